//! Reconciliation core of a PIX operations console.
//!
//! Provider records are adapted into [`models::CanonicalTransaction`]s, held in a single
//! [`session::Session`] set that fetches and live pushes both feed, and read back through
//! [`console::Console`] as filtered pages, metrics, and CSV exports.

pub mod adapters;
pub mod compensation;
pub mod config;
pub mod console;
pub mod export;
pub mod filters;
pub mod metrics;
pub mod models;
pub mod pagination;
pub mod replay;
pub mod session;
pub mod stream;
pub mod types;
