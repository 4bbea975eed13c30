mod amount;
mod errors;
mod timestamp;

pub use amount::Amount;
pub use errors::AmountError;
pub use timestamp::{local_date, parse_timestamp};

/// Provider-local record identifier; unique only within one provider's result set.
pub type RecordId = i64;
