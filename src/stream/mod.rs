mod live_merge;

pub use live_merge::{LiveMergeHandler, MergeStats};
