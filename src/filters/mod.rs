mod sort;
mod spec;

use chrono::FixedOffset;

use crate::models::CanonicalTransaction;

pub use sort::{SortKey, SortOrder, SortSpec};
pub use spec::{AmountPredicate, FilterSpec, EXACT_AMOUNT_TOLERANCE};

/// Returns the records `filter` accepts, in `sort` order. The input is left untouched.
pub fn filter_and_sort(records: &[CanonicalTransaction], filter: &FilterSpec, sort: &SortSpec, local: &FixedOffset) -> Vec<CanonicalTransaction> {
    let mut selected: Vec<CanonicalTransaction> = records.iter()
        .filter(|transaction| filter.matches(transaction, local))
        .cloned()
        .collect();

    sort.apply(&mut selected);

    selected
}
