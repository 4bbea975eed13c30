use serde::Deserialize;

use crate::models::CanonicalTransaction;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Amount
}

/// Three-state ordering switch; `None` keeps the fetch order untouched.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    None,
    Asc,
    Desc
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortSpec {
    #[serde(rename = "sortBy")]
    pub key: SortKey,
    #[serde(rename = "sortOrder")]
    pub order: SortOrder
}

impl SortSpec {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Stable sort in place. Records without `createdAt` sort before dated ones in ascending order.
    pub fn apply(&self, records: &mut [CanonicalTransaction]) {
        let descending = match self.order {
            SortOrder::None => return,
            SortOrder::Asc => false,
            SortOrder::Desc => true
        };

        records.sort_by(|left, right| {
            let ordering = match self.key {
                SortKey::Date => left.created_at.cmp(&right.created_at),
                SortKey::Amount => left.amount.as_decimal().abs().cmp(&right.amount.as_decimal().abs())
            };

            if descending { ordering.reverse() } else { ordering }
        });
    }
}
