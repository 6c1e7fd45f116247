use crate::types::TransferRecord;
use serde::{Deserialize, Serialize};

/// Predicate applied to the accumulated raw record set before aggregation.
///
/// Filtering is stateless and re-appliable: toggling it only re-aggregates
/// the retained dataset, it never triggers a new fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordFilter {
    /// Every record passes
    All,
    /// Records where either leg's token symbol contains "btc" (case-insensitive)
    #[default]
    BtcOnly,
}

impl RecordFilter {
    pub fn matches(&self, record: &TransferRecord) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::BtcOnly => is_btc_transfer(record),
        }
    }

    /// Borrowing view of the records that pass the filter, preserving order
    pub fn apply<'a>(&self, records: &'a [TransferRecord]) -> Vec<&'a TransferRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn is_btc_transfer(record: &TransferRecord) -> bool {
    let sending = record
        .sending
        .token
        .as_ref()
        .map(|t| t.symbol.to_lowercase())
        .unwrap_or_default();
    let receiving = record
        .receiving
        .token
        .as_ref()
        .map(|t| t.symbol.to_lowercase())
        .unwrap_or_default();

    sending.contains("btc") || receiving.contains("btc")
}
