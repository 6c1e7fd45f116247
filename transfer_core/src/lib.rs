pub mod aggregate;
pub mod chains;
pub mod filter;
pub mod types;
pub mod window;

pub use aggregate::{
    aggregate_transfers, Aggregate, PairAggregate, RouteStats, TopTransactionEntry,
    TOP_TRANSACTIONS_LIMIT,
};
pub use chains::chain_display_name;
pub use filter::RecordFilter;
pub use types::{
    IncludedStep, TokenInfo, TransferLeg, TransferMetadata, TransferRecord, FEE_COLLECTION_TOOL,
    UNKNOWN_INTEGRATOR, UNKNOWN_ROUTE,
};
pub use window::TimestampWindow;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
