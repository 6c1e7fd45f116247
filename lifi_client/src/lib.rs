pub mod client;
pub mod error;
pub mod types;

pub use client::LifiClient;
pub use error::LifiError;
pub use types::{LifiConfig, TransfersPage};
