pub mod region;
pub mod zone;
pub mod rate;
pub mod catalog;
pub mod calc;
pub mod error;
pub mod logger;
pub mod config;

pub use calc::{calculate_postage, CalculationResult, PostageRequest};
pub use catalog::{Catalog, CatalogSchema};
pub use error::CalculationError;

use sha2::{Sha256, Digest};

/// Calculate SHA256 digest
pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}
