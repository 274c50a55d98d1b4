//! Data loading and entity records

pub mod csv_loader;
pub mod matching;
pub mod records;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types
pub use csv_loader::{DataConfig, DataStore, DEFAULT_CSV_DIR};
pub use matching::{build_matching_table, MatchingRow};
pub use records::{Customer, Geolocation, Order, OrderItem, OrderReview, Seller};
