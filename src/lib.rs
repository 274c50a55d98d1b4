//! Olist - per-order feature table for the Olist marketplace extracts
//!
//! This library provides:
//! - CSV loading of the marketplace tables into a shared [`DataStore`]
//! - Typed entity records and the order/review/item matching table
//! - Order-level features: wait time, review flags, product/seller counts,
//!   price/freight totals and seller–customer distance
//! - A merged, null-free training table
//!
//! # Example
//!
//! ```no_run
//! use olist::{DataStore, OrderFeatureBuilder};
//!
//! let store = DataStore::load_dir("data/csv").unwrap();
//! let table = OrderFeatureBuilder::new(&store)
//!     .training_data(true, true)
//!     .unwrap();
//! println!("{} orders, columns {:?}", table.len(), table.column_names());
//! ```

pub mod core;
pub mod data;
pub mod error;
pub mod order;

// Re-export commonly used types
pub use crate::core::{haversine_distance, DistanceCalculator, Haversine};
pub use data::{DataConfig, DataStore, MatchingRow};
pub use error::DataError;
pub use order::{OrderFeatureBuilder, TrainingRow, TrainingTable};
