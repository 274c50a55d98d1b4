//! CSV loading for the marketplace extracts
//!
//! Every `.csv` file in a directory becomes one named table. Names come from
//! the filename with the configured prefix and suffix stripped, so
//! `olist_orders_dataset.csv` and `orders.csv` both load as `orders`.

use polars::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::data::matching::{build_matching_table, MatchingRow};
use crate::data::records::{tables, Customer, Geolocation, Order, OrderItem, OrderReview, Seller};
use crate::error::{DataError, Result};

/// Default CSV directory (relative to the working directory)
pub const DEFAULT_CSV_DIR: &str = "data/csv";

/// Where and how to load the CSV extracts
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Directory holding one CSV per table
    pub csv_dir: PathBuf,
    /// Prefix stripped from filenames
    pub file_prefix: String,
    /// Suffix stripped from filenames (includes the extension)
    pub file_suffix: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from(DEFAULT_CSV_DIR),
            file_prefix: "olist_".to_string(),
            file_suffix: "_dataset.csv".to_string(),
        }
    }
}

impl DataConfig {
    pub fn new<P: AsRef<Path>>(csv_dir: P) -> Self {
        Self {
            csv_dir: csv_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.file_prefix = prefix.to_string();
        self
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.file_suffix = suffix.to_string();
        self
    }

    /// Table name for a CSV filename, or `None` for non-data files
    pub fn table_name(&self, file_name: &str) -> Option<String> {
        if file_name.starts_with('.') || !file_name.ends_with(".csv") {
            return None;
        }

        let name = file_name
            .strip_prefix(self.file_prefix.as_str())
            .unwrap_or(file_name);
        let name = name
            .strip_suffix(self.file_suffix.as_str())
            .or_else(|| name.strip_suffix(".csv"))
            .unwrap_or(name);

        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

/// All tables of one dataset snapshot, loaded once and shared by reference
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    tables: HashMap<String, DataFrame>,
}

impl DataStore {
    /// Load every CSV in the configured directory
    pub fn load(config: &DataConfig) -> Result<Self> {
        let dir = config.csv_dir.as_path();
        if !dir.is_dir() {
            return Err(DataError::MissingData(format!(
                "CSV directory {:?} does not exist",
                dir
            )));
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        paths.sort();

        let mut tables = HashMap::new();
        for path in paths {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();

            let name = match config.table_name(file_name) {
                Some(name) if path.is_file() => name,
                _ => {
                    debug!("Skipping non-data entry {:?}", path);
                    continue;
                }
            };

            let df = read_csv(&path)?;
            debug!("Loaded `{}`: {} rows x {} columns", name, df.height(), df.width());
            tables.insert(name, df);
        }

        if tables.is_empty() {
            return Err(DataError::MissingData(format!(
                "no CSV tables found in {:?}",
                dir
            )));
        }

        info!("Loaded {} tables from {:?}", tables.len(), dir);
        Ok(Self { tables })
    }

    /// Load a directory with the default filename convention
    pub fn load_dir<P: AsRef<Path>>(csv_dir: P) -> Result<Self> {
        Self::load(&DataConfig::new(csv_dir))
    }

    /// Build a store from frames already in memory
    pub fn from_tables(tables: HashMap<String, DataFrame>) -> Self {
        Self { tables }
    }

    /// Borrow a table by name
    pub fn table(&self, name: &str) -> Result<&DataFrame> {
        self.tables
            .get(name)
            .ok_or_else(|| DataError::MissingData(format!("table `{}` was not loaded", name)))
    }

    /// Table names in sorted order
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn orders(&self) -> Result<Vec<Order>> {
        Order::from_frame(self.table(tables::ORDERS)?)
    }

    pub fn order_items(&self) -> Result<Vec<OrderItem>> {
        OrderItem::from_frame(self.table(tables::ORDER_ITEMS)?)
    }

    pub fn order_reviews(&self) -> Result<Vec<OrderReview>> {
        OrderReview::from_frame(self.table(tables::ORDER_REVIEWS)?)
    }

    pub fn sellers(&self) -> Result<Vec<Seller>> {
        Seller::from_frame(self.table(tables::SELLERS)?)
    }

    pub fn customers(&self) -> Result<Vec<Customer>> {
        Customer::from_frame(self.table(tables::CUSTOMERS)?)
    }

    pub fn geolocation(&self) -> Result<Vec<Geolocation>> {
        Geolocation::from_frame(self.table(tables::GEOLOCATION)?)
    }

    /// Order ↔ review ↔ customer ↔ product ↔ seller closure
    pub fn matching_table(&self) -> Result<Vec<MatchingRow>> {
        let orders = self.orders()?;
        let reviews = self.order_reviews()?;
        let items = self.order_items()?;

        let rows = build_matching_table(&orders, &reviews, &items);
        debug!("Matching table: {} rows", rows.len());
        Ok(rows)
    }
}

/// Whether a column holds an identifier or zip prefix, read verbatim as text
fn is_key_column(name: &str) -> bool {
    name.ends_with("_zip_code_prefix") || (name.ends_with("_id") && name != "order_item_id")
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    let csv_error = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };

    // Header only, to pin key columns to String before inference
    let header = CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(csv_error)?;
    let keys: Schema = header
        .get_column_names()
        .into_iter()
        .filter(|name| is_key_column(name.as_str()))
        .map(|name| Field::new(name.clone(), DataType::String))
        .collect();

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_schema_overwrite(Some(Arc::new(keys)))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(csv_error)
}
