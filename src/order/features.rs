//! Per-order feature rows
//!
//! Each feature method of [`OrderFeatureBuilder`](super::OrderFeatureBuilder)
//! returns one of these row types; [`TrainingTable`] is the merged result.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Delivery timing in fractional days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitTime {
    pub order_id: String,
    pub wait_time: Option<f64>,
    pub expected_wait_time: Option<f64>,
    /// Days late; 0 for on-time, early or undelivered orders
    pub delay_vs_expected: f64,
}

/// Review sentiment flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewScore {
    pub order_id: String,
    pub dim_is_five_star: i64,
    pub dim_is_one_star: i64,
    pub review_score: Option<i64>,
}

/// Item rows per order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCount {
    pub order_id: String,
    pub number_of_products: u32,
}

/// Distinct sellers per order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerCount {
    pub order_id: String,
    pub number_of_sellers: u32,
}

/// Summed line-item price and freight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceFreight {
    pub order_id: String,
    pub price: f64,
    pub freight_value: f64,
}

/// Mean seller–customer distance in km
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerCustomerDistance {
    pub order_id: String,
    pub distance_seller_customer: f64,
}

/// One complete row of the training table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub order_id: String,
    pub wait_time: f64,
    pub expected_wait_time: f64,
    pub delay_vs_expected: f64,
    pub dim_is_five_star: i64,
    pub dim_is_one_star: i64,
    pub review_score: i64,
    pub number_of_products: u32,
    pub number_of_sellers: u32,
    pub price: f64,
    pub freight_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_seller_customer: Option<f64>,
}

/// Column names of the training table, in output order
pub fn training_column_names(with_distance: bool) -> Vec<&'static str> {
    let mut names = vec![
        "order_id",
        "wait_time",
        "expected_wait_time",
        "delay_vs_expected",
        "dim_is_five_star",
        "dim_is_one_star",
        "review_score",
        "number_of_products",
        "number_of_sellers",
        "price",
        "freight_value",
    ];
    if with_distance {
        names.push("distance_seller_customer");
    }
    names
}

/// Final per-order feature table, free of missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingTable {
    pub rows: Vec<TrainingRow>,
    /// Whether `distance_seller_customer` was joined in
    pub with_distance: bool,
}

impl TrainingTable {
    pub fn column_names(&self) -> Vec<&'static str> {
        training_column_names(self.with_distance)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainingRow> {
        self.rows.iter()
    }

    /// Convert to a polars DataFrame with the training columns
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let rows = &self.rows;
        let mut df = df!(
            "order_id" => rows.iter().map(|r| r.order_id.clone()).collect::<Vec<_>>(),
            "wait_time" => rows.iter().map(|r| r.wait_time).collect::<Vec<_>>(),
            "expected_wait_time" => rows.iter().map(|r| r.expected_wait_time).collect::<Vec<_>>(),
            "delay_vs_expected" => rows.iter().map(|r| r.delay_vs_expected).collect::<Vec<_>>(),
            "dim_is_five_star" => rows.iter().map(|r| r.dim_is_five_star).collect::<Vec<_>>(),
            "dim_is_one_star" => rows.iter().map(|r| r.dim_is_one_star).collect::<Vec<_>>(),
            "review_score" => rows.iter().map(|r| r.review_score).collect::<Vec<_>>(),
            "number_of_products" => rows.iter().map(|r| r.number_of_products).collect::<Vec<_>>(),
            "number_of_sellers" => rows.iter().map(|r| r.number_of_sellers).collect::<Vec<_>>(),
            "price" => rows.iter().map(|r| r.price).collect::<Vec<_>>(),
            "freight_value" => rows.iter().map(|r| r.freight_value).collect::<Vec<_>>(),
        )?;

        if self.with_distance {
            let distances: Vec<Option<f64>> =
                rows.iter().map(|r| r.distance_seller_customer).collect();
            df.with_column(Series::new("distance_seller_customer".into(), distances))?;
        }

        Ok(df)
    }
}
