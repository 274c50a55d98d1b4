//! Small in-memory marketplace shared by the unit tests
//!
//! | order | status    | items (seller, price, freight) | review | notes                         |
//! |-------|-----------|--------------------------------|--------|-------------------------------|
//! | o1    | delivered | (s1, 10, 5) (s2, 20, 5)        | 5      | early by 4.5 days             |
//! | o2    | delivered | (s1, 15, 2.5) x2               | 1      | late by 3 days                |
//! | o3    | shipped   | (s2, 50, 8)                    | 3      | not delivered yet             |
//! | o4    | delivered | (s3, 12, 3)                    | -      | seller zip has no geolocation |

use polars::prelude::*;
use std::collections::HashMap;

use crate::data::DataStore;

/// São Paulo sample point (lng, lat)
pub const SAO_PAULO: (f64, f64) = (-46.63, -23.54);
/// Rio de Janeiro sample point (lng, lat)
pub const RIO: (f64, f64) = (-43.17, -22.90);

pub fn orders() -> DataFrame {
    df!(
        "order_id" => &["o1", "o2", "o3", "o4"],
        "customer_id" => &["c1", "c2", "c3", "c4"],
        "order_status" => &["delivered", "delivered", "shipped", "delivered"],
        "order_purchase_timestamp" => &[
            "2018-01-01 00:00:00",
            "2018-02-01 00:00:00",
            "2018-03-01 00:00:00",
            "2018-04-01 00:00:00",
        ],
        "order_estimated_delivery_date" => &[
            "2018-01-11 00:00:00",
            "2018-02-05 00:00:00",
            "2018-03-10 00:00:00",
            "2018-04-05 00:00:00",
        ],
        "order_delivered_customer_date" => &[
            Some("2018-01-06 12:00:00"),
            Some("2018-02-08 00:00:00"),
            None,
            Some("2018-04-03 00:00:00"),
        ],
    )
    .unwrap()
}

pub fn order_items() -> DataFrame {
    df!(
        "order_id" => &["o1", "o1", "o2", "o2", "o3", "o4"],
        "order_item_id" => &[1i64, 2, 1, 2, 1, 1],
        "product_id" => &["p1", "p2", "p3", "p3", "p1", "p2"],
        "seller_id" => &["s1", "s2", "s1", "s1", "s2", "s3"],
        "price" => &[10.0, 20.0, 15.0, 15.0, 50.0, 12.0],
        "freight_value" => &[5.0, 5.0, 2.5, 2.5, 8.0, 3.0],
    )
    .unwrap()
}

pub fn order_reviews() -> DataFrame {
    df!(
        "review_id" => &["r1", "r2", "r3"],
        "order_id" => &["o1", "o2", "o3"],
        "review_score" => &[5i64, 1, 3],
    )
    .unwrap()
}

pub fn sellers() -> DataFrame {
    df!(
        "seller_id" => &["s1", "s2", "s3"],
        "seller_zip_code_prefix" => &["01037", "20010", "99999"],
        "seller_city" => &["sao paulo", "rio de janeiro", "nowhere"],
        "seller_state" => &["SP", "RJ", "XX"],
    )
    .unwrap()
}

pub fn customers() -> DataFrame {
    df!(
        "customer_id" => &["c1", "c2", "c3", "c4"],
        "customer_zip_code_prefix" => &["01037", "20010", "01037", "20010"],
        "customer_city" => &["sao paulo", "rio de janeiro", "sao paulo", "rio de janeiro"],
        "customer_state" => &["SP", "RJ", "SP", "RJ"],
    )
    .unwrap()
}

pub fn geolocation() -> DataFrame {
    // 01037 appears twice; the first sample wins
    df!(
        "geolocation_zip_code_prefix" => &["01037", "01037", "20010"],
        "geolocation_lat" => &[SAO_PAULO.1, -23.60, RIO.1],
        "geolocation_lng" => &[SAO_PAULO.0, -46.70, RIO.0],
    )
    .unwrap()
}

pub fn marketplace() -> DataStore {
    store_with(HashMap::new())
}

/// Marketplace with some tables replaced
pub fn store_with(overrides: HashMap<&str, DataFrame>) -> DataStore {
    let mut tables: HashMap<String, DataFrame> = [
        ("orders", orders()),
        ("order_items", order_items()),
        ("order_reviews", order_reviews()),
        ("sellers", sellers()),
        ("customers", customers()),
        ("geolocation", geolocation()),
    ]
    .into_iter()
    .map(|(name, df)| (name.to_string(), df))
    .collect();

    for (name, df) in overrides {
        tables.insert(name.to_string(), df);
    }

    DataStore::from_tables(tables)
}
