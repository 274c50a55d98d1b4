//! Typed entity records extracted from loaded tables
//!
//! Every identifier and zip prefix is read as a string (integer-inferred
//! columns are cast), so keys from different files compare consistently.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DataError, Result};

/// Table names as derived from the CSV filenames
pub mod tables {
    pub const ORDERS: &str = "orders";
    pub const ORDER_ITEMS: &str = "order_items";
    pub const ORDER_REVIEWS: &str = "order_reviews";
    pub const SELLERS: &str = "sellers";
    pub const CUSTOMERS: &str = "customers";
    pub const GEOLOCATION: &str = "geolocation";
}

/// Order header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: Option<String>,
    pub order_status: Option<String>,
    // Raw timestamp cells, parsed by the features that need them
    pub order_purchase_timestamp: Option<String>,
    pub order_estimated_delivery_date: Option<String>,
    pub order_delivered_customer_date: Option<String>,
}

/// Line item of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    pub order_item_id: Option<i64>,
    pub product_id: Option<String>,
    pub seller_id: Option<String>,
    pub price: Option<f64>,
    pub freight_value: Option<f64>,
}

/// Customer review; an order may have several
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReview {
    pub review_id: Option<String>,
    pub order_id: String,
    pub review_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub seller_id: String,
    pub zip_code_prefix: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub zip_code_prefix: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// One geolocation sample; prefixes repeat across rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub zip_code_prefix: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Order {
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>> {
        let table = tables::ORDERS;
        let order_id = strings(df, table, "order_id")?;
        let customer_id = strings(df, table, "customer_id")?;
        let status = strings(df, table, "order_status")?;
        let purchase = strings(df, table, "order_purchase_timestamp")?;
        let estimated = strings(df, table, "order_estimated_delivery_date")?;
        let delivered = strings(df, table, "order_delivered_customer_date")?;

        let mut orders = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Some(id) = order_id[i].clone() else {
                continue;
            };
            orders.push(Order {
                order_id: id,
                customer_id: customer_id[i].clone(),
                order_status: status[i].clone(),
                order_purchase_timestamp: purchase[i].clone(),
                order_estimated_delivery_date: estimated[i].clone(),
                order_delivered_customer_date: delivered[i].clone(),
            });
        }

        report_skipped(table, df.height(), orders.len());
        Ok(orders)
    }

    /// Whether the order reached the customer
    pub fn is_delivered(&self) -> bool {
        self.order_status.as_deref() == Some("delivered")
    }
}

impl OrderItem {
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>> {
        let table = tables::ORDER_ITEMS;
        let order_id = strings(df, table, "order_id")?;
        let item_id = integers(df, table, "order_item_id")?;
        let product_id = strings(df, table, "product_id")?;
        let seller_id = strings(df, table, "seller_id")?;
        let price = floats(df, table, "price")?;
        let freight = floats(df, table, "freight_value")?;

        let mut items = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Some(id) = order_id[i].clone() else {
                continue;
            };
            items.push(OrderItem {
                order_id: id,
                order_item_id: item_id[i],
                product_id: product_id[i].clone(),
                seller_id: seller_id[i].clone(),
                price: price[i],
                freight_value: freight[i],
            });
        }

        report_skipped(table, df.height(), items.len());
        Ok(items)
    }
}

impl OrderReview {
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>> {
        let table = tables::ORDER_REVIEWS;
        let review_id = strings(df, table, "review_id")?;
        let order_id = strings(df, table, "order_id")?;
        let score = integers(df, table, "review_score")?;

        let mut reviews = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Some(id) = order_id[i].clone() else {
                continue;
            };
            reviews.push(OrderReview {
                review_id: review_id[i].clone(),
                order_id: id,
                review_score: score[i],
            });
        }

        report_skipped(table, df.height(), reviews.len());
        Ok(reviews)
    }
}

impl Seller {
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>> {
        let table = tables::SELLERS;
        let seller_id = strings(df, table, "seller_id")?;
        let zip = strings(df, table, "seller_zip_code_prefix")?;
        let city = strings(df, table, "seller_city")?;
        let state = strings(df, table, "seller_state")?;

        let sellers: Vec<Seller> = (0..df.height())
            .filter_map(|i| {
                Some(Seller {
                    seller_id: seller_id[i].clone()?,
                    zip_code_prefix: zip[i].clone(),
                    city: city[i].clone(),
                    state: state[i].clone(),
                })
            })
            .collect();

        report_skipped(table, df.height(), sellers.len());
        Ok(sellers)
    }
}

impl Customer {
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>> {
        let table = tables::CUSTOMERS;
        let customer_id = strings(df, table, "customer_id")?;
        let zip = strings(df, table, "customer_zip_code_prefix")?;
        let city = strings(df, table, "customer_city")?;
        let state = strings(df, table, "customer_state")?;

        let customers: Vec<Customer> = (0..df.height())
            .filter_map(|i| {
                Some(Customer {
                    customer_id: customer_id[i].clone()?,
                    zip_code_prefix: zip[i].clone(),
                    city: city[i].clone(),
                    state: state[i].clone(),
                })
            })
            .collect();

        report_skipped(table, df.height(), customers.len());
        Ok(customers)
    }
}

impl Geolocation {
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>> {
        let table = tables::GEOLOCATION;
        let zip = strings(df, table, "geolocation_zip_code_prefix")?;
        let lat = floats(df, table, "geolocation_lat")?;
        let lng = floats(df, table, "geolocation_lng")?;

        let points: Vec<Geolocation> = (0..df.height())
            .filter_map(|i| {
                Some(Geolocation {
                    zip_code_prefix: zip[i].clone()?,
                    lat: lat[i],
                    lng: lng[i],
                })
            })
            .collect();

        report_skipped(table, df.height(), points.len());
        Ok(points)
    }
}

fn column<'a>(df: &'a DataFrame, table: &str, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| DataError::missing_column(table, name))
}

/// Column values as owned strings, casting non-string columns
fn strings(df: &DataFrame, table: &str, name: &str) -> Result<Vec<Option<String>>> {
    let casted = column(df, table, name)?.cast(&DataType::String)?;
    let values: Vec<Option<String>> = casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

fn floats(df: &DataFrame, table: &str, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = column(df, table, name)?.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = casted.f64()?.into_iter().collect();
    Ok(values)
}

fn integers(df: &DataFrame, table: &str, name: &str) -> Result<Vec<Option<i64>>> {
    let casted = column(df, table, name)?.cast(&DataType::Int64)?;
    let values: Vec<Option<i64>> = casted.i64()?.into_iter().collect();
    Ok(values)
}

fn report_skipped(table: &str, total: usize, kept: usize) {
    if kept < total {
        warn!("Skipped {} rows with a null key in `{}`", total - kept, table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_from_frame() {
        let df = df!(
            "order_id" => &["o1", "o2"],
            "customer_id" => &["c1", "c2"],
            "order_status" => &["delivered", "shipped"],
            "order_purchase_timestamp" => &["2017-10-02 10:56:33", "2017-10-03 08:00:00"],
            "order_estimated_delivery_date" => &["2017-10-18 00:00:00", "2017-10-20 00:00:00"],
            "order_delivered_customer_date" => &[Some("2017-10-10 21:25:13"), None],
        )
        .unwrap();

        let orders = Order::from_frame(&df).unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id, "o1");
        assert!(orders[0].is_delivered());
        assert!(!orders[1].is_delivered());
        assert_eq!(orders[1].order_delivered_customer_date, None);
    }

    #[test]
    fn test_missing_column() {
        let df = df!(
            "order_id" => &["o1"],
            "customer_id" => &["c1"],
        )
        .unwrap();

        match Order::from_frame(&df) {
            Err(DataError::MissingColumn { table, column }) => {
                assert_eq!(table, "orders");
                assert_eq!(column, "order_status");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_zip_prefix_is_cast_to_string() {
        let df = df!(
            "seller_id" => &["s1"],
            "seller_zip_code_prefix" => &[13023i64],
            "seller_city" => &["campinas"],
            "seller_state" => &["SP"],
        )
        .unwrap();

        let sellers = Seller::from_frame(&df).unwrap();
        assert_eq!(sellers[0].zip_code_prefix.as_deref(), Some("13023"));
    }

    #[test]
    fn test_integer_price_is_cast_to_float() {
        let df = df!(
            "order_id" => &["o1", "o1"],
            "order_item_id" => &[1i64, 2],
            "product_id" => &["p1", "p2"],
            "seller_id" => &["s1", "s2"],
            "price" => &[10i64, 20],
            "freight_value" => &[5.0, 5.5],
        )
        .unwrap();

        let items = OrderItem::from_frame(&df).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].price, Some(20.0));
        assert_eq!(items[1].freight_value, Some(5.5));
    }

    #[test]
    fn test_null_keys_are_skipped() {
        let df = df!(
            "geolocation_zip_code_prefix" => &[Some("01037"), None, Some("01046")],
            "geolocation_lat" => &[-23.54, -23.55, -23.56],
            "geolocation_lng" => &[-46.63, -46.64, -46.65],
        )
        .unwrap();

        let points = Geolocation::from_frame(&df).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].zip_code_prefix, "01046");
    }
}
