//! Per-order feature derivation
//!
//! [`OrderFeatureBuilder`] borrows a loaded [`DataStore`] and derives one
//! feature frame per method. [`OrderFeatureBuilder::training_data`] inner-joins
//! them on order_id and keeps only complete rows.
//!
//! # Example
//!
//! ```no_run
//! use olist::data::DataStore;
//! use olist::order::OrderFeatureBuilder;
//!
//! let store = DataStore::load_dir("data/csv").unwrap();
//! let builder = OrderFeatureBuilder::new(&store);
//! let table = builder.training_data(true, false).unwrap();
//! println!("{} training rows", table.len());
//! ```

pub mod features;

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

use crate::core::distance::{DistanceCalculator, Haversine};
use crate::data::{DataStore, Geolocation};
use crate::error::{DataError, Result};

pub use features::{
    training_column_names, PriceFreight, ProductCount, ReviewScore, SellerCount,
    SellerCustomerDistance, TrainingRow, TrainingTable, WaitTime,
};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Accepted timestamp layouts, tried in order
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Derives order-level features from one dataset snapshot
pub struct OrderFeatureBuilder<'a, D = Haversine> {
    store: &'a DataStore,
    calculator: D,
}

impl<'a> OrderFeatureBuilder<'a> {
    /// Builder using haversine distances
    pub fn new(store: &'a DataStore) -> Self {
        Self::with_calculator(store, Haversine::default())
    }
}

impl<'a, D: DistanceCalculator> OrderFeatureBuilder<'a, D> {
    pub fn with_calculator(store: &'a DataStore, calculator: D) -> Self {
        Self { store, calculator }
    }

    /// Wait time, expected wait time and lateness per order
    ///
    /// # Arguments
    /// * `is_delivered` - Keep only orders with status `delivered`. Pass
    ///   `false` at inference time, when delivery has not happened yet.
    pub fn wait_time(&self, is_delivered: bool) -> Result<Vec<WaitTime>> {
        let orders = self.store.orders()?;

        let mut rows = Vec::with_capacity(orders.len());
        for order in orders.iter().filter(|o| !is_delivered || o.is_delivered()) {
            let purchase = parse_timestamp(
                "order_purchase_timestamp",
                order.order_purchase_timestamp.as_deref(),
            )?;
            let estimated = parse_timestamp(
                "order_estimated_delivery_date",
                order.order_estimated_delivery_date.as_deref(),
            )?;
            let delivered = parse_timestamp(
                "order_delivered_customer_date",
                order.order_delivered_customer_date.as_deref(),
            )?;

            rows.push(WaitTime {
                order_id: order.order_id.clone(),
                wait_time: elapsed_days(purchase, delivered),
                expected_wait_time: elapsed_days(purchase, estimated),
                delay_vs_expected: lateness(elapsed_days(delivered, estimated)),
            });
        }

        debug!("wait_time: {} of {} orders", rows.len(), orders.len());
        Ok(rows)
    }

    /// Five-star and one-star flags per review
    pub fn review_score(&self) -> Result<Vec<ReviewScore>> {
        let reviews = self.store.order_reviews()?;

        Ok(reviews
            .into_iter()
            .map(|review| ReviewScore {
                dim_is_five_star: i64::from(review.review_score == Some(5)),
                dim_is_one_star: i64::from(review.review_score == Some(1)),
                review_score: review.review_score,
                order_id: review.order_id,
            })
            .collect())
    }

    /// Number of item rows per order
    ///
    /// Rows with a null `order_item_id` are not counted, while their seller
    /// still counts in [`number_sellers`](Self::number_sellers), so
    /// `number_of_sellers <= number_of_products` holds only for items with ids.
    pub fn number_products(&self) -> Result<Vec<ProductCount>> {
        let items = self.store.order_items()?;

        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for item in &items {
            let count = counts.entry(item.order_id.as_str()).or_default();
            if item.order_item_id.is_some() {
                *count += 1;
            }
        }

        Ok(counts
            .into_iter()
            .map(|(order_id, number_of_products)| ProductCount {
                order_id: order_id.to_string(),
                number_of_products,
            })
            .collect())
    }

    /// Number of distinct sellers per order
    pub fn number_sellers(&self) -> Result<Vec<SellerCount>> {
        let items = self.store.order_items()?;

        let mut sellers: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for item in &items {
            let distinct = sellers.entry(item.order_id.as_str()).or_default();
            if let Some(seller_id) = item.seller_id.as_deref() {
                distinct.insert(seller_id);
            }
        }

        Ok(sellers
            .into_iter()
            .map(|(order_id, distinct)| SellerCount {
                order_id: order_id.to_string(),
                number_of_sellers: distinct.len() as u32,
            })
            .collect())
    }

    /// Total price and freight per order
    pub fn price_and_freight(&self) -> Result<Vec<PriceFreight>> {
        let items = self.store.order_items()?;

        let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
        for item in &items {
            let (price, freight) = totals.entry(item.order_id.as_str()).or_default();
            *price += item.price.unwrap_or(0.0);
            *freight += item.freight_value.unwrap_or(0.0);
        }

        Ok(totals
            .into_iter()
            .map(|(order_id, (price, freight_value))| PriceFreight {
                order_id: order_id.to_string(),
                price,
                freight_value,
            })
            .collect())
    }

    /// Mean distance between sellers and customer per order
    ///
    /// Rows whose seller or customer zip prefix has no geolocation are dropped
    /// before the distance loop, so orders without coverage are absent.
    pub fn distance_seller_customer(&self) -> Result<Vec<SellerCustomerDistance>> {
        let matching = self.store.matching_table()?;
        let samples = self.store.geolocation()?;
        let geo = first_point_per_prefix(&samples);

        // sellers ⟕ geo, customers ⟕ geo
        let sellers = self.store.sellers()?;
        let mut seller_points: HashMap<&str, GeoPoint> = HashMap::with_capacity(sellers.len());
        for seller in &sellers {
            seller_points
                .entry(seller.seller_id.as_str())
                .or_insert_with(|| locate(&geo, seller.zip_code_prefix.as_deref()));
        }

        let customers = self.store.customers()?;
        let mut customer_points: HashMap<&str, GeoPoint> = HashMap::with_capacity(customers.len());
        for customer in &customers {
            customer_points
                .entry(customer.customer_id.as_str())
                .or_insert_with(|| locate(&geo, customer.zip_code_prefix.as_deref()));
        }

        // matching ⋈ sellers ⋈ customers, keeping fully located pairs
        let mut pairs = Vec::with_capacity(matching.len());
        let mut joined = 0usize;
        for row in &matching {
            let seller = row.seller_id.as_deref().and_then(|id| seller_points.get(id));
            let customer = row.customer_id.as_deref().and_then(|id| customer_points.get(id));
            let (Some(seller), Some(customer)) = (seller, customer) else {
                continue;
            };
            joined += 1;

            if let (Some((seller_lng, seller_lat)), Some((customer_lng, customer_lat))) =
                (seller.coordinates(), customer.coordinates())
            {
                pairs.push((row.order_id.as_str(), seller_lng, seller_lat, customer_lng, customer_lat));
            }
        }
        debug!(
            "distance_seller_customer: {} joined rows, {} without coordinates",
            joined,
            joined - pairs.len()
        );

        let mut per_order: BTreeMap<&str, (f64, u32)> = BTreeMap::new();
        for (order_id, seller_lng, seller_lat, customer_lng, customer_lat) in pairs {
            let distance = self
                .calculator
                .distance(seller_lng, seller_lat, customer_lng, customer_lat);
            let (sum, count) = per_order.entry(order_id).or_default();
            *sum += distance;
            *count += 1;
        }

        Ok(per_order
            .into_iter()
            .map(|(order_id, (sum, count))| SellerCustomerDistance {
                order_id: order_id.to_string(),
                distance_seller_customer: sum / f64::from(count),
            })
            .collect())
    }

    /// Merged, null-free feature table
    ///
    /// Inner-joins wait time, review score, product count, seller count and
    /// price/freight on order_id, plus the seller–customer distance when
    /// `with_distance_seller_customer` is set (the most expensive feature).
    /// A join that leaves no rows fails with [`DataError::EmptyJoinResult`].
    pub fn training_data(
        &self,
        is_delivered: bool,
        with_distance_seller_customer: bool,
    ) -> Result<TrainingTable> {
        let wait_times = self.wait_time(is_delivered)?;
        let reviews = self.review_score()?;
        let products = self.number_products()?;
        let sellers = self.number_sellers()?;
        let totals = self.price_and_freight()?;

        // wait_time ⋈ review_score keeps one row per review
        let mut reviews_by_order: HashMap<&str, Vec<&ReviewScore>> = HashMap::new();
        for review in &reviews {
            reviews_by_order
                .entry(review.order_id.as_str())
                .or_default()
                .push(review);
        }
        let mut joined: Vec<Joined> = Vec::with_capacity(wait_times.len());
        for wait in &wait_times {
            if let Some(matches) = reviews_by_order.get(wait.order_id.as_str()) {
                joined.extend(matches.iter().map(|review| Joined::new(wait, review)));
            }
        }
        ensure_rows(&joined, "review_score")?;

        let products: HashMap<&str, u32> = products
            .iter()
            .map(|p| (p.order_id.as_str(), p.number_of_products))
            .collect();
        joined.retain_mut(|row| match products.get(row.order_id()) {
            Some(&n) => {
                row.number_of_products = n;
                true
            }
            None => false,
        });
        ensure_rows(&joined, "number_of_products")?;

        let sellers: HashMap<&str, u32> = sellers
            .iter()
            .map(|s| (s.order_id.as_str(), s.number_of_sellers))
            .collect();
        joined.retain_mut(|row| match sellers.get(row.order_id()) {
            Some(&n) => {
                row.number_of_sellers = n;
                true
            }
            None => false,
        });
        ensure_rows(&joined, "number_of_sellers")?;

        let totals: HashMap<&str, (f64, f64)> = totals
            .iter()
            .map(|t| (t.order_id.as_str(), (t.price, t.freight_value)))
            .collect();
        joined.retain_mut(|row| match totals.get(row.order_id()) {
            Some(&(price, freight)) => {
                row.price = price;
                row.freight_value = freight;
                true
            }
            None => false,
        });
        ensure_rows(&joined, "price_and_freight")?;

        if with_distance_seller_customer {
            let distances = self.distance_seller_customer()?;
            let distances: HashMap<&str, f64> = distances
                .iter()
                .map(|d| (d.order_id.as_str(), d.distance_seller_customer))
                .collect();
            joined.retain_mut(|row| match distances.get(row.order_id()) {
                Some(&distance) => {
                    row.distance = Some(distance);
                    true
                }
                None => false,
            });
            ensure_rows(&joined, "distance_seller_customer")?;
        }

        let total = joined.len();
        let rows: Vec<TrainingRow> = joined
            .into_iter()
            .filter_map(|row| row.complete(with_distance_seller_customer))
            .collect();
        if rows.is_empty() {
            return Err(DataError::EmptyJoinResult {
                stage: "drop_incomplete",
            });
        }

        info!(
            "Training data: {} rows ({} dropped as incomplete)",
            rows.len(),
            total - rows.len()
        );
        Ok(TrainingTable {
            rows,
            with_distance: with_distance_seller_customer,
        })
    }
}

/// Row under construction while joining feature frames
struct Joined<'r> {
    wait: &'r WaitTime,
    review: &'r ReviewScore,
    number_of_products: u32,
    number_of_sellers: u32,
    price: f64,
    freight_value: f64,
    distance: Option<f64>,
}

impl<'r> Joined<'r> {
    fn new(wait: &'r WaitTime, review: &'r ReviewScore) -> Self {
        Self {
            wait,
            review,
            number_of_products: 0,
            number_of_sellers: 0,
            price: 0.0,
            freight_value: 0.0,
            distance: None,
        }
    }

    fn order_id(&self) -> &str {
        self.wait.order_id.as_str()
    }

    /// Training row if no feature is missing
    fn complete(self, with_distance: bool) -> Option<TrainingRow> {
        let distance = if with_distance {
            Some(self.distance.filter(|d| d.is_finite())?)
        } else {
            None
        };

        Some(TrainingRow {
            order_id: self.wait.order_id.clone(),
            wait_time: self.wait.wait_time.filter(|v| v.is_finite())?,
            expected_wait_time: self.wait.expected_wait_time.filter(|v| v.is_finite())?,
            delay_vs_expected: self.wait.delay_vs_expected,
            dim_is_five_star: self.review.dim_is_five_star,
            dim_is_one_star: self.review.dim_is_one_star,
            review_score: self.review.review_score?,
            number_of_products: self.number_of_products,
            number_of_sellers: self.number_of_sellers,
            price: self.price,
            freight_value: self.freight_value,
            distance_seller_customer: distance,
        })
    }
}

fn ensure_rows<T>(rows: &[T], stage: &'static str) -> Result<()> {
    debug!("join `{}`: {} rows", stage, rows.len());
    if rows.is_empty() {
        return Err(DataError::EmptyJoinResult { stage });
    }
    Ok(())
}

/// Coordinates resolved for one zip prefix; either half may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct GeoPoint {
    lat: Option<f64>,
    lng: Option<f64>,
}

impl GeoPoint {
    /// (lng, lat) when both are known
    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lng?, self.lat?))
    }
}

/// One point per zip prefix: the first non-null latitude and the first
/// non-null longitude seen for it, in file order
fn first_point_per_prefix(samples: &[Geolocation]) -> HashMap<&str, GeoPoint> {
    let mut points: HashMap<&str, GeoPoint> = HashMap::new();
    for sample in samples {
        let point = points.entry(sample.zip_code_prefix.as_str()).or_default();
        if point.lat.is_none() {
            point.lat = sample.lat;
        }
        if point.lng.is_none() {
            point.lng = sample.lng;
        }
    }
    points
}

fn locate(geo: &HashMap<&str, GeoPoint>, zip_code_prefix: Option<&str>) -> GeoPoint {
    zip_code_prefix
        .and_then(|zip| geo.get(zip))
        .copied()
        .unwrap_or_default()
}

/// Parse a timestamp cell; empty cells are missing values
fn parse_timestamp(column: &'static str, value: Option<&str>) -> Result<Option<NaiveDateTime>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(ts));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Some)
        .ok_or_else(|| DataError::MalformedDate {
            column,
            value: raw.to_string(),
        })
}

/// Fractional days from `start` to `end`
fn elapsed_days(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Option<f64> {
    Some((end? - start?).num_milliseconds() as f64 / MILLIS_PER_DAY)
}

/// Days late from (estimated − delivered)
///
/// Negative means late and becomes its magnitude; on-time, early and unknown
/// all map to 0, so early delivery is indistinguishable from on-time.
pub fn lateness(delay: Option<f64>) -> f64 {
    match delay {
        Some(days) if days < 0.0 => days.abs(),
        _ => 0.0,
    }
}
