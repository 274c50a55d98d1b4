//! Matching table: order ↔ review ↔ customer ↔ product ↔ seller
//!
//! Full outer join closure of orders, reviews and items on order_id. Orders
//! without reviews or items keep `None` in the missing references, and
//! reviews or items whose order is absent still produce a row.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::data::records::{Order, OrderItem, OrderReview};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingRow {
    pub order_id: String,
    pub review_id: Option<String>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub seller_id: Option<String>,
}

/// Build the matching table, sorted by order_id
pub fn build_matching_table(
    orders: &[Order],
    reviews: &[OrderReview],
    items: &[OrderItem],
) -> Vec<MatchingRow> {
    // orders ⟗ reviews
    let reviews_by_order = index_by_order(reviews, |r| r.order_id.as_str());
    let mut rows = Vec::with_capacity(orders.len().max(reviews.len()));
    let mut order_ids: HashSet<&str> = HashSet::with_capacity(orders.len());

    for order in orders {
        order_ids.insert(order.order_id.as_str());
        let base = MatchingRow {
            order_id: order.order_id.clone(),
            review_id: None,
            customer_id: order.customer_id.clone(),
            product_id: None,
            seller_id: None,
        };
        match reviews_by_order.get(order.order_id.as_str()) {
            Some(matches) => rows.extend(matches.iter().map(|review| MatchingRow {
                review_id: review.review_id.clone(),
                ..base.clone()
            })),
            None => rows.push(base),
        }
    }
    for review in reviews {
        if !order_ids.contains(review.order_id.as_str()) {
            rows.push(MatchingRow {
                order_id: review.order_id.clone(),
                review_id: review.review_id.clone(),
                customer_id: None,
                product_id: None,
                seller_id: None,
            });
        }
    }
    rows.sort_by(|a, b| a.order_id.cmp(&b.order_id));

    // (orders ⟗ reviews) ⟗ items
    let items_by_order = index_by_order(items, |i| i.order_id.as_str());
    let left_ids: HashSet<String> = rows.iter().map(|r| r.order_id.clone()).collect();
    let mut joined = Vec::with_capacity(rows.len().max(items.len()));

    for row in rows {
        match items_by_order.get(row.order_id.as_str()) {
            Some(matches) => joined.extend(matches.iter().map(|item| MatchingRow {
                product_id: item.product_id.clone(),
                seller_id: item.seller_id.clone(),
                ..row.clone()
            })),
            None => joined.push(row),
        }
    }
    for item in items {
        if !left_ids.contains(&item.order_id) {
            joined.push(MatchingRow {
                order_id: item.order_id.clone(),
                review_id: None,
                customer_id: None,
                product_id: item.product_id.clone(),
                seller_id: item.seller_id.clone(),
            });
        }
    }
    joined.sort_by(|a, b| a.order_id.cmp(&b.order_id));

    joined
}

/// Group rows by order_id, keeping file order within each group
fn index_by_order<'a, T>(rows: &'a [T], key: impl Fn(&'a T) -> &'a str) -> HashMap<&'a str, Vec<&'a T>> {
    let mut index: HashMap<&str, Vec<&T>> = HashMap::new();
    for row in rows {
        index.entry(key(row)).or_default().push(row);
    }
    index
}
