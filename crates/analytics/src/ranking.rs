//! Product rankings: best sellers and lowest stock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockline_catalog::Product;
use stockline_core::ProductId;
use stockline_orders::{Order, OrderStatus};

/// Default size of the best-seller ranking.
pub const TOP_N: usize = 10;

/// Default size of the low-stock ranking.
pub const LOW_STOCK_RANKING_SIZE: usize = 10;

/// Display name of the bucket collecting orders for products missing from
/// the catalog.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMetric {
    /// Units ordered.
    Quantity,
    /// `quantity × total_amount` per order, in minor currency units.
    Revenue,
}

impl RankMetric {
    fn measure(self, order: &Order) -> u64 {
        match self {
            RankMetric::Quantity => u64::from(order.quantity),
            RankMetric::Revenue => u64::from(order.quantity).saturating_mul(order.total_amount.minor()),
        }
    }
}

/// One row of a best-seller ranking.
///
/// `product_id` is `None` for the unknown-product bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRank {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Bucket {
    Known(ProductId),
    Unknown,
}

/// Rank products by `metric` over every non-cancelled order.
///
/// Orders without a product id are skipped. Orders whose product id is not in
/// `products` share one "Unknown Product" bucket. Ties keep the order in
/// which buckets first appear in `orders`.
pub fn top_products(
    orders: &[Order],
    products: &[Product],
    metric: RankMetric,
    n: usize,
) -> Vec<ProductRank> {
    let names: HashMap<&ProductId, &str> = products.iter().map(|p| (&p.id, p.name.as_str())).collect();

    let mut index: HashMap<Bucket, usize> = HashMap::new();
    let mut ranks: Vec<ProductRank> = Vec::new();

    for order in orders {
        if order.status == OrderStatus::Cancelled || order.product_id.is_empty() {
            continue;
        }

        let bucket = if names.contains_key(&order.product_id) {
            Bucket::Known(order.product_id.clone())
        } else {
            Bucket::Unknown
        };

        let slot = *index.entry(bucket.clone()).or_insert_with(|| {
            ranks.push(match &bucket {
                Bucket::Known(id) => ProductRank {
                    product_id: Some(id.clone()),
                    name: names.get(id).copied().unwrap_or(UNKNOWN_PRODUCT).to_string(),
                    value: 0,
                },
                Bucket::Unknown => ProductRank {
                    product_id: None,
                    name: UNKNOWN_PRODUCT.to_string(),
                    value: 0,
                },
            });
            ranks.len() - 1
        });

        ranks[slot].value = ranks[slot].value.saturating_add(metric.measure(order));
    }

    // `sort_by` is stable: equal values keep first-seen order.
    ranks.sort_by(|a, b| b.value.cmp(&a.value));
    ranks.truncate(n);
    ranks
}

/// The `n` products with the least stock, lowest first (stable on ties).
pub fn low_stock_ranking(products: &[Product], n: usize) -> Vec<Product> {
    let mut ranked = products.to_vec();
    ranked.sort_by_key(|p| p.stock);
    ranked.truncate(n);
    ranked
}
