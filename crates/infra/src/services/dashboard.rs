//! Dashboard view: one snapshot, pure aggregation, then the side effects a
//! view triggers (country enrichment and low-stock alerts).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::instrument;

use stockline_analytics::{AnalyticsReport, CountryCount, DashboardSnapshot};

use crate::error::ServiceError;
use crate::lookup::{CountryLookup, CountryMetadata};
use crate::notify::LowStockNotifier;
use crate::store::{CatalogStore, OrderLedger, UserDirectory};

/// A country row with its flag, for countries whose lookup succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryFlag {
    pub country: String,
    pub users: u64,
    pub flag_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(flatten)]
    pub report: AnalyticsReport,
    /// Enriched view of `report.countries`; countries whose lookup failed
    /// are missing here only.
    pub country_flags: Vec<CountryFlag>,
}

#[derive(Clone)]
pub struct DashboardService {
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn OrderLedger>,
    users: Arc<dyn UserDirectory>,
    lookup: Arc<dyn CountryLookup>,
    notifier: LowStockNotifier,
    low_stock_alerts: bool,
}

impl DashboardService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        ledger: Arc<dyn OrderLedger>,
        users: Arc<dyn UserDirectory>,
        lookup: Arc<dyn CountryLookup>,
        notifier: LowStockNotifier,
        low_stock_alerts: bool,
    ) -> Self {
        Self {
            catalog,
            ledger,
            users,
            lookup,
            notifier,
            low_stock_alerts,
        }
    }

    /// Fetch the full history once and aggregate it. Pagination never
    /// applies here.
    #[instrument(skip(self), err)]
    pub async fn build(&self) -> Result<Dashboard, ServiceError> {
        let (orders, products, users) = tokio::try_join!(
            self.ledger.list_orders_full(),
            self.catalog.list_all_products(),
            self.users.list_users(),
        )?;
        let snapshot = DashboardSnapshot::new(orders, products, users);
        let report = AnalyticsReport::compute(&snapshot);

        if self.low_stock_alerts {
            for product in &report.low_stock {
                self.notifier.notify_if_low(product);
            }
        }

        let country_flags = self.enrich(&report.countries).await;
        tracing::debug!(
            orders = report.summary.total_orders,
            countries = report.countries.len(),
            flags = country_flags.len(),
            "dashboard built"
        );
        Ok(Dashboard {
            report,
            country_flags,
        })
    }

    /// Look every country up concurrently. A failed lookup drops that
    /// country from the result and is logged.
    async fn enrich(&self, countries: &[CountryCount]) -> Vec<CountryFlag> {
        let mut lookups = JoinSet::new();
        for row in countries {
            let lookup = Arc::clone(&self.lookup);
            let country = row.country.clone();
            lookups.spawn(async move {
                let result = lookup.lookup(&country).await;
                (country, result)
            });
        }

        let mut found: HashMap<String, CountryMetadata> = HashMap::new();
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((country, Ok(meta))) => {
                    found.insert(country, meta);
                }
                Ok((country, Err(err))) => {
                    tracing::warn!(country = %country, error = %err, "country lookup failed");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "country lookup task failed");
                }
            }
        }

        countries
            .iter()
            .filter_map(|row| {
                found.remove(&row.country).map(|meta| CountryFlag {
                    country: row.country.clone(),
                    users: row.users,
                    flag_url: meta.flag_url,
                })
            })
            .collect()
    }
}

impl core::fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DashboardService")
            .field("low_stock_alerts", &self.low_stock_alerts)
            .finish_non_exhaustive()
    }
}
