//! Service wiring: stores, outbound clients and the application services
//! shared by every handler.

use std::sync::Arc;

use stockline_infra::AppConfig;
use stockline_infra::lookup::{CountryLookup, LookupError, RestCountriesLookup};
use stockline_infra::notify::{
    HttpNotificationDispatcher, LoggingDispatcher, LowStockNotifier, NotificationDispatcher,
    NotifyError,
};
use stockline_infra::services::{
    CatalogService, DashboardService, OrderPlacementService, OrderService,
};
use stockline_infra::store::{
    CatalogStore, HttpUserDirectory, InMemoryCatalogStore, InMemoryOrderLedger,
    InMemoryUserDirectory, OrderLedger, StoreError, UserDirectory,
};

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("notification client: {0}")]
    Notify(#[from] NotifyError),
    #[error("country lookup client: {0}")]
    Lookup(#[from] LookupError),
    #[error("user service client: {0}")]
    Users(#[from] StoreError),
    #[error("database: {0}")]
    Database(String),
}

/// The storage and outbound adapters the services run on.
#[derive(Clone)]
pub struct Backends {
    pub catalog: Arc<dyn CatalogStore>,
    pub ledger: Arc<dyn OrderLedger>,
    pub users: Arc<dyn UserDirectory>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub lookup: Arc<dyn CountryLookup>,
}

impl Backends {
    /// Empty in-memory stores with the given outbound adapters.
    pub fn in_memory(
        dispatcher: Arc<dyn NotificationDispatcher>,
        lookup: Arc<dyn CountryLookup>,
    ) -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalogStore::new()),
            ledger: Arc::new(InMemoryOrderLedger::new()),
            users: Arc::new(InMemoryUserDirectory::new()),
            dispatcher,
            lookup,
        }
    }
}

#[derive(Clone)]
pub struct AppServices {
    pub placement: OrderPlacementService,
    pub orders: OrderService,
    pub catalog: CatalogService,
    pub dashboard: DashboardService,
}

impl AppServices {
    pub fn from_backends(backends: Backends, config: &AppConfig) -> Self {
        let notifier = LowStockNotifier::new(backends.dispatcher, config.notify.clone());

        Self {
            placement: OrderPlacementService::new(
                Arc::clone(&backends.catalog),
                Arc::clone(&backends.ledger),
                notifier.clone(),
            ),
            orders: OrderService::new(Arc::clone(&backends.ledger), config.transitions),
            catalog: CatalogService::new(Arc::clone(&backends.catalog), notifier.clone()),
            dashboard: DashboardService::new(
                backends.catalog,
                backends.ledger,
                backends.users,
                backends.lookup,
                notifier,
                config.dashboard_low_stock_alerts,
            ),
        }
    }
}

/// Build every service from configuration.
///
/// Stores are in-memory unless the `postgres` feature is enabled and
/// `DATABASE_URL` is set. `USERS_URL` takes precedence over the database
/// for the user directory.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, WiringError> {
    let dispatcher: Arc<dyn NotificationDispatcher> = match &config.notify.endpoint {
        Some(endpoint) => Arc::new(HttpNotificationDispatcher::new(
            endpoint.clone(),
            &config.notify,
            config.http_timeout,
        )?),
        None => Arc::new(LoggingDispatcher),
    };
    let lookup: Arc<dyn CountryLookup> = Arc::new(RestCountriesLookup::new(
        config.country_lookup_url.clone(),
        config.http_timeout,
    )?);

    let mut backends = match &config.database_url {
        Some(url) => connect_backends(url, dispatcher, lookup).await?,
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory stores");
            Backends::in_memory(dispatcher, lookup)
        }
    };

    match &config.users_url {
        Some(url) => {
            backends.users = Arc::new(HttpUserDirectory::new(url.clone(), config.http_timeout)?);
            tracing::info!(url = %url, "reading users from the user service");
        }
        None if config.database_url.is_none() => {
            tracing::warn!("USERS_URL not set; the dashboard will report no users");
        }
        None => {}
    }

    Ok(AppServices::from_backends(backends, config))
}

#[cfg(feature = "postgres")]
async fn connect_backends(
    url: &str,
    dispatcher: Arc<dyn NotificationDispatcher>,
    lookup: Arc<dyn CountryLookup>,
) -> Result<Backends, WiringError> {
    use stockline_infra::store::postgres::{
        PostgresCatalogStore, PostgresOrderLedger, PostgresUserDirectory, ensure_schema,
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .map_err(|e| WiringError::Database(e.to_string()))?;
    ensure_schema(&pool)
        .await
        .map_err(|e| WiringError::Database(e.to_string()))?;
    tracing::info!("connected to postgres");

    Ok(Backends {
        catalog: Arc::new(PostgresCatalogStore::new(pool.clone())),
        ledger: Arc::new(PostgresOrderLedger::new(pool.clone())),
        users: Arc::new(PostgresUserDirectory::new(pool)),
        dispatcher,
        lookup,
    })
}

#[cfg(not(feature = "postgres"))]
async fn connect_backends(
    _url: &str,
    dispatcher: Arc<dyn NotificationDispatcher>,
    lookup: Arc<dyn CountryLookup>,
) -> Result<Backends, WiringError> {
    tracing::warn!("DATABASE_URL set but built without the postgres feature; using in-memory stores");
    Ok(Backends::in_memory(dispatcher, lookup))
}
