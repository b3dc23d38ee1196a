use rental_booking_ddd::{
    adapters::mock::{
        CustomerDirectory as InMemoryCustomerDirectory, InMemoryBookingReadModel,
        InMemoryEventStore, InvoiceRegistry as InMemoryInvoiceRegistry,
        ProductCatalog as InMemoryProductCatalog,
    },
    adapters::postgres::{
        PostgresBookingReadModel, PostgresCustomerDirectory, PostgresEventStore,
        PostgresInvoiceRegistry, PostgresProductCatalog, rebuild_read_model,
    },
    api::{AppState, create_router},
    application::booking::{BookingLocks, ServiceDependencies},
    config::{AppConfig, SeedData, StorageBackend},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PostgreSQLのアダプターで依存関係を組み立てる
async fn postgres_dependencies(config: &AppConfig) -> ServiceDependencies {
    let database_url = config.database_url.as_deref().unwrap_or_default();

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    ServiceDependencies {
        event_store: Arc::new(PostgresEventStore::new(pool.clone())),
        booking_read_model: Arc::new(PostgresBookingReadModel::new(pool.clone())),
        product_catalog: Arc::new(PostgresProductCatalog::new(pool.clone())),
        customer_directory: Arc::new(PostgresCustomerDirectory::new(pool.clone())),
        invoice_registry: Arc::new(PostgresInvoiceRegistry::new(pool)),
        locks: Arc::new(BookingLocks::new()),
    }
}

/// インメモリのアダプターで依存関係を組み立てる
///
/// 商品と顧客はSEED_DATA_PATHのJSONから登録する。
fn memory_dependencies(config: &AppConfig) -> ServiceDependencies {
    let seed = match &config.seed_data_path {
        Some(path) => SeedData::load(path).expect("Failed to load seed data"),
        None => SeedData::default(),
    };

    let product_catalog = Arc::new(InMemoryProductCatalog::new());
    let customer_directory = Arc::new(InMemoryCustomerDirectory::new());
    tracing::info!(
        products = seed.products.len(),
        customers = seed.customers.len(),
        "Seeding in-memory catalog"
    );
    for product in seed.products {
        product_catalog.add_product(product);
    }
    for customer_id in seed.customers {
        customer_directory.add_customer(customer_id);
    }

    ServiceDependencies {
        event_store: Arc::new(InMemoryEventStore::new()),
        booking_read_model: Arc::new(InMemoryBookingReadModel::new()),
        product_catalog,
        customer_directory,
        invoice_registry: Arc::new(InMemoryInvoiceRegistry::new()),
        locks: Arc::new(BookingLocks::new()),
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rental_booking_ddd=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");
    tracing::info!(backend = ?config.storage_backend, "Starting rental booking service");

    // Create service dependencies
    let service_deps = match config.storage_backend {
        StorageBackend::Postgres => postgres_dependencies(&config).await,
        StorageBackend::Memory => memory_dependencies(&config),
    };

    if config.rebuild_read_model {
        rebuild_read_model(
            service_deps.event_store.as_ref(),
            service_deps.booking_read_model.as_ref(),
        )
        .await
        .expect("Failed to rebuild read model");
    }

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
