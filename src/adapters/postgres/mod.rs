pub mod booking_read_model;
pub mod customer_directory;
pub mod event_store;
pub mod invoice_registry;
pub mod product_catalog;
pub mod projector;

// パブリックに型を再エクスポート
pub use booking_read_model::BookingReadModel as PostgresBookingReadModel;
pub use customer_directory::CustomerDirectory as PostgresCustomerDirectory;
pub use event_store::EventStore as PostgresEventStore;
pub use invoice_registry::InvoiceRegistry as PostgresInvoiceRegistry;
pub use product_catalog::ProductCatalog as PostgresProductCatalog;
pub use projector::{project_booking_events, rebuild_read_model};
