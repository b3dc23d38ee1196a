pub mod booking_read_model;
pub mod customer_directory;
pub mod event_store;
pub mod invoice_registry;
pub mod product_catalog;

pub use booking_read_model::BookingReadModel as InMemoryBookingReadModel;
pub use customer_directory::CustomerDirectory;
pub use event_store::EventStore as InMemoryEventStore;
pub use invoice_registry::InvoiceRegistry;
pub use product_catalog::ProductCatalog;
