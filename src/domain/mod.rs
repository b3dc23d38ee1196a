pub mod availability;
pub mod booking;
pub mod commands;
pub mod errors;
pub mod events;
pub mod pricing;
pub mod product;
pub mod rental_period;
pub mod status;
pub mod value_objects;

pub use availability::*;
pub use booking::{Booking, BookingDraft, DepositRefund, PaymentEntry};
pub use commands::*;
pub use errors::*;
pub use events::*;
pub use pricing::*;
pub use product::*;
pub use rental_period::*;
pub use status::*;
pub use value_objects::*;
