mod availability_service;
mod booking_service;
mod errors;
mod overdue_detection;
mod reservation_lock;

pub use availability_service::{compute_availability, validate_line_items};
pub use booking_service::{
    ServiceDependencies, cancel_booking, confirm_booking, create_booking, get_booking,
    list_bookings, mark_picked_up, mark_returned, record_payment, revise_booking,
};
pub use errors::{AmountError, BookingApplicationError, Result};
pub use overdue_detection::detect_overdue_bookings;
pub use reservation_lock::BookingLocks;
