//! Bookings module - the booking request state machine and its payment schedule.

mod booking_status;
mod bookings_model;
mod bookings_traits;


pub use booking_status::BookingStatus;
pub use bookings_model::{
    BookingRequest, MilestoneStatus, NewBookingRequest, NewMilestone, PaymentMilestone,
};
pub use bookings_traits::BookingRepositoryTrait;
