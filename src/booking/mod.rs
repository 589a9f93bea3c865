//! Booking service model and typed API

mod api;
mod types;

pub use api::BookerApi;
pub use types::{
    AuthToken, BookingDates, BookingId, BookingPatch, BookingRecord, BookingRef, CreatedBooking,
};
