//! Typed marketplace resources over the authenticated API client
//!
//! Each module is a set of free functions taking `&ApiClient`. Inputs are
//! checked locally before any request is sent; server failures surface as
//! `Error::Client` with the classified `ClientError` inside.

pub mod accommodations;
pub mod auth;
pub mod bookings;
pub mod dates;
pub mod earnings;
pub mod error;
pub mod payload;
pub mod reviews;
pub mod wishlist;

#[cfg(test)]
mod testing;

pub use accommodations::{Accommodation, AccommodationUpdate, NewAccommodation, SearchFilters};
pub use auth::{Registration, Role, UserProfile};
pub use bookings::{Booking, BookingStatus, NewBooking};
pub use dates::DateRange;
pub use earnings::{EarningsSummary, Transaction};
pub use error::{Error, Result};
pub use payload::Id;
pub use reviews::{NewReview, Review};
