//! Booking requests for students and booking management for hosts

use std::fmt;
use std::str::FromStr;

use api_client::{ApiClient, RequestOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::dates::DateRange;
use crate::error::{Error, Result};
use crate::payload::{Id, Payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
    Completed,
    #[serde(other)]
    Unknown,
}

impl BookingStatus {
    /// Whether the guest may still cancel.
    pub fn is_cancellable(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for BookingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "rejected" => Ok(BookingStatus::Rejected),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(Error::InvalidInput(format!("unknown booking status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation_id: Option<Id>,
    pub check_in: String,
    pub check_out: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

/// A booking request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBooking {
    pub accommodation_id: Id,
    #[serde(flatten)]
    pub stay: DateRange,
    pub guests: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn create(client: &ApiClient, booking: &NewBooking) -> Result<Booking> {
    if booking.guests == 0 {
        return Err(Error::InvalidInput("at least one guest is required".into()));
    }
    let created = client
        .post_json::<_, Payload<Booking>>("/bookings", booking)
        .await?
        .into_inner();
    info!(booking_id = %created.id, status = %created.status, "booking requested");
    Ok(created)
}

/// The signed-in guest's bookings.
pub async fn list_mine(client: &ApiClient) -> Result<Vec<Booking>> {
    let bookings = client
        .get_json::<Payload<Vec<Booking>>>("/bookings", RequestOptions::default())
        .await?
        .into_inner();
    Ok(bookings)
}

pub async fn get(client: &ApiClient, id: &Id) -> Result<Booking> {
    let booking = client
        .get_json::<Payload<Booking>>(&format!("/bookings/{id}"), RequestOptions::default())
        .await?
        .into_inner();
    Ok(booking)
}

pub async fn cancel(client: &ApiClient, id: &Id) -> Result<Booking> {
    let booking = client
        .put(&format!("/bookings/{id}/cancel"), None, RequestOptions::default())
        .await?
        .json::<Payload<Booking>>()?
        .into_inner();
    info!(booking_id = %id, "booking cancelled");
    Ok(booking)
}

/// Bookings across all of the signed-in host's listings.
pub async fn list_for_host(client: &ApiClient) -> Result<Vec<Booking>> {
    let bookings = client
        .get_json::<Payload<Vec<Booking>>>("/bookings/host", RequestOptions::default())
        .await?
        .into_inner();
    Ok(bookings)
}

/// Host decision on a booking.
pub async fn update_status(client: &ApiClient, id: &Id, status: BookingStatus) -> Result<Booking> {
    if status == BookingStatus::Unknown {
        return Err(Error::InvalidInput("cannot set an unknown status".into()));
    }
    let booking = client
        .put_json::<_, Payload<Booking>>(&format!("/bookings/{id}/status"), &json!({ "status": status }))
        .await?
        .into_inner();
    info!(booking_id = %id, %status, "booking status updated");
    Ok(booking)
}
