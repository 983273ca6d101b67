//! Listing search, details, host management and availability

use api_client::{ApiClient, RequestOptions};
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::error::{Error, Result};
use crate::payload::{Id, Payload};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub id: Id,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, alias = "price", skip_serializing_if = "Option::is_none")]
    pub price_per_month: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

/// Search filters. Unset filters are left off the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub room_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchFilters {
    fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(Error::InvalidInput(format!(
                    "min_price {min} is above max_price {max}"
                )));
            }
        }
        if self.limit == Some(0) {
            return Err(Error::InvalidInput("limit must be positive".into()));
        }
        Ok(())
    }

    fn to_options(&self) -> RequestOptions {
        RequestOptions::new()
            .query_opt("city", self.city.as_deref().filter(|c| !c.trim().is_empty()))
            .query_opt("min_price", self.min_price)
            .query_opt("max_price", self.max_price)
            .query_opt("room_type", self.room_type.as_deref())
            .query_opt("page", self.page)
            .query_opt("limit", self.limit)
    }
}

/// A listing as submitted by a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewAccommodation {
    pub title: String,
    pub description: String,
    pub city: String,
    pub address: String,
    pub price_per_month: f64,
    pub room_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Partial update; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccommodationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_month: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

pub async fn search(client: &ApiClient, filters: &SearchFilters) -> Result<Vec<Accommodation>> {
    filters.validate()?;
    let listings = client
        .get_json::<Payload<Vec<Accommodation>>>("/accommodations", filters.to_options())
        .await?
        .into_inner();
    Ok(listings)
}

pub async fn get(client: &ApiClient, id: &Id) -> Result<Accommodation> {
    let listing = client
        .get_json::<Payload<Accommodation>>(&format!("/accommodations/{id}"), RequestOptions::default())
        .await?
        .into_inner();
    Ok(listing)
}

pub async fn create(client: &ApiClient, listing: &NewAccommodation) -> Result<Accommodation> {
    if listing.title.trim().is_empty() {
        return Err(Error::InvalidInput("title is required".into()));
    }
    check_price(listing.price_per_month)?;
    let created = client
        .post_json::<_, Payload<Accommodation>>("/accommodations", listing)
        .await?
        .into_inner();
    Ok(created)
}

pub async fn update(client: &ApiClient, id: &Id, changes: &AccommodationUpdate) -> Result<Accommodation> {
    if let Some(price) = changes.price_per_month {
        check_price(price)?;
    }
    let updated = client
        .put_json::<_, Payload<Accommodation>>(&format!("/accommodations/{id}"), changes)
        .await?
        .into_inner();
    Ok(updated)
}

pub async fn delete(client: &ApiClient, id: &Id) -> Result<()> {
    client
        .delete(&format!("/accommodations/{id}"), RequestOptions::default())
        .await?;
    Ok(())
}

/// Date ranges already booked for a listing.
pub async fn availability(client: &ApiClient, id: &Id) -> Result<Vec<DateRange>> {
    let booked = client
        .get_json::<Payload<Vec<DateRange>>>(
            &format!("/accommodations/{id}/availability"),
            RequestOptions::default(),
        )
        .await?
        .into_inner();
    Ok(booked)
}

/// Whether a stay fits around the booked ranges.
pub fn is_free(booked: &[DateRange], stay: &DateRange) -> bool {
    booked.iter().all(|range| !range.overlaps(stay))
}

fn check_price(price: f64) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::InvalidInput(format!("price {price} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Backend, route, signed_in};
    use axum::http::Method;
    use serde_json::json;

    fn listing(id: u64) -> serde_json::Value {
        json!({
            "id": id,
            "title": "Ensuite near campus",
            "city": "Leeds",
            "price": 650.0,
            "room_type": "ensuite",
            "amenities": ["wifi", "bills included"]
        })
    }

    #[tokio::test]
    async fn search_sends_only_set_filters() {
        let backend = Backend::start(vec![route(
            Method::GET,
            "/accommodations",
            200,
            json!({"data": [listing(1), listing(2)], "total": 2}),
        )])
        .await;
        let client = backend.client(signed_in());

        let filters = SearchFilters {
            city: Some("Leeds".into()),
            max_price: Some(700.0),
            page: Some(1),
            ..Default::default()
        };
        let results = search(&client, &filters).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].price_per_month, Some(650.0));
        assert_eq!(results[1].amenities, vec!["wifi", "bills included"]);
        assert_eq!(backend.seen()[0].query, "city=Leeds&max_price=700&page=1");
    }

    #[tokio::test]
    async fn search_accepts_bare_arrays() {
        let backend = Backend::start(vec![route(
            Method::GET,
            "/accommodations",
            200,
            json!([listing(3)]),
        )])
        .await;
        let client = backend.client(signed_in());

        let results = search(&client, &SearchFilters::default()).await.unwrap();
        assert_eq!(results[0].id, Id::Num(3));
        assert_eq!(backend.seen()[0].query, "");
    }

    #[tokio::test]
    async fn inverted_price_range_is_rejected() {
        let backend = Backend::start(vec![]).await;
        let client = backend.client(signed_in());
        let filters = SearchFilters {
            min_price: Some(900.0),
            max_price: Some(400.0),
            ..Default::default()
        };
        assert!(matches!(
            search(&client, &filters).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(backend.seen().is_empty());
    }

    #[tokio::test]
    async fn get_missing_listing_is_http_404() {
        let backend = Backend::start(vec![]).await;
        let client = backend.client(signed_in());

        let err = get(&client, &Id::Num(99)).await.unwrap_err();
        match err {
            Error::Client(e) => assert_eq!(e.status(), 404),
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn host_can_create_update_and_delete() {
        let backend = Backend::start(vec![
            route(Method::POST, "/accommodations", 201, json!({"data": listing(5)})),
            route(Method::PUT, "/accommodations/5", 200, listing(5)),
            route(Method::DELETE, "/accommodations/5", 200, json!({"message": "deleted"})),
        ])
        .await;
        let client = backend.client(signed_in());

        let created = create(
            &client,
            &NewAccommodation {
                title: "Ensuite near campus".into(),
                city: "Leeds".into(),
                price_per_month: 650.0,
                room_type: "ensuite".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(created.id, Id::Num(5));

        let changes = AccommodationUpdate {
            available: Some(false),
            ..Default::default()
        };
        update(&client, &created.id, &changes).await.unwrap();
        delete(&client, &created.id).await.unwrap();

        let seen = backend.seen();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].body["price_per_month"], 650.0);
        assert!(seen[0].body.get("amenities").is_none());
        assert_eq!(seen[1].body, json!({"available": false}));
        assert_eq!(seen[2].method, Method::DELETE);
        assert!(seen.iter().all(|s| s.bearer.as_deref() == Some("A1")));
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let backend = Backend::start(vec![]).await;
        let client = backend.client(signed_in());
        let changes = AccommodationUpdate {
            price_per_month: Some(0.0),
            ..Default::default()
        };
        assert!(update(&client, &Id::Num(1), &changes).await.is_err());
        assert!(backend.seen().is_empty());
    }

    #[tokio::test]
    async fn availability_lists_booked_ranges() {
        let backend = Backend::start(vec![route(
            Method::GET,
            "/accommodations/5/availability",
            200,
            json!([{"check_in": "2026-09-01", "check_out": "2026-12-15"}]),
        )])
        .await;
        let client = backend.client(signed_in());

        let booked = availability(&client, &Id::Num(5)).await.unwrap();
        let autumn = DateRange::parse("2026-10-01", "2026-11-01").unwrap();
        let spring = DateRange::parse("2027-01-10", "2027-06-30").unwrap();
        assert!(!is_free(&booked, &autumn));
        assert!(is_free(&booked, &spring));
    }
}
