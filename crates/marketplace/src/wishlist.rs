//! Saved listings

use api_client::{ApiClient, RequestOptions};
use serde_json::json;
use tracing::debug;

use crate::accommodations::Accommodation;
use crate::error::Result;
use crate::payload::{Id, Payload};

pub async fn list(client: &ApiClient) -> Result<Vec<Accommodation>> {
    let saved = client
        .get_json::<Payload<Vec<Accommodation>>>("/wishlist", RequestOptions::default())
        .await?
        .into_inner();
    Ok(saved)
}

pub async fn add(client: &ApiClient, accommodation_id: &Id) -> Result<()> {
    client
        .post(
            "/wishlist",
            Some(json!({ "accommodation_id": accommodation_id })),
            RequestOptions::default(),
        )
        .await?;
    debug!(%accommodation_id, "saved to wishlist");
    Ok(())
}

pub async fn remove(client: &ApiClient, accommodation_id: &Id) -> Result<()> {
    client
        .delete(&format!("/wishlist/{accommodation_id}"), RequestOptions::default())
        .await?;
    debug!(%accommodation_id, "removed from wishlist");
    Ok(())
}
