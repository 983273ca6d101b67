//! Listing reviews

use api_client::{ApiClient, RequestOptions};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::payload::{Id, Payload};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation_id: Option<Id>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default, alias = "user_name", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReview {
    pub accommodation_id: Id,
    pub rating: u8,
    pub comment: String,
}

pub async fn list_for(client: &ApiClient, accommodation_id: &Id) -> Result<Vec<Review>> {
    let reviews = client
        .get_json::<Payload<Vec<Review>>>(
            &format!("/accommodations/{accommodation_id}/reviews"),
            RequestOptions::default(),
        )
        .await?
        .into_inner();
    Ok(reviews)
}

pub async fn create(client: &ApiClient, review: &NewReview) -> Result<Review> {
    if !(1..=5).contains(&review.rating) {
        return Err(Error::InvalidInput(format!(
            "rating {} must be between 1 and 5",
            review.rating
        )));
    }
    if review.comment.trim().is_empty() {
        return Err(Error::InvalidInput("comment is required".into()));
    }
    let created = client
        .post_json::<_, Payload<Review>>("/reviews", review)
        .await?
        .into_inner();
    Ok(created)
}

pub async fn delete(client: &ApiClient, id: &Id) -> Result<()> {
    client
        .delete(&format!("/reviews/{id}"), RequestOptions::default())
        .await?;
    Ok(())
}

/// Mean rating, or `None` when there are no reviews.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Some(f64::from(total) / reviews.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Backend, route, signed_in};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn lists_reviews_for_a_listing() {
        let backend = Backend::start(vec![route(
            Method::GET,
            "/accommodations/5/reviews",
            200,
            json!({"data": [
                {"id": 1, "rating": 5, "comment": "Great host", "user_name": "Ada"},
                {"id": 2, "rating": 4, "comment": "Quiet"}
            ]}),
        )])
        .await;
        let client = backend.client(signed_in());

        let reviews = list_for(&client, &Id::Num(5)).await.unwrap();
        assert_eq!(reviews[0].author.as_deref(), Some("Ada"));
        assert_eq!(average_rating(&reviews), Some(4.5));
    }

    #[tokio::test]
    async fn create_validates_then_posts() {
        let backend = Backend::start(vec![route(
            Method::POST,
            "/reviews",
            201,
            json!({"id": 9, "accommodation_id": 5, "rating": 3, "comment": "Fine"}),
        )])
        .await;
        let client = backend.client(signed_in());

        let mut review = NewReview {
            accommodation_id: Id::Num(5),
            rating: 6,
            comment: "Fine".into(),
        };
        assert!(matches!(create(&client, &review).await, Err(Error::InvalidInput(_))));
        assert!(backend.seen().is_empty());

        review.rating = 3;
        let created = create(&client, &review).await.unwrap();
        assert_eq!(created.id, Id::Num(9));
        assert_eq!(
            backend.seen()[0].body,
            json!({"accommodation_id": 5, "rating": 3, "comment": "Fine"})
        );
    }

    #[tokio::test]
    async fn delete_hits_review_path() {
        let backend =
            Backend::start(vec![route(Method::DELETE, "/reviews/9", 200, json!({"message": "deleted"}))]).await;
        let client = backend.client(signed_in());

        delete(&client, &Id::Num(9)).await.unwrap();
        assert_eq!(backend.seen()[0].path, "/reviews/9");
    }

    #[test]
    fn average_of_nothing_is_none() {
        assert_eq!(average_rating(&[]), None);
    }
}
