//! Host earnings

use api_client::{ApiClient, RequestOptions};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::payload::{Id, Payload};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEarning {
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsSummary {
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub pending_payouts: f64,
    #[serde(default)]
    pub completed_bookings: u32,
    #[serde(default)]
    pub monthly: Vec<MonthlyEarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<Id>,
    pub amount: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

pub async fn summary(client: &ApiClient) -> Result<EarningsSummary> {
    let summary = client
        .get_json::<Payload<EarningsSummary>>("/earnings", RequestOptions::default())
        .await?
        .into_inner();
    Ok(summary)
}

pub async fn transactions(client: &ApiClient) -> Result<Vec<Transaction>> {
    let transactions = client
        .get_json::<Payload<Vec<Transaction>>>("/earnings/transactions", RequestOptions::default())
        .await?
        .into_inner();
    Ok(transactions)
}
