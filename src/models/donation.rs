use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A completed monetary contribution, reconciled against a provider
/// checkout session. `transaction_id` carries a unique index.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Donation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub amount: f64,
    pub email: String,
    pub transaction_id: String,
    pub tracking_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateCheckoutRequest {
    /// Donation amount in major currency units (USD).
    pub amount: f64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ConfirmPaymentRequest {
    pub session_id: String,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct DonationQuery {
    pub limit: Option<i64>,
}
