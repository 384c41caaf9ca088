use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const REQUEST_STATUSES: [&str; 4] = ["pending", "inprogress", "done", "canceled"];

pub fn is_valid_request_status(value: &str) -> bool {
    REQUEST_STATUSES.contains(&value)
}

/// A request for blood, created by a donor and moderated by volunteers/admins.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DonorRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub requester_email: String,
    pub requester_name: String,
    pub recipient_name: String,
    pub blood_group: String,
    pub district: String,
    pub upazila: String,
    pub hospital: String,
    pub address: String,
    pub donation_date: String,
    pub donation_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "default_request_status")]
    pub status: String, // pending, inprogress, done, canceled
    pub created_at: DateTime<Utc>,
}

fn default_request_status() -> String {
    "pending".to_string()
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateDonorRequestBody {
    pub recipient_name: String,
    pub blood_group: String,
    pub district: String,
    pub upazila: String,
    pub hospital: String,
    pub address: String,
    pub donation_date: String,
    pub donation_time: String,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct DonorRequestQuery {
    pub email: Option<String>,
    pub status: Option<String>,
    pub blood_group: Option<String>,
    pub district: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRequestStatusBody {
    pub status: String,
}
