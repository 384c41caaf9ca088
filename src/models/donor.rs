use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
pub const ROLES: [&str; 3] = ["donor", "volunteer", "admin"];
pub const STATUSES: [&str; 2] = ["active", "blocked"];

pub fn is_valid_blood_group(value: &str) -> bool {
    BLOOD_GROUPS.contains(&value)
}

pub fn is_valid_role(value: &str) -> bool {
    ROLES.contains(&value)
}

pub fn is_valid_status(value: &str) -> bool {
    STATUSES.contains(&value)
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Donor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub blood_group: String,
    pub district: String,
    pub upazila: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default = "default_role")]
    pub role: String, // donor, volunteer, admin
    #[serde(default = "default_status")]
    pub status: String, // active, blocked
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_role() -> String {
    "donor".to_string()
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterDonorRequest {
    pub name: String,
    pub email: String,
    pub blood_group: String,
    pub district: String,
    pub upazila: String,
    pub avatar: Option<String>,
}

/// Query-string filters for donor listing and search.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct DonorQuery {
    pub blood_group: Option<String>,
    pub district: Option<String>,
    pub upazila: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}
