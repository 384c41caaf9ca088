use crate::database::{MongoDB, DONOR_REQUESTS};
use crate::models::{
    is_valid_request_status, CreateDonorRequestBody, DonorRequest, DonorRequestQuery,
};
use crate::services::donor_service::{effective_limit, normalize_email, parse_object_id};
use crate::utils::error::AppError;
use futures::stream::StreamExt;
use mongodb::bson::{doc, Document};

pub async fn create_request(
    db: &MongoDB,
    requester_email: &str,
    requester_name: &str,
    body: &CreateDonorRequestBody,
) -> Result<String, AppError> {
    if body.recipient_name.trim().is_empty() {
        return Err(AppError::InvalidRequest("Recipient name is required".into()));
    }
    if !crate::models::is_valid_blood_group(&body.blood_group) {
        return Err(AppError::InvalidRequest(format!(
            "Invalid blood group: {}",
            body.blood_group
        )));
    }

    let request = DonorRequest {
        id: None,
        requester_email: normalize_email(requester_email),
        requester_name: requester_name.to_string(),
        recipient_name: body.recipient_name.trim().to_string(),
        blood_group: body.blood_group.clone(),
        district: body.district.clone(),
        upazila: body.upazila.clone(),
        hospital: body.hospital.clone(),
        address: body.address.clone(),
        donation_date: body.donation_date.clone(),
        donation_time: body.donation_time.clone(),
        message: body.message.clone(),
        status: "pending".to_string(),
        created_at: chrono::Utc::now(),
    };

    let result = db
        .collection::<DonorRequest>(DONOR_REQUESTS)
        .insert_one(&request)
        .await?;

    Ok(result
        .inserted_id
        .as_object_id()
        .map(|id| id.to_hex())
        .unwrap_or_default())
}

pub fn build_request_filter(query: &DonorRequestQuery) -> Document {
    let mut filter = Document::new();

    if let Some(email) = &query.email {
        filter.insert("requester_email", email);
    }
    if let Some(status) = &query.status {
        filter.insert("status", status);
    }
    if let Some(blood_group) = &query.blood_group {
        filter.insert("blood_group", blood_group);
    }
    if let Some(district) = &query.district {
        filter.insert("district", district);
    }

    filter
}

pub async fn list_requests(
    db: &MongoDB,
    query: &DonorRequestQuery,
) -> Result<Vec<DonorRequest>, AppError> {
    let collection = db.collection::<DonorRequest>(DONOR_REQUESTS);

    let mut cursor = collection
        .find(build_request_filter(query))
        .sort(doc! { "created_at": -1 })
        .limit(effective_limit(query.limit))
        .await?;

    let mut requests = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(request) => requests.push(request),
            Err(e) => log::warn!("⚠️  Skipping unreadable donor request: {}", e),
        }
    }

    Ok(requests)
}

pub async fn get_request(db: &MongoDB, id: &str) -> Result<DonorRequest, AppError> {
    let object_id = parse_object_id(id)?;
    db.collection::<DonorRequest>(DONOR_REQUESTS)
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Donor request not found".into()))
}

/// Strips the keys a partial update must never touch.
pub fn build_update_doc(fields: &serde_json::Map<String, serde_json::Value>) -> Document {
    let mut update = Document::new();

    for (key, value) in fields {
        if key == "_id" {
            continue;
        }
        match mongodb::bson::to_bson(value) {
            Ok(bson) => {
                update.insert(key, bson);
            }
            Err(e) => log::warn!("⚠️  Dropping unconvertible update field {}: {}", key, e),
        }
    }

    update
}

/// Unrestricted partial update: `$set` of whatever fields the caller sent.
pub async fn update_request(
    db: &MongoDB,
    id: &str,
    fields: &serde_json::Map<String, serde_json::Value>,
) -> Result<(), AppError> {
    let object_id = parse_object_id(id)?;
    let update = build_update_doc(fields);

    if update.is_empty() {
        return Err(AppError::InvalidRequest("No updatable fields supplied".into()));
    }

    let result = db
        .collection::<DonorRequest>(DONOR_REQUESTS)
        .update_one(doc! { "_id": object_id }, doc! { "$set": update })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Donor request not found".into()));
    }
    Ok(())
}

/// Volunteers and admins may set any status; the requester may only cancel
/// their own request.
pub async fn update_request_status(
    db: &MongoDB,
    id: &str,
    status: &str,
    caller_email: &str,
    caller_is_moderator: bool,
) -> Result<(), AppError> {
    if !is_valid_request_status(status) {
        return Err(AppError::InvalidRequest(format!("Invalid status: {}", status)));
    }

    let request = get_request(db, id).await?;

    if !caller_is_moderator {
        if request.requester_email != normalize_email(caller_email) {
            return Err(AppError::Forbidden("Not your request".into()));
        }
        if status != "canceled" {
            return Err(AppError::Forbidden("Requesters may only cancel their own request".into()));
        }
    }

    let object_id = parse_object_id(id)?;
    db.collection::<DonorRequest>(DONOR_REQUESTS)
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "status": status } },
        )
        .await?;

    Ok(())
}

pub async fn delete_request(
    db: &MongoDB,
    id: &str,
    caller_email: &str,
    caller_is_admin: bool,
) -> Result<(), AppError> {
    let request = get_request(db, id).await?;

    if !caller_is_admin && request.requester_email != normalize_email(caller_email) {
        return Err(AppError::Forbidden("Not your request".into()));
    }

    let object_id = parse_object_id(id)?;
    db.collection::<DonorRequest>(DONOR_REQUESTS)
        .delete_one(doc! { "_id": object_id })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_filter_keys() {
        let query = DonorRequestQuery {
            email: Some("someone@example.com".into()),
            status: Some("pending".into()),
            blood_group: None,
            district: None,
            limit: None,
        };

        let filter = build_request_filter(&query);
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get_str("requester_email").unwrap(), "someone@example.com");
        assert_eq!(filter.get_str("status").unwrap(), "pending");
    }

    #[test]
    fn test_update_doc_skips_id() {
        let body = json!({
            "_id": "65f1b2c3d4e5f6a7b8c9d0e1",
            "hospital": "Dhaka Medical College",
            "message": "urgent"
        });

        let update = build_update_doc(body.as_object().unwrap());
        assert!(update.get("_id").is_none());
        assert_eq!(update.get_str("hospital").unwrap(), "Dhaka Medical College");
        assert_eq!(update.get_str("message").unwrap(), "urgent");
    }

    #[test]
    fn test_update_doc_empty_body() {
        let body = json!({ "_id": "abc" });
        let update = build_update_doc(body.as_object().unwrap());
        assert!(update.is_empty());
    }

    #[test]
    fn test_status_validation() {
        assert!(is_valid_request_status("inprogress"));
        assert!(!is_valid_request_status("in_progress"));
        assert!(!is_valid_request_status(""));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_update_missing_request_not_found() {
        use crate::database::MongoDB;
        use crate::utils::error::AppError;

        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/bloodheros_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        // Valid ObjectId, but no document behind it.
        let missing_id = mongodb::bson::oid::ObjectId::new().to_hex();

        let body = json!({ "hospital": "Dhaka Medical College" });
        let result = update_request(&db, &missing_id, body.as_object().unwrap()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = get_request(&db, &missing_id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
