use crate::database::{MongoDB, DONORS};
use crate::models::{
    is_valid_blood_group, is_valid_role, is_valid_status, Donor, DonorQuery, RegisterDonorRequest,
};
use crate::utils::error::{is_duplicate_key, AppError};
use futures::stream::StreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

/// Emails compare byte-wise in BSON filters, so every path that stores or
/// looks up a donor email goes through the same normalization. Identity
/// providers are free to report `User@Example.com` for an account that
/// registered as `user@example.com`.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registers a new donor. Existence is checked first so the common case
/// returns a clean 409; the unique index on email settles the race when two
/// registrations slip past the check at once.
pub async fn register_donor(db: &MongoDB, req: &RegisterDonorRequest) -> Result<String, AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() {
        return Err(AppError::InvalidRequest("Email is required".into()));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("Name is required".into()));
    }
    if !is_valid_blood_group(&req.blood_group) {
        return Err(AppError::InvalidRequest(format!(
            "Invalid blood group: {}",
            req.blood_group
        )));
    }

    let collection = db.collection::<Donor>(DONORS);

    let existing = collection.find_one(doc! { "email": &email }).await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Donor already registered with this email".into()));
    }

    let donor = Donor {
        id: None,
        name: req.name.trim().to_string(),
        email,
        blood_group: req.blood_group.clone(),
        district: req.district.clone(),
        upazila: req.upazila.clone(),
        avatar: req.avatar.clone(),
        role: "donor".to_string(),
        status: "active".to_string(),
        created_at: chrono::Utc::now(),
        updated_at: None,
    };

    match collection.insert_one(&donor).await {
        Ok(result) => Ok(result
            .inserted_id
            .as_object_id()
            .map(|id| id.to_hex())
            .unwrap_or_default()),
        Err(e) if is_duplicate_key(&e) => {
            Err(AppError::Conflict("Donor already registered with this email".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Builds the find filter from the optional query-string parameters.
/// Only the supplied keys appear in the document.
pub fn build_donor_filter(query: &DonorQuery) -> Document {
    let mut filter = Document::new();

    if let Some(blood_group) = &query.blood_group {
        filter.insert("blood_group", blood_group);
    }
    if let Some(district) = &query.district {
        filter.insert("district", district);
    }
    if let Some(upazila) = &query.upazila {
        filter.insert("upazila", upazila);
    }
    if let Some(status) = &query.status {
        filter.insert("status", status);
    }

    filter
}

pub fn effective_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(n) if n > 0 => n.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

pub async fn list_donors(db: &MongoDB, query: &DonorQuery) -> Result<Vec<Donor>, AppError> {
    find_donors(db, build_donor_filter(query), query.limit).await
}

/// Search only surfaces donors who can actually be contacted.
pub async fn search_donors(db: &MongoDB, query: &DonorQuery) -> Result<Vec<Donor>, AppError> {
    let mut filter = build_donor_filter(query);
    filter.insert("status", "active");
    find_donors(db, filter, query.limit).await
}

async fn find_donors(db: &MongoDB, filter: Document, limit: Option<i64>) -> Result<Vec<Donor>, AppError> {
    let collection = db.collection::<Donor>(DONORS);

    let mut cursor = collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .limit(effective_limit(limit))
        .await?;

    let mut donors = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(donor) => donors.push(donor),
            Err(e) => log::warn!("⚠️  Skipping unreadable donor document: {}", e),
        }
    }

    Ok(donors)
}

pub fn parse_object_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::InvalidRequest(format!("Invalid id: {}", id)))
}

pub async fn get_donor(db: &MongoDB, id: &str) -> Result<Donor, AppError> {
    let object_id = parse_object_id(id)?;
    db.collection::<Donor>(DONORS)
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Donor not found".into()))
}

pub async fn get_donor_by_email(db: &MongoDB, email: &str) -> Result<Donor, AppError> {
    db.collection::<Donor>(DONORS)
        .find_one(doc! { "email": normalize_email(email) })
        .await?
        .ok_or_else(|| AppError::NotFound("Donor not found".into()))
}

pub async fn update_role(db: &MongoDB, id: &str, role: &str) -> Result<(), AppError> {
    if !is_valid_role(role) {
        return Err(AppError::InvalidRequest(format!("Invalid role: {}", role)));
    }

    let object_id = parse_object_id(id)?;
    let result = db
        .collection::<Donor>(DONORS)
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": {
                "role": role,
                "updated_at": chrono::Utc::now().to_rfc3339(),
            }},
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Donor not found".into()));
    }
    Ok(())
}

pub async fn update_status(db: &MongoDB, id: &str, status: &str) -> Result<(), AppError> {
    if !is_valid_status(status) {
        return Err(AppError::InvalidRequest(format!("Invalid status: {}", status)));
    }

    let object_id = parse_object_id(id)?;
    let result = db
        .collection::<Donor>(DONORS)
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": {
                "status": status,
                "updated_at": chrono::Utc::now().to_rfc3339(),
            }},
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Donor not found".into()));
    }
    Ok(())
}

pub async fn delete_donor(db: &MongoDB, id: &str) -> Result<(), AppError> {
    let object_id = parse_object_id(id)?;
    let result = db
        .collection::<Donor>(DONORS)
        .delete_one(doc! { "_id": object_id })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Donor not found".into()));
    }
    Ok(())
}

/// Role gate for moderation handlers. The caller's current donor document
/// decides, not the token: a blocked or demoted account is rejected even
/// while its token is still live.
pub async fn require_role(db: &MongoDB, email: &str, allowed: &[&str]) -> Result<Donor, AppError> {
    let donor = db
        .collection::<Donor>(DONORS)
        .find_one(doc! { "email": normalize_email(email) })
        .await?
        .ok_or_else(|| AppError::Forbidden("Caller is not a registered donor".into()))?;

    if donor.status == "blocked" {
        return Err(AppError::Forbidden("Account is blocked".into()));
    }
    if !allowed.contains(&donor.role.as_str()) {
        return Err(AppError::Forbidden(format!(
            "Requires one of roles: {}",
            allowed.join(", ")
        )));
    }

    Ok(donor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_empty_query() {
        let filter = build_donor_filter(&DonorQuery::default());
        assert!(filter.is_empty());
    }

    #[test]
    fn test_filter_contains_only_supplied_keys() {
        let query = DonorQuery {
            blood_group: Some("O-".into()),
            district: Some("Dhaka".into()),
            upazila: None,
            status: None,
            limit: Some(10),
        };

        let filter = build_donor_filter(&query);
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get_str("blood_group").unwrap(), "O-");
        assert_eq!(filter.get_str("district").unwrap(), "Dhaka");
        assert!(filter.get("limit").is_none()); // limit is not a filter key
    }

    #[test]
    fn test_effective_limit() {
        assert_eq!(effective_limit(None), 100);
        assert_eq!(effective_limit(Some(0)), 100);
        assert_eq!(effective_limit(Some(-5)), 100);
        assert_eq!(effective_limit(Some(25)), 25);
        assert_eq!(effective_limit(Some(10_000)), 500);
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("not-an-oid").is_err());
        assert!(parse_object_id("65f1b2c3d4e5f6a7b8c9d0e1").is_ok());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
        assert_eq!(normalize_email(""), "");
    }

    #[test]
    fn test_blood_group_validation() {
        assert!(is_valid_blood_group("AB+"));
        assert!(!is_valid_blood_group("ab+"));
        assert!(!is_valid_blood_group("C+"));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_duplicate_registration_conflicts() {
        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/bloodheros_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        let email = format!("dup-{}@example.com", uuid::Uuid::new_v4().simple());
        let req = RegisterDonorRequest {
            name: "Test Donor".into(),
            email: email.clone(),
            blood_group: "O+".into(),
            district: "Dhaka".into(),
            upazila: "Dhanmondi".into(),
            avatar: None,
        };

        assert!(register_donor(&db, &req).await.is_ok());

        let second = register_donor(&db, &req).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let donor = get_donor_by_email(&db, &email).await.unwrap();
        delete_donor(&db, &donor.id.unwrap().to_hex()).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mixed_case_claim_email_and_role_gate() {
        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/bloodheros_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        let local = format!("case-{}", uuid::Uuid::new_v4().simple());
        let req = RegisterDonorRequest {
            name: "Case Donor".into(),
            email: format!("{}@Example.com", local),
            blood_group: "B+".into(),
            district: "Dhaka".into(),
            upazila: "Mirpur".into(),
            avatar: None,
        };
        register_donor(&db, &req).await.unwrap();

        // An identity provider may report the address with different casing
        // than the one stored at registration.
        let claim_email = format!("{}@EXAMPLE.COM", local.to_uppercase());
        let donor = get_donor_by_email(&db, &claim_email).await.unwrap();
        assert_eq!(donor.email, format!("{}@example.com", local));

        // A freshly registered donor passes the donor gate but must never
        // pass a moderation gate.
        assert!(require_role(&db, &claim_email, &["donor"]).await.is_ok());
        let denied = require_role(&db, &claim_email, &["admin"]).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));
        let denied = require_role(&db, &claim_email, &["volunteer", "admin"]).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        delete_donor(&db, &donor.id.unwrap().to_hex()).await.unwrap();
    }
}
