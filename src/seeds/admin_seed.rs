use crate::database::{MongoDB, DONORS};
use crate::models::Donor;
use mongodb::bson::doc;

/// Promotes the donor named by ADMIN_EMAIL to admin at startup.
/// Idempotent: an already-admin account is left alone, and an unset env
/// var or unregistered email is just logged.
pub async fn seed_admin(db: &MongoDB) {
    let admin_email = match std::env::var("ADMIN_EMAIL") {
        Ok(email) if !email.trim().is_empty() => email.trim().to_lowercase(),
        _ => {
            log::info!("👤 ADMIN_EMAIL not set — skipping admin seed");
            return;
        }
    };

    let collection = db.collection::<Donor>(DONORS);

    match collection
        .update_one(
            doc! { "email": &admin_email, "role": { "$ne": "admin" } },
            doc! { "$set": {
                "role": "admin",
                "updated_at": chrono::Utc::now().to_rfc3339(),
            }},
        )
        .await
    {
        Ok(result) if result.modified_count > 0 => {
            log::info!("   ✅ Promoted {} to admin", admin_email);
        }
        Ok(_) => {
            log::info!("👤 Admin seed: {} already admin or not registered yet", admin_email);
        }
        Err(e) => {
            log::error!("   ❌ Admin seed failed: {}", e);
        }
    }
}
