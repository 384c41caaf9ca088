use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;

pub const DONORS: &str = "donors";
pub const DONOR_REQUESTS: &str = "donor_requests";
pub const DONATIONS: &str = "donations";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool: 20 max, 5 warm, 5min idle
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("bloodheros_db");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the handlers rely on. The two unique indexes are
    /// load-bearing: donor email duplication and the payment-confirmation
    /// race are both resolved here rather than in application code.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let donors = self.db.collection::<mongodb::bson::Document>(DONORS);

        let email_unique = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match donors.create_index(email_unique).await {
            Ok(_) => log::info!("   ✅ Index created: donors(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // Search path: donors filtered by blood group + district
        let donor_search = IndexModel::builder()
            .keys(doc! { "blood_group": 1, "district": 1 })
            .build();

        match donors.create_index(donor_search).await {
            Ok(_) => log::info!("   ✅ Index created: donors(blood_group, district)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let requests = self.db.collection::<mongodb::bson::Document>(DONOR_REQUESTS);

        let requests_email = IndexModel::builder()
            .keys(doc! { "requester_email": 1 })
            .build();

        match requests.create_index(requests_email).await {
            Ok(_) => log::info!("   ✅ Index created: donor_requests(requester_email)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let requests_status = IndexModel::builder()
            .keys(doc! { "status": 1 })
            .build();

        match requests.create_index(requests_status).await {
            Ok(_) => log::info!("   ✅ Index created: donor_requests(status)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let donations = self.db.collection::<mongodb::bson::Document>(DONATIONS);

        let txn_unique = IndexModel::builder()
            .keys(doc! { "transaction_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match donations.create_index(txn_unique).await {
            Ok(_) => log::info!("   ✅ Index created: donations(transaction_id) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn health_check(&self) -> Result<bool, Box<dyn Error>> {
        self.db.list_collection_names().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_connection_and_indexes() {
        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/bloodheros_db".to_string());
        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());

        let db = db.unwrap();
        assert!(db.health_check().await.unwrap());
    }
}
