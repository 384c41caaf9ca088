use crate::database::{MongoDB, DONATIONS};
use crate::models::{CheckoutSessionResponse, Donation};
use crate::utils::error::{is_duplicate_key, AppError};
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use lazy_static::lazy_static;
use mongodb::bson::doc;
use serde::Deserialize;
use uuid::Uuid;

const MIN_AMOUNT: f64 = 1.0;

lazy_static! {
    /// One HTTP client for every provider call, shared across workers.
    static ref HTTP: reqwest::Client = reqwest::Client::new();
}

fn provider_base() -> String {
    std::env::var("STRIPE_API_BASE").unwrap_or_else(|_| "https://api.stripe.com".to_string())
}

fn secret_key() -> Result<String, AppError> {
    std::env::var("STRIPE_SECRET_KEY")
        .map_err(|_| AppError::PaymentProviderError("STRIPE_SECRET_KEY is not configured".into()))
}

fn success_url() -> String {
    std::env::var("CHECKOUT_SUCCESS_URL").unwrap_or_else(|_| {
        "http://localhost:3000/donations/success?session_id={CHECKOUT_SESSION_ID}".to_string()
    })
}

fn cancel_url() -> String {
    std::env::var("CHECKOUT_CANCEL_URL")
        .unwrap_or_else(|_| "http://localhost:3000/donations/canceled".to_string())
}

/// Checkout session as the provider returns it. Only the fields the
/// reconcile path reads are deserialized.
#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    pub payment_status: String,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

impl CheckoutSession {
    pub fn payer_email(&self) -> Option<&str> {
        self.customer_email
            .as_deref()
            .or_else(|| self.customer_details.as_ref().and_then(|d| d.email.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

pub struct ConfirmOutcome {
    pub donation: Donation,
    pub duplicate: bool,
}

/// Converts a major-unit amount into provider cents. Sub-dollar and
/// non-finite amounts are rejected before any provider call happens.
pub fn amount_to_cents(amount: f64) -> Result<i64, AppError> {
    if !amount.is_finite() || amount < MIN_AMOUNT {
        return Err(AppError::InvalidRequest(format!(
            "Donation amount must be at least {} USD",
            MIN_AMOUNT
        )));
    }
    Ok((amount * 100.0).round() as i64)
}

pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// `BH-<YYYYMMDD>-<6 random hex>`, shown to donors as their receipt number.
pub fn generate_tracking_id(now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("BH-{}-{}", now.format("%Y%m%d"), random)
}

pub async fn create_checkout_session(
    email: &str,
    amount: f64,
) -> Result<CheckoutSessionResponse, AppError> {
    let cents = amount_to_cents(amount)?;
    let key = secret_key()?;

    log::info!("💳 Creating checkout session: {} USD for {}", amount, email);

    let params = [
        ("mode", "payment".to_string()),
        ("customer_email", email.to_string()),
        ("success_url", success_url()),
        ("cancel_url", cancel_url()),
        ("line_items[0][quantity]", "1".to_string()),
        ("line_items[0][price_data][currency]", "usd".to_string()),
        ("line_items[0][price_data][unit_amount]", cents.to_string()),
        (
            "line_items[0][price_data][product_data][name]",
            "BloodHeros donation".to_string(),
        ),
    ];

    let response = HTTP
        .post(format!("{}/v1/checkout/sessions", provider_base()))
        .basic_auth(&key, Option::<&str>::None)
        .form(&params)
        .send()
        .await
        .map_err(|e| AppError::PaymentProviderError(format!("Request failed: {}", e)))?;

    let session = parse_session_response(response).await?;

    let url = session
        .url
        .ok_or_else(|| AppError::PaymentProviderError("Session has no redirect URL".into()))?;

    Ok(CheckoutSessionResponse {
        session_id: session.id,
        url,
    })
}

pub async fn retrieve_session(session_id: &str) -> Result<CheckoutSession, AppError> {
    let key = secret_key()?;

    let response = HTTP
        .get(format!(
            "{}/v1/checkout/sessions/{}",
            provider_base(),
            session_id
        ))
        .basic_auth(&key, Option::<&str>::None)
        .send()
        .await
        .map_err(|e| AppError::PaymentProviderError(format!("Request failed: {}", e)))?;

    parse_session_response(response).await
}

async fn parse_session_response(response: reqwest::Response) -> Result<CheckoutSession, AppError> {
    let status = response.status();

    if !status.is_success() {
        let message = response
            .json::<ProviderErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error.message)
            .unwrap_or_else(|| format!("Provider returned HTTP {}", status));
        return Err(AppError::PaymentProviderError(message));
    }

    response
        .json::<CheckoutSession>()
        .await
        .map_err(|e| AppError::PaymentProviderError(format!("Malformed session payload: {}", e)))
}

/// Reconciles a provider session into the local donations collection.
/// Safe to call any number of times for the same session: the stored row
/// wins, whether it was found by the pre-read or surfaced as a
/// duplicate-key error from a racing confirmation.
pub async fn confirm_payment(
    db: &MongoDB,
    session_id: &str,
    fallback_email: &str,
) -> Result<ConfirmOutcome, AppError> {
    let session = retrieve_session(session_id).await?;

    if session.payment_status != "paid" {
        return Err(AppError::InvalidRequest(format!(
            "Session is not paid (status: {})",
            session.payment_status
        )));
    }

    let transaction_id = session
        .payment_intent
        .clone()
        .ok_or_else(|| AppError::InvalidRequest("Session has no payment intent".into()))?;

    let collection = db.collection::<Donation>(DONATIONS);

    if let Some(existing) = collection
        .find_one(doc! { "transaction_id": &transaction_id })
        .await?
    {
        log::info!("🔁 Donation already recorded for txn {}", transaction_id);
        return Ok(ConfirmOutcome {
            donation: existing,
            duplicate: true,
        });
    }

    let now = chrono::Utc::now();
    let donation = Donation {
        id: None,
        amount: cents_to_amount(session.amount_total.unwrap_or(0)),
        email: crate::services::donor_service::normalize_email(
            session.payer_email().unwrap_or(fallback_email),
        ),
        transaction_id: transaction_id.clone(),
        tracking_id: generate_tracking_id(now),
        status: session.payment_status,
        created_at: now,
    };

    match collection.insert_one(&donation).await {
        Ok(result) => {
            log::info!(
                "✅ Donation recorded: txn {} tracking {}",
                transaction_id,
                donation.tracking_id
            );
            let mut stored = donation;
            stored.id = result.inserted_id.as_object_id();
            Ok(ConfirmOutcome {
                donation: stored,
                duplicate: false,
            })
        }
        Err(e) if is_duplicate_key(&e) => {
            // Lost the race to another confirmation; the winner's row stands.
            let existing = collection
                .find_one(doc! { "transaction_id": &transaction_id })
                .await?
                .ok_or_else(|| AppError::DatabaseError("Donation vanished after duplicate key".into()))?;
            Ok(ConfirmOutcome {
                donation: existing,
                duplicate: true,
            })
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn list_donations(
    db: &MongoDB,
    email: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<Donation>, AppError> {
    let mut filter = mongodb::bson::Document::new();
    if let Some(email) = email {
        filter.insert("email", crate::services::donor_service::normalize_email(email));
    }

    let mut cursor = db
        .collection::<Donation>(DONATIONS)
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .limit(crate::services::donor_service::effective_limit(limit))
        .await?;

    let mut donations = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(donation) => donations.push(donation),
            Err(e) => log::warn!("⚠️  Skipping unreadable donation: {}", e),
        }
    }

    Ok(donations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tracking_id_shape() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let id = generate_tracking_id(now);

        assert!(id.starts_with("BH-20260314-"));
        assert_eq!(id.len(), "BH-20260314-".len() + 6);

        let random = &id["BH-20260314-".len()..];
        assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(random, random.to_uppercase());
    }

    #[test]
    fn test_tracking_ids_differ() {
        let now = Utc::now();
        assert_ne!(generate_tracking_id(now), generate_tracking_id(now));
    }

    #[test]
    fn test_amount_to_cents() {
        assert_eq!(amount_to_cents(5.0).unwrap(), 500);
        assert_eq!(amount_to_cents(19.99).unwrap(), 1999);
        assert!(amount_to_cents(0.5).is_err());
        assert!(amount_to_cents(-10.0).is_err());
        assert!(amount_to_cents(f64::NAN).is_err());
    }

    #[test]
    fn test_cents_roundtrip() {
        assert_eq!(cents_to_amount(amount_to_cents(12.34).unwrap()), 12.34);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_transaction_id_unique_index_settles_race() {
        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/bloodheros_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        let txn = format!("pi_test_{}", Uuid::new_v4().simple());
        let donation = Donation {
            id: None,
            amount: 25.0,
            email: "payer@example.com".into(),
            transaction_id: txn.clone(),
            tracking_id: generate_tracking_id(Utc::now()),
            status: "paid".into(),
            created_at: Utc::now(),
        };

        let collection = db.collection::<Donation>(DONATIONS);
        collection.insert_one(&donation).await.unwrap();

        // A second confirmation for the same transaction must not create
        // a second row.
        let second = collection.insert_one(&donation).await;
        assert!(matches!(&second, Err(e) if is_duplicate_key(e)));

        collection
            .delete_one(doc! { "transaction_id": &txn })
            .await
            .unwrap();
    }

    #[test]
    fn test_payer_email_prefers_top_level() {
        let session = CheckoutSession {
            id: "cs_test_1".into(),
            url: None,
            payment_intent: Some("pi_1".into()),
            payment_status: "paid".into(),
            amount_total: Some(500),
            customer_email: Some("top@example.com".into()),
            customer_details: Some(CustomerDetails {
                email: Some("details@example.com".into()),
            }),
        };
        assert_eq!(session.payer_email(), Some("top@example.com"));
    }
}
