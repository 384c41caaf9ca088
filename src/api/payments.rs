use actix_web::{web, HttpResponse, Responder};
use crate::api::error_response;
use crate::database::MongoDB;
use crate::middleware::auth::Claims;
use crate::models::{ConfirmPaymentRequest, CreateCheckoutRequest, DonationQuery};
use crate::services::{donor_service, payment_service};

#[utoipa::path(
    post,
    path = "/api/v1/payments/create-checkout-session",
    tag = "Payments",
    request_body = CreateCheckoutRequest,
    responses(
        (status = 200, description = "Checkout session created", body = crate::models::CheckoutSessionResponse),
        (status = 400, description = "Invalid amount"),
        (status = 502, description = "Checkout provider failure")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_checkout_session(
    user: web::ReqData<Claims>,
    request: web::Json<CreateCheckoutRequest>,
) -> impl Responder {
    log::info!("💳 POST /payments/create-checkout-session - {} USD by {}", request.amount, user.email);

    match payment_service::create_checkout_session(&user.email, request.amount).await {
        Ok(session) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "session_id": session.session_id,
            "url": session.url
        })),
        Err(e) => {
            log::warn!("❌ Checkout session failed for {}: {}", user.email, e);
            error_response(&e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/confirm",
    tag = "Payments",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Donation recorded (or already on record)"),
        (status = 400, description = "Session not paid or malformed"),
        (status = 502, description = "Checkout provider failure")
    ),
    security(("bearer_auth" = []))
)]
pub async fn confirm_payment(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    request: web::Json<ConfirmPaymentRequest>,
) -> impl Responder {
    log::info!("💳 POST /payments/confirm - session {} by {}", request.session_id, user.email);

    match payment_service::confirm_payment(&db, &request.session_id, &user.email).await {
        Ok(outcome) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "duplicate": outcome.duplicate,
            "donation": outcome.donation
        })),
        Err(e) => {
            log::warn!("❌ Payment confirmation failed: {}", e);
            error_response(&e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/donations",
    tag = "Payments",
    params(DonationQuery),
    responses(
        (status = 200, description = "Donations: all for admins, own otherwise")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_donations(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    query: web::Query<DonationQuery>,
) -> impl Responder {
    let is_admin = donor_service::require_role(&db, &user.email, &["admin"])
        .await
        .is_ok();

    let email_filter = if is_admin { None } else { Some(user.email.as_str()) };

    match payment_service::list_donations(&db, email_filter, query.limit).await {
        Ok(donations) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": donations.len(),
            "donations": donations
        })),
        Err(e) => error_response(&e),
    }
}
