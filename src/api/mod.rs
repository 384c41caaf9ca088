pub mod donor_requests;
pub mod donors;
pub mod health;
pub mod metrics;
pub mod payments;
pub mod swagger;

use crate::utils::error::AppError;
use actix_web::HttpResponse;

/// Common failure body: `{ "success": false, "error": "..." }` at the
/// variant's status code.
pub fn error_response(e: &AppError) -> HttpResponse {
    HttpResponse::build(e.status_code()).json(serde_json::json!({
        "success": false,
        "error": e.to_string()
    }))
}
