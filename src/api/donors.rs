use actix_web::{web, HttpRequest, HttpResponse, Responder};
use crate::api::error_response;
use crate::database::MongoDB;
use crate::middleware::auth::{extract_bearer, Claims};
use crate::models::{DonorQuery, RegisterDonorRequest, UpdateRoleRequest, UpdateStatusRequest};
use crate::services::{auth_service, donor_service};

#[utoipa::path(
    post,
    path = "/api/v1/donors",
    tag = "Donors",
    request_body = RegisterDonorRequest,
    responses(
        (status = 201, description = "Donor registered"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_donor(
    db: web::Data<MongoDB>,
    request: web::Json<RegisterDonorRequest>,
) -> impl Responder {
    log::info!("🩸 POST /donors - email: {}", request.email);

    match donor_service::register_donor(&db, &request).await {
        Ok(id) => {
            log::info!("✅ Donor registered: {}", request.email);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "inserted_id": id
            }))
        }
        Err(e) => {
            log::warn!("❌ Donor registration failed: {} - {}", request.email, e);
            error_response(&e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/donors",
    tag = "Donors",
    params(DonorQuery),
    responses(
        (status = 200, description = "Donor list, newest first")
    )
)]
pub async fn list_donors(db: web::Data<MongoDB>, query: web::Query<DonorQuery>) -> impl Responder {
    match donor_service::list_donors(&db, &query).await {
        Ok(donors) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": donors.len(),
            "donors": donors
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/donors/search",
    tag = "Donors",
    params(DonorQuery),
    responses(
        (status = 200, description = "Active donors matching the filters")
    )
)]
pub async fn search_donors(db: web::Data<MongoDB>, query: web::Query<DonorQuery>) -> impl Responder {
    log::info!(
        "🔍 GET /donors/search - blood_group: {:?}, district: {:?}",
        query.blood_group,
        query.district
    );

    match donor_service::search_donors(&db, &query).await {
        Ok(donors) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": donors.len(),
            "donors": donors
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/donors/me",
    tag = "Donors",
    responses(
        (status = 200, description = "Profile of the authenticated donor"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(db: web::Data<MongoDB>, user: web::ReqData<Claims>) -> impl Responder {
    match donor_service::get_donor_by_email(&db, &user.email).await {
        Ok(donor) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "donor": donor
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/donors/{id}",
    tag = "Donors",
    responses(
        (status = 200, description = "Donor found"),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "Donor not found")
    )
)]
pub async fn get_donor(db: web::Data<MongoDB>, path: web::Path<String>) -> impl Responder {
    match donor_service::get_donor(&db, &path.into_inner()).await {
        Ok(donor) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "donor": donor
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/donors/{id}/role",
    tag = "Donors",
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated"),
        (status = 400, description = "Invalid role"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Donor not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateRoleRequest>,
) -> impl Responder {
    let id = path.into_inner();
    log::info!("🛡️  PATCH /donors/{}/role -> {} by {}", id, request.role, user.email);

    if let Err(e) = donor_service::require_role(&db, &user.email, &["admin"]).await {
        return error_response(&e);
    }

    match donor_service::update_role(&db, &id, &request.role).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "role": request.role
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/donors/{id}/status",
    tag = "Donors",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Caller is not a volunteer or admin"),
        (status = 404, description = "Donor not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_status(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateStatusRequest>,
) -> impl Responder {
    let id = path.into_inner();
    log::info!("🛡️  PATCH /donors/{}/status -> {} by {}", id, request.status, user.email);

    if let Err(e) = donor_service::require_role(&db, &user.email, &["volunteer", "admin"]).await {
        return error_response(&e);
    }

    match donor_service::update_status(&db, &id, &request.status).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "status": request.status
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/donors/{id}",
    tag = "Donors",
    responses(
        (status = 200, description = "Donor deleted"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Donor not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_donor(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let id = path.into_inner();

    // GET on this path is public, so the resource carries no auth wrap;
    // delete verifies the bearer token itself.
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok());
    let claims: Claims = match extract_bearer(header).map(auth_service::verify_token) {
        Some(Ok(claims)) => claims,
        _ => {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "success": false,
                "error": "Missing or invalid authorization token"
            }))
        }
    };

    log::info!("🗑️  DELETE /donors/{} by {}", id, claims.email);

    if let Err(e) = donor_service::require_role(&db, &claims.email, &["admin"]).await {
        return error_response(&e);
    }

    match donor_service::delete_donor(&db, &id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => error_response(&e),
    }
}
