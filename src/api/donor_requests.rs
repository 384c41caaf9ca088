use actix_web::{web, HttpResponse, Responder};
use crate::api::error_response;
use crate::database::MongoDB;
use crate::middleware::auth::Claims;
use crate::models::{CreateDonorRequestBody, DonorRequestQuery, UpdateRequestStatusBody};
use crate::services::{donor_request_service, donor_service};

#[utoipa::path(
    post,
    path = "/api/v1/donor-requests",
    tag = "Donor Requests",
    request_body = CreateDonorRequestBody,
    responses(
        (status = 201, description = "Request created"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_request(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    request: web::Json<CreateDonorRequestBody>,
) -> impl Responder {
    log::info!("🆘 POST /donor-requests by {}", user.email);

    let requester_name = user.name.clone().unwrap_or_else(|| user.email.clone());

    match donor_request_service::create_request(&db, &user.email, &requester_name, &request).await {
        Ok(id) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "inserted_id": id
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/donor-requests",
    tag = "Donor Requests",
    params(DonorRequestQuery),
    responses(
        (status = 200, description = "Requests, newest first"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_requests(
    db: web::Data<MongoDB>,
    query: web::Query<DonorRequestQuery>,
) -> impl Responder {
    match donor_request_service::list_requests(&db, &query).await {
        Ok(requests) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": requests.len(),
            "requests": requests
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/donor-requests/{id}",
    tag = "Donor Requests",
    responses(
        (status = 200, description = "Request found"),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_request(db: web::Data<MongoDB>, path: web::Path<String>) -> impl Responder {
    match donor_request_service::get_request(&db, &path.into_inner()).await {
        Ok(request) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "request": request
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/donor-requests/{id}",
    tag = "Donor Requests",
    responses(
        (status = 200, description = "Request updated"),
        (status = 400, description = "Empty or invalid body"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_request(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    let id = path.into_inner();
    log::info!("✏️  PATCH /donor-requests/{} by {}", id, user.email);

    let fields = match body.as_object() {
        Some(fields) => fields,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": "Body must be a JSON object"
            }))
        }
    };

    match donor_request_service::update_request(&db, &id, fields).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/donor-requests/{id}/status",
    tag = "Donor Requests",
    request_body = UpdateRequestStatusBody,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Not allowed for this caller"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_request_status(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateRequestStatusBody>,
) -> impl Responder {
    let id = path.into_inner();
    log::info!(
        "✏️  PATCH /donor-requests/{}/status -> {} by {}",
        id,
        request.status,
        user.email
    );

    let is_moderator = donor_service::require_role(&db, &user.email, &["volunteer", "admin"])
        .await
        .is_ok();

    match donor_request_service::update_request_status(
        &db,
        &id,
        &request.status,
        &user.email,
        is_moderator,
    )
    .await
    {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "status": request.status
        })),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/donor-requests/{id}",
    tag = "Donor Requests",
    responses(
        (status = 200, description = "Request deleted"),
        (status = 403, description = "Not allowed for this caller"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_request(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> impl Responder {
    let id = path.into_inner();
    log::info!("🗑️  DELETE /donor-requests/{} by {}", id, user.email);

    let is_admin = donor_service::require_role(&db, &user.email, &["admin"])
        .await
        .is_ok();

    match donor_request_service::delete_request(&db, &id, &user.email, is_admin).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => error_response(&e),
    }
}
