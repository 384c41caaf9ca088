use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BloodHeros Service API",
        version = "1.0.0",
        description = "Blood-donation coordination backend.\n\n**Authentication:** donor-request, payment, and moderation endpoints require a JWT Bearer token. Roles (donor/volunteer/admin) are read from the donors collection, not from the token.",
        contact(
            name = "BloodHeros Team",
            email = "support@bloodheros.org"
        )
    ),
    paths(
        // Health
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Donors
        crate::api::donors::register_donor,
        crate::api::donors::list_donors,
        crate::api::donors::search_donors,
        crate::api::donors::get_me,
        crate::api::donors::get_donor,
        crate::api::donors::update_role,
        crate::api::donors::update_status,
        crate::api::donors::delete_donor,

        // Donor requests
        crate::api::donor_requests::create_request,
        crate::api::donor_requests::list_requests,
        crate::api::donor_requests::get_request,
        crate::api::donor_requests::update_request,
        crate::api::donor_requests::update_request_status,
        crate::api::donor_requests::delete_request,

        // Payments
        crate::api::payments::create_checkout_session,
        crate::api::payments::confirm_payment,
        crate::api::payments::list_donations,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::models::RegisterDonorRequest,
            crate::models::UpdateRoleRequest,
            crate::models::UpdateStatusRequest,
            crate::models::CreateDonorRequestBody,
            crate::models::UpdateRequestStatusBody,
            crate::models::CreateCheckoutRequest,
            crate::models::CheckoutSessionResponse,
            crate::models::ConfirmPaymentRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check and service metrics."),
        (name = "Donors", description = "Donor registration, listing, search, and role/status moderation."),
        (name = "Donor Requests", description = "Blood requests, trackable by status."),
        (name = "Payments", description = "Checkout sessions and donation reconciliation against the payment provider.")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
