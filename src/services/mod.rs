pub mod auth_service;
pub mod donor_request_service;
pub mod donor_service;
pub mod payment_service;
