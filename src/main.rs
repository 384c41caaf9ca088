mod api;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "mongodb://localhost:27017/bloodheros_db".to_string());

    log::info!("🩸 Starting BloodHeros Service...");
    log::info!("📊 Database: {}", database_url);

    // Initialize MongoDB connection (also creates the unique indexes the
    // registration and payment paths depend on)
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    // 🌱 Promote the configured admin account, if any
    seeds::admin_seed::seed_admin(&db).await;

    api::metrics::init_uptime();

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_origin("http://127.0.0.1:5173")
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Root greeting + health + metrics
            .route("/", web::get().to(api::health::index))
            .route("/health", web::get().to(api::health::health_check))
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // ==================== DONORS ====================
            // Registration, listing and search are public; moderation
            // routes sit behind the bearer-token middleware.
            .service(
                web::scope("/api/v1/donors")
                    .route("", web::post().to(api::donors::register_donor))
                    .route("", web::get().to(api::donors::list_donors))
                    .route("/search", web::get().to(api::donors::search_donors))
                    .service(
                        web::resource("/me")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route(web::get().to(api::donors::get_me)),
                    )
                    .service(
                        web::resource("/{id}/role")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route(web::patch().to(api::donors::update_role)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route(web::patch().to(api::donors::update_status)),
                    )
                    // GET is public here; DELETE checks its own token
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(api::donors::get_donor))
                            .route(web::delete().to(api::donors::delete_donor)),
                    ),
            )
            // ==================== DONOR REQUESTS ====================
            .service(
                web::scope("/api/v1/donor-requests")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::post().to(api::donor_requests::create_request))
                    .route("", web::get().to(api::donor_requests::list_requests))
                    .route("/{id}/status", web::patch().to(api::donor_requests::update_request_status))
                    .route("/{id}", web::get().to(api::donor_requests::get_request))
                    .route("/{id}", web::patch().to(api::donor_requests::update_request))
                    .route("/{id}", web::delete().to(api::donor_requests::delete_request)),
            )
            // ==================== PAYMENTS ====================
            .service(
                web::scope("/api/v1/payments")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route(
                        "/create-checkout-session",
                        web::post().to(api::payments::create_checkout_session),
                    )
                    .route("/confirm", web::post().to(api::payments::confirm_payment))
                    .route("/donations", web::get().to(api::payments::list_donations)),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
