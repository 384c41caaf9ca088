use crate::database::{MongoDB, DONATIONS, DONORS, DONOR_REQUESTS};
use actix_web::{web, HttpResponse};
use mongodb::bson::doc;
use std::sync::OnceLock;
use std::time::Instant;

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// Call once at startup so uptime has a base.
pub fn init_uptime() {
    STARTED_AT.get_or_init(Instant::now);
}

async fn count(db: &MongoDB, collection: &str) -> u64 {
    db.collection::<mongodb::bson::Document>(collection)
        .count_documents(doc! {})
        .await
        .unwrap_or(0)
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus-format service metrics")
    )
)]
pub async fn get_metrics(db: web::Data<MongoDB>) -> HttpResponse {
    let donors = count(&db, DONORS).await;
    let requests = count(&db, DONOR_REQUESTS).await;
    let donations = count(&db, DONATIONS).await;
    let uptime = STARTED_AT.get().map(|t| t.elapsed().as_secs()).unwrap_or(0);

    let metrics = format!(
        "# HELP donors_total Registered donors\n\
         # TYPE donors_total gauge\n\
         donors_total {}\n\
         \n\
         # HELP donor_requests_total Blood requests on record\n\
         # TYPE donor_requests_total gauge\n\
         donor_requests_total {}\n\
         \n\
         # HELP donations_total Recorded monetary donations\n\
         # TYPE donations_total gauge\n\
         donations_total {}\n\
         \n\
         # HELP uptime_seconds Seconds since service start\n\
         # TYPE uptime_seconds counter\n\
         uptime_seconds {}\n",
        donors, requests, donations, uptime
    );

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics)
}
