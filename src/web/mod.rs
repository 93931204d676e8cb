// src/web/mod.rs
//! JSON API over the discovery pipeline: single lookups and background
//! CSV batch jobs with progress polling.

pub mod handlers;
pub mod jobs;
pub mod types;

pub use jobs::JobRegistry;
pub use types::*;

use anyhow::Result;
use rocket::data::Data;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tracing::info;

use crate::discovery::BatchRunner;
use crate::types::ResultRow;

pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new("Access-Control-Allow-Methods", "POST, GET, OPTIONS"));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

#[get("/health")]
pub async fn health() -> Json<&'static str> {
    handlers::health_handler().await
}

#[get("/personas")]
pub async fn personas() -> Json<DataResponse<Vec<handlers::PersonaInfo>>> {
    handlers::personas_handler().await
}

#[post("/lookup", data = "<request>")]
pub async fn lookup(
    request: Json<LookupRequest>,
    runner: &State<Arc<BatchRunner>>,
) -> Result<Json<DataResponse<ResultRow>>, ApiError> {
    handlers::lookup_handler(request, runner).await
}

#[post("/batch?<persona>&<roles>", data = "<data>")]
pub async fn create_batch(
    data: Data<'_>,
    persona: Option<String>,
    roles: Option<String>,
    runner: &State<Arc<BatchRunner>>,
    registry: &State<Arc<JobRegistry>>,
) -> Result<Json<DataResponse<BatchCreated>>, ApiError> {
    handlers::create_batch_handler(data, persona, roles, runner, registry).await
}

#[get("/batch/<id>?<rows>")]
pub async fn batch_status(
    id: &str,
    rows: Option<bool>,
    registry: &State<Arc<JobRegistry>>,
) -> Result<Json<DataResponse<BatchStatusData>>, ApiError> {
    handlers::batch_status_handler(id, rows, registry).await
}

#[get("/batch/<id>/csv")]
pub async fn batch_csv(id: &str, registry: &State<Arc<JobRegistry>>) -> Result<CsvResponse, ApiError> {
    handlers::batch_csv_handler(id, registry).await
}

#[post("/batch/<id>/cancel")]
pub async fn cancel_batch(
    id: &str,
    registry: &State<Arc<JobRegistry>>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::cancel_batch_handler(id, registry).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Route not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["See /api/health for a liveness check".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
    ))
}

/// Assemble the API around an already-wired pipeline.
pub fn build_rocket(runner: Arc<BatchRunner>, figment: rocket::figment::Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(Cors)
        .manage(runner)
        .manage(Arc::new(JobRegistry::new()))
        .register("/api", catchers![bad_request, not_found, internal_error])
        .mount(
            "/api",
            routes![
                health,
                personas,
                lookup,
                create_batch,
                batch_status,
                batch_csv,
                cancel_batch,
                options,
            ],
        )
}

pub async fn start_web_server(runner: Arc<BatchRunner>, port: u16) -> Result<()> {
    let figment = rocket::Config::figment()
        .merge(("port", port))
        .merge(("address", IpAddr::V4(Ipv4Addr::UNSPECIFIED)));

    info!("Starting founder-finder API server on port {}", port);

    build_rocket(runner, figment)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {}", e))?;

    Ok(())
}
