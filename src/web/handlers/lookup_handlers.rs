// src/web/handlers/lookup_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use tracing::info;

use crate::discovery::BatchRunner;
use crate::types::ResultRow;
use crate::web::types::{api_error, ApiError, DataResponse, LookupRequest};

/// Request roles, else the persona preset, else the server default.
pub fn request_roles(request: &LookupRequest, runner: &BatchRunner) -> Vec<String> {
    let explicit: Vec<String> = request
        .roles
        .iter()
        .flatten()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();

    if !explicit.is_empty() {
        explicit
    } else if let Some(persona) = request.persona {
        persona.keywords()
    } else {
        runner.roles().to_vec()
    }
}

pub async fn lookup_handler(
    request: Json<LookupRequest>,
    runner: &State<Arc<BatchRunner>>,
) -> Result<Json<DataResponse<ResultRow>>, ApiError> {
    let company = request.company.trim();
    if company.is_empty() {
        return Err(api_error(
            Status::BadRequest,
            "Company name is required".to_string(),
            "EMPTY_COMPANY",
            &["Provide a non-empty 'company' field"],
        ));
    }

    let roles = request_roles(&request, runner);
    info!("Single lookup for {} with roles {:?}", company, roles);

    let row = runner.lookup_with_roles(company, &roles).await;
    let message = if row.is_resolved() {
        format!("Best match found for {}", row.company)
    } else {
        format!("No profile resolved for {}", row.company)
    };

    Ok(Json(DataResponse::success(message, row)))
}
