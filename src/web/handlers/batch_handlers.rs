// src/web/handlers/batch_handlers.rs
use rocket::data::{Data, ToByteUnit};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::core::csv_io;
use crate::core::persona::{parse_role_list, Persona};
use crate::discovery::BatchRunner;
use crate::web::jobs::JobRegistry;
use crate::web::types::{
    api_error, ActionResponse, ApiError, BatchCreated, BatchStatusData, CsvResponse,
    DataResponse, JobStatus,
};

const MAX_UPLOAD_MIB: u64 = 2;

fn parse_job_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| {
        api_error(
            Status::BadRequest,
            format!("Invalid job id: {}", id),
            "INVALID_JOB_ID",
            &["Use the job_id returned when the batch was created"],
        )
    })
}

fn job_not_found(id: Uuid) -> ApiError {
    api_error(
        Status::NotFound,
        format!("Batch job not found: {}", id),
        "JOB_NOT_FOUND",
        &["Jobs are kept in memory, only the most recent finished jobs are retained"],
    )
}

fn batch_roles(
    persona: Option<&str>,
    roles: Option<&str>,
    runner: &BatchRunner,
) -> Result<Vec<String>, ApiError> {
    if let Some(list) = roles.map(parse_role_list).filter(|l| !l.is_empty()) {
        return Ok(list);
    }
    match persona {
        Some(name) => name
            .parse::<Persona>()
            .map(Persona::keywords)
            .map_err(|e| api_error(Status::BadRequest, e.to_string(), "INVALID_PERSONA", &[])),
        None => Ok(runner.roles().to_vec()),
    }
}

pub async fn create_batch_handler(
    data: Data<'_>,
    persona: Option<String>,
    roles: Option<String>,
    runner: &State<Arc<BatchRunner>>,
    registry: &State<Arc<JobRegistry>>,
) -> Result<Json<DataResponse<BatchCreated>>, ApiError> {
    let body = data
        .open(MAX_UPLOAD_MIB.mebibytes())
        .into_string()
        .await
        .map_err(|e| {
            error!("Failed to read uploaded CSV: {}", e);
            api_error(Status::BadRequest, format!("Failed to read upload: {}", e), "UPLOAD_ERROR", &[])
        })?;

    if !body.is_complete() {
        return Err(api_error(
            Status::PayloadTooLarge,
            format!("CSV upload exceeds {} MiB", MAX_UPLOAD_MIB),
            "UPLOAD_TOO_LARGE",
            &["Split the company list into smaller files"],
        ));
    }

    let companies = csv_io::read_companies(body.as_bytes()).map_err(|e| {
        api_error(
            Status::BadRequest,
            format!("{:#}", e),
            "INVALID_CSV",
            &["The CSV needs a header row with a 'Company' column"],
        )
    })?;

    if companies.is_empty() {
        return Err(api_error(
            Status::BadRequest,
            "CSV contains no companies".to_string(),
            "EMPTY_BATCH",
            &["Add at least one row under the 'Company' header"],
        ));
    }

    let roles = batch_roles(persona.as_deref(), roles.as_deref(), runner)?;
    let total = companies.len();
    let (job_id, cancel) = registry.create(total);
    info!("Batch job {} created for {} companies", job_id, total);

    let runner = Arc::clone(runner.inner());
    let jobs = Arc::clone(registry.inner());
    let job_roles = roles.clone();
    tokio::spawn(async move {
        let rows = runner
            .run_with(&companies, &job_roles, Some(cancel.as_ref()), |progress| {
                jobs.record_progress(job_id, &progress)
            })
            .await;
        jobs.finish(job_id, rows);
        info!("Batch job {} finished", job_id);
    });

    Ok(Json(DataResponse::success(
        format!("Processing {} companies", total),
        BatchCreated {
            job_id,
            total,
            roles,
        },
    )))
}

pub async fn batch_status_handler(
    id: &str,
    rows: Option<bool>,
    registry: &State<Arc<JobRegistry>>,
) -> Result<Json<DataResponse<BatchStatusData>>, ApiError> {
    let job_id = parse_job_id(id)?;
    let status = registry
        .status(job_id, rows.unwrap_or(false))
        .ok_or_else(|| job_not_found(job_id))?;

    Ok(Json(DataResponse::success(
        format!("{} of {} processed", status.processed, status.total),
        status,
    )))
}

pub async fn batch_csv_handler(
    id: &str,
    registry: &State<Arc<JobRegistry>>,
) -> Result<CsvResponse, ApiError> {
    let job_id = parse_job_id(id)?;
    let rows = match registry.rows(job_id) {
        None => return Err(job_not_found(job_id)),
        Some(Err(_)) => {
            return Err(api_error(
                Status::Conflict,
                "Batch is still running".to_string(),
                "JOB_RUNNING",
                &["Poll the job status until it is completed"],
            ))
        }
        Some(Ok(rows)) => rows,
    };

    let data = csv_io::rows_to_csv(&rows).map_err(|e| {
        error!("Failed to serialize batch {}: {:#}", job_id, e);
        api_error(Status::InternalServerError, e.to_string(), "CSV_ERROR", &[])
    })?;

    Ok(CsvResponse {
        data,
        filename: format!("founders_ceos_linkedin_{}.csv", job_id),
    })
}

pub async fn cancel_batch_handler(
    id: &str,
    registry: &State<Arc<JobRegistry>>,
) -> Result<Json<ActionResponse>, ApiError> {
    let job_id = parse_job_id(id)?;
    let status = registry.cancel(job_id).ok_or_else(|| job_not_found(job_id))?;

    let message = match status {
        JobStatus::Running => "Cancellation requested; remaining companies will be skipped",
        _ => "Batch already finished",
    };
    Ok(Json(ActionResponse::success(message.to_string(), "cancel".to_string())))
}
