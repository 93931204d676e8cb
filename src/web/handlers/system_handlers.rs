// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::serde::Serialize;

use crate::core::Persona;
use crate::web::types::DataResponse;

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PersonaInfo {
    pub name: String,
    pub roles: Vec<String>,
}

pub async fn health_handler() -> Json<&'static str> {
    Json("OK")
}

pub async fn personas_handler() -> Json<DataResponse<Vec<PersonaInfo>>> {
    let personas = Persona::all()
        .iter()
        .map(|p| PersonaInfo {
            name: p.to_string(),
            roles: p.keywords(),
        })
        .collect();

    Json(DataResponse::success("Available personas".to_string(), personas))
}
