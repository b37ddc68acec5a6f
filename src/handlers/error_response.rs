//! handlers/error_response.rs
//! Traducción de errores del dominio a respuestas HTTP.

use actix_web::HttpResponse;
use serde_json::json;

use crate::error::{AccessDenied, StoreError};

pub fn store_error(e: &StoreError) -> HttpResponse {
    let mut builder = match e {
        StoreError::NotFound { .. } => HttpResponse::NotFound(),
        StoreError::DuplicateAddress(_) => HttpResponse::Conflict(),
        StoreError::InvalidAddress(_)
        | StoreError::InvalidWindow
        | StoreError::InvalidSubject(_)
        | StoreError::UnknownReference { .. } => HttpResponse::BadRequest(),
        StoreError::Corrupt(_) | StoreError::Database(_) => {
            log::error!("Storage error: {}", e);
            HttpResponse::InternalServerError()
        }
    };

    builder.json(json!({
        "success": false,
        "error": e.to_string()
    }))
}

/// Lo que el actor no puede tocar se responde como inexistente.
pub fn denied(_: AccessDenied) -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "error": "not found"
    }))
}

/// Sin identidad no hay nada que mostrar.
pub fn login_required(_: AccessDenied) -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "success": false,
        "error": "login required"
    }))
}
