//! error.rs
//! Errores tipados del dominio (almacenamiento, transporte y permisos).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("recipient address '{0}' is already registered")]
    DuplicateAddress(String),
    #[error("invalid email address '{0}'")]
    InvalidAddress(String),
    #[error("end_time must be after start_time")]
    InvalidWindow,
    #[error("subject must be between 1 and {0} characters")]
    InvalidSubject(usize),
    #[error("{entity} '{id}' referenced by the request does not exist")]
    UnknownReference { entity: &'static str, id: String },
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Fallo del transporte de correo; se registra como dato, nunca se propaga.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("send timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("access denied")]
pub struct AccessDenied;
