//! models/mod.rs
//! Entidades del dominio de envíos y estructuras de request/response.

pub mod campaign_model;
pub mod dispatch_log_model;
pub mod recipient_model;
pub mod template_model;
