//! handlers/mod.rs
//! Handlers HTTP (destinatarios, plantillas, campañas, envíos).
pub mod campaign_handler;
pub mod dispatch_handler;
pub mod error_response;
pub mod recipient_handler;
pub mod template_handler;
