//! handlers/template_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::access::{self, Actor};
use crate::handlers::error_response::{denied, store_error};
use crate::models::template_model::{CreateTemplateRequest, UpdateTemplateRequest};
use crate::services::store_service::MailingStore;

/// POST /api/templates
pub async fn create_template_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    body: web::Json<CreateTemplateRequest>,
) -> HttpResponse {
    match store
        .create_template(actor.id.as_deref(), body.into_inner())
        .await
    {
        Ok(template) => HttpResponse::Created().json(template),
        Err(e) => store_error(&e),
    }
}

/// GET /api/templates
///
/// Las plantillas son visibles para todos.
pub async fn list_templates_endpoint(store: web::Data<MailingStore>) -> HttpResponse {
    match store.list_templates().await {
        Ok(templates) => HttpResponse::Ok().json(json!({
            "total": templates.len(),
            "items": templates
        })),
        Err(e) => store_error(&e),
    }
}

/// GET /api/templates/{id}
pub async fn get_template_endpoint(
    store: web::Data<MailingStore>,
    path: web::Path<String>,
) -> HttpResponse {
    match store.get_template(&path.into_inner()).await {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => store_error(&e),
    }
}

/// PUT /api/templates/{id}
pub async fn update_template_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    path: web::Path<String>,
    body: web::Json<UpdateTemplateRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    let current = match store.get_template(&id).await {
        Ok(template) => template,
        Err(e) => return store_error(&e),
    };
    if let Err(e) = access::can_edit_template(&actor, current.owner_id.as_deref()) {
        return denied(e);
    }

    match store.update_template(&id, body.into_inner()).await {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/templates/{id}
pub async fn delete_template_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    let current = match store.get_template(&id).await {
        Ok(template) => template,
        Err(e) => return store_error(&e),
    };
    if let Err(e) = access::can_modify(&actor, current.owner_id.as_deref()) {
        return denied(e);
    }

    match store.delete_template(&id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => store_error(&e),
    }
}
