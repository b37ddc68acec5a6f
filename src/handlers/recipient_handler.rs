//! handlers/recipient_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::access::{self, Actor};
use crate::handlers::error_response::{denied, store_error};
use crate::models::recipient_model::{CreateRecipientRequest, UpdateRecipientRequest};
use crate::services::store_service::MailingStore;

/// POST /api/recipients
pub async fn create_recipient_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    body: web::Json<CreateRecipientRequest>,
) -> HttpResponse {
    match store
        .create_recipient(actor.id.as_deref(), body.into_inner())
        .await
    {
        Ok(recipient) => HttpResponse::Created().json(recipient),
        Err(e) => store_error(&e),
    }
}

/// GET /api/recipients
pub async fn list_recipients_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
) -> HttpResponse {
    match store.list_recipients(actor.list_scope()).await {
        Ok(recipients) => HttpResponse::Ok().json(json!({
            "total": recipients.len(),
            "items": recipients
        })),
        Err(e) => store_error(&e),
    }
}

/// GET /api/recipients/{id}
pub async fn get_recipient_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    match store.get_recipient(&id).await {
        Ok(recipient) => match access::can_view(&actor, recipient.owner_id.as_deref()) {
            Ok(()) => HttpResponse::Ok().json(recipient),
            Err(e) => denied(e),
        },
        Err(e) => store_error(&e),
    }
}

/// PUT /api/recipients/{id}
pub async fn update_recipient_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    path: web::Path<String>,
    body: web::Json<UpdateRecipientRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    let current = match store.get_recipient(&id).await {
        Ok(recipient) => recipient,
        Err(e) => return store_error(&e),
    };
    if let Err(e) = access::can_modify(&actor, current.owner_id.as_deref()) {
        return denied(e);
    }

    match store.update_recipient(&id, body.into_inner()).await {
        Ok(recipient) => HttpResponse::Ok().json(recipient),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/recipients/{id}
pub async fn delete_recipient_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    let current = match store.get_recipient(&id).await {
        Ok(recipient) => recipient,
        Err(e) => return store_error(&e),
    };
    if let Err(e) = access::can_modify(&actor, current.owner_id.as_deref()) {
        return denied(e);
    }

    match store.delete_recipient(&id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => store_error(&e),
    }
}
