//! handlers/campaign_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::access::{self, Actor};
use crate::handlers::error_response::{denied, store_error};
use crate::models::campaign_model::{CreateCampaignRequest, UpdateCampaignRequest};
use crate::services::store_service::MailingStore;

/// POST /api/campaigns
pub async fn create_campaign_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    body: web::Json<CreateCampaignRequest>,
) -> HttpResponse {
    match store
        .create_campaign(actor.id.as_deref(), body.into_inner())
        .await
    {
        Ok(campaign) => HttpResponse::Created().json(campaign),
        Err(e) => store_error(&e),
    }
}

/// GET /api/campaigns
pub async fn list_campaigns_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
) -> HttpResponse {
    match store.list_campaigns(actor.list_scope()).await {
        Ok(campaigns) => HttpResponse::Ok().json(json!({
            "total": campaigns.len(),
            "items": campaigns
        })),
        Err(e) => store_error(&e),
    }
}

/// GET /api/campaigns/{id}
pub async fn get_campaign_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    path: web::Path<String>,
) -> HttpResponse {
    match store.get_campaign(&path.into_inner()).await {
        Ok(campaign) => match access::can_view(&actor, campaign.owner_id.as_deref()) {
            Ok(()) => HttpResponse::Ok().json(campaign),
            Err(e) => denied(e),
        },
        Err(e) => store_error(&e),
    }
}

/// PUT /api/campaigns/{id}
pub async fn update_campaign_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    path: web::Path<String>,
    body: web::Json<UpdateCampaignRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    let current = match store.get_campaign(&id).await {
        Ok(campaign) => campaign,
        Err(e) => return store_error(&e),
    };
    if let Err(e) = access::can_modify(&actor, current.owner_id.as_deref()) {
        return denied(e);
    }

    match store.update_campaign(&id, body.into_inner()).await {
        Ok(campaign) => HttpResponse::Ok().json(campaign),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/campaigns/{id}
pub async fn delete_campaign_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    let current = match store.get_campaign(&id).await {
        Ok(campaign) => campaign,
        Err(e) => return store_error(&e),
    };
    if let Err(e) = access::can_modify(&actor, current.owner_id.as_deref()) {
        return denied(e);
    }

    match store.delete_campaign(&id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => store_error(&e),
    }
}
