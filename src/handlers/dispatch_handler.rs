//! handlers/dispatch_handler.rs
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::access::{self, Actor};
use crate::handlers::error_response::{login_required, store_error};
use crate::models::dispatch_log_model::{DispatchLogView, LogsQuery};
use crate::services::dispatch_service::DispatchService;
use crate::services::store_service::MailingStore;

/// POST /api/dispatch/run
pub async fn run_dispatch_endpoint(dispatch: web::Data<DispatchService>) -> HttpResponse {
    let summary = dispatch.run_once(Utc::now()).await;
    HttpResponse::Ok().json(json!({
        "success": summary.store_errors == 0,
        "summary": summary
    }))
}

/// GET /api/logs
pub async fn list_logs_endpoint(
    store: web::Data<MailingStore>,
    actor: Actor,
    query: web::Query<LogsQuery>,
) -> HttpResponse {
    if let Err(e) = access::can_read_logs(&actor) {
        return login_required(e);
    }

    let campaign_id = query.campaign_id.as_deref();
    let entries = match store.list_logs(campaign_id).await {
        Ok(entries) => entries,
        Err(e) => return store_error(&e),
    };
    let counts = match store.count_logs(campaign_id).await {
        Ok(counts) => counts,
        Err(e) => return store_error(&e),
    };

    let items: Vec<DispatchLogView> = entries.into_iter().map(Into::into).collect();
    HttpResponse::Ok().json(json!({
        "total": items.len(),
        "total_count": counts.total_count,
        "successful_count": counts.successful_count,
        "unsuccessful_count": counts.unsuccessful_count,
        "items": items
    }))
}
