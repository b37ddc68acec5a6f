use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::campaign_model::Campaign;
use crate::models::recipient_model::Recipient;
use crate::models::template_model::MessageTemplate;

pub const DELIVERY_ACCEPTED: &str = "delivery accepted";

/// Un intento de entrega para un destinatario. No se modifica una vez escrito.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchLogEntry {
    pub id: String,
    pub success: bool,
    pub attempt_time: DateTime<Utc>,
    pub response: String,
    /// `None` si la campaña fue eliminada.
    pub campaign_id: Option<String>,
    /// `None` si el destinatario fue eliminado.
    pub recipient_id: Option<String>,
}

/// Fila de log tal como la devuelve GET /api/logs.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchLogView {
    pub id: String,
    pub success: bool,
    pub attempt_time: String,
    pub response: String,
    pub campaign: String,
    pub recipient: String,
}

impl From<DispatchLogEntry> for DispatchLogView {
    fn from(entry: DispatchLogEntry) -> Self {
        DispatchLogView {
            id: entry.id,
            success: entry.success,
            attempt_time: entry.attempt_time.to_rfc3339(),
            response: entry.response,
            campaign: entry.campaign_id.unwrap_or_else(|| "unknown".to_string()),
            recipient: entry.recipient_id.unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Totales de GET /api/logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogCounts {
    pub total_count: i64,
    pub successful_count: i64,
    pub unsuccessful_count: i64,
}

/// Una campaña con todo lo que necesita una pasada de envío.
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    pub campaign: Campaign,
    pub template: Option<MessageTemplate>,
    pub recipients: Vec<Recipient>,
}

/// Contadores de una pasada de `run_once`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub campaigns_seen: usize,
    pub started: usize,
    pub completed: usize,
    pub pending: usize,
    pub unchanged: usize,
    pub sends_attempted: usize,
    pub sends_failed: usize,
    pub log_entries_written: usize,
    pub store_errors: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsQuery {
    pub campaign_id: Option<String>,
}
