use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Destinatario de envíos. El email es único entre todos los destinatarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipientRequest {
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecipientRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub comment: Option<String>,
}
