//! tests/mod.rs
//! Utilidades compartidas por las pruebas: SQLite en memoria y transporte falso.

mod store_tests;

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::TransportError;
use crate::models::recipient_model::{CreateRecipientRequest, Recipient};
use crate::models::template_model::{CreateTemplateRequest, MessageTemplate};
use crate::services::email_service::MailTransport;
use crate::services::store_service::MailingStore;

/// Una sola conexión: cada conexión a `:memory:` es una base distinta.
pub async fn memory_store() -> MailingStore {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    let store = MailingStore::new(pool);
    store.run_migrations().await.expect("Failed to migrate");
    store
}

pub fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub async fn add_recipient(store: &MailingStore, email: &str, owner: Option<&str>) -> Recipient {
    store
        .create_recipient(
            owner,
            CreateRecipientRequest {
                email: email.to_string(),
                full_name: format!("Cliente {email}"),
                comment: None,
            },
        )
        .await
        .expect("Failed to create recipient")
}

pub async fn add_template(store: &MailingStore, subject: &str) -> MessageTemplate {
    store
        .create_template(
            Some("owner-1"),
            CreateTemplateRequest {
                subject: subject.to_string(),
                body: format!("Cuerpo de {subject}"),
            },
        )
        .await
        .expect("Failed to create template")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub recipients: Vec<String>,
}

/// Transporte que registra cada llamada; falla cuando el asunto empieza por "fail".
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<SentMail>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        from: &str,
        recipients: &[String],
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(SentMail {
            subject: subject.to_string(),
            body: body.to_string(),
            from: from.to_string(),
            recipients: recipients.to_vec(),
        });

        if subject.starts_with("fail") {
            return Err(TransportError::Timeout(30));
        }
        Ok(())
    }
}
