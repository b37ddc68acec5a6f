//! services/store_service.rs
//! Persistencia en SQLite (sqlx) de destinatarios, plantillas, campañas y logs.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::campaign_model::{
    Campaign, CampaignStatus, CreateCampaignRequest, UpdateCampaignRequest,
};
use crate::models::dispatch_log_model::{DispatchLogEntry, DispatchPlan, LogCounts};
use crate::models::recipient_model::{
    CreateRecipientRequest, Recipient, UpdateRecipientRequest,
};
use crate::models::template_model::{
    CreateTemplateRequest, MessageTemplate, UpdateTemplateRequest, MAX_SUBJECT_CHARS,
};

type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone, Debug)]
pub struct MailingStore {
    db_pool: Pool<Sqlite>,
}

impl MailingStore {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        MailingStore { db_pool }
    }

    #[cfg(test)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db_pool
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.db_pool).await?;
        Ok(())
    }

    // ======================================================
    // Destinatarios
    // ======================================================

    pub async fn create_recipient(
        &self,
        owner_id: Option<&str>,
        req: CreateRecipientRequest,
    ) -> StoreResult<Recipient> {
        let recipient = Recipient {
            id: Uuid::new_v4().to_string(),
            email: normalize_address(&req.email)?,
            full_name: req.full_name,
            comment: req.comment,
            owner_id: owner_id.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO recipients (id, email, full_name, comment, owner_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&recipient.id)
        .bind(&recipient.email)
        .bind(&recipient.full_name)
        .bind(&recipient.comment)
        .bind(&recipient.owner_id)
        .bind(recipient.created_at.to_rfc3339())
        .execute(&self.db_pool)
        .await
        .map_err(|e| duplicate_or(e, &recipient.email))?;

        Ok(recipient)
    }

    pub async fn get_recipient(&self, id: &str) -> StoreResult<Recipient> {
        let row = sqlx::query(
            r#"
            SELECT id, email, full_name, comment, owner_id, created_at
            FROM recipients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| StoreError::not_found("recipient", id))?;

        recipient_from_row(&row)
    }

    /// `owner_id = None` lista todo.
    pub async fn list_recipients(&self, owner_id: Option<&str>) -> StoreResult<Vec<Recipient>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, full_name, comment, owner_id, created_at
            FROM recipients
            WHERE ?1 IS NULL OR owner_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db_pool)
        .await?;

        rows.iter().map(recipient_from_row).collect()
    }

    pub async fn update_recipient(
        &self,
        id: &str,
        req: UpdateRecipientRequest,
    ) -> StoreResult<Recipient> {
        let mut recipient = self.get_recipient(id).await?;
        if let Some(email) = req.email {
            recipient.email = normalize_address(&email)?;
        }
        if let Some(full_name) = req.full_name {
            recipient.full_name = full_name;
        }
        if req.comment.is_some() {
            recipient.comment = req.comment;
        }

        sqlx::query(
            r#"
            UPDATE recipients
            SET email = ?2, full_name = ?3, comment = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&recipient.id)
        .bind(&recipient.email)
        .bind(&recipient.full_name)
        .bind(&recipient.comment)
        .execute(&self.db_pool)
        .await
        .map_err(|e| duplicate_or(e, &recipient.email))?;

        Ok(recipient)
    }

    pub async fn delete_recipient(&self, id: &str) -> StoreResult<()> {
        let done = sqlx::query("DELETE FROM recipients WHERE id = ?1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::not_found("recipient", id));
        }
        Ok(())
    }

    // ======================================================
    // Plantillas
    // ======================================================

    pub async fn create_template(
        &self,
        owner_id: Option<&str>,
        req: CreateTemplateRequest,
    ) -> StoreResult<MessageTemplate> {
        let template = MessageTemplate {
            id: Uuid::new_v4().to_string(),
            subject: validate_subject(req.subject)?,
            body: req.body,
            owner_id: owner_id.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO message_templates (id, subject, body, owner_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&template.id)
        .bind(&template.subject)
        .bind(&template.body)
        .bind(&template.owner_id)
        .bind(template.created_at.to_rfc3339())
        .execute(&self.db_pool)
        .await?;

        Ok(template)
    }

    pub async fn get_template(&self, id: &str) -> StoreResult<MessageTemplate> {
        let row = sqlx::query(
            r#"
            SELECT id, subject, body, owner_id, created_at
            FROM message_templates
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| StoreError::not_found("template", id))?;

        template_from_row(&row)
    }

    pub async fn list_templates(&self) -> StoreResult<Vec<MessageTemplate>> {
        let rows = sqlx::query(
            r#"
            SELECT id, subject, body, owner_id, created_at
            FROM message_templates
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        rows.iter().map(template_from_row).collect()
    }

    pub async fn update_template(
        &self,
        id: &str,
        req: UpdateTemplateRequest,
    ) -> StoreResult<MessageTemplate> {
        let mut template = self.get_template(id).await?;
        if let Some(subject) = req.subject {
            template.subject = validate_subject(subject)?;
        }
        if let Some(body) = req.body {
            template.body = body;
        }

        sqlx::query("UPDATE message_templates SET subject = ?2, body = ?3 WHERE id = ?1")
            .bind(&template.id)
            .bind(&template.subject)
            .bind(&template.body)
            .execute(&self.db_pool)
            .await?;

        Ok(template)
    }

    /// Borra la plantilla y, en cascada, las campañas que la usan.
    pub async fn delete_template(&self, id: &str) -> StoreResult<()> {
        let done = sqlx::query("DELETE FROM message_templates WHERE id = ?1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::not_found("template", id));
        }
        Ok(())
    }

    // ======================================================
    // Campañas
    // ======================================================

    pub async fn create_campaign(
        &self,
        owner_id: Option<&str>,
        req: CreateCampaignRequest,
    ) -> StoreResult<Campaign> {
        if req.end_time <= req.start_time {
            return Err(StoreError::InvalidWindow);
        }

        let campaign = Campaign {
            id: Uuid::new_v4().to_string(),
            start_time: req.start_time,
            end_time: req.end_time,
            periodicity: req.periodicity,
            status: CampaignStatus::Created,
            template_id: req.template_id,
            recipient_ids: dedup(req.recipient_ids),
            owner_id: owner_id.map(str::to_string),
            created_at: Utc::now(),
        };

        let mut tx = self.db_pool.begin().await?;
        ensure_references(&mut *tx, campaign.template_id.as_deref(), &campaign.recipient_ids)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, start_time, end_time, periodicity, status,
                template_id, owner_id, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&campaign.id)
        .bind(campaign.start_time.to_rfc3339())
        .bind(campaign.end_time.to_rfc3339())
        .bind(campaign.periodicity.as_str())
        .bind(campaign.status.as_str())
        .bind(&campaign.template_id)
        .bind(&campaign.owner_id)
        .bind(campaign.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        replace_recipients(&mut *tx, &campaign.id, &campaign.recipient_ids).await?;
        tx.commit().await?;

        Ok(campaign)
    }

    pub async fn get_campaign(&self, id: &str) -> StoreResult<Campaign> {
        let row = sqlx::query(
            r#"
            SELECT id, start_time, end_time, periodicity, status,
                   template_id, owner_id, created_at
            FROM campaigns
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| StoreError::not_found("campaign", id))?;

        let recipient_ids = self.campaign_recipient_ids(id).await?;
        campaign_from_row(&row, recipient_ids)
    }

    pub async fn list_campaigns(&self, owner_id: Option<&str>) -> StoreResult<Vec<Campaign>> {
        let rows = sqlx::query(
            r#"
            SELECT id, start_time, end_time, periodicity, status,
                   template_id, owner_id, created_at
            FROM campaigns
            WHERE ?1 IS NULL OR owner_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db_pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id")?;
            let recipient_ids = self.campaign_recipient_ids(&id).await?;
            result.push(campaign_from_row(row, recipient_ids)?);
        }
        Ok(result)
    }

    /// Cambia ventana, periodicidad, plantilla o destinatarios. El estado no se toca.
    pub async fn update_campaign(
        &self,
        id: &str,
        req: UpdateCampaignRequest,
    ) -> StoreResult<Campaign> {
        let mut campaign = self.get_campaign(id).await?;
        if let Some(start_time) = req.start_time {
            campaign.start_time = start_time;
        }
        if let Some(end_time) = req.end_time {
            campaign.end_time = end_time;
        }
        if campaign.end_time <= campaign.start_time {
            return Err(StoreError::InvalidWindow);
        }
        if let Some(periodicity) = req.periodicity {
            campaign.periodicity = periodicity;
        }
        if let Some(template_id) = req.template_id {
            campaign.template_id = template_id;
        }
        if let Some(recipient_ids) = req.recipient_ids {
            campaign.recipient_ids = dedup(recipient_ids);
        }

        let mut tx = self.db_pool.begin().await?;
        ensure_references(&mut *tx, campaign.template_id.as_deref(), &campaign.recipient_ids)
            .await?;

        sqlx::query(
            r#"
            UPDATE campaigns
            SET start_time = ?2, end_time = ?3, periodicity = ?4, template_id = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&campaign.id)
        .bind(campaign.start_time.to_rfc3339())
        .bind(campaign.end_time.to_rfc3339())
        .bind(campaign.periodicity.as_str())
        .bind(&campaign.template_id)
        .execute(&mut *tx)
        .await?;

        replace_recipients(&mut *tx, &campaign.id, &campaign.recipient_ids).await?;
        tx.commit().await?;

        Ok(campaign)
    }

    pub async fn delete_campaign(&self, id: &str) -> StoreResult<()> {
        let done = sqlx::query("DELETE FROM campaigns WHERE id = ?1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::not_found("campaign", id));
        }
        Ok(())
    }

    /// Escritura del runner: solo estado y `start_time`.
    pub async fn save_schedule(&self, campaign: &Campaign) -> StoreResult<()> {
        let done = sqlx::query("UPDATE campaigns SET status = ?2, start_time = ?3 WHERE id = ?1")
            .bind(&campaign.id)
            .bind(campaign.status.as_str())
            .bind(campaign.start_time.to_rfc3339())
            .execute(&self.db_pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::not_found("campaign", &campaign.id));
        }
        Ok(())
    }

    /// Ids de todas las campañas, en orden de creación. Solo lee la columna
    /// `id`, así una fila corrupta no impide listar las demás.
    pub async fn dispatch_campaign_ids(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM campaigns ORDER BY created_at, id")
            .fetch_all(&self.db_pool)
            .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("id").map_err(StoreError::from))
            .collect()
    }

    /// Una campaña con su plantilla y sus destinatarios.
    pub async fn load_dispatch_plan(&self, campaign_id: &str) -> StoreResult<DispatchPlan> {
        let campaign = self.get_campaign(campaign_id).await?;

        let template = match campaign.template_id.as_deref() {
            Some(template_id) => Some(self.get_template(template_id).await?),
            None => None,
        };

        let rows = sqlx::query(
            r#"
            SELECT r.id, r.email, r.full_name, r.comment, r.owner_id, r.created_at
            FROM recipients r
            JOIN campaign_recipients cr ON cr.recipient_id = r.id
            WHERE cr.campaign_id = ?1
            ORDER BY r.created_at, r.id
            "#,
        )
        .bind(&campaign.id)
        .fetch_all(&self.db_pool)
        .await?;
        let recipients = rows
            .iter()
            .map(recipient_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(DispatchPlan {
            campaign,
            template,
            recipients,
        })
    }

    async fn campaign_recipient_ids(&self, campaign_id: &str) -> StoreResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT recipient_id FROM campaign_recipients WHERE campaign_id = ?1 ORDER BY recipient_id",
        )
        .bind(campaign_id)
        .fetch_all(&self.db_pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("recipient_id").map_err(StoreError::from))
            .collect()
    }

    // ======================================================
    // Logs de envío (solo se agregan)
    // ======================================================

    pub async fn append_log(&self, entry: &DispatchLogEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dispatch_logs (
                id, success, attempt_time, response, campaign_id, recipient_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.success)
        .bind(entry.attempt_time.to_rfc3339())
        .bind(&entry.response)
        .bind(&entry.campaign_id)
        .bind(&entry.recipient_id)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    /// Más recientes primero.
    pub async fn list_logs(&self, campaign_id: Option<&str>) -> StoreResult<Vec<DispatchLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, success, attempt_time, response, campaign_id, recipient_id
            FROM dispatch_logs
            WHERE ?1 IS NULL OR campaign_id = ?1
            ORDER BY attempt_time DESC, rowid DESC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.db_pool)
        .await?;

        rows.iter()
            .map(|r| -> StoreResult<DispatchLogEntry> {
                Ok(DispatchLogEntry {
                    id: r.try_get("id")?,
                    success: r.try_get("success")?,
                    attempt_time: parse_ts(&r.try_get::<String, _>("attempt_time")?)?,
                    response: r.try_get("response")?,
                    campaign_id: r.try_get("campaign_id")?,
                    recipient_id: r.try_get("recipient_id")?,
                })
            })
            .collect()
    }

    /// Cuántos intentos salieron bien y cuántos no, con el mismo filtro que `list_logs`.
    pub async fn count_logs(&self, campaign_id: Option<&str>) -> StoreResult<LogCounts> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(CASE WHEN success = 1 THEN 1 ELSE 0 END), 0) AS successful
            FROM dispatch_logs
            WHERE ?1 IS NULL OR campaign_id = ?1
            "#,
        )
        .bind(campaign_id)
        .fetch_one(&self.db_pool)
        .await?;

        let total: i64 = row.try_get("total")?;
        let successful: i64 = row.try_get("successful")?;
        Ok(LogCounts {
            total_count: total,
            successful_count: successful,
            unsuccessful_count: total - successful,
        })
    }
}

// ========================================================================
// Helpers
// ========================================================================

async fn ensure_references(
    conn: &mut SqliteConnection,
    template_id: Option<&str>,
    recipient_ids: &[String],
) -> StoreResult<()> {
    if let Some(template_id) = template_id {
        let found = sqlx::query("SELECT 1 FROM message_templates WHERE id = ?1")
            .bind(template_id)
            .fetch_optional(&mut *conn)
            .await?;
        if found.is_none() {
            return Err(StoreError::UnknownReference {
                entity: "template",
                id: template_id.to_string(),
            });
        }
    }

    for recipient_id in recipient_ids {
        let found = sqlx::query("SELECT 1 FROM recipients WHERE id = ?1")
            .bind(recipient_id)
            .fetch_optional(&mut *conn)
            .await?;
        if found.is_none() {
            return Err(StoreError::UnknownReference {
                entity: "recipient",
                id: recipient_id.clone(),
            });
        }
    }
    Ok(())
}

async fn replace_recipients(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    recipient_ids: &[String],
) -> StoreResult<()> {
    sqlx::query("DELETE FROM campaign_recipients WHERE campaign_id = ?1")
        .bind(campaign_id)
        .execute(&mut *conn)
        .await?;

    for recipient_id in recipient_ids {
        sqlx::query("INSERT INTO campaign_recipients (campaign_id, recipient_id) VALUES (?1, ?2)")
            .bind(campaign_id)
            .bind(recipient_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn recipient_from_row(row: &SqliteRow) -> StoreResult<Recipient> {
    Ok(Recipient {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        comment: row.try_get("comment")?,
        owner_id: row.try_get("owner_id")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
    })
}

fn template_from_row(row: &SqliteRow) -> StoreResult<MessageTemplate> {
    Ok(MessageTemplate {
        id: row.try_get("id")?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        owner_id: row.try_get("owner_id")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
    })
}

fn campaign_from_row(row: &SqliteRow, recipient_ids: Vec<String>) -> StoreResult<Campaign> {
    let periodicity: String = row.try_get("periodicity")?;
    let status: String = row.try_get("status")?;

    Ok(Campaign {
        id: row.try_get("id")?,
        start_time: parse_ts(&row.try_get::<String, _>("start_time")?)?,
        end_time: parse_ts(&row.try_get::<String, _>("end_time")?)?,
        periodicity: periodicity.parse().map_err(StoreError::Corrupt)?,
        status: status.parse().map_err(StoreError::Corrupt)?,
        template_id: row.try_get("template_id")?,
        recipient_ids,
        owner_id: row.try_get("owner_id")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
    })
}

fn parse_ts(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{raw}': {e}")))
}

fn normalize_address(raw: &str) -> StoreResult<String> {
    let trimmed = raw.trim();
    trimmed
        .parse::<lettre::Address>()
        .map(|addr| addr.to_string())
        .map_err(|_| StoreError::InvalidAddress(trimmed.to_string()))
}

fn validate_subject(subject: String) -> StoreResult<String> {
    let len = subject.chars().count();
    if len == 0 || len > MAX_SUBJECT_CHARS {
        return Err(StoreError::InvalidSubject(MAX_SUBJECT_CHARS));
    }
    Ok(subject)
}

fn duplicate_or(err: sqlx::Error, email: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::DuplicateAddress(email.to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn dedup(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids.dedup();
    ids
}
