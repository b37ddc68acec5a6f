//! services/dispatch_service.rs
//! Pasada de envío: evalúa cada campaña contra `now`, envía, registra y reprograma.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::campaign_model::CampaignStatus;
use crate::models::dispatch_log_model::{
    DispatchLogEntry, DispatchPlan, DispatchSummary, DELIVERY_ACCEPTED,
};
use crate::services::email_service::MailTransport;
use crate::services::store_service::MailingStore;

#[derive(Clone)]
pub struct DispatchService {
    store: MailingStore,
    transport: Arc<dyn MailTransport>,
    from_address: String,
    // Serializa las pasadas dentro del proceso (estado leído-modificado-escrito).
    run_lock: Arc<Mutex<()>>,
}

impl DispatchService {
    pub fn new(
        store: MailingStore,
        transport: Arc<dyn MailTransport>,
        from_address: String,
    ) -> Self {
        Self {
            store,
            transport,
            from_address,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Una pasada completa. Nunca falla hacia quien la dispara: los errores
    /// quedan como logs de envío o en los contadores del resumen.
    pub async fn run_once(&self, now: DateTime<Utc>) -> DispatchSummary {
        let _guard = self.run_lock.lock().await;
        let mut summary = DispatchSummary::default();

        let campaign_ids = match self.store.dispatch_campaign_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("(run_once) Could not list campaigns: {}", e);
                summary.store_errors += 1;
                return summary;
            }
        };

        log::info!(
            "(run_once) Evaluando {} campañas a las {}",
            campaign_ids.len(),
            now.to_rfc3339()
        );

        for campaign_id in &campaign_ids {
            summary.campaigns_seen += 1;
            // Una campaña que no carga se cuenta y se salta; las demás siguen.
            match self.store.load_dispatch_plan(campaign_id).await {
                Ok(plan) => self.process_campaign(plan, now, &mut summary).await,
                Err(e) => {
                    log::error!("(run_once) Could not load campaign {}: {}", campaign_id, e);
                    summary.store_errors += 1;
                }
            }
        }

        log::info!("(run_once) Resumen: {:?}", summary);
        summary
    }

    async fn process_campaign(
        &self,
        plan: DispatchPlan,
        now: DateTime<Utc>,
        summary: &mut DispatchSummary,
    ) {
        let DispatchPlan {
            mut campaign,
            template,
            recipients,
        } = plan;

        match campaign.derived_status(now) {
            Some(CampaignStatus::Started) => {
                campaign.status = CampaignStatus::Started;
                summary.started += 1;

                if let Some(template) = template {
                    let (success, response) = if recipients.is_empty() {
                        // Nada a quien enviar: no hay llamada ni filas de log.
                        (true, DELIVERY_ACCEPTED.to_string())
                    } else {
                        let addresses: Vec<String> =
                            recipients.iter().map(|r| r.email.clone()).collect();
                        summary.sends_attempted += 1;

                        match self
                            .transport
                            .send(
                                &template.subject,
                                &template.body,
                                &self.from_address,
                                &addresses,
                            )
                            .await
                        {
                            Ok(()) => (true, DELIVERY_ACCEPTED.to_string()),
                            Err(e) => {
                                log::warn!(
                                    "(run_once) Send failed for campaign {}: {}",
                                    campaign.id,
                                    e
                                );
                                summary.sends_failed += 1;
                                (false, e.to_string())
                            }
                        }
                    };

                    // Un log por destinatario, también cuando el envío falla.
                    for recipient in &recipients {
                        let entry = DispatchLogEntry {
                            id: Uuid::new_v4().to_string(),
                            success,
                            attempt_time: now,
                            response: response.clone(),
                            campaign_id: Some(campaign.id.clone()),
                            recipient_id: Some(recipient.id.clone()),
                        };
                        match self.store.append_log(&entry).await {
                            Ok(()) => summary.log_entries_written += 1,
                            Err(e) => {
                                log::error!(
                                    "(run_once) Could not write log for campaign {} / recipient {}: {}",
                                    campaign.id,
                                    recipient.id,
                                    e
                                );
                                summary.store_errors += 1;
                            }
                        }
                    }

                    // Se reprograma haya salido bien o mal el envío.
                    campaign.start_time = campaign.periodicity.advance(campaign.start_time);
                }
            }
            Some(CampaignStatus::Completed) => {
                campaign.status = CampaignStatus::Completed;
                summary.completed += 1;
            }
            Some(CampaignStatus::Created) => {
                campaign.status = CampaignStatus::Created;
                summary.pending += 1;
            }
            None => {
                summary.unchanged += 1;
            }
        }

        if let Err(e) = self.store.save_schedule(&campaign).await {
            log::error!("(run_once) Could not save campaign {}: {}", campaign.id, e);
            summary.store_errors += 1;
        }
    }

    /// Disparador interno: una pasada cada `every`, hasta que muera el runtime.
    pub fn spawn_ticker(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                service.run_once(Utc::now()).await;
            }
        })
    }
}
