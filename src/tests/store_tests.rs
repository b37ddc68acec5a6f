//! tests/store_tests.rs
//! Pruebas de `MailingStore` contra SQLite en memoria.

#[cfg(test)]
mod tests {
    use actix_rt::test;
    use uuid::Uuid;

    use crate::error::StoreError;
    use crate::models::campaign_model::{
        CampaignStatus, CreateCampaignRequest, Periodicity, UpdateCampaignRequest,
    };
    use crate::models::dispatch_log_model::{DispatchLogEntry, DispatchLogView};
    use crate::models::recipient_model::{CreateRecipientRequest, UpdateRecipientRequest};
    use crate::models::template_model::CreateTemplateRequest;
    use crate::tests::{add_recipient, add_template, memory_store, ts};

    fn window(template_id: Option<String>, recipient_ids: Vec<String>) -> CreateCampaignRequest {
        CreateCampaignRequest {
            start_time: ts(2024, 1, 1, 0),
            end_time: ts(2024, 1, 31, 0),
            periodicity: Periodicity::Daily,
            template_id,
            recipient_ids,
        }
    }

    fn log_for(campaign_id: &str, recipient_id: &str) -> DispatchLogEntry {
        DispatchLogEntry {
            id: Uuid::new_v4().to_string(),
            success: true,
            attempt_time: ts(2024, 1, 15, 0),
            response: "delivery accepted".to_string(),
            campaign_id: Some(campaign_id.to_string()),
            recipient_id: Some(recipient_id.to_string()),
        }
    }

    #[test]
    async fn recipient_address_is_unique() {
        let store = memory_store().await;
        add_recipient(&store, "a@example.com", Some("u1")).await;

        let err = store
            .create_recipient(
                Some("u2"),
                CreateRecipientRequest {
                    email: " a@example.com ".to_string(),
                    full_name: "Otra".to_string(),
                    comment: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateAddress(addr) if addr == "a@example.com"));
    }

    #[test]
    async fn invalid_address_is_rejected() {
        let store = memory_store().await;
        let err = store
            .create_recipient(
                None,
                CreateRecipientRequest {
                    email: "sin-arroba".to_string(),
                    full_name: "X".to_string(),
                    comment: Some("nota".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidAddress(_)));
    }

    #[test]
    async fn update_recipient_keeps_untouched_fields() {
        let store = memory_store().await;
        let r = add_recipient(&store, "a@example.com", Some("u1")).await;

        let updated = store
            .update_recipient(
                &r.id,
                UpdateRecipientRequest {
                    full_name: Some("Nuevo Nombre".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "a@example.com");
        assert_eq!(updated.full_name, "Nuevo Nombre");
        assert_eq!(updated.owner_id.as_deref(), Some("u1"));
    }

    #[test]
    async fn recipients_are_filtered_by_owner() {
        let store = memory_store().await;
        add_recipient(&store, "a@example.com", Some("u1")).await;
        add_recipient(&store, "b@example.com", Some("u2")).await;

        assert_eq!(store.list_recipients(None).await.unwrap().len(), 2);
        let mine = store.list_recipients(Some("u1")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].email, "a@example.com");
    }

    #[test]
    async fn long_subject_is_rejected() {
        let store = memory_store().await;
        let err = store
            .create_template(
                None,
                CreateTemplateRequest {
                    subject: "x".repeat(31),
                    body: "cuerpo".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSubject(30)));
    }

    #[test]
    async fn campaign_window_must_be_ordered() {
        let store = memory_store().await;
        let mut req = window(None, vec![]);
        req.end_time = req.start_time;

        let err = store.create_campaign(None, req).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidWindow));
    }

    #[test]
    async fn campaign_rejects_unknown_references() {
        let store = memory_store().await;

        let err = store
            .create_campaign(None, window(None, vec!["missing".to_string()]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownReference { entity: "recipient", .. }));

        let err = store
            .create_campaign(None, window(Some("missing".to_string()), vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownReference { entity: "template", .. }));
        assert!(store.list_campaigns(None).await.unwrap().is_empty());
    }

    #[test]
    async fn new_campaign_starts_as_created_with_its_recipients() {
        let store = memory_store().await;
        let a = add_recipient(&store, "a@example.com", None).await;
        let template = add_template(&store, "Hola").await;

        let c = store
            .create_campaign(
                Some("u1"),
                window(Some(template.id.clone()), vec![a.id.clone(), a.id.clone()]),
            )
            .await
            .unwrap();

        let stored = store.get_campaign(&c.id).await.unwrap();
        assert_eq!(stored.status, CampaignStatus::Created);
        assert_eq!(stored.recipient_ids, vec![a.id]);
        assert_eq!(stored.template_id, Some(template.id));
        assert_eq!(stored.owner_id.as_deref(), Some("u1"));
    }

    #[test]
    async fn update_campaign_can_clear_template_and_swap_recipients() {
        let store = memory_store().await;
        let a = add_recipient(&store, "a@example.com", None).await;
        let b = add_recipient(&store, "b@example.com", None).await;
        let template = add_template(&store, "Hola").await;
        let c = store
            .create_campaign(None, window(Some(template.id), vec![a.id]))
            .await
            .unwrap();

        let updated = store
            .update_campaign(
                &c.id,
                UpdateCampaignRequest {
                    template_id: Some(None),
                    recipient_ids: Some(vec![b.id.clone()]),
                    periodicity: Some(Periodicity::Monthly),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.template_id, None);
        let stored = store.get_campaign(&c.id).await.unwrap();
        assert_eq!(stored.recipient_ids, vec![b.id]);
        assert_eq!(stored.periodicity, Periodicity::Monthly);
        assert_eq!(stored.status, CampaignStatus::Created);
    }

    #[test]
    async fn deleted_recipient_leaves_a_dangling_log_reference() {
        let store = memory_store().await;
        let a = add_recipient(&store, "a@example.com", None).await;
        let c = store
            .create_campaign(None, window(None, vec![a.id.clone()]))
            .await
            .unwrap();
        store.append_log(&log_for(&c.id, &a.id)).await.unwrap();

        store.delete_recipient(&a.id).await.unwrap();

        let logs = store.list_logs(None).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].recipient_id, None);
        assert_eq!(logs[0].campaign_id.as_deref(), Some(c.id.as_str()));
        assert!(store.get_campaign(&c.id).await.unwrap().recipient_ids.is_empty());

        let view = DispatchLogView::from(logs[0].clone());
        assert_eq!(view.recipient, "unknown");
    }

    #[test]
    async fn deleting_a_template_removes_its_campaigns_but_not_the_logs() {
        let store = memory_store().await;
        let a = add_recipient(&store, "a@example.com", None).await;
        let template = add_template(&store, "Hola").await;
        let c = store
            .create_campaign(None, window(Some(template.id.clone()), vec![a.id.clone()]))
            .await
            .unwrap();
        store.append_log(&log_for(&c.id, &a.id)).await.unwrap();

        store.delete_template(&template.id).await.unwrap();

        assert!(matches!(
            store.get_campaign(&c.id).await,
            Err(StoreError::NotFound { entity: "campaign", .. })
        ));
        let logs = store.list_logs(None).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].campaign_id, None);
        assert_eq!(logs[0].recipient_id.as_deref(), Some(a.id.as_str()));
    }

    #[test]
    async fn logs_can_be_filtered_by_campaign() {
        let store = memory_store().await;
        let a = add_recipient(&store, "a@example.com", None).await;
        let c1 = store
            .create_campaign(None, window(None, vec![a.id.clone()]))
            .await
            .unwrap();
        let c2 = store
            .create_campaign(None, window(None, vec![a.id.clone()]))
            .await
            .unwrap();
        store.append_log(&log_for(&c1.id, &a.id)).await.unwrap();
        store.append_log(&log_for(&c2.id, &a.id)).await.unwrap();
        store.append_log(&log_for(&c2.id, &a.id)).await.unwrap();

        assert_eq!(store.list_logs(Some(&c1.id)).await.unwrap().len(), 1);
        assert_eq!(store.list_logs(Some(&c2.id)).await.unwrap().len(), 2);
        assert_eq!(store.list_logs(None).await.unwrap().len(), 3);
    }

    #[test]
    async fn deleting_missing_rows_is_not_found() {
        let store = memory_store().await;
        assert!(matches!(
            store.delete_campaign("nope").await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_recipient("nope").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    async fn saving_the_schedule_of_a_deleted_campaign_is_not_found() {
        let store = memory_store().await;
        let c = store.create_campaign(None, window(None, vec![])).await.unwrap();
        store.delete_campaign(&c.id).await.unwrap();

        assert!(matches!(
            store.save_schedule(&c).await,
            Err(StoreError::NotFound { entity: "campaign", .. })
        ));
        assert!(store.list_campaigns(None).await.unwrap().is_empty());
    }

    #[test]
    async fn log_counts_split_success_and_failure() {
        let store = memory_store().await;
        let a = add_recipient(&store, "a@example.com", None).await;
        let c = store
            .create_campaign(None, window(None, vec![a.id.clone()]))
            .await
            .unwrap();
        store.append_log(&log_for(&c.id, &a.id)).await.unwrap();
        for _ in 0..2 {
            let mut failed = log_for(&c.id, &a.id);
            failed.success = false;
            store.append_log(&failed).await.unwrap();
        }

        let counts = store.count_logs(None).await.unwrap();
        assert_eq!(counts.total_count, 3);
        assert_eq!(counts.successful_count, 1);
        assert_eq!(counts.unsuccessful_count, 2);

        let empty = store.count_logs(Some("missing")).await.unwrap();
        assert_eq!(empty, Default::default());
    }
}
