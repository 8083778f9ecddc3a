use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use patient_cell::services::PatientService;
use shared_database::{Collection, Database, Filter, ListQuery};
use shared_utils::AppState;

use crate::models::{
    BroadcastReport, DeliveryFailure, Notification, NotificationError, NotificationFields,
    NotificationList, OutgoingMessage,
};
use crate::services::push::{provider_from_config, PushProvider};

const LIST_LIMIT: usize = 50;

/// Writes notification records and pushes them to registered devices.
pub struct NotificationDispatcher {
    db: Database,
    push: Arc<dyn PushProvider>,
    concurrency: usize,
}

impl NotificationDispatcher {
    pub fn new(state: &AppState) -> Self {
        Self::with_provider(
            &state.db,
            provider_from_config(&state.config),
            state.config.broadcast_concurrency,
        )
    }

    pub fn with_provider(db: &Database, push: Arc<dyn PushProvider>, concurrency: usize) -> Self {
        Self {
            db: db.clone(),
            push,
            concurrency: concurrency.max(1),
        }
    }

    /// Record a notification for one patient and push it if they have a device registered.
    /// Push failures are logged, not returned.
    pub async fn notify_one(
        &self,
        patient_id: Uuid,
        message: &OutgoingMessage,
    ) -> Result<Notification, NotificationError> {
        let record = self.store_record(patient_id, message).await?;

        if self.push.is_enabled() {
            match PatientService::new(&self.db).get(patient_id).await {
                Ok(patient) => {
                    if let Err(e) = self.push_to(patient.push_token.as_deref(), message).await {
                        warn!("Push to patient {} failed: {}", patient_id, e);
                    }
                }
                Err(e) => warn!("Could not look up push token for {}: {}", patient_id, e),
            }
        }

        Ok(record)
    }

    /// Deliver to every active patient with bounded parallelism. One failed
    /// recipient never stops the rest.
    pub async fn notify_all(&self, message: &OutgoingMessage) -> Result<BroadcastReport, NotificationError> {
        if message.title.trim().is_empty() || message.message.trim().is_empty() {
            return Err(NotificationError::ValidationError(
                "Title and message are required".to_string(),
            ));
        }

        let recipients = PatientService::new(&self.db)
            .active_patients()
            .await
            .map_err(|e| NotificationError::Recipients(e.to_string()))?;

        info!(
            "Broadcasting '{}' to {} patients (concurrency {})",
            message.title,
            recipients.len(),
            self.concurrency
        );

        let outcomes: Vec<(Uuid, Result<(), NotificationError>)> = stream::iter(recipients.into_iter())
            .map(|patient| async move {
                let result = self.deliver(patient.id, patient.push_token.as_deref(), message).await;
                (patient.id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = BroadcastReport {
            recipients: outcomes.len(),
            ..BroadcastReport::default()
        };

        for (patient_id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Broadcast to patient {} failed: {}", patient_id, e);
                    report.failures.push(DeliveryFailure {
                        patient_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Broadcast finished: {}/{} delivered",
            report.delivered, report.recipients
        );
        Ok(report)
    }

    pub async fn list_for_patient(&self, patient_id: Uuid) -> Result<NotificationList, NotificationError> {
        let query = ListQuery::newest_first()
            .filter(Filter::eq("patient_id", patient_id.to_string()))
            .limit(LIST_LIMIT);
        let notifications: Vec<Notification> = self.db.find(Collection::Notifications, &query).await?;

        let unread_count = self
            .db
            .count(
                Collection::Notifications,
                &[
                    Filter::eq("patient_id", patient_id.to_string()),
                    Filter::eq("is_read", false),
                ],
            )
            .await?;

        Ok(NotificationList {
            notifications,
            unread_count,
        })
    }

    /// Mark one of the patient's own notifications read. Someone else's id is NotFound.
    pub async fn mark_read(&self, patient_id: Uuid, notification_id: Uuid) -> Result<Notification, NotificationError> {
        self.db
            .patch_where(
                Collection::Notifications,
                notification_id,
                vec![Filter::eq("patient_id", patient_id.to_string())],
                &json!({ "is_read": true }),
            )
            .await?
            .ok_or(NotificationError::NotFound)
    }

    pub async fn mark_all_read(&self, patient_id: Uuid) -> Result<usize, NotificationError> {
        let updated = self
            .db
            .patch_matching(
                Collection::Notifications,
                &[
                    Filter::eq("patient_id", patient_id.to_string()),
                    Filter::eq("is_read", false),
                ],
                &json!({ "is_read": true }),
            )
            .await?;

        debug!("Marked {} notifications read for {}", updated, patient_id);
        Ok(updated)
    }

    async fn deliver(
        &self,
        patient_id: Uuid,
        push_token: Option<&str>,
        message: &OutgoingMessage,
    ) -> Result<(), NotificationError> {
        self.store_record(patient_id, message).await?;
        self.push_to(push_token, message).await
    }

    async fn store_record(&self, patient_id: Uuid, message: &OutgoingMessage) -> Result<Notification, NotificationError> {
        let fields = NotificationFields {
            patient_id,
            title: message.title.clone(),
            message: message.message.clone(),
            kind: message.kind,
            is_read: false,
        };

        Ok(self.db.create(Collection::Notifications, &fields).await?)
    }

    async fn push_to(&self, push_token: Option<&str>, message: &OutgoingMessage) -> Result<(), NotificationError> {
        match push_token {
            Some(token) if self.push.is_enabled() => {
                self.push.send(token, &message.title, &message.message).await
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use patient_cell::models::{Patient, RegisterPatientRequest};
    use shared_models::ClinicType;

    use crate::models::NotificationKind;
    use crate::services::push::DisabledPush;

    /// Records every push and fails for one chosen token.
    #[derive(Default)]
    struct RecordingPush {
        failing_token: Option<String>,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PushProvider for RecordingPush {
        fn is_enabled(&self) -> bool {
            true
        }

        async fn send(&self, token: &str, _title: &str, _body: &str) -> Result<(), NotificationError> {
            if self.failing_token.as_deref() == Some(token) {
                return Err(NotificationError::Push("device unreachable".to_string()));
            }
            self.sent.lock().unwrap().push(token.to_string());
            Ok(())
        }
    }

    async fn patient_with_token(db: &Database, name: &str, token: Option<&str>) -> Patient {
        let service = PatientService::new(db);
        let patient = service
            .register(RegisterPatientRequest {
                name: name.to_string(),
                phone: format!("98{}", name.len()),
                access_code: "1234".to_string(),
                clinic_type: ClinicType::Homeopathy,
            })
            .await
            .unwrap();
        service
            .set_push_token(patient.id, token.map(str::to_string))
            .await
            .unwrap()
    }

    fn tip() -> OutgoingMessage {
        OutgoingMessage::new("Health Tip", "Drink warm water", NotificationKind::HealthTip)
    }

    #[tokio::test]
    async fn broadcast_isolates_a_failing_recipient() {
        let db = Database::memory();
        let mut patients = Vec::new();
        for i in 1..=5 {
            let token = format!("token-{}", i);
            patients.push(patient_with_token(&db, &format!("patient-{}", i), Some(&token)).await);
        }
        let push = Arc::new(RecordingPush {
            failing_token: Some("token-3".to_string()),
            ..RecordingPush::default()
        });
        let dispatcher = NotificationDispatcher::with_provider(&db, push.clone(), 2);

        let report = dispatcher.notify_all(&tip()).await.unwrap();

        assert_eq!(report.recipients, 5);
        assert_eq!(report.delivered, 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].patient_id, patients[2].id);
        assert_eq!(push.sent.lock().unwrap().len(), 4);

        for patient in &patients {
            let list = dispatcher.list_for_patient(patient.id).await.unwrap();
            assert_eq!(list.notifications.len(), 1);
            assert_eq!(list.notifications[0].kind, NotificationKind::HealthTip);
        }
    }

    #[tokio::test]
    async fn broadcast_runs_on_a_spawned_task() {
        let db = Database::memory();
        patient_with_token(&db, "asha", Some("token-a")).await;
        patient_with_token(&db, "ravi", Some("token-r")).await;
        let push = Arc::new(RecordingPush::default());
        let dispatcher = Arc::new(NotificationDispatcher::with_provider(&db, push.clone(), 2));

        let task = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.notify_all(&tip()).await }
        });
        let report = task.await.unwrap().unwrap();

        assert_eq!(report.delivered, 2);
        assert_eq!(push.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn broadcast_skips_inactive_patients() {
        let db = Database::memory();
        patient_with_token(&db, "active", None).await;
        let inactive = patient_with_token(&db, "inactive", None).await;
        PatientService::new(&db).set_active(inactive.id, false).await.unwrap();

        let dispatcher = NotificationDispatcher::with_provider(&db, Arc::new(RecordingPush::default()), 4);
        let report = dispatcher.notify_all(&tip()).await.unwrap();

        assert_eq!(report.recipients, 1);
        assert_eq!(report.delivered, 1);
        assert!(dispatcher.list_for_patient(inactive.id).await.unwrap().notifications.is_empty());
    }

    #[tokio::test]
    async fn broadcast_requires_title_and_message() {
        let dispatcher = NotificationDispatcher::with_provider(
            &Database::memory(),
            Arc::new(DisabledPush),
            4,
        );

        let result = dispatcher
            .notify_all(&OutgoingMessage::new(" ", "body", NotificationKind::General))
            .await;

        assert_matches!(result, Err(NotificationError::ValidationError(_)));
    }

    #[tokio::test]
    async fn notify_one_survives_push_failure() {
        let db = Database::memory();
        let patient = patient_with_token(&db, "asha", Some("token-x")).await;
        let push = Arc::new(RecordingPush {
            failing_token: Some("token-x".to_string()),
            ..RecordingPush::default()
        });
        let dispatcher = NotificationDispatcher::with_provider(&db, push, 4);

        let record = dispatcher
            .notify_one(patient.id, &OutgoingMessage::new("Hi", "Hello", NotificationKind::General))
            .await
            .unwrap();

        assert_eq!(record.patient_id, patient.id);
        assert!(!record.is_read);
    }

    #[tokio::test]
    async fn disabled_provider_still_records() {
        let db = Database::memory();
        let patient = patient_with_token(&db, "asha", Some("token-x")).await;
        let dispatcher = NotificationDispatcher::with_provider(&db, Arc::new(DisabledPush), 4);

        dispatcher
            .notify_one(patient.id, &OutgoingMessage::new("Hi", "Hello", NotificationKind::General))
            .await
            .unwrap();

        assert_eq!(dispatcher.list_for_patient(patient.id).await.unwrap().unread_count, 1);
    }

    #[tokio::test]
    async fn mark_all_read_clears_unread() {
        let db = Database::memory();
        let patient = patient_with_token(&db, "asha", None).await;
        let dispatcher = NotificationDispatcher::with_provider(&db, Arc::new(RecordingPush::default()), 4);
        for i in 0..3 {
            dispatcher
                .notify_one(patient.id, &OutgoingMessage::new(format!("n{}", i), "m", NotificationKind::General))
                .await
                .unwrap();
        }

        assert_eq!(dispatcher.mark_all_read(patient.id).await.unwrap(), 3);
        assert_eq!(dispatcher.mark_all_read(patient.id).await.unwrap(), 0);

        let list = dispatcher.list_for_patient(patient.id).await.unwrap();
        assert_eq!(list.unread_count, 0);
        assert_eq!(list.notifications.len(), 3);
        assert_eq!(list.notifications[0].title, "n2");
    }

    #[tokio::test]
    async fn mark_read_is_scoped_to_the_owner() {
        let db = Database::memory();
        let asha = patient_with_token(&db, "asha", None).await;
        let ravi = patient_with_token(&db, "ravi", None).await;
        let dispatcher = NotificationDispatcher::with_provider(&db, Arc::new(RecordingPush::default()), 4);
        let record = dispatcher
            .notify_one(asha.id, &OutgoingMessage::new("Hi", "Hello", NotificationKind::General))
            .await
            .unwrap();

        assert_matches!(
            dispatcher.mark_read(ravi.id, record.id).await,
            Err(NotificationError::NotFound)
        );

        let read = dispatcher.mark_read(asha.id, record.id).await.unwrap();
        assert!(read.is_read);
        let again = dispatcher.mark_read(asha.id, record.id).await.unwrap();
        assert!(again.is_read);
    }
}
