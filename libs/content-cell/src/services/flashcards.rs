use tracing::{info, warn};
use uuid::Uuid;

use notification_cell::models::{NotificationKind, OutgoingMessage};
use notification_cell::NotificationDispatcher;
use shared_database::{Collection, Database, Filter, ListQuery};
use shared_models::ClinicType;
use shared_utils::AppState;

use super::next_display_order;
use crate::models::{
    ContentError, CreateFlashcardRequest, Flashcard, FlashcardCreated, FlashcardFields,
};

/// Health tip cards shown in the app, announced to patients when added.
pub struct FlashcardService {
    db: Database,
    dispatcher: NotificationDispatcher,
}

impl FlashcardService {
    pub fn new(state: &AppState) -> Self {
        Self::with_dispatcher(&state.db, NotificationDispatcher::new(state))
    }

    pub fn with_dispatcher(db: &Database, dispatcher: NotificationDispatcher) -> Self {
        Self {
            db: db.clone(),
            dispatcher,
        }
    }

    /// Active cards in display order. A clinic sees its own cards and shared ones;
    /// `search` matches the title case-insensitively.
    pub async fn list(
        &self,
        clinic_type: Option<ClinicType>,
        search: Option<&str>,
    ) -> Result<Vec<Flashcard>, ContentError> {
        let mut query = ListQuery::new()
            .filter(Filter::eq("is_active", true))
            .order_asc("display_order");

        if let Some(clinic) = clinic_type {
            let scopes = clinic.visible_scopes().into_iter().map(|c| c.as_str());
            query = query.filter(Filter::any_of("clinic_type", scopes));
        }

        let cards: Vec<Flashcard> = self.db.find(Collection::Flashcards, &query).await?;

        let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
        Ok(match needle {
            Some(needle) => cards
                .into_iter()
                .filter(|card| card.title.to_lowercase().contains(&needle))
                .collect(),
            None => cards,
        })
    }

    /// Save a card and broadcast it as a health tip. The card is kept even
    /// when the broadcast cannot run.
    pub async fn create(&self, request: CreateFlashcardRequest) -> Result<FlashcardCreated, ContentError> {
        let title = request.title.trim();
        let back_content = request.back_content.trim();
        if title.is_empty() || back_content.is_empty() {
            return Err(ContentError::ValidationError(
                "Title and back content required".to_string(),
            ));
        }

        let display_order = next_display_order(&self.db, Collection::Flashcards).await?;
        let fields = FlashcardFields {
            title: title.to_string(),
            front_description: trimmed_or_empty(request.front_description),
            back_content: back_content.to_string(),
            front_image_url: trimmed_or_empty(request.front_image_url),
            clinic_type: request.clinic_type,
            display_order,
            is_active: true,
        };

        let flashcard: Flashcard = self.db.create(Collection::Flashcards, &fields).await?;
        info!("Flashcard {} '{}' created", flashcard.id, flashcard.title);

        let message = OutgoingMessage::new(
            "💡 New Health Tip Added!",
            format!(
                "Check out the new health tip: \"{}\" in the Health Tips section.",
                flashcard.title
            ),
            NotificationKind::HealthTip,
        );

        let broadcast = match self.dispatcher.notify_all(&message).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Health tip broadcast for flashcard {} failed: {}", flashcard.id, e);
                None
            }
        };

        Ok(FlashcardCreated { flashcard, broadcast })
    }

    pub async fn delete(&self, flashcard_id: Uuid) -> Result<(), ContentError> {
        self.db
            .remove(Collection::Flashcards, flashcard_id)
            .await
            .map_err(|e| if e.is_not_found() { ContentError::NotFound("Flashcard") } else { e.into() })?;

        info!("Flashcard {} deleted", flashcard_id);
        Ok(())
    }
}

fn trimmed_or_empty(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use notification_cell::services::DisabledPush;
    use patient_cell::models::RegisterPatientRequest;
    use patient_cell::services::PatientService;

    fn service(db: &Database) -> FlashcardService {
        let dispatcher = NotificationDispatcher::with_provider(db, Arc::new(DisabledPush), 2);
        FlashcardService::with_dispatcher(db, dispatcher)
    }

    fn card(title: &str, clinic_type: ClinicType) -> CreateFlashcardRequest {
        CreateFlashcardRequest {
            title: title.to_string(),
            front_description: Some("Tap to read".to_string()),
            back_content: "Drink water before meals.".to_string(),
            front_image_url: None,
            clinic_type,
        }
    }

    #[tokio::test]
    async fn new_card_is_announced_to_active_patients() {
        let db = Database::memory();
        let patients = PatientService::new(&db);
        for (name, phone) in [("Asha", "9000000001"), ("Ravi", "9000000002")] {
            patients
                .register(RegisterPatientRequest {
                    name: name.to_string(),
                    phone: phone.to_string(),
                    access_code: "1234".to_string(),
                    clinic_type: ClinicType::Homeopathy,
                })
                .await
                .unwrap();
        }

        let created = service(&db).create(card("Hydration", ClinicType::Both)).await.unwrap();

        assert_eq!(created.flashcard.display_order, 0);
        let report = created.broadcast.unwrap();
        assert_eq!(report.recipients, 2);
        assert_eq!(report.delivered, 2);
    }

    #[tokio::test]
    async fn clinic_filter_includes_shared_cards_and_search_matches_title() {
        let db = Database::memory();
        let service = service(&db);
        service.create(card("Sleep hygiene", ClinicType::Homeopathy)).await.unwrap();
        service.create(card("Protein basics", ClinicType::LeanLife)).await.unwrap();
        service.create(card("Morning walk", ClinicType::Both)).await.unwrap();

        let leanlife = service.list(Some(ClinicType::LeanLife), None).await.unwrap();
        let titles: Vec<_> = leanlife.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Protein basics", "Morning walk"]);

        let found = service.list(None, Some("SLEEP")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Sleep hygiene");

        assert_eq!(service.list(None, Some("  ")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn title_and_back_content_are_required() {
        let db = Database::memory();
        let mut request = card("  ", ClinicType::Homeopathy);

        assert_matches!(
            service(&db).create(request.clone()).await,
            Err(ContentError::ValidationError(msg)) if msg == "Title and back content required"
        );

        request.title = "Fibre".to_string();
        request.back_content = String::new();
        assert_matches!(service(&db).create(request).await, Err(ContentError::ValidationError(_)));
        assert_eq!(db.count(Collection::Flashcards, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn card_added_after_a_delete_still_goes_last() {
        let db = Database::memory();
        let service = service(&db);
        let first = service.create(card("Sleep", ClinicType::Both)).await.unwrap().flashcard;
        let last = service.create(card("Walk", ClinicType::Both)).await.unwrap().flashcard;

        service.delete(first.id).await.unwrap();
        let added = service.create(card("Fibre", ClinicType::Both)).await.unwrap().flashcard;

        assert!(added.display_order > last.display_order);
        let titles: Vec<_> = service
            .list(None, None)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.data.title)
            .collect();
        assert_eq!(titles, vec!["Walk", "Fibre"]);
    }

    #[tokio::test]
    async fn deleting_a_missing_card_is_not_found() {
        let db = Database::memory();
        assert_matches!(
            service(&db).delete(Uuid::new_v4()).await,
            Err(ContentError::NotFound("Flashcard"))
        );
    }
}
