use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use notification_cell::models::{NotificationKind, OutgoingMessage};
use notification_cell::services::NotificationDispatcher;
use patient_cell::models::PatientError;
use patient_cell::services::PatientService;
use shared_database::{Collection, Database, Filter, ListQuery};
use shared_models::ClinicType;
use shared_utils::AppState;

use crate::models::{
    Appointment, AppointmentError, AppointmentFields, AppointmentStatus, BookAppointmentRequest,
    DashboardStats, PatientSnapshot,
};
use crate::services::lifecycle::AppointmentLifecycleService;

const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 500;

pub struct AppointmentBookingService {
    db: Database,
    dispatcher: NotificationDispatcher,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self::with_dispatcher(&state.db, NotificationDispatcher::new(state))
    }

    pub fn with_dispatcher(db: &Database, dispatcher: NotificationDispatcher) -> Self {
        Self {
            db: db.clone(),
            dispatcher,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Snapshot of the signed-in patient used to stamp a new booking.
    pub async fn patient_snapshot(
        &self,
        patient_id: Uuid,
        clinic_type: ClinicType,
    ) -> Result<PatientSnapshot, AppointmentError> {
        let patient = PatientService::new(&self.db)
            .get(patient_id)
            .await
            .map_err(|e| match e {
                PatientError::NotFound => AppointmentError::PatientNotFound,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        if !patient.is_active {
            return Err(AppointmentError::Unauthorized);
        }

        Ok(PatientSnapshot {
            patient_id: patient.id,
            name: patient.name.clone(),
            phone: patient.phone.clone(),
            clinic_type,
        })
    }

    /// Book a pending appointment request. Nothing is stored unless the date,
    /// time and clinic are valid.
    pub async fn create(
        &self,
        snapshot: PatientSnapshot,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let (preferred_date, preferred_time) =
            parse_slot(&request.preferred_date, &request.preferred_time)?;

        if !snapshot.clinic_type.is_concrete() {
            return Err(AppointmentError::ValidationError(
                "Appointments are booked at a single clinic".to_string(),
            ));
        }

        let fields = AppointmentFields {
            patient_id: snapshot.patient_id,
            patient_name: snapshot.name,
            phone: snapshot.phone,
            clinic_type: snapshot.clinic_type,
            preferred_date,
            preferred_time: preferred_time.format("%H:%M").to_string(),
            note: request.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            status: AppointmentStatus::Pending,
            decline_reason: None,
        };

        let appointment: Appointment = self.db.create(Collection::Appointments, &fields).await?;
        info!(
            "Appointment {} requested by {} at {} for {} {}",
            appointment.id,
            appointment.patient_id,
            appointment.clinic_type,
            appointment.preferred_date,
            appointment.preferred_time
        );

        self.notify(
            appointment.patient_id,
            OutgoingMessage::new(
                "Appointment Request Received",
                format!(
                    "Your appointment request at {} for {} at {} has been received. We will confirm it shortly.",
                    appointment.clinic_type.display_name(),
                    appointment.preferred_date,
                    appointment.preferred_time
                ),
                NotificationKind::General,
            ),
        )
        .await;

        Ok(appointment)
    }

    pub async fn approve(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .transition(
                appointment_id,
                AppointmentStatus::Confirmed,
                json!({ "status": AppointmentStatus::Confirmed }),
            )
            .await?;

        self.notify(
            appointment.patient_id,
            OutgoingMessage::new(
                "Appointment Confirmed ✅",
                format!(
                    "Your appointment at {} is confirmed for {} at {}. See you soon!",
                    appointment.clinic_type.display_name(),
                    appointment.preferred_date,
                    appointment.preferred_time
                ),
                NotificationKind::Confirmed,
            ),
        )
        .await;

        Ok(appointment)
    }

    /// Decline a pending request. A blank reason is stored as absent.
    pub async fn decline(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());

        let appointment = self
            .transition(
                appointment_id,
                AppointmentStatus::Declined,
                json!({ "status": AppointmentStatus::Declined, "decline_reason": reason }),
            )
            .await?;

        let reason_sentence = match &appointment.decline_reason {
            Some(reason) => format!(" {}.", reason.trim_end_matches('.')),
            None => String::new(),
        };

        self.notify(
            appointment.patient_id,
            OutgoingMessage::new(
                "Appointment Update ❌",
                format!(
                    "Your appointment at {} has been declined.{} Please contact us to reschedule.",
                    appointment.clinic_type.display_name(),
                    reason_sentence
                ),
                NotificationKind::Declined,
            ),
        )
        .await;

        Ok(appointment)
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.db
            .fetch(Collection::Appointments, appointment_id)
            .await
            .map_err(|e| if e.is_not_found() { AppointmentError::NotFound } else { e.into() })
    }

    /// Every appointment of one patient, newest request first.
    pub async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let query = ListQuery::newest_first().filter(Filter::eq("patient_id", patient_id.to_string()));
        Ok(self.db.find(Collection::Appointments, &query).await?)
    }

    /// Confirmed appointments on or after `today`, soonest first.
    pub async fn list_upcoming_confirmed(
        &self,
        patient_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let query = ListQuery::new()
            .filter(Filter::eq("patient_id", patient_id.to_string()))
            .filter(Filter::eq("status", AppointmentStatus::Confirmed.as_str()))
            .filter(Filter::gte("preferred_date", iso_date(today)))
            .order_asc("preferred_date");

        let mut upcoming: Vec<Appointment> = self.db.find(Collection::Appointments, &query).await?;
        upcoming.sort_by(|a, b| {
            (a.preferred_date, &a.preferred_time).cmp(&(b.preferred_date, &b.preferred_time))
        });

        debug!("{} upcoming appointments for {}", upcoming.len(), patient_id);
        Ok(upcoming)
    }

    pub async fn list_all(
        &self,
        status: Option<AppointmentStatus>,
        limit: Option<usize>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let mut query = ListQuery::newest_first().limit(limit);
        if let Some(status) = status {
            query = query.filter(Filter::eq("status", status.as_str()));
        }

        Ok(self.db.find(Collection::Appointments, &query).await?)
    }

    pub async fn dashboard_stats(&self, today: NaiveDate) -> Result<DashboardStats, AppointmentError> {
        let total_patients = self.db.count(Collection::Patients, &[]).await?;
        let pending = self
            .db
            .count(
                Collection::Appointments,
                &[Filter::eq("status", AppointmentStatus::Pending.as_str())],
            )
            .await?;
        let today_confirmed = self
            .db
            .count(
                Collection::Appointments,
                &[
                    Filter::eq("status", AppointmentStatus::Confirmed.as_str()),
                    Filter::eq("preferred_date", iso_date(today)),
                ],
            )
            .await?;

        Ok(DashboardStats {
            total_patients,
            pending,
            today_confirmed,
        })
    }

    /// Move a pending appointment to `target`. The write only applies while the
    /// row is still pending, so concurrent admins cannot both succeed.
    async fn transition(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
        patch: Value,
    ) -> Result<Appointment, AppointmentError> {
        let updated: Option<Appointment> = self
            .db
            .patch_where(
                Collection::Appointments,
                appointment_id,
                vec![Filter::eq("status", AppointmentStatus::Pending.as_str())],
                &patch,
            )
            .await?;

        if let Some(appointment) = updated {
            info!("Appointment {} is now {}", appointment_id, target);
            return Ok(appointment);
        }

        let current = self.get(appointment_id).await?;
        self.lifecycle.validate_status_transition(current.status, target)?;

        error!(
            "Appointment {} still {} after a rejected conditional update",
            appointment_id, current.status
        );
        Err(AppointmentError::DatabaseError(
            "Appointment changed while updating, please retry".to_string(),
        ))
    }

    async fn notify(&self, patient_id: Uuid, message: OutgoingMessage) {
        if let Err(e) = self.dispatcher.notify_one(patient_id, &message).await {
            warn!("Failed to notify patient {} ('{}'): {}", patient_id, message.title, e);
        }
    }
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_slot(date: &str, time: &str) -> Result<(NaiveDate, NaiveTime), AppointmentError> {
    let date = date.trim();
    let time = time.trim();

    if date.is_empty() || time.is_empty() {
        return Err(AppointmentError::ValidationError(
            "Please select date and time".to_string(),
        ));
    }

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        AppointmentError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", date))
    })?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
        AppointmentError::ValidationError(format!("Invalid time '{}', expected HH:MM", time))
    })?;

    Ok((date, time))
}
