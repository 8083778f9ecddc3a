use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![AppointmentStatus::Confirmed, AppointmentStatus::Declined],
            // Terminal states
            AppointmentStatus::Confirmed | AppointmentStatus::Declined => vec![],
        }
    }

    pub fn is_terminal(&self, status: AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const ALL: [AppointmentStatus; 3] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Declined,
    ];

    #[test]
    fn pending_can_be_confirmed_or_declined() {
        let lifecycle = AppointmentLifecycleService::new();

        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Confirmed)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Declined)
            .is_ok());
    }

    #[test]
    fn terminal_states_never_move() {
        let lifecycle = AppointmentLifecycleService::new();

        for from in [AppointmentStatus::Confirmed, AppointmentStatus::Declined] {
            assert!(lifecycle.is_terminal(from));
            for to in ALL {
                assert_matches!(
                    lifecycle.validate_status_transition(from, to),
                    Err(AppointmentError::InvalidStatusTransition { .. })
                );
            }
        }
    }

    #[test]
    fn pending_cannot_stay_pending() {
        let lifecycle = AppointmentLifecycleService::new();

        assert!(!lifecycle.is_terminal(AppointmentStatus::Pending));
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Pending)
            .is_err());
    }
}
