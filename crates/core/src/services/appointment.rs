//! Appointment booking and review.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use owr_common::{AppError, AppResult, IdGenerator};
use owr_db::{
    entities::{ReviewStatus, appointment},
    repositories::AppointmentRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::email::{self, Mailer};
use super::review::{Decision, ensure_transition, lost_race};

/// Input for booking an appointment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 32))]
    pub phone: Option<String>,
    pub appointment_date: DateTime<Utc>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// Appointment service.
#[derive(Clone)]
pub struct AppointmentService {
    appointment_repo: AppointmentRepository,
    mailer: Arc<dyn Mailer>,
    id_gen: IdGenerator,
}

impl AppointmentService {
    /// Create a new appointment service.
    #[must_use]
    pub fn new(appointment_repo: AppointmentRepository, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            appointment_repo,
            mailer,
            id_gen: IdGenerator::new(),
        }
    }

    /// Book an appointment for the caller. The date must lie in the future.
    pub async fn book(
        &self,
        user_id: &str,
        input: BookAppointmentInput,
    ) -> AppResult<appointment::Model> {
        input.validate()?;
        if input.appointment_date <= Utc::now() {
            return Err(AppError::Validation(
                "appointmentDate must be in the future".to_string(),
            ));
        }

        let model = appointment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email.trim().to_lowercase()),
            phone: Set(input.phone),
            appointment_date: Set(input.appointment_date),
            note: Set(input.note),
            status: Set(ReviewStatus::Pending),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let appointment = self.appointment_repo.create(model).await?;
        tracing::info!(appointment_id = %appointment.id, user_id = %user_id, "Appointment booked");
        Ok(appointment)
    }

    /// The caller's appointments, newest first.
    pub async fn my_appointments(&self, user_id: &str) -> AppResult<Vec<appointment::Model>> {
        self.appointment_repo.list_by_user(user_id).await
    }

    /// All appointments, newest first.
    pub async fn list_all(&self, limit: u64, offset: u64) -> AppResult<Vec<appointment::Model>> {
        self.appointment_repo.list_all(limit, offset).await
    }

    /// Approve or reject a pending appointment.
    ///
    /// Approval sends one confirmation email after the change is stored.
    /// Delivery runs detached; its outcome never affects the result.
    pub async fn decide(&self, id: &str, decision: Decision) -> AppResult<appointment::Model> {
        let current = self.appointment_repo.get_by_id(id).await?;
        let target = decision.target();
        ensure_transition("Appointment", id, current.status, target)?;

        if !self
            .appointment_repo
            .transition_from_pending(id, target)
            .await?
        {
            return Err(lost_race("Appointment", id));
        }

        let decided = appointment::Model {
            status: target,
            updated_at: Some(Utc::now()),
            ..current
        };

        tracing::info!(appointment_id = %id, status = %target, "Appointment decided");

        if decision == Decision::Approve {
            email::send_detached(
                self.mailer.clone(),
                email::appointment_confirmed(
                    &decided.email,
                    &decided.name,
                    decided.appointment_date,
                ),
            );
        }

        Ok(decided)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::email::EmailMessage;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Counts attempts, reports each one, and always fails.
    struct FailingMailer {
        attempts: AtomicUsize,
        notify: mpsc::UnboundedSender<String>,
    }

    #[async_trait::async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, message: EmailMessage) -> AppResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let _ = self.notify.send(message.to);
            Err(AppError::ExternalService("smtp down".to_string()))
        }
    }

    fn test_appointment(status: ReviewStatus) -> appointment::Model {
        appointment::Model {
            id: "appt1".to_string(),
            user_id: "user1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            appointment_date: Utc::now() + Duration::days(2),
            note: None,
            status,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn service(
        db: sea_orm::DatabaseConnection,
    ) -> (
        AppointmentService,
        Arc<FailingMailer>,
        mpsc::UnboundedReceiver<String>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mailer = Arc::new(FailingMailer {
            attempts: AtomicUsize::new(0),
            notify: tx,
        });
        let service = AppointmentService::new(
            AppointmentRepository::new(Arc::new(db)),
            mailer.clone() as Arc<dyn Mailer>,
        );
        (service, mailer, rx)
    }

    #[tokio::test]
    async fn test_approval_survives_failed_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_appointment(ReviewStatus::Pending)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let (service, mailer, mut rx) = service(db);

        let approved = service.decide("appt1", Decision::Approve).await.unwrap();
        assert_eq!(approved.status, ReviewStatus::Approved);

        let to = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(to, "ada@example.com");

        tokio::task::yield_now().await;
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_sends_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_appointment(ReviewStatus::Pending)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let (service, mailer, mut rx) = service(db);

        let rejected = service.decide("appt1", Decision::Reject).await.unwrap();
        assert_eq!(rejected.status, ReviewStatus::Rejected);

        let waited = tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await;
        assert!(waited.is_err() || waited.unwrap().is_none());
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_decided_appointment_is_terminal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_appointment(ReviewStatus::Approved)]])
            .into_connection();
        let (service, mailer, _rx) = service(db);

        let result = service.decide("appt1", Decision::Reject).await;

        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_booking_in_the_past_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let (service, _, _rx) = service(db);

        let result = service
            .book(
                "user1",
                BookAppointmentInput {
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                    phone: None,
                    appointment_date: Utc::now() - Duration::hours(1),
                    note: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
