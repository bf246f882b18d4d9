//! Review decisions shared by certificates and appointments.

use owr_common::{AppError, AppResult};
use owr_db::entities::ReviewStatus;
use serde::Serialize;

/// An administrator's verdict on a pending item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Status the item ends up in.
    #[must_use]
    pub const fn target(self) -> ReviewStatus {
        match self {
            Self::Approve => ReviewStatus::Approved,
            Self::Reject => ReviewStatus::Rejected,
        }
    }
}

/// Reject any move the review state machine does not allow.
pub fn ensure_transition(
    kind: &str,
    id: &str,
    from: ReviewStatus,
    to: ReviewStatus,
) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition(format!(
            "{kind} {id} is {from} and cannot become {to}"
        )))
    }
}

/// Error for a conditional update that found no pending row.
pub(crate) fn lost_race(kind: &str, id: &str) -> AppError {
    AppError::InvalidTransition(format!("{kind} {id} is no longer pending"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_items_can_be_decided() {
        for decision in [Decision::Approve, Decision::Reject] {
            assert!(
                ensure_transition("Certificate", "c1", ReviewStatus::Pending, decision.target())
                    .is_ok()
            );
            for terminal in [ReviewStatus::Approved, ReviewStatus::Rejected] {
                assert!(matches!(
                    ensure_transition("Certificate", "c1", terminal, decision.target()),
                    Err(AppError::InvalidTransition(_))
                ));
            }
        }
    }

    #[test]
    fn test_cannot_return_to_pending() {
        assert!(
            ensure_transition(
                "Appointment",
                "a1",
                ReviewStatus::Pending,
                ReviewStatus::Pending
            )
            .is_err()
        );
    }
}
