//! Admin dashboard figures.

use owr_common::AppResult;
use owr_db::{
    entities::candidate,
    repositories::{CandidateRepository, CertificateRepository, UserRepository, VoteRepository},
};
use serde::Serialize;

/// Number of candidates in the leaderboard.
pub const TOP_CANDIDATES: u64 = 5;

/// Dashboard snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_users: u64,
    pub total_votes: u64,
    pub total_certificates: u64,
    pub top_candidates: Vec<candidate::Model>,
}

/// Analytics service.
#[derive(Clone)]
pub struct AnalyticsService {
    user_repo: UserRepository,
    vote_repo: VoteRepository,
    certificate_repo: CertificateRepository,
    candidate_repo: CandidateRepository,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        vote_repo: VoteRepository,
        certificate_repo: CertificateRepository,
        candidate_repo: CandidateRepository,
    ) -> Self {
        Self {
            user_repo,
            vote_repo,
            certificate_repo,
            candidate_repo,
        }
    }

    pub async fn summary(&self) -> AppResult<AnalyticsSummary> {
        Ok(AnalyticsSummary {
            total_users: self.user_repo.count().await?,
            total_votes: self.vote_repo.count().await?,
            total_certificates: self.certificate_repo.count().await?,
            top_candidates: self.candidate_repo.top_by_votes(TOP_CANDIDATES).await?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_summary_collects_counts_and_leaders() {
        let count = |n: i64| {
            [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
        };
        let leader = candidate::Model {
            id: "c1".to_string(),
            subcategory_id: "s1".to_string(),
            name: "Ada".to_string(),
            description: None,
            display_order: 0,
            vote_count: 12,
            created_at: Utc::now(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count(3)])
                .append_query_results([count(12)])
                .append_query_results([count(2)])
                .append_query_results([[leader]])
                .into_connection(),
        );
        let service = AnalyticsService::new(
            UserRepository::new(db.clone()),
            VoteRepository::new(db.clone()),
            CertificateRepository::new(db.clone()),
            CandidateRepository::new(db),
        );

        let summary = service.summary().await.unwrap();

        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.total_votes, 12);
        assert_eq!(summary.total_certificates, 2);
        assert_eq!(summary.top_candidates[0].vote_count, 12);
    }
}
