//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `owr_test`)
//!   `TEST_DB_PASSWORD` (default: `owr_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use owr_common::AppError;
use owr_db::{
    entities::{category, candidate, subcategory, user, user::UserStatus, vote},
    repositories::{
        CandidateRepository, CategoryRepository, SubcategoryRepository, UserRepository,
        VoteRepository,
    },
    test_utils::{TestDatabase, TestDbConfig},
};
use sea_orm::{DatabaseConnection, Set};

async fn seed_candidate(db: &Arc<DatabaseConnection>) -> candidate::Model {
    let category = CategoryRepository::new(db.clone())
        .create(category::ActiveModel {
            id: Set("cat1".to_string()),
            name: Set("Sports".to_string()),
            full_name: Set("Sports records".to_string()),
            description: Set(None),
            image_url: Set(None),
            display_order: Set(0),
            created_at: Set(Utc::now()),
        })
        .await
        .unwrap();
    let subcategory = SubcategoryRepository::new(db.clone())
        .create(subcategory::ActiveModel {
            id: Set("sub1".to_string()),
            category_id: Set(category.id),
            name: Set("Sprint".to_string()),
            description: Set(None),
            image_url: Set(None),
            display_order: Set(0),
            created_at: Set(Utc::now()),
        })
        .await
        .unwrap();
    CandidateRepository::new(db.clone())
        .create(
            candidate::ActiveModel {
                id: Set("cand1".to_string()),
                subcategory_id: Set(subcategory.id),
                name: Set("Ada".to_string()),
                description: Set(None),
                display_order: Set(0),
                vote_count: Set(0),
                created_at: Set(Utc::now()),
            },
            None,
        )
        .await
        .unwrap()
        .candidate
}

async fn seed_user(db: &Arc<DatabaseConnection>, n: usize) -> user::Model {
    UserRepository::new(db.clone())
        .create(
            user::ActiveModel {
                id: Set(format!("user{n}")),
                email: Set(format!("voter{n}@example.com")),
                full_name: Set(None),
                password_hash: Set("$argon2id$unused".to_string()),
                token: Set(None),
                status: Set(UserStatus::Active),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
            },
            Vec::new(),
        )
        .await
        .unwrap()
}

fn ballot(id: String, user_id: &str, candidate: &candidate::Model) -> vote::ActiveModel {
    vote::ActiveModel {
        id: Set(id),
        user_id: Set(user_id.to_string()),
        candidate_id: Set(candidate.id.clone()),
        subcategory_id: Set(candidate.subcategory_id.clone()),
        created_at: Set(Utc::now()),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_votes_keep_tally_exact() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to connect");
    let db = Arc::new(
        sea_orm::Database::connect(test_db.config.database_url())
            .await
            .expect("Failed to connect"),
    );
    let candidate = seed_candidate(&db).await;

    let mut users = Vec::new();
    for n in 0..50 {
        users.push(seed_user(&db, n).await);
    }

    let repo = VoteRepository::new(db.clone());
    let casts = users.iter().enumerate().map(|(n, user)| {
        let repo = repo.clone();
        let model = ballot(format!("vote{n}"), &user.id, &candidate);
        async move { repo.cast(model).await }
    });
    let results = futures::future::join_all(casts).await;
    assert!(results.iter().all(Result::is_ok));

    let candidate = CandidateRepository::new(db.clone())
        .get_by_id(&candidate.id)
        .await
        .unwrap();
    assert_eq!(candidate.vote_count, 50);
    assert_eq!(repo.count_for_candidate(&candidate.id).await.unwrap(), 50);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_duplicate_votes_store_one_row() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to connect");
    let db = Arc::new(
        sea_orm::Database::connect(test_db.config.database_url())
            .await
            .expect("Failed to connect"),
    );
    let candidate = seed_candidate(&db).await;
    let user = seed_user(&db, 1).await;

    let repo = VoteRepository::new(db.clone());
    let casts = (0..10).map(|n| {
        let repo = repo.clone();
        let model = ballot(format!("vote{n}"), &user.id, &candidate);
        async move { repo.cast(model).await }
    });
    let results = futures::future::join_all(casts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AppError::AlreadyVoted(_)))
    );
    let candidate = CandidateRepository::new(db.clone())
        .get_by_id(&candidate.id)
        .await
        .unwrap();
    assert_eq!(candidate.vote_count, 1);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_category_delete_cascades() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to connect");
    let db = Arc::new(
        sea_orm::Database::connect(test_db.config.database_url())
            .await
            .expect("Failed to connect"),
    );
    let candidate = seed_candidate(&db).await;

    assert!(CategoryRepository::new(db.clone()).delete("cat1").await.unwrap());

    let subcategory = SubcategoryRepository::new(db.clone())
        .find_by_id(&candidate.subcategory_id)
        .await
        .unwrap();
    let candidate = CandidateRepository::new(db.clone())
        .find_by_id(&candidate.id)
        .await
        .unwrap();
    assert!(subcategory.is_none());
    assert!(candidate.is_none());

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_deleting_voters_while_voting_keeps_tally_exact() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to connect");
    let db = Arc::new(
        sea_orm::Database::connect(test_db.config.database_url())
            .await
            .expect("Failed to connect"),
    );
    let candidate = seed_candidate(&db).await;

    let mut users = Vec::new();
    for n in 0..20 {
        users.push(seed_user(&db, n).await);
    }

    let votes = VoteRepository::new(db.clone());
    let accounts = UserRepository::new(db.clone());
    let casts = users.iter().enumerate().map(|(n, user)| {
        let votes = votes.clone();
        let model = ballot(format!("vote{n}"), &user.id, &candidate);
        async move {
            let _ = votes.cast(model).await;
        }
    });
    let deletions = users.iter().step_by(2).map(|user| {
        let accounts = accounts.clone();
        let id = user.id.clone();
        async move {
            accounts.delete(&id).await.unwrap();
        }
    });
    tokio::join!(
        futures::future::join_all(casts),
        futures::future::join_all(deletions)
    );

    let candidate = CandidateRepository::new(db.clone())
        .get_by_id(&candidate.id)
        .await
        .unwrap();
    let rows = votes.count_for_candidate(&candidate.id).await.unwrap();
    assert_eq!(i64::from(candidate.vote_count), rows as i64);
    assert!(rows <= 10);

    test_db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
