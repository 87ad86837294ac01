//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `rollcall_test`)
//!   `TEST_DB_PASSWORD` (default: `rollcall_test`)
//!   `TEST_DB_NAME` (default: `rollcall_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use rollcall_common::AppError;
use rollcall_db::entities::{ballot, ballot::VoteChoice, user, vote};
use rollcall_db::repositories::{
    AttendanceRepository, BallotRepository, UserRepository, VoteRepository,
};
use rollcall_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_cleanup() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_ballot_is_rejected_by_index() {
    let db = TestDatabase::create_unique().await.expect("Failed to create");
    let TestDatabase { conn, config } = db;
    let conn = Arc::new(conn);
    let now = Utc::now();

    UserRepository::new(Arc::clone(&conn))
        .create(user::ActiveModel {
            id: Set("u1".to_string()),
            username: Set("member1".to_string()),
            display_name: Set(None),
            role: Set(user::Role::Member),
            party: Set(Some("Blue".to_string())),
            committee: Set(None),
            created_at: Set(now.into()),
        })
        .await
        .unwrap();

    VoteRepository::new(Arc::clone(&conn))
        .create(vote::ActiveModel {
            id: Set("v1".to_string()),
            title: Set("Budget".to_string()),
            description: Set(String::new()),
            start_time: Set(now.into()),
            end_time: Set((now + Duration::minutes(5)).into()),
            is_anonymous: Set(false),
            target_group: Set("ALL".to_string()),
            created_at: Set(now.into()),
        })
        .await
        .unwrap();

    AttendanceRepository::new(Arc::clone(&conn))
        .upsert("v1", "u1", now)
        .await
        .unwrap();

    let ballot = |id: &str| ballot::ActiveModel {
        id: Set(id.to_string()),
        vote_id: Set("v1".to_string()),
        user_id: Set("u1".to_string()),
        vote_choice: Set(VoteChoice::Approve),
        vote_time: Set(now.into()),
    };

    BallotRepository::insert_unique_in(conn.as_ref(), ballot("b1"))
        .await
        .unwrap();
    let second = BallotRepository::insert_unique_in(conn.as_ref(), ballot("b2")).await;
    assert!(matches!(second, Err(AppError::AlreadyVoted(_))));

    let conn = Arc::try_unwrap(conn).unwrap();
    TestDatabase { conn, config }.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}
