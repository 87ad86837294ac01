//! The engine-backed executor against a migrated in-memory SQLite database.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rollcall_core::{CreateVoteInput, Engine, ManualClock, Principal, TargetGroup};
use rollcall_db::entities::{ballot::VoteChoice, user};
use rollcall_queue::{EngineJobExecutor, JobExecutor};
use sea_orm::Set;

#[tokio::test]
async fn test_executor_sweeps_closed_votes_once() {
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let db = Arc::new(rollcall_db::test_utils::sqlite_memory().await.unwrap());
    let clock = Arc::new(ManualClock::new(t0));
    let engine = Engine::new(db, clock.clone());

    let member = engine
        .users
        .create(user::ActiveModel {
            id: Set("m1".to_string()),
            username: Set("member".to_string()),
            display_name: Set(None),
            role: Set(user::Role::Member),
            party: Set(Some("Blue".to_string())),
            committee: Set(None),
            created_at: Set(t0.into()),
        })
        .await
        .unwrap();
    let member = Principal::from(member);

    let vote = engine
        .votes
        .create(CreateVoteInput {
            title: "Budget".to_string(),
            description: None,
            start_time: t0,
            end_time: t0 + Duration::seconds(30),
            is_anonymous: false,
            target_group: Some(TargetGroup::All),
        })
        .await
        .unwrap();
    engine.attendance.register(&vote.id, &member).await.unwrap();

    let executor = EngineJobExecutor::new(engine.sweeper.clone());

    // Still open: nothing to do
    assert_eq!(executor.sweep_abstentions().await.unwrap(), 0);

    clock.advance(Duration::seconds(31));
    assert_eq!(executor.sweep_abstentions().await.unwrap(), 1);
    assert_eq!(executor.sweep_abstentions().await.unwrap(), 0);

    let ballots = engine.ballot_repo.find_by_vote(&vote.id).await.unwrap();
    assert_eq!(ballots.len(), 1);
    assert_eq!(ballots[0].vote_choice, VoteChoice::Abstain);
}
