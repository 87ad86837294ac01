//! Vote endpoints.

use std::collections::{HashMap, HashSet};

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use rollcall_common::AppResult;
use rollcall_core::{CreateVoteInput, VoteRecord, VoteSummary, is_eligible, is_open};
use rollcall_db::entities::{ballot::VoteChoice, vote};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    extractors::{AdminPrincipal, ApiJson, AuthPrincipal},
    middleware::AppState,
    response::{ApiResponse, Message},
};

/// Vote response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub is_anonymous: bool,
    pub target_group: String,
    pub created_at: DateTime<FixedOffset>,
    pub is_open: bool,
}

impl VoteResponse {
    fn new(vote: vote::Model, is_open: bool) -> Self {
        Self {
            id: vote.id,
            title: vote.title,
            description: vote.description,
            start_time: vote.start_time,
            end_time: vote.end_time,
            is_anonymous: vote.is_anonymous,
            target_group: vote.target_group,
            created_at: vote.created_at,
            is_open,
        }
    }
}

/// Open vote annotated with the caller's state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveVoteResponse {
    #[serde(flatten)]
    pub vote: VoteResponse,
    pub eligible: bool,
    pub attended: bool,
    pub user_vote: Option<VoteChoice>,
}

/// History entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Vote list response.
#[derive(Serialize)]
pub struct VotesResponse<T: Serialize> {
    pub votes: Vec<T>,
}

/// Vote count response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub total_votes: u64,
}

/// Cast request.
///
/// `vote_choice` is taken as any JSON value so that a missing or non-string
/// choice is still reported as an invalid choice, after the window check.
#[derive(Debug, Deserialize)]
pub struct CastRequest {
    #[serde(default)]
    pub vote_choice: Value,
}

impl CastRequest {
    fn choice(&self) -> String {
        match &self.vote_choice {
            Value::String(choice) => choice.clone(),
            other => other.to_string(),
        }
    }
}

/// Results response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub title: String,
    pub description: String,
    pub created_at: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub target_group: String,
    pub total_voters: u64,
    pub total_present: u64,
    /// Percentage with two decimals, e.g. `"66.67"`.
    pub attendance_rate: String,
    pub approve: u64,
    pub reject: u64,
    pub abstain: u64,
    pub is_anonymous: bool,
}

impl From<VoteSummary> for ResultsResponse {
    fn from(summary: VoteSummary) -> Self {
        Self {
            title: summary.vote.title,
            description: summary.vote.description,
            created_at: summary.vote.created_at,
            end_time: summary.vote.end_time,
            target_group: summary.vote.target_group,
            total_voters: summary.total_eligible,
            total_present: summary.total_present,
            attendance_rate: format!("{:.2}", summary.attendance_rate),
            approve: summary.counts.approve,
            reject: summary.counts.reject,
            abstain: summary.counts.abstain,
            is_anonymous: summary.is_anonymous,
        }
    }
}

/// Per-voter record.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub party: Option<String>,
    pub committee: Option<String>,
    pub vote_choice: VoteChoice,
}

impl From<VoteRecord> for RecordResponse {
    fn from(record: VoteRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            display_name: record.display_name,
            party: record.party,
            committee: record.committee,
            vote_choice: record.vote_choice,
        }
    }
}

/// Records response.
#[derive(Serialize)]
pub struct RecordsResponse {
    pub records: Vec<RecordResponse>,
}

/// Create a vote.
async fn create_vote(
    AdminPrincipal(_admin): AdminPrincipal,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateVoteInput>,
) -> AppResult<ApiResponse<VoteResponse>> {
    let vote = state.engine.votes.create(input).await?;
    let open = state.engine.votes.is_open(&vote);
    Ok(ApiResponse::created(VoteResponse::new(vote, open)))
}

/// Count all votes.
async fn count_votes(
    AuthPrincipal(_user): AuthPrincipal,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let total_votes = state.engine.votes.count().await?;
    Ok(ApiResponse::ok(CountResponse { total_votes }))
}

/// Open votes, soonest-closing first, with the caller's state.
async fn active_votes(
    AuthPrincipal(user): AuthPrincipal,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<VotesResponse<ActiveVoteResponse>>> {
    let votes = state.engine.votes.list_active().await?;
    let now = state.engine.votes.now();
    let vote_ids: Vec<String> = votes.iter().map(|v| v.id.clone()).collect();

    let attended: HashSet<String> = state
        .engine
        .attendance_repo
        .find_by_user_in_votes(&user.id, &vote_ids)
        .await?
        .into_iter()
        .map(|a| a.vote_id)
        .collect();
    let choices: HashMap<String, VoteChoice> = state
        .engine
        .ballot_repo
        .find_by_user_in_votes(&user.id, &vote_ids)
        .await?
        .into_iter()
        .map(|b| (b.vote_id, b.vote_choice))
        .collect();

    let votes = votes
        .into_iter()
        .map(|vote| {
            let open = is_open(&vote, now);
            ActiveVoteResponse {
                eligible: is_eligible(&vote, &user),
                attended: attended.contains(&vote.id),
                user_vote: choices.get(&vote.id).copied(),
                vote: VoteResponse::new(vote, open),
            }
        })
        .collect();

    Ok(ApiResponse::ok(VotesResponse { votes }))
}

/// All votes, newest first.
async fn history(
    AuthPrincipal(_user): AuthPrincipal,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<VotesResponse<HistoryEntry>>> {
    let votes = state
        .engine
        .votes
        .list()
        .await?
        .into_iter()
        .map(|v| HistoryEntry {
            id: v.id,
            title: v.title,
            created_at: v.created_at,
        })
        .collect();
    Ok(ApiResponse::ok(VotesResponse { votes }))
}

/// Get a vote.
async fn show_vote(
    AuthPrincipal(_user): AuthPrincipal,
    State(state): State<AppState>,
    Path(vote_id): Path<String>,
) -> AppResult<ApiResponse<VoteResponse>> {
    let vote = state.engine.votes.get(&vote_id).await?;
    let open = state.engine.votes.is_open(&vote);
    Ok(ApiResponse::ok(VoteResponse::new(vote, open)))
}

/// Delete a vote with its attendance and ballots.
async fn delete_vote(
    AdminPrincipal(_admin): AdminPrincipal,
    State(state): State<AppState>,
    Path(vote_id): Path<String>,
) -> AppResult<ApiResponse<Message>> {
    state.engine.votes.delete(&vote_id).await?;
    Ok(ApiResponse::ok(Message::new("Vote deleted")))
}

/// Register the caller's attendance.
async fn register_attendance(
    AuthPrincipal(user): AuthPrincipal,
    State(state): State<AppState>,
    Path(vote_id): Path<String>,
) -> AppResult<ApiResponse<Message>> {
    state.engine.attendance.register(&vote_id, &user).await?;
    Ok(ApiResponse::created(Message::new("Attendance registered")))
}

/// Cast the caller's ballot.
async fn cast(
    AuthPrincipal(user): AuthPrincipal,
    State(state): State<AppState>,
    Path(vote_id): Path<String>,
    ApiJson(req): ApiJson<CastRequest>,
) -> AppResult<ApiResponse<Message>> {
    state
        .engine
        .ballots
        .cast(&vote_id, &user, &req.choice())
        .await?;
    Ok(ApiResponse::created(Message::new("Ballot cast")))
}

/// Attendance and choice tallies.
async fn results(
    AuthPrincipal(_user): AuthPrincipal,
    State(state): State<AppState>,
    Path(vote_id): Path<String>,
) -> AppResult<ApiResponse<ResultsResponse>> {
    let summary = state.engine.results.compute_summary(&vote_id).await?;
    Ok(ApiResponse::ok(summary.into()))
}

/// Per-voter records of a non-anonymous vote.
async fn records(
    AuthPrincipal(_user): AuthPrincipal,
    State(state): State<AppState>,
    Path(vote_id): Path<String>,
) -> AppResult<ApiResponse<RecordsResponse>> {
    let records = state
        .engine
        .results
        .list_records(&vote_id)
        .await?
        .into_iter()
        .map(RecordResponse::from)
        .collect();
    Ok(ApiResponse::ok(RecordsResponse { records }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vote))
        .route("/count", get(count_votes))
        .route("/active", get(active_votes))
        .route("/history", get(history))
        .route("/{id}", get(show_vote).delete(delete_vote))
        .route("/{id}/attendance", post(register_attendance))
        .route("/{id}/cast", post(cast))
        .route("/{id}/results", get(results))
        .route("/{id}/records", get(records))
}
