use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{clamp_limit, AppState};
use crate::auth::AuthUser;
use crate::directory::Role;
use crate::error::Result;
use crate::lifecycle::{ChecklistItem, Job, Rating};

#[derive(Deserialize)]
struct ChecklistItemIn {
    text: String,
}

#[derive(Deserialize)]
struct CreateJobRequest {
    property_id: u64,
    booking_start: DateTime<Utc>,
    booking_end: DateTime<Utc>,
    #[serde(default)]
    checklist: Vec<ChecklistItemIn>,
}

#[derive(Deserialize)]
struct TickRequest {
    item_ids: Vec<u64>,
}

#[derive(Deserialize)]
struct RatingRequest {
    stars: u8,
    #[serde(default)]
    feedback: Option<String>,
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct PhotoResponse {
    photo_path: String,
}

/// Wire shape of a job: the tagged state is flattened into the status
/// string plus an optional cleaner id, matching what clients expect.
#[derive(Serialize)]
struct JobView {
    id: u64,
    property_id: u64,
    booking_start: DateTime<Utc>,
    booking_end: DateTime<Utc>,
    status: String,
    cleaner_id: Option<u64>,
    checklist: Vec<ChecklistItem>,
    rating: Option<Rating>,
    created_at: DateTime<Utc>,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            property_id: job.property_id,
            booking_start: job.booking_start,
            booking_end: job.booking_end,
            status: job.state().name().to_string(),
            cleaner_id: job.claimant(),
            checklist: job.checklist().to_vec(),
            rating: job.rating().cloned(),
            created_at: job.created_at,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_job))
        .route("/open", get(list_open))
        .route("/me", get(list_mine))
        .route("/:id", get(get_job))
        .route("/:id/claim", post(claim))
        .route("/:id/checklist/tick", post(tick))
        .route("/:id/checklist/:item_id/photo", post(upload_photo))
        .route("/:id/complete", post(complete))
        .route("/:id/rating", post(rate))
}

async fn create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<Json<JobView>> {
    auth.require_role(&[Role::Host])?;
    let property = state.registry.read().await.get(req.property_id)?.clone();
    let texts = req.checklist.into_iter().map(|item| item.text).collect();

    let job = state
        .board
        .create(
            auth.id,
            auth.role,
            &property,
            req.booking_start,
            req.booking_end,
            texts,
        )
        .await?;
    Ok(Json(job.into()))
}

async fn list_open(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<JobView>>> {
    let jobs = state.board.list_open(clamp_limit(query.limit)).await;
    Ok(Json(jobs.into_iter().map(JobView::from).collect()))
}

async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<JobView>>> {
    let jobs = state
        .board
        .list_for(auth.id, auth.role, clamp_limit(query.limit))
        .await;
    Ok(Json(jobs.into_iter().map(JobView::from).collect()))
}

async fn get_job(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<u64>,
) -> Result<Json<JobView>> {
    let job = state.board.get(id).await?;
    Ok(Json(job.into()))
}

async fn claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<u64>,
) -> Result<Json<JobView>> {
    auth.require_role(&[Role::Cleaner])?;
    let job = state.board.claim(id, auth.id).await?;
    Ok(Json(job.into()))
}

async fn tick(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<u64>,
    Json(req): Json<TickRequest>,
) -> Result<Json<Vec<ChecklistItem>>> {
    let items = state
        .board
        .tick(id, auth.id, auth.role, &req.item_ids)
        .await?;
    Ok(Json(items))
}

async fn upload_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((job_id, item_id)): Path<(u64, u64)>,
    body: Bytes,
) -> Result<Json<PhotoResponse>> {
    // Authorize before touching the blob store so a rejected upload never
    // leaves an orphaned file behind.
    state
        .board
        .checklist_item(job_id, item_id, auth.id, auth.role)
        .await?;

    let photo_path = state.media.store(job_id, item_id, &body).await?;
    state
        .board
        .attach_photo(job_id, item_id, auth.id, auth.role, photo_path.clone())
        .await?;
    Ok(Json(PhotoResponse { photo_path }))
}

async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<u64>,
) -> Result<Json<JobView>> {
    let job = state.board.complete(id, auth.id, auth.role).await?;
    Ok(Json(job.into()))
}

async fn rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<u64>,
    Json(req): Json<RatingRequest>,
) -> Result<Json<Rating>> {
    auth.require_role(&[Role::Host])?;
    let rating = state
        .board
        .rate(id, auth.id, auth.role, req.stars, req.feedback)
        .await?;
    Ok(Json(rating))
}
