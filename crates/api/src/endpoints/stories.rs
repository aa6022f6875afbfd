//! Story endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyvault_common::{AppResult, ExpiryWindow, StoryLifetime};
use storyvault_core::{CreateStoryInput, StoryWithAuthor};
use storyvault_db::{entities::story, repositories::StorySort};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 50;

/// Author attribution in a story response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Story response shape shared by all story endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Option<AuthorView>,
    pub votes: i32,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Present only when the viewer is authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_voted: Option<bool>,
}

impl StoryView {
    fn new(enriched: StoryWithAuthor, has_voted: Option<bool>) -> Self {
        let StoryWithAuthor { story, author } = enriched;
        Self {
            id: story.id,
            title: story.title,
            content: story.content,
            author: author.map(|a| AuthorView {
                id: a.id,
                username: a.username,
                avatar_url: a.avatar_url,
            }),
            votes: story.votes,
            access_token: story.access_token,
            expires_at: story.expires_at.into(),
            created_at: story.created_at.into(),
            has_voted,
        }
    }

    fn bare(story: story::Model) -> Self {
        Self::new(
            StoryWithAuthor {
                story,
                author: None,
            },
            None,
        )
    }
}

/// Create story request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub lifetime: StoryLifetime,
}

/// Create a story.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateStoryRequest>,
) -> AppResult<ApiResponse<StoryView>> {
    let created = state
        .story_service
        .create(
            &user.id,
            CreateStoryInput {
                title: req.title,
                content: req.content,
                lifetime: req.lifetime,
            },
        )
        .await?;

    let enriched = state.story_service.with_author(created).await?;
    Ok(ApiResponse::ok(StoryView::new(enriched, Some(false))))
}

/// List stories request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStoriesQuery {
    #[serde(default)]
    pub sort: StorySort,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Paginated story list response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStoriesResponse {
    pub stories: Vec<StoryView>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// List active public stories.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListStoriesQuery>,
) -> AppResult<ApiResponse<ListStoriesResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = page.saturating_sub(1).saturating_mul(limit);

    let (stories, total) = state
        .story_service
        .list_public(query.sort, offset, limit, Utc::now())
        .await?;

    Ok(ApiResponse::ok(ListStoriesResponse {
        stories: stories
            .into_iter()
            .map(|s| StoryView::new(s, None))
            .collect(),
        total,
        page,
        limit,
    }))
}

/// Get the authenticated user's own stories, expired ones included.
async fn author_stories(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<StoryView>>> {
    let stories = state.story_service.list_by_author(&user.id).await?;
    Ok(ApiResponse::ok(
        stories.into_iter().map(StoryView::bare).collect(),
    ))
}

/// Get a uniformly random active story.
async fn random(State(state): State<AppState>) -> AppResult<ApiResponse<StoryView>> {
    let story = state.story_service.random_public(Utc::now()).await?;
    Ok(ApiResponse::ok(StoryView::new(story, None)))
}

/// Get a random story expiring within the named window.
///
/// Unknown window tokens fall back to a day.
async fn random_expiring(
    State(state): State<AppState>,
    Path(window): Path<String>,
) -> AppResult<ApiResponse<StoryView>> {
    let window = ExpiryWindow::parse(&window);
    let story = state
        .story_service
        .random_expiring_within(window, Utc::now())
        .await?;
    Ok(ApiResponse::ok(StoryView::new(story, None)))
}

/// Get a story by its permalink access token.
///
/// The permalink outlives expiry, so no expiry check here.
async fn by_access_token(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<ApiResponse<StoryView>> {
    let story = state.story_service.get_by_access_token(&token).await?;

    let has_voted = match &viewer {
        Some(user) => Some(state.vote_service.has_voted(&user.id, &story.id).await?),
        None => None,
    };

    let enriched = state.story_service.with_author(story).await?;
    Ok(ApiResponse::ok(StoryView::new(enriched, has_voted)))
}

/// Get a story by ID.
///
/// An expired story is gone (410) for everyone except its author, who can
/// still read their own history.
async fn by_id(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StoryView>> {
    let story = state
        .story_service
        .get_for_viewer(&id, viewer.as_ref().map(|u| u.id.as_str()), Utc::now())
        .await?;

    let has_voted = match &viewer {
        Some(user) => Some(state.vote_service.has_voted(&user.id, &story.id).await?),
        None => None,
    };

    let enriched = state.story_service.with_author(story).await?;
    Ok(ApiResponse::ok(StoryView::new(enriched, has_voted)))
}

/// Vote toggle response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub votes: i32,
    pub has_voted: bool,
}

/// Toggle the caller's vote on a story.
async fn vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<VoteResponse>> {
    let outcome = state.vote_service.toggle(&user.id, &id, Utc::now()).await?;
    Ok(ApiResponse::ok(VoteResponse {
        votes: outcome.votes,
        has_voted: outcome.has_voted,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/author", get(author_stories))
        .route("/random", get(random))
        .route("/expiring/{window}", get(random_expiring))
        .route("/access/{token}", get(by_access_token))
        .route("/{id}", get(by_id))
        .route("/{id}/vote", post(vote))
}
