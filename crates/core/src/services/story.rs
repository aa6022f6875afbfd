//! Story service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use storyvault_common::{AppError, AppResult, ExpiryWindow, IdGenerator, StoryLifetime};
use storyvault_db::{
    entities::{story, user},
    repositories::{StoryRepository, StorySort, UserRepository},
};
use validator::Validate;

/// Attempts at minting a collision-free access token before giving up.
const ACCESS_TOKEN_ATTEMPTS: usize = 5;

/// Story service for business logic.
#[derive(Clone)]
pub struct StoryService {
    story_repo: StoryRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a story.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStoryInput {
    #[validate(length(min = 3, max = 100))]
    pub title: String,

    #[validate(length(min = 20, max = 5000))]
    pub content: String,

    /// Unknown tokens fall back to one week during deserialization.
    #[serde(default)]
    pub lifetime: StoryLifetime,
}

/// Public author attribution for a story listing.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<user::Model> for AuthorSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
        }
    }
}

/// A story joined with its author's public profile.
///
/// `author` is `None` only if the account was deleted out from under the
/// story.
#[derive(Debug, Clone, Serialize)]
pub struct StoryWithAuthor {
    #[serde(flatten)]
    pub story: story::Model,
    pub author: Option<AuthorSummary>,
}

impl StoryService {
    /// Create a new story service.
    #[must_use]
    pub fn new(story_repo: StoryRepository, user_repo: UserRepository) -> Self {
        Self {
            story_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a story with a freshly minted permalink token.
    pub async fn create(&self, author_id: &str, input: CreateStoryInput) -> AppResult<story::Model> {
        input.validate()?;

        let author = self.user_repo.get_by_id(author_id).await?;

        let now = Utc::now();
        let expires_at = input.lifetime.expires_at(now);
        let access_token = self.mint_access_token().await?;

        let model = story::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            content: Set(input.content),
            author_id: Set(author.id),
            expires_at: Set(expires_at.into()),
            votes: Set(0),
            access_token: Set(access_token),
            // Creation is always public; visibility is not client-settable.
            visibility: Set(story::Visibility::Public),
            created_at: Set(now.into()),
        };

        self.story_repo.create(model).await
    }

    /// Generate an access token not already in use.
    ///
    /// Collisions over a 64^10 space are vanishingly rare; the retry loop is
    /// bounded so a pathological state cannot spin forever.
    async fn mint_access_token(&self) -> AppResult<String> {
        for _ in 0..ACCESS_TOKEN_ATTEMPTS {
            let token = self.id_gen.generate_access_token();
            if self
                .story_repo
                .find_by_access_token(&token)
                .await?
                .is_none()
            {
                return Ok(token);
            }
            tracing::warn!("Access token collision, regenerating");
        }
        Err(AppError::Internal(
            "Failed to generate a unique access token".to_string(),
        ))
    }

    /// Get a story by ID, treating expiry as gone rather than missing.
    ///
    /// The author still sees their own expired stories; everyone else gets
    /// `StoryExpired`.
    pub async fn get_for_viewer(
        &self,
        id: &str,
        viewer_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<story::Model> {
        let story = self.story_repo.get_by_id(id).await?;
        if story.expires_at <= now && viewer_id != Some(story.author_id.as_str()) {
            return Err(AppError::StoryExpired(id.to_string()));
        }
        Ok(story)
    }

    /// Get a story by its permalink token, expired or not.
    pub async fn get_by_access_token(&self, token: &str) -> AppResult<story::Model> {
        self.story_repo
            .find_by_access_token(token)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(token.to_string()))
    }

    /// Get all of an author's stories, including expired ones.
    pub async fn list_by_author(&self, author_id: &str) -> AppResult<Vec<story::Model>> {
        self.story_repo.find_by_author(author_id).await
    }

    /// Get a page of active public stories with author attribution.
    ///
    /// Authors are resolved in one batched lookup for the whole page, never
    /// per row.
    pub async fn list_public(
        &self,
        sort: StorySort,
        offset: u64,
        limit: u64,
        now: DateTime<Utc>,
    ) -> AppResult<(Vec<StoryWithAuthor>, u64)> {
        let total = self.story_repo.count_public(now).await?;
        let stories = self
            .story_repo
            .find_public_page(sort, offset, limit, now)
            .await?;

        let enriched = self.attach_authors(stories).await?;
        Ok((enriched, total))
    }

    /// Pick a uniformly random active public story.
    pub async fn random_public(&self, now: DateTime<Utc>) -> AppResult<StoryWithAuthor> {
        let count = self.story_repo.count_public(now).await?;
        if count == 0 {
            return Err(AppError::NotFound("No stories available".to_string()));
        }

        let offset = rand::thread_rng().gen_range(0..count);
        let story = self
            .story_repo
            .find_public_at_offset(now, offset)
            .await?
            .ok_or_else(|| AppError::NotFound("No stories available".to_string()))?;

        self.with_author(story).await
    }

    /// Pick a random active public story expiring within the given window.
    pub async fn random_expiring_within(
        &self,
        window: ExpiryWindow,
        now: DateTime<Utc>,
    ) -> AppResult<StoryWithAuthor> {
        let until = now + window.duration();
        let count = self.story_repo.count_expiring_within(now, until).await?;
        if count == 0 {
            return Err(AppError::NotFound(
                "No stories expiring in this window".to_string(),
            ));
        }

        let offset = rand::thread_rng().gen_range(0..count);
        let story = self
            .story_repo
            .find_expiring_at_offset(now, until, offset)
            .await?
            .ok_or_else(|| AppError::NotFound("No stories expiring in this window".to_string()))?;

        self.with_author(story).await
    }

    /// Attach the author summary to a single story.
    pub async fn with_author(&self, story: story::Model) -> AppResult<StoryWithAuthor> {
        let author = self
            .user_repo
            .find_by_id(&story.author_id)
            .await?
            .map(AuthorSummary::from);
        Ok(StoryWithAuthor { story, author })
    }

    /// Batch-resolve authors for a page of stories.
    async fn attach_authors(&self, stories: Vec<story::Model>) -> AppResult<Vec<StoryWithAuthor>> {
        let mut author_ids: Vec<String> =
            stories.iter().map(|s| s.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(stories
            .into_iter()
            .map(|story| {
                let author = authors
                    .get(&story.author_id)
                    .cloned()
                    .map(AuthorSummary::from);
                StoryWithAuthor { story, author }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_story(id: &str, author_id: &str, expires_in: Duration) -> story::Model {
        let now = Utc::now();
        story::Model {
            id: id.to_string(),
            title: "A story".to_string(),
            content: "x".repeat(25),
            author_id: author_id.to_string(),
            expires_at: (now + expires_in).into(),
            votes: 0,
            access_token: format!("tok-{id}"),
            visibility: story::Visibility::Public,
            created_at: now.into(),
        }
    }

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user-{id}"),
            email: format!("{id}@example.com"),
            password_hash: None,
            provider: None,
            provider_id: None,
            avatar_url: None,
            token: None,
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: Arc<sea_orm::DatabaseConnection>) -> StoryService {
        StoryService::new(StoryRepository::new(db.clone()), UserRepository::new(db))
    }

    #[test]
    fn test_create_input_validation() {
        let input = CreateStoryInput {
            title: "ab".to_string(),
            content: "too short".to_string(),
            lifetime: StoryLifetime::default(),
        };
        assert!(input.validate().is_err());

        let input = CreateStoryInput {
            title: "A proper title".to_string(),
            content: "x".repeat(20),
            lifetime: StoryLifetime::default(),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_input_unknown_lifetime_falls_back() {
        let input: CreateStoryInput = serde_json::from_value(serde_json::json!({
            "title": "A proper title",
            "content": "x".repeat(20),
            "lifetime": "42y"
        }))
        .unwrap();

        assert_eq!(input.lifetime, StoryLifetime::OneWeek);
    }

    #[tokio::test]
    async fn test_create_ignores_client_supplied_visibility() {
        let author = create_test_user("u1");
        let created = create_test_story("s1", "u1", Duration::days(7));

        // A "visibility" key in the payload is not part of the input and
        // must not reach the row; creation is always public.
        let input: CreateStoryInput = serde_json::from_value(serde_json::json!({
            "title": "A proper title",
            "content": "x".repeat(25),
            "visibility": "private"
        }))
        .unwrap();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[author]])
                .append_query_results([Vec::<story::Model>::new()])
                .append_query_results([[created]])
                .into_connection(),
        );

        let service = service_with(db);
        let story = service.create("u1", input).await.unwrap();

        assert_eq!(story.visibility, story::Visibility::Public);
    }

    #[tokio::test]
    async fn test_create_story() {
        let author = create_test_user("u1");
        let created = create_test_story("s1", "u1", Duration::hours(1));

        // Queries: author lookup, access-token collision check (empty),
        // INSERT..RETURNING.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[author]])
                .append_query_results([Vec::<story::Model>::new()])
                .append_query_results([[created]])
                .into_connection(),
        );

        let service = service_with(db);
        let story = service
            .create(
                "u1",
                CreateStoryInput {
                    title: "Hi there".to_string(),
                    content: "x".repeat(25),
                    lifetime: StoryLifetime::parse("1h"),
                },
            )
            .await
            .unwrap();

        assert_eq!(story.votes, 0);
        assert!(!story.access_token.is_empty());
        assert_eq!(story.visibility, story::Visibility::Public);
    }

    #[tokio::test]
    async fn test_create_rejects_short_title_before_touching_db() {
        // No query results queued: a validation failure must short-circuit
        // before any database work.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = service_with(db);
        let result = service
            .create(
                "u1",
                CreateStoryInput {
                    title: "ab".to_string(),
                    content: "x".repeat(25),
                    lifetime: StoryLifetime::default(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_for_viewer_expired_story() {
        let story = create_test_story("s1", "u1", Duration::hours(-1));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[story]])
                .into_connection(),
        );

        let service = service_with(db);
        let result = service.get_for_viewer("s1", None, Utc::now()).await;

        assert!(matches!(result, Err(AppError::StoryExpired(_))));
    }

    #[tokio::test]
    async fn test_get_for_viewer_author_sees_expired() {
        let story = create_test_story("s1", "u1", Duration::hours(-1));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[story]])
                .into_connection(),
        );

        let service = service_with(db);
        let result = service.get_for_viewer("s1", Some("u1"), Utc::now()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_get_by_access_token_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<story::Model>::new()])
                .into_connection(),
        );

        let service = service_with(db);
        let result = service.get_by_access_token("nope").await;

        assert!(matches!(result, Err(AppError::StoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_random_public_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let service = service_with(db);
        let result = service.random_public(Utc::now()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_public_attaches_authors() {
        let s1 = create_test_story("s1", "u1", Duration::hours(1));
        let s2 = create_test_story("s2", "u1", Duration::hours(2));
        let author = create_test_user("u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .append_query_results([[s1, s2]])
                .append_query_results([[author]])
                .into_connection(),
        );

        let service = service_with(db);
        let (stories, total) = service
            .list_public(StorySort::Latest, 0, 10, Utc::now())
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert_eq!(stories.len(), 2);
        assert!(stories.iter().all(|s| s.author.is_some()));
        assert_eq!(stories[0].author.as_ref().unwrap().username, "user-u1");
    }

    #[tokio::test]
    async fn test_list_public_tolerates_deleted_author() {
        let s1 = create_test_story("s1", "gone", Duration::hours(1));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[s1]])
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = service_with(db);
        let (stories, _) = service
            .list_public(StorySort::Latest, 0, 10, Utc::now())
            .await
            .unwrap();

        assert_eq!(stories.len(), 1);
        assert!(stories[0].author.is_none());
    }
}
