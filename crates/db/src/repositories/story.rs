//! Story repository.
//!
//! Expiry is never stored as a state transition; every public-facing query
//! re-evaluates `expires_at > now` against the caller-provided instant.

use std::sync::Arc;

use crate::entities::{Story, story};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use serde::Deserialize;
use storyvault_common::{AppError, AppResult};

/// Sort order for public story listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorySort {
    /// Newest first.
    #[default]
    Latest,
    /// Most voted first; creation-descending tie-break keeps pagination
    /// deterministic across pages.
    Popular,
}

/// Story repository for database operations.
#[derive(Clone)]
pub struct StoryRepository {
    db: Arc<DatabaseConnection>,
}

impl StoryRepository {
    /// Create a new story repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a story by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<story::Model>> {
        Story::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a story by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<story::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(id.to_string()))
    }

    /// Find a story by its permalink access token.
    ///
    /// Deliberately unfiltered by expiry: the permalink is the one path that
    /// stays reachable after a story expires.
    pub async fn find_by_access_token(&self, token: &str) -> AppResult<Option<story::Model>> {
        Story::find()
            .filter(story::Column::AccessToken.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all stories by an author, active and expired alike (newest first).
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<story::Model>> {
        Story::find()
            .filter(story::Column::AuthorId.eq(author_id))
            .order_by_desc(story::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new story.
    pub async fn create(&self, model: story::ActiveModel) -> AppResult<story::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Publicly visible and not yet expired, as of `now`.
    fn active_condition(now: DateTime<Utc>) -> Condition {
        Condition::all()
            .add(story::Column::Visibility.eq(story::Visibility::Public))
            .add(story::Column::ExpiresAt.gt(now))
    }

    /// Active as of `now` and expiring no later than `until`.
    fn expiring_condition(now: DateTime<Utc>, until: DateTime<Utc>) -> Condition {
        Self::active_condition(now).add(story::Column::ExpiresAt.lte(until))
    }

    /// Count currently active public stories.
    pub async fn count_public(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Story::find()
            .filter(Self::active_condition(now))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a page of active public stories.
    pub async fn find_public_page(
        &self,
        sort: StorySort,
        offset: u64,
        limit: u64,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<story::Model>> {
        let query = Story::find().filter(Self::active_condition(now));

        let query = match sort {
            StorySort::Latest => query.order_by_desc(story::Column::CreatedAt),
            StorySort::Popular => query
                .order_by_desc(story::Column::Votes)
                .order_by_desc(story::Column::CreatedAt),
        };

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the active public story at a given offset (id-ordered).
    ///
    /// Uniform random selection is done by the caller: count, draw an offset,
    /// fetch one row.
    pub async fn find_public_at_offset(
        &self,
        now: DateTime<Utc>,
        offset: u64,
    ) -> AppResult<Option<story::Model>> {
        Story::find()
            .filter(Self::active_condition(now))
            .order_by_asc(story::Column::Id)
            .offset(offset)
            .limit(1)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count active public stories expiring within `(now, until]`.
    pub async fn count_expiring_within(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<u64> {
        Story::find()
            .filter(Self::expiring_condition(now, until))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the story expiring within `(now, until]` at a given offset.
    pub async fn find_expiring_at_offset(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
        offset: u64,
    ) -> AppResult<Option<story::Model>> {
        Story::find()
            .filter(Self::expiring_condition(now, until))
            .order_by_asc(story::Column::Id)
            .offset(offset)
            .limit(1)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all stories ever created, expired included.
    pub async fn count_all(&self) -> AppResult<u64> {
        Story::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment vote count atomically (single UPDATE query, no fetch).
    pub async fn increment_votes(&self, story_id: &str) -> AppResult<()> {
        Story::update_many()
            .col_expr(story::Column::Votes, Expr::col(story::Column::Votes).add(1))
            .filter(story::Column::Id.eq(story_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement vote count atomically, clamped at zero.
    pub async fn decrement_votes(&self, story_id: &str) -> AppResult<()> {
        Story::update_many()
            .col_expr(story::Column::Votes, Expr::cust("GREATEST(votes - 1, 0)"))
            .filter(story::Column::Id.eq(story_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

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

    #[tokio::test]
    async fn test_find_by_id_found() {
        let story = create_test_story("s1", "u1", Duration::hours(1));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[story.clone()]])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo.find_by_id("s1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().access_token, "tok-s1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<story::Model>::new()])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::StoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_access_token_returns_expired_story() {
        // The permalink lookup carries no expiry filter; an expired story
        // still comes back.
        let story = create_test_story("s1", "u1", Duration::hours(-1));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[story]])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo.find_by_access_token("tok-s1").await.unwrap();

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_find_by_author() {
        let s1 = create_test_story("s1", "u1", Duration::hours(1));
        let s2 = create_test_story("s2", "u1", Duration::hours(-1));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[s1, s2]])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo.find_by_author("u1").await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_count_public() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let count = repo.count_public(Utc::now()).await.unwrap();

        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn test_find_public_page() {
        let s1 = create_test_story("s1", "u1", Duration::hours(2));
        let s2 = create_test_story("s2", "u2", Duration::hours(3));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[s1, s2]])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo
            .find_public_page(StorySort::Popular, 0, 10, Utc::now())
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_find_public_at_offset_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<story::Model>::new()])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo.find_public_at_offset(Utc::now(), 3).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_increment_votes_executes_update() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        repo.increment_votes("s1").await.unwrap();
    }

    #[tokio::test]
    async fn test_decrement_votes_executes_update() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        repo.decrement_votes("s1").await.unwrap();
    }
}
