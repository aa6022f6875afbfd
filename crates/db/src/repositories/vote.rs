//! Vote repository.
//!
//! One row per (user, story) pair, enforced by a unique index. A concurrent
//! duplicate insert loses the race at the database and surfaces as a
//! conflict rather than a double-counted vote.

use std::sync::Arc;

use crate::entities::{Vote, vote};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, SqlErr,
};
use storyvault_common::{AppError, AppResult};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a vote by user and story.
    pub async fn find_by_user_and_story(
        &self,
        user_id: &str,
        story_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::StoryId.eq(story_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has voted on a story.
    pub async fn has_voted(&self, user_id: &str, story_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_story(user_id, story_id)
            .await?
            .is_some())
    }

    /// Record a vote. A duplicate (user, story) pair is a conflict.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("vote already recorded".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a user's vote on a story, returning how many rows went away.
    ///
    /// A single conditional DELETE rather than find-then-delete: the caller
    /// needs to know whether THIS call removed the row, because a racing
    /// retraction may already have done so and only the winner may touch the
    /// counter.
    pub async fn delete_by_user_and_story(
        &self,
        user_id: &str,
        story_id: &str,
    ) -> AppResult<u64> {
        let result = Vote::delete_many()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::StoryId.eq(story_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_vote(id: &str, user_id: &str, story_id: &str) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            story_id: story_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_story_found() {
        let vote = create_test_vote("v1", "user1", "story1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_user_and_story("user1", "story1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "v1");
    }

    #[tokio::test]
    async fn test_has_voted_true() {
        let vote = create_test_vote("v1", "user1", "story1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.has_voted("user1", "story1").await.unwrap();

        assert!(result);
    }

    #[tokio::test]
    async fn test_has_voted_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.has_voted("user1", "story2").await.unwrap();

        assert!(!result);
    }

    #[tokio::test]
    async fn test_delete_by_user_and_story_removes_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let removed = repo
            .delete_by_user_and_story("user1", "story1")
            .await
            .unwrap();

        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_delete_by_user_and_story_reports_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let removed = repo
            .delete_by_user_and_story("user1", "story1")
            .await
            .unwrap();

        assert_eq!(removed, 0);
    }
}
