//! Vote service.
//!
//! Voting is a toggle: a first vote records it, a second retracts it. The
//! denormalized counter on the story is adjusted with single atomic UPDATEs
//! so concurrent voters never read-modify-write a stale count.

use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::Serialize;
use storyvault_common::{AppError, AppResult, IdGenerator};
use storyvault_db::{
    entities::vote,
    repositories::{StoryRepository, VoteRepository},
};

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    story_repo: StoryRepository,
    id_gen: IdGenerator,
}

/// Result of a vote toggle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoteOutcome {
    /// Vote count after the toggle.
    pub votes: i32,
    /// Whether the caller's vote is now recorded.
    pub has_voted: bool,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub fn new(vote_repo: VoteRepository, story_repo: StoryRepository) -> Self {
        Self {
            vote_repo,
            story_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Check if a user has voted on a story.
    pub async fn has_voted(&self, user_id: &str, story_id: &str) -> AppResult<bool> {
        self.vote_repo.has_voted(user_id, story_id).await
    }

    /// Toggle the caller's vote on a story.
    ///
    /// Expired stories refuse votes; the unique ledger index catches
    /// concurrent duplicate casts and surfaces them as a conflict.
    pub async fn toggle(
        &self,
        user_id: &str,
        story_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<VoteOutcome> {
        let story = self.story_repo.get_by_id(story_id).await?;
        if story.expires_at <= now {
            return Err(AppError::StoryExpired(story_id.to_string()));
        }

        let has_voted = match self
            .vote_repo
            .find_by_user_and_story(user_id, story_id)
            .await?
        {
            Some(_) => {
                // Only the call that actually removed the ledger row may
                // decrement; a racing retraction can have emptied it since
                // the read above.
                let removed = self
                    .vote_repo
                    .delete_by_user_and_story(user_id, story_id)
                    .await?;
                if removed == 1 {
                    self.story_repo.decrement_votes(story_id).await?;
                }
                false
            }
            None => {
                let model = vote::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.to_string()),
                    story_id: Set(story_id.to_string()),
                    created_at: Set(now.into()),
                };
                self.vote_repo.create(model).await?;
                self.story_repo.increment_votes(story_id).await?;
                true
            }
        };

        // Refetch for the post-toggle count rather than computing it locally.
        let story = self.story_repo.get_by_id(story_id).await?;
        Ok(VoteOutcome {
            votes: story.votes,
            has_voted,
        })
    }
}
