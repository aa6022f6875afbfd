//! Business logic services.

#![allow(missing_docs)]

pub mod stats;
pub mod story;
pub mod user;
pub mod vote;

pub use stats::{Stats, StatsService};
pub use story::{AuthorSummary, CreateStoryInput, StoryService, StoryWithAuthor};
pub use user::{FederatedProfile, LoginInput, RegisterInput, UserService};
pub use vote::{VoteOutcome, VoteService};
