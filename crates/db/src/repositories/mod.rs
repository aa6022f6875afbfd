//! Database repositories.

pub mod story;
pub mod user;
pub mod vote;

pub use story::{StoryRepository, StorySort};
pub use user::UserRepository;
pub use vote::VoteRepository;
