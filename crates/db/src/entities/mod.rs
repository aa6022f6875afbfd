//! Database entities.

pub mod story;
pub mod user;
pub mod vote;

pub use story::Entity as Story;
pub use user::Entity as User;
pub use vote::Entity as Vote;
