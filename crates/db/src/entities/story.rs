//! Story entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Story visibility levels.
///
/// Every story is currently created `Public`; the other levels are a
/// reserved capability the queries already filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "unlisted")]
    Unlisted,
    #[sea_orm(string_value = "private")]
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "story")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub author_id: String,

    /// Absolute expiry instant, computed once at creation and never changed.
    /// Expiry is a predicate (`expires_at > now`), not a stored transition.
    #[sea_orm(indexed)]
    pub expires_at: DateTimeWithTimeZone,

    /// Vote count (denormalized cache of the vote ledger)
    #[sea_orm(default_value = 0)]
    pub votes: i32,

    /// Opaque permalink token, independent of the primary id; stays valid
    /// after expiry
    #[sea_orm(unique)]
    pub access_token: String,

    pub visibility: Visibility,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,

    #[sea_orm(has_many = "super::vote::Entity")]
    Votes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
