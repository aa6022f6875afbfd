//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 hash; NULL for accounts created through a federated provider
    #[sea_orm(nullable)]
    pub password_hash: Option<String>,

    /// Federated identity provider name (e.g. "google", "github")
    #[sea_orm(nullable)]
    pub provider: Option<String>,

    /// Provider-assigned account id
    #[sea_orm(nullable)]
    pub provider_id: Option<String>,

    /// Avatar URL
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// API bearer token
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::story::Entity")]
    Stories,

    #[sea_orm(has_many = "super::vote::Entity")]
    Votes,
}

impl Related<super::story::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stories.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
