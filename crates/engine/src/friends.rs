//! Friend links.
//!
//! A friend link is the nickname a user assigns to another registered user.
//! Links are one-directional: many users may nickname the same person, and
//! the nickname is immutable short of delete and re-add.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: Uuid,
    /// Owner of the link.
    pub user_id: Uuid,
    /// The befriended user.
    pub friend_user_id: Uuid,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "friends")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub friend_user_id: Uuid,
    pub nickname: String,
    /// NFKC + lowercase form used for duplicate checks and lookups.
    pub nickname_norm: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Friend {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            friend_user_id: model.friend_user_id,
            nickname: model.nickname,
            created_at: model.created_at,
        }
    }
}

impl Friend {
    pub(crate) fn into_active_model(self, nickname_norm: String) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id),
            user_id: ActiveValue::Set(self.user_id),
            friend_user_id: ActiveValue::Set(self.friend_user_id),
            nickname: ActiveValue::Set(self.nickname),
            nickname_norm: ActiveValue::Set(nickname_norm),
            created_at: ActiveValue::Set(self.created_at),
        }
    }
}
