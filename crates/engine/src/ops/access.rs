use std::collections::HashMap;

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, users};

use super::Engine;

impl Engine {
    /// Looks up a user row or fails with `KeyNotFound`.
    pub(crate) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Telegram id paired with a user, if any.
    ///
    /// Used by callers that want to notify a counterparty after a settle;
    /// the notification itself is theirs to send.
    pub async fn user_telegram_id(&self, user_id: Uuid) -> ResultEngine<Option<String>> {
        let user = self.require_user(&self.database, user_id).await?;
        Ok(user.telegram_id)
    }

    /// Telegram ids for a set of users; unpaired or unknown ids are absent.
    pub async fn telegram_ids(&self, user_ids: &[Uuid]) -> ResultEngine<HashMap<Uuid, String>> {
        let mut out = HashMap::new();
        if user_ids.is_empty() {
            return Ok(out);
        }

        let models = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids.to_vec()))
            .all(&self.database)
            .await?;
        for user in models {
            if let Some(telegram_id) = user.telegram_id {
                out.insert(user.id, telegram_id);
            }
        }
        Ok(out)
    }
}
