use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    AddFriendCmd, EngineError, Friend, ResultEngine, friends, users, util::normalize_nickname,
};

use super::{Engine, with_tx};

impl Engine {
    /// Lists the user's friend links, oldest first.
    pub async fn list_friends(&self, user_id: Uuid) -> ResultEngine<Vec<Friend>> {
        self.require_user(&self.database, user_id).await?;

        let models = friends::Entity::find()
            .filter(friends::Column::UserId.eq(user_id))
            .order_by_asc(friends::Column::CreatedAt)
            .all(&self.database)
            .await?;

        Ok(models.into_iter().map(Friend::from).collect())
    }

    /// Creates a friend link from `cmd.user_id` to the user named
    /// `cmd.friend_username`, under the given nickname.
    ///
    /// Self-links are rejected, as is a second link to the same person or a
    /// nickname that collides (case/width-insensitively) with an existing
    /// one.
    pub async fn add_friend(&self, cmd: AddFriendCmd) -> ResultEngine<Friend> {
        let nickname = cmd.nickname.trim().to_string();
        let nickname_norm = normalize_nickname(&cmd.nickname)?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, cmd.user_id).await?;

            let friend_user = users::Entity::find()
                .filter(users::Column::Username.eq(cmd.friend_username.as_str()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;

            if friend_user.id == cmd.user_id {
                return Err(EngineError::InvalidFriend(
                    "cannot add yourself as a friend".to_string(),
                ));
            }

            let duplicate = friends::Entity::find()
                .filter(friends::Column::UserId.eq(cmd.user_id))
                .filter(
                    Condition::any()
                        .add(friends::Column::FriendUserId.eq(friend_user.id))
                        .add(friends::Column::NicknameNorm.eq(nickname_norm.as_str())),
                )
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(nickname.clone()));
            }

            let friend = Friend {
                id: Uuid::new_v4(),
                user_id: cmd.user_id,
                friend_user_id: friend_user.id,
                nickname,
                created_at: Utc::now(),
            };
            friend
                .clone()
                .into_active_model(nickname_norm)
                .insert(&db_tx)
                .await?;

            Ok(friend)
        })
    }

    /// Deletes a friend link owned by the user.
    pub async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = friends::Entity::find_by_id(friend_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("friend not exists".to_string()))?;

            if model.user_id != user_id {
                return Err(EngineError::KeyNotFound("friend not exists".to_string()));
            }

            model.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// Resolves display names for a set of counterparties from the user's
    /// point of view: the nickname when a friend link exists, the
    /// counterparty's username otherwise.
    ///
    /// Unknown ids are silently absent from the result.
    pub async fn display_names(
        &self,
        user_id: Uuid,
        counterparties: &[Uuid],
    ) -> ResultEngine<HashMap<Uuid, String>> {
        let mut names: HashMap<Uuid, String> = HashMap::new();
        if counterparties.is_empty() {
            return Ok(names);
        }

        let user_models = users::Entity::find()
            .filter(users::Column::Id.is_in(counterparties.to_vec()))
            .all(&self.database)
            .await?;
        for user in user_models {
            names.insert(user.id, user.username);
        }

        let links = friends::Entity::find()
            .filter(friends::Column::UserId.eq(user_id))
            .filter(friends::Column::FriendUserId.is_in(counterparties.to_vec()))
            .all(&self.database)
            .await?;
        for link in links {
            names.insert(link.friend_user_id, link.nickname);
        }

        Ok(names)
    }
}
