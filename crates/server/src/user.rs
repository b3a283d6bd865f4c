//! The module contains the definition of a user account and the telegram
//! pairing handlers.

use api_types::user::{PairUser, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{ServerError, server::ServerState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub telegram_id: Option<String>,
    pub pair_code: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Returns the acting account, so thin clients can reference themselves in
/// splits without knowing database internals.
pub async fn me(Extension(user): Extension<Model>) -> Json<UserView> {
    Json(UserView {
        id: user.id,
        username: user.username,
    })
}

/// Function to pair a user with its telegram id
pub async fn pair(
    _: Extension<Model>,
    State(state): State<ServerState>,
    Json(payload): Json<PairUser>,
) -> Result<StatusCode, ServerError> {
    if let Some(user) = Entity::find()
        .filter(Column::PairCode.eq(payload.code))
        .one(&state.db)
        .await
        .map_err(|err| ServerError::Generic(err.to_string()))?
    {
        let mut user: ActiveModel = user.into();
        user.telegram_id = ActiveValue::Set(Some(payload.telegram_id));
        user.pair_code = ActiveValue::Set(None);

        user.update(&state.db)
            .await
            .map_err(|err| ServerError::Generic(err.to_string()))?;
    } else {
        return Err(ServerError::Generic("user not found".to_string()));
    }

    Ok(StatusCode::CREATED)
}

/// Function to unpair the user from its telegram id
pub async fn unpair(
    Extension(user): Extension<Model>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    if let Some(user) = Entity::find()
        .filter(Column::TelegramId.eq(user.telegram_id))
        .one(&state.db)
        .await
        .map_err(|err| ServerError::Generic(err.to_string()))?
    {
        let mut user: ActiveModel = user.into();
        user.telegram_id = ActiveValue::Set(None);
        user.update(&state.db)
            .await
            .map_err(|err| ServerError::Generic(err.to_string()))?;
    } else {
        return Err(ServerError::Generic("user not found".to_string()));
    }

    Ok(StatusCode::ACCEPTED)
}
