//! Friend-links API endpoints.

use api_types::friend::{FriendCreated, FriendNew, FriendView, FriendsResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<FriendsResponse>, ServerError> {
    let friends = state
        .engine
        .list_friends(user.id)
        .await?
        .into_iter()
        .map(|friend| FriendView {
            id: friend.id,
            friend_user_id: friend.friend_user_id,
            nickname: friend.nickname,
        })
        .collect();

    Ok(Json(FriendsResponse { friends }))
}

pub async fn add(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FriendNew>,
) -> Result<(StatusCode, Json<FriendCreated>), ServerError> {
    let friend = state
        .engine
        .add_friend(engine::AddFriendCmd {
            user_id: user.id,
            friend_username: payload.username,
            nickname: payload.nickname,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(FriendCreated { id: friend.id })))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.remove_friend(user.id, id).await?;
    Ok(StatusCode::OK)
}
