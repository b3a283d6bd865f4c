//! Statistics API endpoints.

use api_types::stats::CategoryTotalsResponse;
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState, user};

/// Per-category spend totals for the authenticated user.
pub async fn get_category_totals(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<CategoryTotalsResponse>, ServerError> {
    let totals = state.engine.category_totals_for_user(user.id).await?;

    Ok(Json(CategoryTotalsResponse {
        currency: api_types::Currency::Usd,
        totals,
    }))
}
