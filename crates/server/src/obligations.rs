//! Obligations API endpoints.

use api_types::obligation::{
    ObligationListQuery, ObligationListResponse, ObligationStatus as ApiStatus, ObligationView,
};
use api_types::settlement::SettleResponse;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{FixedOffset, Utc};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Usd => api_types::Currency::Usd,
    }
}

fn map_status(status: engine::ObligationStatus) -> ApiStatus {
    match status {
        engine::ObligationStatus::Pending => ApiStatus::Pending,
        engine::ObligationStatus::Paid => ApiStatus::Paid,
    }
}

pub(crate) fn map_obligation(
    obligation: engine::Obligation,
) -> Result<ObligationView, ServerError> {
    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;

    Ok(ObligationView {
        id: obligation.id,
        expense_id: obligation.expense_id,
        payer_id: obligation.payer_id,
        payee_id: obligation.payee_id,
        amount_minor: obligation.amount_minor,
        currency: map_currency(obligation.currency),
        label: obligation.label,
        category: obligation.category,
        status: map_status(obligation.status),
        created_at: obligation.created_at.with_timezone(&utc),
        paid_at: obligation.paid_at.map(|ts| ts.with_timezone(&utc)),
    })
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ObligationListQuery>,
) -> Result<Json<ObligationListResponse>, ServerError> {
    let status = query.status.map(|status| match status {
        ApiStatus::Pending => engine::ObligationStatus::Pending,
        ApiStatus::Paid => engine::ObligationStatus::Paid,
    });

    let obligations = state
        .engine
        .list_obligations(user.id, status)
        .await?
        .into_iter()
        .map(map_obligation)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ObligationListResponse { obligations }))
}

pub async fn settle(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SettleResponse>, ServerError> {
    let obligation = state
        .engine
        .settle_obligation(id, user.id, Utc::now())
        .await?;

    let counterparty = if obligation.payer_id == user.id {
        obligation.payee_id
    } else {
        obligation.payer_id
    };
    let counterparty_telegram_id = state.engine.user_telegram_id(counterparty).await?;

    Ok(Json(SettleResponse {
        obligation: map_obligation(obligation)?,
        counterparty_telegram_id,
    }))
}
