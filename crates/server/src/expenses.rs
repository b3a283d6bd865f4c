//! Expenses API endpoints: recording, settled history, receipt retrieval.

use api_types::expense::{
    ExpenseHistoryQuery, ExpenseListResponse, ExpenseNew, ExpenseRecorded, ExpenseView,
    ReceiptResponse, SourceKind as ApiSourceKind,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};
use uuid::Uuid;

use crate::{ServerError, obligations::map_currency, server::ServerState, user};

fn map_source_kind_in(kind: ApiSourceKind) -> engine::SourceKind {
    match kind {
        ApiSourceKind::Text => engine::SourceKind::Text,
        ApiSourceKind::Image => engine::SourceKind::Image,
        ApiSourceKind::Voice => engine::SourceKind::Voice,
    }
}

fn map_source_kind_out(kind: engine::SourceKind) -> ApiSourceKind {
    match kind {
        engine::SourceKind::Text => ApiSourceKind::Text,
        engine::SourceKind::Image => ApiSourceKind::Image,
        engine::SourceKind::Voice => ApiSourceKind::Voice,
    }
}

pub async fn record(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseRecorded>), ServerError> {
    let currency = match payload.currency {
        Some(api_types::Currency::Usd) | None => engine::Currency::Usd,
    };

    let participants = payload
        .participants
        .into_iter()
        .map(|participant| engine::ObligationDraft {
            payer_id: participant.payer_id,
            payee_id: participant.payee_id,
            amount_minor: participant.amount_minor,
            label: participant.label,
            category: participant.category,
        })
        .collect();

    let id = state
        .engine
        .record_expense(engine::RecordExpenseCmd {
            creator_id: user.id,
            description: payload.description,
            source_kind: map_source_kind_in(payload.source_kind),
            source_path: payload.source_path,
            total_minor: payload.total_minor,
            currency,
            participants,
            created_at: Utc::now(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ExpenseRecorded { id })))
}

pub async fn history(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseHistoryQuery>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(50);
    let page = state
        .engine
        .list_settled_expenses_page(user.id, limit, query.cursor.as_deref())
        .await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    let expenses = page
        .expenses
        .into_iter()
        .map(|expense| ExpenseView {
            id: expense.id,
            description: expense.description,
            source_kind: map_source_kind_out(expense.source_kind),
            total_minor: expense.total_minor,
            currency: map_currency(expense.currency),
            created_at: expense.created_at.with_timezone(&utc),
        })
        .collect();

    Ok(Json(ExpenseListResponse {
        expenses,
        next_cursor: page.next_cursor,
    }))
}

pub async fn receipt(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReceiptResponse>, ServerError> {
    let (source_kind, source_path) = state.engine.expense_source(id, user.id).await?;

    Ok(Json(ReceiptResponse {
        source_kind: map_source_kind_out(source_kind),
        source_path,
    }))
}
