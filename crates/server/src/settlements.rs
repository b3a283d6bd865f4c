//! Settlements API endpoint.
//!
//! Net balances are recomputed from the pending obligations on every
//! request; nothing here is cached or persisted.

use api_types::settlement::{CounterpartyBalanceView, SettlementLineView, SettlementsResponse};
use axum::{Extension, Json, extract::State};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_balance(
    balance: engine::CounterpartyBalance,
    names: &HashMap<Uuid, String>,
    telegram_ids: &HashMap<Uuid, String>,
) -> CounterpartyBalanceView {
    CounterpartyBalanceView {
        counterparty_id: balance.counterparty_id,
        counterparty_name: names.get(&balance.counterparty_id).cloned(),
        counterparty_telegram_id: telegram_ids.get(&balance.counterparty_id).cloned(),
        net_minor: balance.net_minor,
        lines: balance
            .lines
            .into_iter()
            .map(|line| SettlementLineView {
                obligation_id: line.obligation_id,
                label: line.label,
                category: line.category,
                amount_minor: line.amount_minor,
            })
            .collect(),
    }
}

pub async fn get_settlements(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<SettlementsResponse>, ServerError> {
    let summary = state.engine.settlements(user.id).await?;

    let counterparties: Vec<Uuid> = summary
        .owed_to_user
        .iter()
        .chain(summary.user_owes.iter())
        .map(|balance| balance.counterparty_id)
        .collect();
    let names = state.engine.display_names(user.id, &counterparties).await?;
    let telegram_ids = state.engine.telegram_ids(&counterparties).await?;

    Ok(Json(SettlementsResponse {
        currency: api_types::Currency::Usd,
        owed_to_user: summary
            .owed_to_user
            .into_iter()
            .map(|balance| map_balance(balance, &names, &telegram_ids))
            .collect(),
        user_owes: summary
            .user_owes
            .into_iter()
            .map(|balance| map_balance(balance, &names, &telegram_ids))
            .collect(),
    }))
}
