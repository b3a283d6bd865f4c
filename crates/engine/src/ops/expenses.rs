use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    Condition, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, Expense, Obligation, ObligationStatus, RecordExpenseCmd, ResultEngine,
    SourceKind, expenses, obligations,
};

use super::{Engine, with_tx};

/// One page of settled expenses, newest first.
#[derive(Clone, Debug)]
pub struct ExpenseHistoryPage {
    pub expenses: Vec<Expense>,
    /// Opaque cursor for the next (older) page, when more rows exist.
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ExpensesCursor {
    created_at: DateTime<Utc>,
    expense_id: Uuid,
}

impl ExpensesCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid expenses cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid expenses cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid expenses cursor".to_string()))
    }
}

impl Engine {
    /// Records one expense and its participant obligations atomically.
    ///
    /// Every participant must reference existing users, with payer and payee
    /// distinct and a positive amount; the whole command is rejected before
    /// anything is written otherwise.
    pub async fn record_expense(&self, cmd: RecordExpenseCmd) -> ResultEngine<Uuid> {
        if cmd.participants.is_empty() {
            return Err(EngineError::InvalidObligation(
                "expense requires at least one participant".to_string(),
            ));
        }

        let expense = Expense::new(
            cmd.creator_id,
            cmd.description.clone(),
            cmd.source_kind,
            cmd.source_path.clone(),
            cmd.total_minor,
            cmd.currency,
            cmd.created_at,
        )?;

        let mut drafts = Vec::with_capacity(cmd.participants.len());
        for participant in &cmd.participants {
            drafts.push(Obligation::new(
                expense.id,
                participant.payer_id,
                participant.payee_id,
                participant.amount_minor,
                cmd.currency,
                participant.label.clone(),
                participant.category.clone(),
                cmd.created_at,
            )?);
        }

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, cmd.creator_id).await?;
            for draft in &drafts {
                self.require_user(&db_tx, draft.payer_id).await?;
                self.require_user(&db_tx, draft.payee_id).await?;
            }

            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            for draft in &drafts {
                obligations::ActiveModel::from(draft).insert(&db_tx).await?;
            }

            Ok(expense.id)
        })
    }

    /// Lists the user's settled expenses with cursor-based pagination.
    ///
    /// An expense appears once no matter how many of its obligations involve
    /// the user. Pagination is newest → older by `(created_at DESC, id
    /// DESC)`.
    pub async fn list_settled_expenses_page(
        &self,
        user_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<ExpenseHistoryPage> {
        self.require_user(&self.database, user_id).await?;

        let limit_plus_one = limit.saturating_add(1);
        let mut query = expenses::Entity::find()
            .join(JoinType::InnerJoin, expenses::Relation::Obligations.def())
            .filter(
                Condition::any()
                    .add(obligations::Column::PayerId.eq(user_id))
                    .add(obligations::Column::PayeeId.eq(user_id)),
            )
            .filter(obligations::Column::Status.eq(ObligationStatus::Paid.as_str()))
            .distinct()
            .order_by_desc(expenses::Column::CreatedAt)
            .order_by_desc(expenses::Column::Id)
            .limit(limit_plus_one);

        if let Some(cursor) = cursor {
            let cursor = ExpensesCursor::decode(cursor)?;
            query = query.filter(
                Condition::any()
                    .add(expenses::Column::CreatedAt.lt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(expenses::Column::CreatedAt.eq(cursor.created_at))
                            .add(expenses::Column::Id.lt(cursor.expense_id)),
                    ),
            );
        }

        let mut models = query.all(&self.database).await?;

        let next_cursor = if models.len() as u64 > limit {
            models.truncate(limit as usize);
            models.last().map(|last| ExpensesCursor {
                created_at: last.created_at,
                expense_id: last.id,
            })
        } else {
            None
        };
        let next_cursor = match next_cursor {
            Some(cursor) => Some(cursor.encode()?),
            None => None,
        };

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(Expense::try_from(model)?);
        }

        Ok(ExpenseHistoryPage {
            expenses: out,
            next_cursor,
        })
    }

    /// Returns the stored source descriptor (kind + path) for an expense the
    /// user created or participates in.
    pub async fn expense_source(
        &self,
        expense_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<(SourceKind, Option<String>)> {
        let model = expenses::Entity::find_by_id(expense_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;

        if model.creator_id != user_id {
            let involved = obligations::Entity::find()
                .filter(obligations::Column::ExpenseId.eq(expense_id))
                .filter(
                    Condition::any()
                        .add(obligations::Column::PayerId.eq(user_id))
                        .add(obligations::Column::PayeeId.eq(user_id)),
                )
                .one(&self.database)
                .await?;
            if involved.is_none() {
                return Err(EngineError::KeyNotFound("expense not exists".to_string()));
            }
        }

        let expense = Expense::try_from(model)?;
        Ok((expense.source_kind, expense.source_path))
    }
}
