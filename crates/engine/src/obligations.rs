//! Obligation primitives.
//!
//! An `Obligation` records that one person owes another a specific amount
//! for one expense item. The payer is the creditor (who fronted the money),
//! the payee is the debtor. Rows are append-only: the only mutation ever
//! applied is the single pending → paid transition (see the settle op).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, util::model_currency};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    Pending,
    Paid,
}

impl ObligationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl TryFrom<&str> for ObligationStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::InvalidObligation(format!(
                "invalid obligation status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: Uuid,
    pub expense_id: Uuid,
    /// The creditor: who paid and is owed the amount.
    pub payer_id: Uuid,
    /// The debtor: who benefited and owes the amount.
    pub payee_id: Uuid,
    pub amount_minor: i64,
    pub currency: Currency,
    /// Item name shown in breakdowns (e.g. the receipt line).
    pub label: Option<String>,
    pub category: Option<String>,
    pub status: ObligationStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Obligation {
    pub fn new(
        expense_id: Uuid,
        payer_id: Uuid,
        payee_id: Uuid,
        amount_minor: i64,
        currency: Currency,
        label: Option<String>,
        category: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if payer_id == payee_id {
            return Err(EngineError::InvalidObligation(
                "payer and payee must differ".to_string(),
            ));
        }
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            expense_id,
            payer_id,
            payee_id,
            amount_minor,
            currency,
            label,
            category,
            status: ObligationStatus::Pending,
            created_at,
            paid_at: None,
        })
    }

    pub fn is_paid(&self) -> bool {
        self.status == ObligationStatus::Paid
    }

    /// Checks the invariants the aggregators rely on and that the obligation
    /// actually involves `user_id` on either side.
    pub(crate) fn ensure_involves(&self, user_id: Uuid) -> ResultEngine<()> {
        if self.payer_id == self.payee_id {
            return Err(EngineError::InvalidObligation(
                "payer and payee must differ".to_string(),
            ));
        }
        if self.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if self.payer_id != user_id && self.payee_id != user_id {
            return Err(EngineError::InvalidObligation(
                "obligation does not involve user".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "obligations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_id: Uuid,
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub label: Option<String>,
    pub category: Option<String>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub paid_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Obligation> for ActiveModel {
    fn from(obligation: &Obligation) -> Self {
        Self {
            id: ActiveValue::Set(obligation.id),
            expense_id: ActiveValue::Set(obligation.expense_id),
            payer_id: ActiveValue::Set(obligation.payer_id),
            payee_id: ActiveValue::Set(obligation.payee_id),
            amount_minor: ActiveValue::Set(obligation.amount_minor),
            currency: ActiveValue::Set(obligation.currency.code().to_string()),
            label: ActiveValue::Set(obligation.label.clone()),
            category: ActiveValue::Set(obligation.category.clone()),
            status: ActiveValue::Set(obligation.status.as_str().to_string()),
            created_at: ActiveValue::Set(obligation.created_at),
            paid_at: ActiveValue::Set(obligation.paid_at),
        }
    }
}

impl TryFrom<Model> for Obligation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status = ObligationStatus::try_from(model.status.as_str())?;

        // paid_at is set iff the obligation is paid; a mismatch means the
        // row was written outside the settle op.
        match (status, model.paid_at.is_some()) {
            (ObligationStatus::Paid, false) => {
                return Err(EngineError::InvalidObligation(
                    "paid obligation without paid timestamp".to_string(),
                ));
            }
            (ObligationStatus::Pending, true) => {
                return Err(EngineError::InvalidObligation(
                    "pending obligation with paid timestamp".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            id: model.id,
            expense_id: model.expense_id,
            payer_id: model.payer_id,
            payee_id: model.payee_id,
            amount_minor: model.amount_minor,
            currency: model_currency(model.currency.as_str())?,
            label: model.label,
            category: model.category,
            status,
            created_at: model.created_at,
            paid_at: model.paid_at,
        })
    }
}
