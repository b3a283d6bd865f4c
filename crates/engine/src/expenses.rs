//! Expense primitives.
//!
//! An `Expense` is the record of one shared spend (a parsed receipt, a voice
//! note, a typed message). Splitting it across people produces one
//! `Obligation` per debtor; the expense row keeps the shared metadata and a
//! pointer to the original source for later retrieval.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, util::model_currency};

/// Where an expense came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Text,
    Image,
    Voice,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
        }
    }
}

impl TryFrom<&str> for SourceKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "voice" => Ok(Self::Voice),
            other => Err(EngineError::InvalidObligation(format!(
                "invalid source kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub description: Option<String>,
    pub source_kind: SourceKind,
    /// Storage path or signed URL of the original receipt, when any.
    pub source_path: Option<String>,
    pub total_minor: i64,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        creator_id: Uuid,
        description: Option<String>,
        source_kind: SourceKind,
        source_path: Option<String>,
        total_minor: i64,
        currency: Currency,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if total_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "total_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            creator_id,
            description,
            source_kind,
            source_path,
            total_minor,
            currency,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub creator_id: Uuid,
    pub description: Option<String>,
    pub source_kind: String,
    pub source_path: Option<String>,
    pub total_minor: i64,
    pub currency: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::obligations::Entity")]
    Obligations,
}

impl Related<super::obligations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Obligations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id),
            creator_id: ActiveValue::Set(expense.creator_id),
            description: ActiveValue::Set(expense.description.clone()),
            source_kind: ActiveValue::Set(expense.source_kind.as_str().to_string()),
            source_path: ActiveValue::Set(expense.source_path.clone()),
            total_minor: ActiveValue::Set(expense.total_minor),
            currency: ActiveValue::Set(expense.currency.code().to_string()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            creator_id: model.creator_id,
            description: model.description,
            source_kind: SourceKind::try_from(model.source_kind.as_str())?,
            source_path: model.source_path,
            total_minor: model.total_minor,
            currency: model_currency(model.currency.as_str())?,
            created_at: model.created_at,
        })
    }
}
