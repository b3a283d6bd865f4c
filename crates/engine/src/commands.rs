//! Command structs for engine write operations.
//!
//! These types group parameters for writes (record expense, add friend),
//! keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Currency, SourceKind};

/// One participant split inside a new expense: `payee_id` owes `payer_id`
/// the amount for the given item.
#[derive(Clone, Debug)]
pub struct ObligationDraft {
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub amount_minor: i64,
    pub label: Option<String>,
    pub category: Option<String>,
}

/// Record one expense together with its participant obligations.
#[derive(Clone, Debug)]
pub struct RecordExpenseCmd {
    pub creator_id: Uuid,
    pub description: Option<String>,
    pub source_kind: SourceKind,
    pub source_path: Option<String>,
    pub total_minor: i64,
    pub currency: Currency,
    pub participants: Vec<ObligationDraft>,
    pub created_at: DateTime<Utc>,
}

/// Create a friend link from `user_id` to the user named `friend_username`.
#[derive(Clone, Debug)]
pub struct AddFriendCmd {
    pub user_id: Uuid,
    pub friend_username: String,
    pub nickname: String,
}
