use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
}

pub mod obligation {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ObligationStatus {
        Pending,
        Paid,
    }

    /// Query for listing a user's obligations.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ObligationListQuery {
        pub status: Option<ObligationStatus>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ObligationView {
        pub id: Uuid,
        pub expense_id: Uuid,
        /// The creditor: who fronted the money.
        pub payer_id: Uuid,
        /// The debtor: who owes the amount.
        pub payee_id: Uuid,
        pub amount_minor: i64,
        pub currency: Currency,
        pub label: Option<String>,
        pub category: Option<String>,
        pub status: ObligationStatus,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
        /// Present iff status is `paid`.
        pub paid_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ObligationListResponse {
        pub obligations: Vec<ObligationView>,
    }
}

pub mod settlement {
    use super::*;

    /// One obligation's contribution to a counterparty balance, signed from
    /// the requesting user's perspective.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct SettlementLineView {
        pub obligation_id: Uuid,
        pub label: Option<String>,
        pub category: Option<String>,
        pub amount_minor: i64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CounterpartyBalanceView {
        pub counterparty_id: Uuid,
        /// Nickname from the user's friend links, else the username.
        pub counterparty_name: Option<String>,
        pub counterparty_telegram_id: Option<String>,
        /// Positive: the counterparty owes the user. Negative: the user owes.
        pub net_minor: i64,
        pub lines: Vec<SettlementLineView>,
    }

    /// Net balances split the way clients render them. Counterparties whose
    /// balance nets out within the settled threshold appear in neither list.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementsResponse {
        pub currency: Currency,
        pub owed_to_user: Vec<CounterpartyBalanceView>,
        pub user_owes: Vec<CounterpartyBalanceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleResponse {
        pub obligation: super::obligation::ObligationView,
        /// Telegram id of the other participant, for caller-side
        /// notifications. Absent when the counterparty is not paired.
        pub counterparty_telegram_id: Option<String>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SourceKind {
        Text,
        Image,
        Voice,
    }

    /// One participant split: `payee_id` owes `payer_id`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ParticipantNew {
        pub payer_id: Uuid,
        pub payee_id: Uuid,
        pub amount_minor: i64,
        pub label: Option<String>,
        pub category: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub description: Option<String>,
        pub source_kind: SourceKind,
        /// Storage path or signed URL of the original receipt, when any.
        pub source_path: Option<String>,
        pub total_minor: i64,
        pub currency: Option<Currency>,
        pub participants: Vec<ParticipantNew>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseRecorded {
        pub id: Uuid,
    }

    /// Query for the settled-expenses history.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseHistoryQuery {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub description: Option<String>,
        pub source_kind: SourceKind,
        pub total_minor: i64,
        pub currency: Currency,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptResponse {
        pub source_kind: SourceKind,
        pub source_path: Option<String>,
    }
}

pub mod friend {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FriendNew {
        /// Username of the registered user to link.
        pub username: String,
        pub nickname: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FriendCreated {
        pub id: Uuid,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct FriendView {
        pub id: Uuid,
        pub friend_user_id: Uuid,
        pub nickname: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FriendsResponse {
        pub friends: Vec<FriendView>,
    }
}

pub mod stats {
    use super::*;

    /// Per-category spend totals; amounts in minor units.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTotalsResponse {
        pub currency: Currency,
        pub totals: HashMap<String, i64>,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PairUser {
        pub code: String,
        pub telegram_id: String,
    }

    /// The authenticated account, as clients need it to build requests.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub username: String,
    }
}
