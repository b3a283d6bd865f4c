//! Core engine for the expense-splitting backend.
//!
//! The engine owns the domain types (expenses, obligations, friend links)
//! and every operation over them: recording a parsed expense, aggregating
//! pending obligations into per-counterparty net balances, the single
//! pending → paid lifecycle transition, and category spend totals.
//!
//! All state lives in the database; the [`Engine`] itself only holds the
//! connection, so operations are independent and safe to run concurrently.

pub use categories::{FALLBACK_CATEGORY, category_totals};
pub use commands::{AddFriendCmd, ObligationDraft, RecordExpenseCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use expenses::{Expense, SourceKind};
pub use friends::Friend;
pub use money::Money;
pub use obligations::{Obligation, ObligationStatus};
pub use ops::{Engine, EngineBuilder, ExpenseHistoryPage};
pub use settlement::{
    CounterpartyBalance, ObligationLine, SETTLED_EPSILON_MINOR, SettlementSummary, net_balances,
    partition_balances,
};

mod categories;
mod commands;
mod currency;
mod error;
mod expenses;
mod friends;
mod money;
mod obligations;
mod ops;
mod settlement;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
