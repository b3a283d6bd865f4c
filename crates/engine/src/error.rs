//! The module contains the errors the engine can throw.
//!
//! The main ones are:
//!
//! - [`KeyNotFound`] thrown when an item is not found (or not visible to the
//!   calling user).
//! - [`AlreadySettled`] thrown when settling an obligation that is already
//!   paid.
//! - [`Database`] wraps any failure of the underlying store; callers must
//!   treat the outcome of the attempted write as unknown.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`AlreadySettled`]: EngineError::AlreadySettled
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Already settled: {0}")]
    AlreadySettled(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid obligation: {0}")]
    InvalidObligation(String),
    #[error("Invalid friend: {0}")]
    InvalidFriend(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::AlreadySettled(a), Self::AlreadySettled(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidObligation(a), Self::InvalidObligation(b)) => a == b,
            (Self::InvalidFriend(a), Self::InvalidFriend(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
