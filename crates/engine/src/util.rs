//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;

use crate::{Currency, EngineError, ResultEngine};

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::InvalidAmount(format!("invalid currency: {value}")))
}

/// Canonical form of a friend nickname: NFKC, trimmed, lowercased.
///
/// Nicknames are user-chosen handles, so lookups and duplicate checks ignore
/// case and unicode width. Category labels deliberately get no such
/// treatment.
pub(crate) fn normalize_nickname(value: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfkc().collect::<String>().to_lowercase();
    if normalized.is_empty() {
        return Err(EngineError::InvalidFriend(
            "nickname must not be empty".to_string(),
        ));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_normalization_is_case_and_width_insensitive() {
        assert_eq!(normalize_nickname("  Bob ").unwrap(), "bob");
        assert_eq!(normalize_nickname("ＢＯＢ").unwrap(), "bob");
    }

    #[test]
    fn empty_nickname_is_rejected() {
        assert!(normalize_nickname("   ").is_err());
    }
}
