//! Category totals for spend reporting.
//!
//! Pure aggregation over already-fetched obligations: storage never enters
//! the picture, so the only possible failures are malformed inputs.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{Obligation, ResultEngine};

/// Obligations without a usable category label are grouped under this one.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Sums obligation amounts per category label for the given user.
///
/// Labels are used exactly as stored (no case folding); missing, empty or
/// whitespace-only labels fall back to [`FALLBACK_CATEGORY`]. The sum of all
/// totals equals the sum of all input amounts.
pub fn category_totals(
    user_id: Uuid,
    obligations: &[Obligation],
) -> ResultEngine<HashMap<String, i64>> {
    let mut totals: HashMap<String, i64> = HashMap::new();

    for obligation in obligations {
        obligation.ensure_involves(user_id)?;

        let label = obligation
            .category
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(FALLBACK_CATEGORY);

        *totals.entry(label.to_string()).or_insert(0) += obligation.amount_minor;
    }

    Ok(totals)
}
