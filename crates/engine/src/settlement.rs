//! Net-settlement aggregation.
//!
//! Converts a user's pending obligations into one signed net balance per
//! counterparty, keeping the contributing line items for breakdown views.
//! These functions are pure: they operate on already-fetched rows and can
//! only fail on malformed input, never on storage.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Obligation, ResultEngine};

/// Net balances whose magnitude does not exceed this many minor units are
/// treated as settled and omitted from both partitions.
///
/// One minor unit (i.e. $0.01): mutual debts that cancel out except for a
/// rounding remainder should not keep nagging either side.
pub const SETTLED_EPSILON_MINOR: i64 = 1;

/// One obligation's contribution to a counterparty balance.
///
/// `amount_minor` is signed from the user's perspective: positive means the
/// counterparty owes the user for this item, negative the reverse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationLine {
    pub obligation_id: Uuid,
    pub label: Option<String>,
    pub category: Option<String>,
    pub amount_minor: i64,
}

/// The signed sum of all pending obligations between the user and one
/// counterparty, with the contributing lines preserved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyBalance {
    pub counterparty_id: Uuid,
    /// Positive: the counterparty owes the user. Negative: the user owes.
    pub net_minor: i64,
    pub lines: Vec<ObligationLine>,
}

/// Net balances split into the two directions a client renders.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub owed_to_user: Vec<CounterpartyBalance>,
    pub user_owes: Vec<CounterpartyBalance>,
}

fn signed_contribution(user_id: Uuid, obligation: &Obligation) -> ResultEngine<(Uuid, i64)> {
    obligation.ensure_involves(user_id)?;
    if obligation.is_paid() {
        return Err(EngineError::InvalidObligation(
            "net balances are computed over pending obligations only".to_string(),
        ));
    }

    if obligation.payer_id == user_id {
        Ok((obligation.payee_id, obligation.amount_minor))
    } else {
        Ok((obligation.payer_id, -obligation.amount_minor))
    }
}

/// Groups a user's pending obligations by counterparty and sums the signed
/// contributions.
///
/// The output order is unspecified; the stable key is `counterparty_id`.
/// An empty input yields an empty output. The signed sums are conserved:
/// the total over all balances equals the signed total of the input.
pub fn net_balances(
    user_id: Uuid,
    obligations: &[Obligation],
) -> ResultEngine<Vec<CounterpartyBalance>> {
    let mut by_counterparty: HashMap<Uuid, CounterpartyBalance> = HashMap::new();

    for obligation in obligations {
        let (counterparty_id, amount_minor) = signed_contribution(user_id, obligation)?;
        let balance = by_counterparty
            .entry(counterparty_id)
            .or_insert_with(|| CounterpartyBalance {
                counterparty_id,
                net_minor: 0,
                lines: Vec::new(),
            });
        balance.net_minor += amount_minor;
        balance.lines.push(ObligationLine {
            obligation_id: obligation.id,
            label: obligation.label.clone(),
            category: obligation.category.clone(),
            amount_minor,
        });
    }

    Ok(by_counterparty.into_values().collect())
}

/// Splits net balances into "owed to user" and "user owes".
///
/// Balances within [`SETTLED_EPSILON_MINOR`] of zero (inclusive) are
/// considered settled and appear in neither partition. Each partition is
/// sorted largest debt first; that ordering is display policy, not part of
/// the aggregation contract.
pub fn partition_balances(balances: Vec<CounterpartyBalance>) -> SettlementSummary {
    let mut summary = SettlementSummary::default();

    for balance in balances {
        if balance.net_minor > SETTLED_EPSILON_MINOR {
            summary.owed_to_user.push(balance);
        } else if balance.net_minor < -SETTLED_EPSILON_MINOR {
            summary.user_owes.push(balance);
        }
    }

    summary
        .owed_to_user
        .sort_by_key(|b| std::cmp::Reverse(b.net_minor));
    summary.user_owes.sort_by_key(|b| b.net_minor);
    summary
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::Currency;

    fn obligation(payer: Uuid, payee: Uuid, amount_minor: i64) -> Obligation {
        Obligation::new(
            Uuid::new_v4(),
            payer,
            payee,
            amount_minor,
            Currency::Usd,
            None,
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let user = Uuid::new_v4();
        assert!(net_balances(user, &[]).unwrap().is_empty());
    }

    #[test]
    fn opposite_directions_net_against_one_counterparty() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        // Alice fronted 25.50 for Bob; Bob fronted 10.00 for Alice.
        let obligations = vec![obligation(alice, bob, 2550), obligation(bob, alice, 1000)];

        let balances = net_balances(alice, &obligations).unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].counterparty_id, bob);
        assert_eq!(balances[0].net_minor, 1550);
        assert_eq!(balances[0].lines.len(), 2);
    }

    #[test]
    fn total_debt_is_conserved() {
        let user = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();

        let obligations = vec![
            obligation(user, bob, 2000),
            obligation(bob, user, 750),
            obligation(user, carol, 120),
            obligation(carol, user, 5000),
        ];

        let signed_total: i64 = obligations
            .iter()
            .map(|o| {
                if o.payer_id == user {
                    o.amount_minor
                } else {
                    -o.amount_minor
                }
            })
            .sum();

        let balances = net_balances(user, &obligations).unwrap();
        let net_total: i64 = balances.iter().map(|b| b.net_minor).sum();
        assert_eq!(net_total, signed_total);
    }

    #[test]
    fn rejects_payer_equal_to_payee() {
        let user = Uuid::new_v4();
        let mut bad = obligation(user, Uuid::new_v4(), 100);
        bad.payee_id = bad.payer_id;

        let err = net_balances(user, &[bad]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidObligation(_)));
    }

    #[test]
    fn rejects_obligation_not_involving_user() {
        let user = Uuid::new_v4();
        let unrelated = obligation(Uuid::new_v4(), Uuid::new_v4(), 100);

        let err = net_balances(user, &[unrelated]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidObligation(_)));
    }

    #[test]
    fn rejects_paid_obligations() {
        let user = Uuid::new_v4();
        let mut paid = obligation(user, Uuid::new_v4(), 100);
        paid.status = crate::ObligationStatus::Paid;
        paid.paid_at = Some(Utc::now());

        let err = net_balances(user, &[paid]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidObligation(_)));
    }

    #[test]
    fn balance_at_threshold_is_excluded_from_both_partitions() {
        let user = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();
        let dan = Uuid::new_v4();

        let balances = net_balances(
            user,
            &[
                // Exactly +epsilon and -epsilon: settled.
                obligation(user, bob, SETTLED_EPSILON_MINOR),
                obligation(carol, user, SETTLED_EPSILON_MINOR),
                // One past the threshold on each side.
                obligation(user, dan, SETTLED_EPSILON_MINOR + 1),
            ],
        )
        .unwrap();

        let summary = partition_balances(balances);
        assert_eq!(summary.owed_to_user.len(), 1);
        assert_eq!(summary.owed_to_user[0].counterparty_id, dan);
        assert!(summary.user_owes.is_empty());
    }

    #[test]
    fn partitions_sort_largest_debt_first() {
        let user = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();

        let balances = net_balances(
            user,
            &[
                obligation(user, bob, 500),
                obligation(user, carol, 1500),
                obligation(bob, user, 2000),
            ],
        )
        .unwrap();

        let summary = partition_balances(balances);
        // Bob: 500 - 2000 = -1500 (user owes); Carol: +1500 (owed to user).
        assert_eq!(summary.owed_to_user[0].counterparty_id, carol);
        assert_eq!(summary.user_owes[0].counterparty_id, bob);
        assert_eq!(summary.user_owes[0].net_minor, -1500);
    }
}
