use uuid::Uuid;

use crate::{
    ObligationStatus, ResultEngine, SettlementSummary,
    settlement::{net_balances, partition_balances},
};

use super::Engine;

impl Engine {
    /// Net balances of the user against every counterparty, partitioned into
    /// "owed to user" / "user owes".
    ///
    /// Recomputed from the pending obligations on every call; nothing is
    /// persisted. Counterparties whose net balance sits within the settled
    /// threshold appear in neither partition.
    pub async fn settlements(&self, user_id: Uuid) -> ResultEngine<SettlementSummary> {
        let pending = self
            .list_obligations(user_id, Some(ObligationStatus::Pending))
            .await?;
        let balances = net_balances(user_id, &pending)?;
        Ok(partition_balances(balances))
    }
}
