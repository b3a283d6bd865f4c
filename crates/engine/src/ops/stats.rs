use std::collections::HashMap;

use uuid::Uuid;

use crate::{ResultEngine, categories::category_totals};

use super::Engine;

impl Engine {
    /// Per-category spend totals over all of the user's obligations, both
    /// directions, regardless of status.
    pub async fn category_totals_for_user(
        &self,
        user_id: Uuid,
    ) -> ResultEngine<HashMap<String, i64>> {
        let obligations = self.list_obligations(user_id, None).await?;
        category_totals(user_id, &obligations)
    }
}
