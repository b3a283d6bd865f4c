use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, Obligation, ObligationStatus, ResultEngine, obligations};

use super::{Engine, with_tx};

impl Engine {
    /// Lists the obligations where the user is payer or payee, newest first,
    /// optionally filtered by status.
    pub async fn list_obligations(
        &self,
        user_id: Uuid,
        status: Option<ObligationStatus>,
    ) -> ResultEngine<Vec<Obligation>> {
        self.require_user(&self.database, user_id).await?;

        let mut query = obligations::Entity::find()
            .filter(
                Condition::any()
                    .add(obligations::Column::PayerId.eq(user_id))
                    .add(obligations::Column::PayeeId.eq(user_id)),
            )
            .order_by_desc(obligations::Column::CreatedAt)
            .order_by_desc(obligations::Column::Id);

        if let Some(status) = status {
            query = query.filter(obligations::Column::Status.eq(status.as_str()));
        }

        let models = query.all(&self.database).await?;

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(Obligation::try_from(model)?);
        }
        Ok(out)
    }

    /// Marks an obligation as paid, exactly once.
    ///
    /// The status and the paid timestamp are written together in one update
    /// inside a transaction; a second settle of the same obligation fails
    /// with `AlreadySettled` and leaves the stored timestamp untouched.
    ///
    /// Obligations that do not involve `user_id` are reported as missing
    /// rather than forbidden, to avoid leaking other people's ledger.
    pub async fn settle_obligation(
        &self,
        obligation_id: Uuid,
        user_id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> ResultEngine<Obligation> {
        with_tx!(self, |db_tx| {
            let model = obligations::Entity::find_by_id(obligation_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("obligation not exists".to_string()))?;

            if model.payer_id != user_id && model.payee_id != user_id {
                return Err(EngineError::KeyNotFound(
                    "obligation not exists".to_string(),
                ));
            }

            let obligation = Obligation::try_from(model.clone())?;
            if obligation.is_paid() {
                return Err(EngineError::AlreadySettled(obligation_id.to_string()));
            }

            let mut active: obligations::ActiveModel = model.into();
            active.status = ActiveValue::Set(ObligationStatus::Paid.as_str().to_string());
            active.paid_at = ActiveValue::Set(Some(paid_at));
            let updated = active.update(&db_tx).await?;

            Obligation::try_from(updated)
        })
    }
}
