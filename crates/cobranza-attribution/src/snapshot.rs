use chrono::NaiveDate;
use cobranza_core::{AttributionError, Snapshot, SnapshotStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSnapshot {
    pub snapshot: Snapshot,
    /// `false` when the snapshot predates the reference date; its
    /// `captured_on` tells how stale it is.
    pub is_current: bool,
}

/// Looks up the delinquency image of a credit as of a date.
pub struct SnapshotResolver<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> SnapshotResolver<'a, S>
where
    S: SnapshotStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        credit_id: i64,
        reference_date: NaiveDate,
    ) -> Result<Option<ResolvedSnapshot>, AttributionError> {
        if let Some(snapshot) = self.store.snapshot_on(credit_id, reference_date).await? {
            return Ok(Some(ResolvedSnapshot {
                snapshot,
                is_current: true,
            }));
        }

        Ok(self
            .store
            .latest_snapshot_before(credit_id, reference_date)
            .await?
            .map(|snapshot| ResolvedSnapshot {
                snapshot,
                is_current: false,
            }))
    }

    pub async fn days_past_due(
        &self,
        credit_id: i64,
        reference_date: NaiveDate,
    ) -> Result<Option<i64>, AttributionError> {
        Ok(self
            .resolve(credit_id, reference_date)
            .await?
            .map(|resolved| resolved.snapshot.days_past_due))
    }
}
