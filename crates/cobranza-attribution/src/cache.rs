use std::collections::HashMap;
use std::sync::Arc;

use cobranza_core::{AttributionError, ManagementAction, ManagementStore};
use tokio::sync::RwLock;
use tracing::warn;

/// Parsed managements per credit, scoped to one reconcile run.
#[derive(Default)]
pub struct ManagementCache {
    by_credit: RwLock<HashMap<i64, Arc<[ManagementAction]>>>,
}

impl ManagementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_load<S>(
        &self,
        store: &S,
        credit_id: i64,
    ) -> Result<Arc<[ManagementAction]>, AttributionError>
    where
        S: ManagementStore + ?Sized,
    {
        if let Some(actions) = self.by_credit.read().await.get(&credit_id) {
            return Ok(Arc::clone(actions));
        }

        let actions = load_actions(store, credit_id).await?;
        let mut by_credit = self.by_credit.write().await;
        Ok(Arc::clone(by_credit.entry(credit_id).or_insert(actions)))
    }

    pub async fn credits_loaded(&self) -> usize {
        self.by_credit.read().await.len()
    }
}

/// Fetches and parses the managements of a credit. Rows with an
/// unparseable date are left out.
async fn load_actions<S>(
    store: &S,
    credit_id: i64,
) -> Result<Arc<[ManagementAction]>, AttributionError>
where
    S: ManagementStore + ?Sized,
{
    let records = store.managements_for_credit(credit_id).await?;
    let mut actions = Vec::with_capacity(records.len());

    for record in records {
        match record.parse() {
            Ok(action) => actions.push(action),
            Err(err) => warn!(credit_id, "skipping management: {err}"),
        }
    }

    Ok(actions.into())
}
