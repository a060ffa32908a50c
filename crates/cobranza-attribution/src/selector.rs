use chrono::NaiveDateTime;
use cobranza_core::{AttributionError, ManagementAction, ManagementStore};

use crate::cache::ManagementCache;
use crate::rules::AttributionRules;

/// Picks the managements that count as effective for a payment.
pub struct ManagementSelector<'a, S: ?Sized> {
    store: &'a S,
    rules: &'a AttributionRules,
    cache: &'a ManagementCache,
}

impl<'a, S> ManagementSelector<'a, S>
where
    S: ManagementStore + ?Sized,
{
    pub fn new(store: &'a S, rules: &'a AttributionRules, cache: &'a ManagementCache) -> Self {
        Self {
            store,
            rules,
            cache,
        }
    }

    /// Effective candidates for the payment, newest first.
    pub async fn select(
        &self,
        credit_id: i64,
        paid_at: NaiveDateTime,
        days_past_due: Option<i64>,
        campaign_id: Option<i64>,
    ) -> Result<Vec<ManagementAction>, AttributionError> {
        let actions = self.cache.get_or_load(self.store, credit_id).await?;

        Ok(
            select_effective(&actions, paid_at, days_past_due, campaign_id, self.rules)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    /// Whether an effective management was recorded after the payment
    /// (grace offset included).
    pub async fn worked_after_payment(
        &self,
        credit_id: i64,
        paid_at: NaiveDateTime,
        days_past_due: Option<i64>,
    ) -> Result<bool, AttributionError> {
        let actions = self.cache.get_or_load(self.store, credit_id).await?;
        Ok(any_effective_after(&actions, paid_at, days_past_due, self.rules))
    }
}

pub fn select_effective<'a>(
    actions: &'a [ManagementAction],
    paid_at: NaiveDateTime,
    days_past_due: Option<i64>,
    campaign_id: Option<i64>,
    rules: &AttributionRules,
) -> Vec<&'a ManagementAction> {
    let cutoff = rules.cutoff(paid_at);
    let eligible: Vec<&ManagementAction> =
        actions.iter().filter(|a| a.created_at <= cutoff).collect();

    let mut candidates: Vec<&ManagementAction> = eligible
        .iter()
        .copied()
        .filter(|a| a.substate.is_priority())
        .collect();

    if candidates.is_empty() {
        candidates = eligible
            .into_iter()
            .filter(|a| rules.is_secondary_effective(a.substate, days_past_due))
            .collect();
    }

    // Ties on the timestamp fall back to the id so reruns pick the same order.
    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    candidates.retain(|a| rules.within_window(a, paid_at, days_past_due, campaign_id));
    candidates
}

pub fn any_effective_after(
    actions: &[ManagementAction],
    paid_at: NaiveDateTime,
    days_past_due: Option<i64>,
    rules: &AttributionRules,
) -> bool {
    let cutoff = rules.cutoff(paid_at);
    actions
        .iter()
        .any(|a| a.created_at > cutoff && rules.is_effective(a.substate, days_past_due))
}
