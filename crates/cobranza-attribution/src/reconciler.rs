use chrono::NaiveDate;
use cobranza_core::{AttributionError, CollectionStore, PaymentRecord};
use futures_util::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attributor::PaymentAttributor;
use crate::cache::ManagementCache;
use crate::rules::AttributionRules;

const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub date: NaiveDate,
    pub processed: usize,
    pub failed: usize,
}

/// Attributes every payment recorded on a day and writes the result back.
pub struct BatchReconciler<'a, S: ?Sized> {
    store: &'a S,
    rules: AttributionRules,
    concurrency: usize,
}

impl<'a, S> BatchReconciler<'a, S>
where
    S: CollectionStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            rules: AttributionRules::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_rules(mut self, rules: AttributionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Only listing the day's payments can fail the run; per-payment
    /// failures are counted in the summary.
    pub async fn reconcile_day(
        &self,
        date: NaiveDate,
    ) -> Result<ReconcileSummary, AttributionError> {
        let mut payments = self.store.payments_on(date).await?;
        payments.sort_by_key(|payment| payment.id);
        payments.dedup_by_key(|payment| payment.id);

        let cache = ManagementCache::new();
        let attributor = PaymentAttributor::new(self.store, &self.rules, &cache);

        let outcomes: Vec<bool> = stream::iter(payments.iter())
            .map(|payment| {
                let attributor = &attributor;
                async move { self.reconcile_payment(attributor, payment).await }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let processed = outcomes.iter().filter(|ok| **ok).count();
        let summary = ReconcileSummary {
            date,
            processed,
            failed: outcomes.len() - processed,
        };

        info!(
            %date,
            processed = summary.processed,
            failed = summary.failed,
            credits = cache.credits_loaded().await,
            "attribution run finished"
        );

        Ok(summary)
    }

    async fn reconcile_payment(
        &self,
        attributor: &PaymentAttributor<'_, S>,
        payment: &PaymentRecord,
    ) -> bool {
        let result = match attributor.attribute(payment).await {
            Ok(attribution) => self
                .store
                .write_attribution(payment.id, &attribution)
                .await
                .map(|()| attribution),
            Err(err) => Err(err),
        };

        match result {
            Ok(attribution) => {
                debug!(
                    payment_id = payment.id,
                    has_management = attribution.has_management.as_str(),
                    primary = ?attribution.primary.map(|m| m.action_id),
                    "payment attributed"
                );
                true
            }
            Err(err) => {
                warn!(payment_id = payment.id, "attribution failed: {err}");
                false
            }
        }
    }
}
