use cobranza_core::{
    Attribution, AttributionError, CreditStore, ManagementStore, MatchedAction, Payment,
    PaymentRecord, SnapshotStore, YesNo,
};
use tracing::debug;

use crate::cache::ManagementCache;
use crate::rules::AttributionRules;
use crate::selector::ManagementSelector;
use crate::snapshot::SnapshotResolver;

/// Computes the attribution fields of one payment.
pub struct PaymentAttributor<'a, S: ?Sized> {
    store: &'a S,
    rules: &'a AttributionRules,
    cache: &'a ManagementCache,
}

impl<'a, S> PaymentAttributor<'a, S>
where
    S: CreditStore + SnapshotStore + ManagementStore + ?Sized,
{
    pub fn new(store: &'a S, rules: &'a AttributionRules, cache: &'a ManagementCache) -> Self {
        Self {
            store,
            rules,
            cache,
        }
    }

    pub async fn attribute(&self, record: &PaymentRecord) -> Result<Attribution, AttributionError> {
        let payment = record.parse()?;
        self.attribute_payment(&payment).await
    }

    pub async fn attribute_payment(
        &self,
        payment: &Payment,
    ) -> Result<Attribution, AttributionError> {
        if self.store.credit(payment.credit_id).await?.is_none() {
            return Err(AttributionError::CreditNotFound {
                credit_id: payment.credit_id,
            });
        }

        let days_past_due = SnapshotResolver::new(self.store)
            .days_past_due(payment.credit_id, payment.paid_at.date())
            .await?;
        if days_past_due.is_none() {
            debug!(
                payment_id = payment.id,
                credit_id = payment.credit_id,
                "no snapshot on or before payment date, selecting without delinquency context"
            );
        }

        let selector = ManagementSelector::new(self.store, self.rules, self.cache);
        let selected = selector
            .select(
                payment.credit_id,
                payment.paid_at,
                days_past_due,
                payment.campaign_id,
            )
            .await?;

        let matched: Vec<MatchedAction> = selected
            .iter()
            .take(2)
            .map(|action| MatchedAction {
                action_id: action.id,
                projected_days_past_due: self
                    .rules
                    .projected_days_past_due(action, payment.paid_at),
            })
            .collect();

        if let Some(primary) = matched.first().copied() {
            return Ok(Attribution {
                has_management: YesNo::Yes,
                primary: Some(primary),
                secondary: matched.get(1).copied(),
                post_payment_management: YesNo::No,
            });
        }

        let worked_after = selector
            .worked_after_payment(payment.credit_id, payment.paid_at, days_past_due)
            .await?;

        Ok(Attribution {
            has_management: YesNo::No,
            primary: None,
            secondary: None,
            post_payment_management: YesNo::from(worked_after),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{CAMPAIGN, day, payment, record, seeded_store, snapshot};
    use cobranza_core::Substate;

    #[tokio::test]
    async fn payment_offer_wins_outright() {
        let store = seeded_store().await;
        store.append_snapshot(snapshot(1, CAMPAIGN, day(2024, 3, 15), 45)).await.unwrap();
        store
            .insert_management(record(
                1,
                "2024-03-10 08:00:00",
                Substate::PaymentOffer,
                Some(40),
                Some(CAMPAIGN),
            ))
            .await;
        store
            .insert_management(record(
                2,
                "2024-02-01 08:00:00",
                Substate::PromiseToPay,
                Some(7),
                Some(CAMPAIGN),
            ))
            .await;

        let rules = AttributionRules::default();
        let cache = ManagementCache::new();
        let attribution = PaymentAttributor::new(&store, &rules, &cache)
            .attribute(&payment(1, 1, "2024-03-15 10:00:00"))
            .await
            .unwrap();

        assert_eq!(attribution.has_management, YesNo::Yes);
        assert_eq!(
            attribution.primary,
            Some(MatchedAction {
                action_id: 1,
                projected_days_past_due: Some(45),
            })
        );
        assert_eq!(attribution.secondary, None);
        assert_eq!(attribution.post_payment_management, YesNo::No);
    }

    #[tokio::test]
    async fn second_candidate_fills_the_secondary_slot() {
        let store = seeded_store().await;
        store.append_snapshot(snapshot(1, CAMPAIGN, day(2024, 3, 15), 45)).await.unwrap();
        for (id, created_at, age) in [
            (1, "2024-03-01 08:00:00", 31),
            (2, "2024-03-05 08:00:00", 35),
            (3, "2024-03-12 08:00:00", 42),
        ] {
            store
                .insert_management(record(id, created_at, Substate::PromiseToPay, Some(age), None))
                .await;
        }

        let rules = AttributionRules::default();
        let cache = ManagementCache::new();
        let attribution = PaymentAttributor::new(&store, &rules, &cache)
            .attribute(&payment(1, 1, "2024-03-15 10:00:00"))
            .await
            .unwrap();

        assert_eq!(attribution.primary.map(|m| m.action_id), Some(3));
        assert_eq!(
            attribution.secondary,
            Some(MatchedAction {
                action_id: 2,
                projected_days_past_due: Some(45),
            })
        );
    }

    #[tokio::test]
    async fn stale_snapshot_still_supplies_context() {
        let store = seeded_store().await;
        store.append_snapshot(snapshot(1, CAMPAIGN, day(2024, 3, 1), 70)).await.unwrap();
        store
            .insert_management(record(
                1,
                "2024-02-20 08:00:00",
                Substate::PromiseToPay,
                Some(60),
                None,
            ))
            .await;

        let rules = AttributionRules::default();
        let cache = ManagementCache::new();
        let attribution = PaymentAttributor::new(&store, &rules, &cache)
            .attribute(&payment(1, 1, "2024-03-15 10:00:00"))
            .await
            .unwrap();

        // 70 > 61 selects the rolling window, so a February action within 30 days counts.
        assert_eq!(attribution.primary.map(|m| m.action_id), Some(1));
        assert_eq!(attribution.primary.and_then(|m| m.projected_days_past_due), Some(84));
    }

    #[tokio::test]
    async fn later_work_sets_the_post_payment_flag() {
        let store = seeded_store().await;
        store.append_snapshot(snapshot(1, CAMPAIGN, day(2024, 3, 15), 45)).await.unwrap();
        store
            .insert_management(record(
                1,
                "2024-03-18 08:00:00",
                Substate::PromiseToPay,
                Some(48),
                None,
            ))
            .await;

        let rules = AttributionRules::default();
        let cache = ManagementCache::new();
        let attribution = PaymentAttributor::new(&store, &rules, &cache)
            .attribute(&payment(1, 1, "2024-03-15 10:00:00"))
            .await
            .unwrap();

        assert_eq!(attribution.has_management, YesNo::No);
        assert_eq!(attribution.primary, None);
        assert_eq!(attribution.post_payment_management, YesNo::Yes);
    }

    #[tokio::test]
    async fn later_text_message_is_ignored_for_deep_delinquency() {
        let store = seeded_store().await;
        store.append_snapshot(snapshot(1, CAMPAIGN, day(2024, 3, 15), 120)).await.unwrap();
        store
            .insert_management(record(
                1,
                "2024-03-20 08:00:00",
                Substate::TextMessageSent,
                Some(125),
                None,
            ))
            .await;

        let rules = AttributionRules::default();
        let cache = ManagementCache::new();
        let attribution = PaymentAttributor::new(&store, &rules, &cache)
            .attribute(&payment(1, 1, "2024-03-15 10:00:00"))
            .await
            .unwrap();

        assert_eq!(attribution, Attribution::default());
    }

    #[tokio::test]
    async fn later_text_message_counts_without_a_snapshot() {
        let store = seeded_store().await;
        store
            .insert_management(record(
                1,
                "2024-03-20 08:00:00",
                Substate::TextMessageSent,
                Some(125),
                None,
            ))
            .await;

        let rules = AttributionRules::default();
        let cache = ManagementCache::new();
        let attribution = PaymentAttributor::new(&store, &rules, &cache)
            .attribute(&payment(1, 1, "2024-03-15 10:00:00"))
            .await
            .unwrap();

        assert_eq!(attribution.has_management, YesNo::No);
        assert_eq!(attribution.post_payment_management, YesNo::Yes);
    }

    #[tokio::test]
    async fn ineffective_later_work_leaves_the_flag_clear() {
        let store = seeded_store().await;
        store
            .insert_management(record(
                1,
                "2024-03-18 08:00:00",
                Substate::WrongNumber,
                Some(48),
                None,
            ))
            .await;

        let rules = AttributionRules::default();
        let cache = ManagementCache::new();
        let attribution = PaymentAttributor::new(&store, &rules, &cache)
            .attribute(&payment(1, 1, "2024-03-15 10:00:00"))
            .await
            .unwrap();

        assert_eq!(attribution, Attribution::default());
    }

    #[tokio::test]
    async fn unknown_credit_fails_the_payment() {
        let store = seeded_store().await;
        let rules = AttributionRules::default();
        let cache = ManagementCache::new();

        let err = PaymentAttributor::new(&store, &rules, &cache)
            .attribute(&payment(1, 77, "2024-03-15 10:00:00"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttributionError::CreditNotFound { credit_id: 77 }));
    }

    #[tokio::test]
    async fn malformed_payment_date_fails_the_payment() {
        let store = seeded_store().await;
        let rules = AttributionRules::default();
        let cache = ManagementCache::new();

        let err = PaymentAttributor::new(&store, &rules, &cache)
            .attribute(&payment(1, 1, "2024-03-15 ten o'clock"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttributionError::MalformedTimestamp { .. }));
    }
}
