use std::collections::BTreeMap;

use chrono::NaiveDate;
use cobranza_core::{AttributedPayment, AttributionError, PaymentLedger, YesNo};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentAttribution {
    pub agent_id: i64,
    pub payments: usize,
    /// Commission base: amount of payments whose primary action is the agent's.
    pub amount: Decimal,
}

/// Collection-effectiveness figures for one day of attributed payments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectivenessReport {
    pub date: NaiveDate,
    pub payments: usize,
    pub amount: Decimal,
    pub with_management: usize,
    pub amount_with_management: Decimal,
    pub post_payment_only: usize,
    pub agents: Vec<AgentAttribution>,
}

impl EffectivenessReport {
    pub async fn for_day<S>(store: &S, date: NaiveDate) -> Result<Self, AttributionError>
    where
        S: PaymentLedger + ?Sized,
    {
        let payments = store.attributed_payments_on(date).await?;
        Ok(Self::from_payments(date, &payments))
    }

    pub fn from_payments(date: NaiveDate, payments: &[AttributedPayment]) -> Self {
        let mut report = Self {
            date,
            payments: payments.len(),
            amount: Decimal::ZERO,
            with_management: 0,
            amount_with_management: Decimal::ZERO,
            post_payment_only: 0,
            agents: Vec::new(),
        };
        let mut by_agent: BTreeMap<i64, AgentAttribution> = BTreeMap::new();

        for payment in payments {
            report.amount += payment.amount;

            if payment.attribution.has_management == YesNo::Yes {
                report.with_management += 1;
                report.amount_with_management += payment.amount;
            } else if payment.attribution.post_payment_management == YesNo::Yes {
                report.post_payment_only += 1;
            }

            if let Some(agent_id) = payment.primary_agent_id {
                let entry = by_agent.entry(agent_id).or_insert(AgentAttribution {
                    agent_id,
                    payments: 0,
                    amount: Decimal::ZERO,
                });
                entry.payments += 1;
                entry.amount += payment.amount;
            }
        }

        report.agents = by_agent.into_values().collect();
        report
    }

    /// Share of collected amount attributed to a management, 0..=1.
    pub fn effectiveness_ratio(&self) -> Decimal {
        if self.amount.is_zero() {
            return Decimal::ZERO;
        }
        (self.amount_with_management / self.amount).round_dp(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{CAMPAIGN, day, payment, record, seeded_store, snapshot};
    use crate::reconciler::BatchReconciler;
    use cobranza_core::{SnapshotStore, Substate};

    #[tokio::test]
    async fn summarises_a_reconciled_day() {
        let store = seeded_store().await;
        store.append_snapshot(snapshot(1, CAMPAIGN, day(2024, 3, 15), 45)).await.unwrap();
        store
            .insert_management(record(
                1,
                "2024-03-10 08:00:00",
                Substate::PaymentOffer,
                Some(40),
                None,
            ))
            .await;
        store
            .insert_management(record(
                2,
                "2024-03-20 08:00:00",
                Substate::PromiseToPay,
                Some(50),
                None,
            ))
            .await;
        store.insert_payment(payment(1, 1, "2024-03-15 10:00:00")).await;
        store.insert_payment(payment(2, 1, "2024-03-15 12:00:00")).await;

        BatchReconciler::new(&store)
            .reconcile_day(day(2024, 3, 15))
            .await
            .unwrap();
        let report = EffectivenessReport::for_day(&store, day(2024, 3, 15))
            .await
            .unwrap();

        assert_eq!(report.payments, 2);
        assert_eq!(report.with_management, 2);
        assert_eq!(report.post_payment_only, 0);
        assert_eq!(report.amount, Decimal::new(50000, 2));
        assert_eq!(
            report.agents,
            vec![AgentAttribution {
                agent_id: 101,
                payments: 2,
                amount: Decimal::new(50000, 2),
            }]
        );
        assert_eq!(report.effectiveness_ratio(), Decimal::ONE);
    }

    #[test]
    fn post_payment_only_counts_unattributed_payments() {
        let attributed = |payment_id, has_management, post_payment_management| AttributedPayment {
            payment_id,
            amount: Decimal::new(100, 0),
            attribution: cobranza_core::Attribution {
                has_management,
                primary: None,
                secondary: None,
                post_payment_management,
            },
            primary_agent_id: None,
        };

        let report = EffectivenessReport::from_payments(
            day(2024, 3, 15),
            &[
                attributed(1, YesNo::Yes, YesNo::No),
                attributed(2, YesNo::No, YesNo::Yes),
                attributed(3, YesNo::No, YesNo::No),
                attributed(4, YesNo::No, YesNo::No),
            ],
        );

        assert_eq!(report.with_management, 1);
        assert_eq!(report.post_payment_only, 1);
        assert_eq!(report.effectiveness_ratio(), Decimal::new(25, 2));
        assert!(report.agents.is_empty());
    }
}
