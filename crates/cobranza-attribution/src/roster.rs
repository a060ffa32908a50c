use chrono::NaiveDate;
use cobranza_core::{AttributionError, CreditStore, NewSnapshot, SnapshotStore};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreezeSummary {
    pub campaign_id: i64,
    pub date: NaiveDate,
    pub created: usize,
    pub skipped: usize,
}

/// Captures the daily delinquency snapshot of a campaign's roster.
pub struct RosterFreezer<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> RosterFreezer<'a, S>
where
    S: CreditStore + SnapshotStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn freeze(
        &self,
        campaign_id: i64,
        date: NaiveDate,
    ) -> Result<FreezeSummary, AttributionError> {
        let roster = self.store.campaign_roster(campaign_id).await?;
        let mut summary = FreezeSummary {
            campaign_id,
            date,
            created: 0,
            skipped: 0,
        };

        for credit in roster {
            let inserted = self
                .store
                .append_snapshot(NewSnapshot {
                    credit_id: credit.id,
                    campaign_id,
                    captured_on: date,
                    days_past_due: credit.days_past_due,
                    outstanding: credit.balances.total(),
                })
                .await?;

            if inserted {
                summary.created += 1;
            } else {
                summary.skipped += 1;
            }
        }

        info!(
            campaign_id,
            %date,
            created = summary.created,
            skipped = summary.skipped,
            "campaign roster frozen"
        );

        Ok(summary)
    }
}
