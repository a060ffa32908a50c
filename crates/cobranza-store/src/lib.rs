use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use cobranza_core::{
    Attribution, AttributedPayment, AttributionError, Credit, CreditStore, ManagementRecord,
    ManagementStore, NewSnapshot, PaymentLedger, PaymentRecord, Snapshot, SnapshotStore,
};
use tokio::sync::RwLock;

struct StoredPayment {
    record: PaymentRecord,
    attribution: Option<Attribution>,
}

/// Collection data held in process memory.
#[derive(Default)]
pub struct InMemoryCollectionStore {
    credits: RwLock<HashMap<i64, Credit>>,
    rosters: RwLock<HashMap<i64, Vec<i64>>>,
    snapshots: RwLock<Vec<Snapshot>>,
    sequence: RwLock<i64>,
    managements: RwLock<HashMap<i64, Vec<ManagementRecord>>>,
    payments: RwLock<BTreeMap<i64, StoredPayment>>,
}

impl InMemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_credit(&self, credit: Credit) {
        self.credits.write().await.insert(credit.id, credit);
    }

    pub async fn enroll(&self, campaign_id: i64, credit_id: i64) {
        let mut rosters = self.rosters.write().await;
        let roster = rosters.entry(campaign_id).or_default();
        if !roster.contains(&credit_id) {
            roster.push(credit_id);
        }
    }

    pub async fn insert_management(&self, record: ManagementRecord) {
        self.managements
            .write()
            .await
            .entry(record.credit_id)
            .or_default()
            .push(record);
    }

    pub async fn insert_payment(&self, record: PaymentRecord) {
        self.payments.write().await.insert(
            record.id,
            StoredPayment {
                record,
                attribution: None,
            },
        );
    }

    pub async fn attribution(&self, payment_id: i64) -> Option<Attribution> {
        self.payments
            .read()
            .await
            .get(&payment_id)
            .and_then(|stored| stored.attribution)
    }

    pub async fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.read().await.clone()
    }
}

/// Calendar day of a payment. A row whose date portion does not parse
/// belongs to no day and is never listed, the same as a row a `TIMESTAMP`
/// column would have refused.
fn payment_day(record: &PaymentRecord) -> Option<NaiveDate> {
    let raw = record.paid_at.trim();
    let date_part = raw.split([' ', 'T']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[async_trait]
impl CreditStore for InMemoryCollectionStore {
    async fn credit(&self, credit_id: i64) -> Result<Option<Credit>, AttributionError> {
        Ok(self.credits.read().await.get(&credit_id).cloned())
    }

    async fn campaign_roster(&self, campaign_id: i64) -> Result<Vec<Credit>, AttributionError> {
        let rosters = self.rosters.read().await;
        let credits = self.credits.read().await;

        Ok(rosters
            .get(&campaign_id)
            .map(|ids| ids.iter().filter_map(|id| credits.get(id).cloned()).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SnapshotStore for InMemoryCollectionStore {
    async fn snapshot_on(
        &self,
        credit_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Snapshot>, AttributionError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .iter()
            .filter(|s| s.credit_id == credit_id && s.captured_on == date)
            .max_by_key(|s| s.id)
            .cloned())
    }

    async fn latest_snapshot_before(
        &self,
        credit_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Snapshot>, AttributionError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .iter()
            .filter(|s| s.credit_id == credit_id && s.captured_on < date)
            .max_by_key(|s| (s.captured_on, s.id))
            .cloned())
    }

    async fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<bool, AttributionError> {
        let mut snapshots = self.snapshots.write().await;
        let exists = snapshots.iter().any(|s| {
            s.credit_id == snapshot.credit_id
                && s.campaign_id == snapshot.campaign_id
                && s.captured_on == snapshot.captured_on
        });
        if exists {
            return Ok(false);
        }

        let mut sequence_guard = self.sequence.write().await;
        *sequence_guard += 1;

        snapshots.push(Snapshot {
            id: *sequence_guard,
            credit_id: snapshot.credit_id,
            campaign_id: snapshot.campaign_id,
            captured_on: snapshot.captured_on,
            days_past_due: snapshot.days_past_due,
            outstanding: snapshot.outstanding,
        });

        Ok(true)
    }
}

#[async_trait]
impl ManagementStore for InMemoryCollectionStore {
    async fn managements_for_credit(
        &self,
        credit_id: i64,
    ) -> Result<Vec<ManagementRecord>, AttributionError> {
        let managements = self.managements.read().await;
        Ok(managements.get(&credit_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PaymentLedger for InMemoryCollectionStore {
    async fn payments_on(&self, date: NaiveDate) -> Result<Vec<PaymentRecord>, AttributionError> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .filter(|stored| payment_day(&stored.record) == Some(date))
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn write_attribution(
        &self,
        payment_id: i64,
        attribution: &Attribution,
    ) -> Result<(), AttributionError> {
        let mut payments = self.payments.write().await;
        let stored = payments
            .get_mut(&payment_id)
            .ok_or_else(|| AttributionError::store(format!("payment {payment_id} not found")))?;
        stored.attribution = Some(*attribution);
        Ok(())
    }

    async fn attributed_payments_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttributedPayment>, AttributionError> {
        let payments = self.payments.read().await;
        let managements = self.managements.read().await;

        let agent_of = |credit_id: i64, action_id: i64| {
            managements
                .get(&credit_id)
                .and_then(|records| records.iter().find(|m| m.id == action_id))
                .and_then(|m| m.agent_id)
        };

        Ok(payments
            .values()
            .filter(|stored| payment_day(&stored.record) == Some(date))
            .filter_map(|stored| {
                let attribution = stored.attribution?;
                let primary_agent_id = attribution
                    .primary
                    .and_then(|primary| agent_of(stored.record.credit_id, primary.action_id));

                Some(AttributedPayment {
                    payment_id: stored.record.id,
                    amount: stored.record.amount,
                    attribution,
                    primary_agent_id,
                })
            })
            .collect())
    }
}
