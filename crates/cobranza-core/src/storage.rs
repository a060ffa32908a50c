use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AttributionError;
use crate::models::{
    Attribution, AttributedPayment, Credit, ManagementRecord, NewSnapshot, PaymentRecord, Snapshot,
};

#[async_trait]
pub trait CreditStore: Send + Sync {
    async fn credit(&self, credit_id: i64) -> Result<Option<Credit>, AttributionError>;

    /// Credits currently on the active roster of a campaign.
    async fn campaign_roster(&self, campaign_id: i64) -> Result<Vec<Credit>, AttributionError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Snapshot captured exactly on `date`, any campaign.
    async fn snapshot_on(
        &self,
        credit_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Snapshot>, AttributionError>;

    /// Most recent snapshot captured strictly before `date`.
    async fn latest_snapshot_before(
        &self,
        credit_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Snapshot>, AttributionError>;

    /// Appends a snapshot. Returns `false` when one already exists for the
    /// same (credit, campaign, day); existing snapshots are never touched.
    async fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<bool, AttributionError>;
}

#[async_trait]
pub trait ManagementStore: Send + Sync {
    async fn managements_for_credit(
        &self,
        credit_id: i64,
    ) -> Result<Vec<ManagementRecord>, AttributionError>;
}

#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn payments_on(&self, date: NaiveDate) -> Result<Vec<PaymentRecord>, AttributionError>;

    /// Overwrites the attribution fields of a payment.
    async fn write_attribution(
        &self,
        payment_id: i64,
        attribution: &Attribution,
    ) -> Result<(), AttributionError>;

    async fn attributed_payments_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttributedPayment>, AttributionError>;
}

/// Everything the attribution engine reads and writes.
pub trait CollectionStore: CreditStore + SnapshotStore + ManagementStore + PaymentLedger {}

impl<T> CollectionStore for T where
    T: CreditStore + SnapshotStore + ManagementStore + PaymentLedger
{
}
