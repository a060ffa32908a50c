use chrono::{DateTime, NaiveDate, Utc};
use cobranza_attribution::ReconcileSummary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asks a listening worker to reconcile one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileRequested {
    pub date: NaiveDate,
    #[serde(default = "default_requesting_service")]
    pub requested_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionRunCompleted {
    pub run_id: Uuid,
    pub date: NaiveDate,
    pub processed: usize,
    pub failed: usize,
    pub finished_at: DateTime<Utc>,
}

impl AttributionRunCompleted {
    pub fn from_summary(summary: &ReconcileSummary, finished_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            date: summary.date,
            processed: summary.processed,
            failed: summary.failed,
            finished_at,
        }
    }
}

fn default_requesting_service() -> String {
    "scheduler".to_string()
}
