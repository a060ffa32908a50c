pub mod error;
pub mod models;
pub mod storage;
pub mod substate;
pub mod timestamp;

pub use error::AttributionError;
pub use models::{
    Attribution, AttributedPayment, Credit, CreditBalances, ManagementAction, ManagementRecord,
    MatchedAction, NewSnapshot, Payment, PaymentRecord, Snapshot, YesNo,
};
pub use storage::{CollectionStore, CreditStore, ManagementStore, PaymentLedger, SnapshotStore};
pub use substate::Substate;
pub use timestamp::{day_gap, parse_timestamp};
