//! Payment–management attribution: decides which collection action, if any,
//! a received payment is credited to.

pub mod attributor;
pub mod cache;
pub mod effectiveness;
pub mod reconciler;
pub mod roster;
pub mod rules;
pub mod selector;
pub mod snapshot;

#[cfg(test)]
mod fixtures;

pub use attributor::PaymentAttributor;
pub use cache::ManagementCache;
pub use effectiveness::{AgentAttribution, EffectivenessReport};
pub use reconciler::{BatchReconciler, ReconcileSummary};
pub use roster::{FreezeSummary, RosterFreezer};
pub use rules::AttributionRules;
pub use selector::ManagementSelector;
pub use snapshot::{ResolvedSnapshot, SnapshotResolver};
