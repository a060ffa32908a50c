pub mod config;
pub mod contracts;
pub mod pg_store;
pub mod redis_bus;

pub use config::ServiceConfig;
pub use contracts::{AttributionRunCompleted, ReconcileRequested};
pub use pg_store::PgCollectionStore;
pub use redis_bus::RedisBus;
