use anyhow::{Context, Result};
use futures_util::StreamExt;
use futures_util::stream::LocalBoxStream;
use redis::{AsyncCommands, Client};
use serde::Serialize;

use crate::contracts::{AttributionRunCompleted, ReconcileRequested};

pub const RECONCILE_REQUESTED_CHANNEL: &str = "attribution.reconcile";
pub const RECONCILE_COMPLETED_CHANNEL: &str = "attribution.reconciled";

#[derive(Clone)]
pub struct RedisBus {
    client: Client,
}

impl RedisBus {
    pub fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self { client })
    }

    pub async fn publish_run_completed(&self, event: &AttributionRunCompleted) -> Result<()> {
        self.publish_json(RECONCILE_COMPLETED_CHANNEL, event).await
    }

    /// Reconcile requests as they arrive. Undecodable messages are yielded
    /// as errors so the caller can log and keep listening.
    pub async fn reconcile_requests(
        &self,
    ) -> Result<LocalBoxStream<'static, Result<ReconcileRequested>>> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(RECONCILE_REQUESTED_CHANNEL).await?;

        Ok(pubsub
            .into_on_message()
            .map(|msg| {
                let payload: String = msg.get_payload()?;
                serde_json::from_str::<ReconcileRequested>(&payload)
                    .with_context(|| format!("invalid reconcile request: {payload}"))
            })
            .boxed_local())
    }

    async fn publish_json<T: Serialize>(&self, channel: &str, payload: &T) -> Result<()> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let serialized = serde_json::to_string(payload)?;
        let _: i64 = connection.publish(channel, serialized).await?;
        Ok(())
    }
}
