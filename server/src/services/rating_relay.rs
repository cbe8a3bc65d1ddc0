// foodloop/server/src/services/rating_relay.rs

//! Stand-in for the ratings service: records that a provider's rating needs
//! recomputing. Aggregation itself lives elsewhere.

use async_trait::async_trait;
use foodloop::RatingHook;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct LoggingRatingRelay {
  /// Simulated round-trip to the ratings service.
  pub latency: Duration,
}

#[async_trait]
impl RatingHook for LoggingRatingRelay {
  async fn recompute_provider_rating(&self, provider_id: Uuid) -> anyhow::Result<()> {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
    info!(%provider_id, "Provider rating recompute requested.");
    Ok(())
  }
}
