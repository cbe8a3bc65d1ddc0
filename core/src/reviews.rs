// foodloop/src/reviews.rs

//! Where reviews meet the order lifecycle: only a delivered order can be
//! reviewed, and only once. Rating aggregation is someone else's job; it is
//! kicked off detached and can never fail the review itself.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Order, OrderStatus};
use crate::store::OrderStore;

/// Recomputes a provider's aggregate rating after one of its orders was reviewed.
#[async_trait]
pub trait RatingHook: Send + Sync {
  async fn recompute_provider_rating(&self, provider_id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct ReviewDesk {
  store: Arc<dyn OrderStore>,
  rating_hook: Option<Arc<dyn RatingHook>>,
}

impl ReviewDesk {
  pub fn new(store: Arc<dyn OrderStore>, rating_hook: Option<Arc<dyn RatingHook>>) -> Self {
    Self { store, rating_hook }
  }

  #[instrument(name = "reviews::mark_reviewed", skip(self), err(Display))]
  pub async fn mark_reviewed(&self, order_id: Uuid, user_profile_id: Uuid) -> EngineResult<Order> {
    let mut order = self
      .store
      .order(order_id)
      .await?
      .ok_or_else(|| EngineError::not_found("order", order_id))?;
    if order.user_profile_id != user_profile_id {
      return Err(EngineError::NotOwner {
        order_id,
        actor_id: user_profile_id,
      });
    }
    if order.status != OrderStatus::Delivered {
      return Err(EngineError::validation(format!(
        "order {} can only be reviewed once delivered (currently {})",
        order_id, order.status
      )));
    }
    if order.is_reviewed || !self.store.mark_reviewed(order_id).await? {
      return Err(EngineError::validation(format!("order {} has already been reviewed", order_id)));
    }
    order.is_reviewed = true;
    info!("Order marked as reviewed.");

    self.spawn_rating_refresh(order.provider_id);
    Ok(order)
  }

  fn spawn_rating_refresh(&self, provider_id: Uuid) {
    let Some(hook) = self.rating_hook.clone() else {
      return;
    };
    match tokio::runtime::Handle::try_current() {
      Ok(handle) => {
        handle.spawn(async move {
          if let Err(e) = hook.recompute_provider_rating(provider_id).await {
            warn!(%provider_id, error = %e, "Provider rating refresh failed.");
          }
        });
      }
      Err(_) => warn!(%provider_id, "No async runtime available; provider rating refresh skipped."),
    }
  }
}

impl std::fmt::Debug for ReviewDesk {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReviewDesk")
      .field("has_rating_hook", &self.rating_hook.is_some())
      .finish_non_exhaustive()
  }
}
