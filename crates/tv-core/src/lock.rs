//! Per-subscriber serialization of pipeline mutations.
//!
//! Each subscriber id maps to its own async mutex, so two mutations for the
//! same subscriber never interleave their read-modify-write cycles while
//! different subscribers proceed in parallel.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct SubscriberLocks {
  locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl SubscriberLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `subscriber_id`. Released on drop.
  pub async fn acquire(&self, subscriber_id: Uuid) -> OwnedMutexGuard<()> {
    let lock = {
      let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
      Arc::clone(locks.entry(subscriber_id).or_default())
    };
    lock.lock_owned().await
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize {
    self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn same_subscriber_is_exclusive() {
    let locks = Arc::new(SubscriberLocks::new());
    let id = Uuid::new_v4();

    let guard = locks.acquire(id).await;
    let waiter = {
      let locks = Arc::clone(&locks);
      tokio::spawn(async move {
        let _g = locks.acquire(id).await;
      })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    waiter.await.unwrap();
  }

  #[tokio::test]
  async fn different_subscribers_do_not_block() {
    let locks = SubscriberLocks::new();
    let _a = locks.acquire(Uuid::new_v4()).await;
    let _b = locks.acquire(Uuid::new_v4()).await;
  }
}
