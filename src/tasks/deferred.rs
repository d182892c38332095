//! Deferred Invalidation Task
//!
//! One-shot timers for changes that take effect at a future timestamp, such
//! as a scheduled sale price starting or ending. The invalidation itself is
//! not run when the change is saved but when it becomes visible.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{ChangeEvent, InvalidationEngine};

/// A timer that has been registered but not yet fired.
#[derive(Debug)]
struct PendingFlush {
    due: DateTime<Utc>,
    handle: JoinHandle<()>,
}

// == Deferred Invalidator ==
/// Registry of pending one-shot invalidation timers.
///
/// At most one timer exists per entity id; registering again while one is
/// pending is a no-op. Each timer is a spawned task that sleeps until its
/// trigger time, runs the engine, and unregisters itself.
#[derive(Debug, Clone)]
pub struct DeferredInvalidator {
    engine: InvalidationEngine,
    pending: Arc<Mutex<HashMap<u64, PendingFlush>>>,
}

impl DeferredInvalidator {
    // == Constructor ==
    pub fn new(engine: InvalidationEngine) -> Self {
        Self {
            engine,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // == Schedule ==
    /// Registers a one-shot invalidation of `event` at `due`.
    ///
    /// Returns false without side effects when a timer for the same entity is
    /// already pending, or when the event has no entity id (global events
    /// have nothing to defer). A trigger time in the past fires immediately.
    pub async fn schedule(&self, event: ChangeEvent, due: DateTime<Utc>) -> bool {
        let Some(entity_id) = event.entity_id() else {
            debug!("deferred invalidation needs an entity id, ignoring");
            return false;
        };

        let mut pending = self.pending.lock().await;
        if let Some(existing) = pending.get(&entity_id) {
            debug!(entity_id, due = %existing.due, "flush already scheduled");
            return false;
        }

        let delay = (due - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let engine = self.engine.clone();
        let registry = Arc::clone(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.handle(&event).await;
            registry.lock().await.remove(&entity_id);
        });

        info!(entity_id, due = %due, "scheduled deferred invalidation");
        pending.insert(entity_id, PendingFlush { due, handle });
        true
    }

    // == Cancel ==
    /// Aborts and removes a pending timer. False if none was pending.
    pub async fn cancel(&self, entity_id: u64) -> bool {
        match self.pending.lock().await.remove(&entity_id) {
            Some(flush) => {
                flush.handle.abort();
                debug!(entity_id, "cancelled deferred invalidation");
                true
            }
            None => false,
        }
    }

    // == Inspection ==
    /// Number of timers currently pending.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// When the pending timer for an entity will fire, if one exists.
    pub async fn pending_at(&self, entity_id: u64) -> Option<DateTime<Utc>> {
        self.pending.lock().await.get(&entity_id).map(|f| f.due)
    }

    // == Shutdown ==
    /// Aborts every pending timer.
    pub async fn shutdown(&self) {
        let mut pending = self.pending.lock().await;
        for (_, flush) in pending.drain() {
            flush.handle.abort();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{KeyBuilder, RedisStore};
    use crate::config::Config;
    use chrono::Duration as ChronoDuration;

    fn invalidator() -> DeferredInvalidator {
        let config = Config::default();
        let engine = InvalidationEngine::new(
            KeyBuilder::from_config(&config),
            Arc::new(RedisStore::new(&config)),
        );
        DeferredInvalidator::new(engine)
    }

    #[tokio::test]
    async fn test_schedule_registers_timer() {
        let deferred = invalidator();
        let due = Utc::now() + ChronoDuration::seconds(60);

        assert!(deferred
            .schedule(ChangeEvent::ProductUpdated { id: 1 }, due)
            .await);
        assert_eq!(deferred.pending_count().await, 1);
        assert_eq!(deferred.pending_at(1).await, Some(due));

        deferred.shutdown().await;
    }

    #[tokio::test]
    async fn test_reregistration_is_noop() {
        let deferred = invalidator();
        let due = Utc::now() + ChronoDuration::seconds(60);

        assert!(deferred
            .schedule(ChangeEvent::ProductUpdated { id: 1 }, due)
            .await);
        assert!(!deferred
            .schedule(ChangeEvent::ProductUpdated { id: 1 }, due)
            .await);
        assert!(!deferred
            .schedule(
                ChangeEvent::ProductUpdated { id: 1 },
                due + ChronoDuration::seconds(30)
            )
            .await);
        assert_eq!(deferred.pending_count().await, 1);

        deferred.shutdown().await;
    }

    #[tokio::test]
    async fn test_distinct_entities_schedule_independently() {
        let deferred = invalidator();
        let due = Utc::now() + ChronoDuration::seconds(60);

        assert!(deferred
            .schedule(ChangeEvent::ProductUpdated { id: 1 }, due)
            .await);
        assert!(deferred
            .schedule(ChangeEvent::ProductUpdated { id: 2 }, due)
            .await);
        assert_eq!(deferred.pending_count().await, 2);

        deferred.shutdown().await;
    }

    #[tokio::test]
    async fn test_global_event_is_rejected() {
        let deferred = invalidator();
        let due = Utc::now() + ChronoDuration::seconds(60);

        assert!(!deferred.schedule(ChangeEvent::SettingsChanged, due).await);
        assert_eq!(deferred.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_timer_fires_and_unregisters() {
        let deferred = invalidator();
        let due = Utc::now() + ChronoDuration::milliseconds(50);

        deferred
            .schedule(ChangeEvent::ProductUpdated { id: 1 }, due)
            .await;
        assert_eq!(deferred.pending_count().await, 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(deferred.pending_count().await, 0);

        // The slot is free again once the timer fired.
        assert!(deferred
            .schedule(
                ChangeEvent::ProductUpdated { id: 1 },
                Utc::now() + ChronoDuration::seconds(60)
            )
            .await);
        deferred.shutdown().await;
    }

    #[tokio::test]
    async fn test_past_due_fires_immediately() {
        let deferred = invalidator();
        let due = Utc::now() - ChronoDuration::seconds(10);

        deferred
            .schedule(ChangeEvent::ProductUpdated { id: 1 }, due)
            .await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(deferred.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_removes_timer() {
        let deferred = invalidator();
        let due = Utc::now() + ChronoDuration::seconds(60);

        deferred
            .schedule(ChangeEvent::ProductUpdated { id: 1 }, due)
            .await;
        assert!(deferred.cancel(1).await);
        assert!(!deferred.cancel(1).await);
        assert_eq!(deferred.pending_count().await, 0);
    }
}
