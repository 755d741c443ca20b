//! Cancelable auto-expiry tasks for active calls.
//!
//! The lifecycle layer schedules one expiry task per active call when it
//! starts; ending the call early cancels the task. Cancellation is
//! idempotent, and the expiry callback itself must tolerate the call having
//! already ended (racing end triggers are expected).

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// How long to wait before the single retry of a failed expiry attempt.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Schedules and cancels per-call expiry tasks.
pub struct ExpiryScheduler {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
    retry_delay: Duration,
}

impl Default for ExpiryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpiryScheduler {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    #[cfg(test)]
    fn with_retry_delay(retry_delay: Duration) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            retry_delay,
        }
    }

    /// Schedules `expire` to run once at `deadline`.
    ///
    /// A failed attempt is logged and retried exactly once after a short
    /// delay; a second failure is logged and dropped so the expiry task can
    /// never crash the host process. Scheduling again for the same call
    /// replaces the previous task.
    pub async fn schedule<F, Fut>(&self, call_id: String, deadline: DateTime<Utc>, expire: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = fitroom_core::Result<()>> + Send + 'static,
    {
        let delay = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let retry_delay = self.retry_delay;
        let id = call_id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = expire(id.clone()).await {
                tracing::warn!("[ExpiryScheduler] expiry of call {id} failed: {e}; retrying once");
                tokio::time::sleep(retry_delay).await;
                if let Err(e) = expire(id.clone()).await {
                    tracing::error!("[ExpiryScheduler] expiry retry of call {id} failed: {e}");
                }
            }
        });

        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.insert(call_id, handle) {
            previous.abort();
        }
    }

    /// Cancels the expiry task for `call_id`, if one is still scheduled.
    /// Canceling an unknown or already-fired task is a no-op.
    pub async fn cancel(&self, call_id: &str) {
        if let Some(handle) = self.tasks.lock().await.remove(call_id) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitroom_core::FitroomError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fires_at_deadline() {
        let scheduler = ExpiryScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        scheduler
            .schedule(
                "call-1".to_string(),
                Utc::now() + chrono::Duration::milliseconds(20),
                move |_| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
            )
            .await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_prevents_firing() {
        let scheduler = ExpiryScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        scheduler
            .schedule(
                "call-1".to_string(),
                Utc::now() + chrono::Duration::milliseconds(50),
                move |_| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
            )
            .await;

        scheduler.cancel("call-1").await;
        // Idempotent: canceling again is a no-op.
        scheduler.cancel("call-1").await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_expiry_retries_once() {
        let scheduler = ExpiryScheduler::with_retry_delay(Duration::from_millis(10));
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        scheduler
            .schedule(
                "call-1".to_string(),
                Utc::now(),
                move |_| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(FitroomError::data_access("store unavailable"))
                    }
                },
            )
            .await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
