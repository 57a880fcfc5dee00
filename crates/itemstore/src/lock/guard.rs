//! Held lease with background renewal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use itemstore_core::lock::{LockLease, LockProvider, MIN_RENEWABLE_LOCK_DURATION_SECONDS};
use itemstore_core::storage::{RepositoryError, Result};

/// A held lease renewed by a background task.
///
/// The task heartbeats every [`LockLease::heartbeat_interval`], retrying
/// failed heartbeats on the next tick. A heartbeat that does not answer
/// within one interval counts as failed. It stops when the guard is released
/// or dropped, or when the provider reports that the lease was lost.
/// Dropping the guard releases the lease on a best-effort basis; call
/// [`LockGuard::release`] to observe the outcome.
pub struct LockGuard<P>
where
    P: LockProvider + ?Sized + 'static,
{
    provider: Arc<P>,
    lease: Arc<Mutex<LockLease>>,
    lost: Arc<AtomicBool>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl<P> LockGuard<P>
where
    P: LockProvider + ?Sized + 'static,
{
    /// Acquires `key` and starts renewing it. `Ok(None)` when the lock is busy.
    ///
    /// Leases shorter than [`MIN_RENEWABLE_LOCK_DURATION_SECONDS`] cannot be
    /// kept alive and are refused with `InvalidData`.
    pub async fn acquire(provider: Arc<P>, key: &str, duration_seconds: i64) -> Result<Option<Self>> {
        check_renewable(duration_seconds)?;
        Ok(provider
            .acquire(key, duration_seconds)
            .await?
            .map(|lease| Self::spawn(provider, lease)))
    }

    /// Starts renewing an already acquired lease at its default cadence.
    pub fn spawn(provider: Arc<P>, lease: LockLease) -> Self {
        let interval = lease.heartbeat_interval();
        Self::with_interval(provider, lease, interval)
    }

    /// Starts renewing an already acquired lease every `interval`.
    pub fn with_interval(provider: Arc<P>, lease: LockLease, interval: Duration) -> Self {
        let lease = Arc::new(Mutex::new(lease));
        let lost = Arc::new(AtomicBool::new(false));
        let (stop, stopped) = oneshot::channel();

        let task = tokio::spawn(heartbeat_loop(
            provider.clone(),
            lease.clone(),
            lost.clone(),
            interval,
            stopped,
        ));

        Self {
            provider,
            lease,
            lost,
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// Snapshot of the lease as last renewed.
    pub async fn lease(&self) -> LockLease {
        self.lease.lock().await.clone()
    }

    /// True once a heartbeat was rejected; the caller no longer holds the lock.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Stops renewal and releases the lease.
    pub async fn release(mut self) -> Result<()> {
        self.stop_renewal().await;
        let lease = self.lease.lock().await.clone();
        self.provider.release(&lease).await
    }

    async fn stop_renewal(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "Lock heartbeat task failed");
            }
        }
    }
}

impl<P> Drop for LockGuard<P>
where
    P: LockProvider + ?Sized + 'static,
{
    fn drop(&mut self) {
        let Some(stop) = self.stop.take() else {
            return;
        };
        let _ = stop.send(());
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let provider = self.provider.clone();
        let lease = self.lease.clone();
        runtime.spawn(async move {
            let lease = lease.lock().await.clone();
            if let Err(err) = provider.release(&lease).await {
                tracing::warn!(lock_key = %lease.key, error = %err, "Failed to release dropped lock");
            }
        });
    }
}

/// Rejects lease lengths a heartbeat cannot keep alive.
pub(crate) fn check_renewable(duration_seconds: i64) -> Result<()> {
    if duration_seconds < MIN_RENEWABLE_LOCK_DURATION_SECONDS {
        return Err(RepositoryError::InvalidData(format!(
            "a renewed lock needs at least {MIN_RENEWABLE_LOCK_DURATION_SECONDS}s, got {duration_seconds}s"
        )));
    }
    Ok(())
}

async fn heartbeat_loop<P>(
    provider: Arc<P>,
    lease: Arc<Mutex<LockLease>>,
    lost: Arc<AtomicBool>,
    interval: Duration,
    mut stopped: oneshot::Receiver<()>,
) where
    P: LockProvider + ?Sized + 'static,
{
    loop {
        tokio::select! {
            _ = &mut stopped => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let mut current = lease.lock().await.clone();
        let beat = match tokio::time::timeout(interval, provider.heartbeat(&mut current)).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout(format!(
                "heartbeat exceeded {interval:?}"
            ))),
        };
        match beat {
            Ok(true) => {
                tracing::trace!(lock_key = %current.key, "Lock heartbeat");
                *lease.lock().await = current;
            }
            Ok(false) => {
                tracing::warn!(lock_key = %current.key, "Lock lease lost");
                lost.store(true, Ordering::SeqCst);
                break;
            }
            Err(err) => {
                tracing::warn!(lock_key = %current.key, error = %err, "Lock heartbeat failed, retrying");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use itemstore_core::time::ManualClock;

    use super::*;
    use crate::lock::InProcessLockProvider;

    const TICK: Duration = Duration::from_millis(10);

    /// Lock provider whose first heartbeat never answers.
    struct FirstBeatHangs {
        inner: InProcessLockProvider,
        beats: AtomicUsize,
    }

    #[async_trait]
    impl LockProvider for FirstBeatHangs {
        async fn acquire(&self, key: &str, duration_seconds: i64) -> Result<Option<LockLease>> {
            self.inner.acquire(key, duration_seconds).await
        }

        async fn heartbeat(&self, lease: &mut LockLease) -> Result<bool> {
            if self.beats.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            self.inner.heartbeat(lease).await
        }

        async fn release(&self, lease: &LockLease) -> Result<()> {
            self.inner.release(lease).await
        }

        async fn get_lock(&self, key: &str) -> Result<Option<LockLease>> {
            self.inner.get_lock(key).await
        }
    }

    fn provider() -> (ManualClock, Arc<InProcessLockProvider>) {
        let clock = ManualClock::new(1_000);
        let provider = Arc::new(InProcessLockProvider::with_clock(Arc::new(clock.clone())));
        (clock, provider)
    }

    #[tokio::test]
    async fn test_guard_keeps_lease_alive() {
        let (clock, provider) = provider();
        let lease = provider.acquire("jobs", 3).await.unwrap().unwrap();
        let guard = LockGuard::with_interval(provider.clone(), lease, TICK);

        for _ in 0..4 {
            clock.advance(2);
            tokio::time::sleep(TICK * 5).await;
        }

        assert!(!guard.is_lost());
        assert!(provider.get_lock("jobs").await.unwrap().is_some());
        assert_eq!(guard.lease().await.last_heartbeat_on, 1_008);

        guard.release().await.unwrap();
        assert!(provider.get_lock("jobs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guard_detects_lost_lease() {
        let (clock, provider) = provider();
        let lease = provider.acquire("jobs", 3).await.unwrap().unwrap();
        let guard = LockGuard::with_interval(provider.clone(), lease, TICK);

        clock.advance(10);
        let _thief = provider.acquire("jobs", 3).await.unwrap().unwrap();
        tokio::time::sleep(TICK * 5).await;

        assert!(guard.is_lost());
        guard.release().await.unwrap();
        assert!(provider.get_lock("jobs").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_acquire_busy_returns_none() {
        let (_, provider) = provider();
        let _held = LockGuard::acquire(provider.clone(), "jobs", 3)
            .await
            .unwrap()
            .unwrap();

        assert!(LockGuard::acquire(provider, "jobs", 3)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_lease() {
        let (_, provider) = provider();
        let guard = LockGuard::acquire(provider.clone(), "jobs", 3)
            .await
            .unwrap()
            .unwrap();

        drop(guard);
        tokio::time::sleep(TICK * 5).await;

        assert!(provider.get_lock("jobs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_two_second_lease_survives_second_boundaries() {
        let provider = Arc::new(InProcessLockProvider::new());
        let guard = LockGuard::acquire(provider.clone(), "short", 2)
            .await
            .unwrap()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert!(!guard.is_lost());
        assert!(provider.get_lock("short").await.unwrap().is_some());
        guard.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_unrenewable_lease_is_refused() {
        let provider = Arc::new(InProcessLockProvider::new());

        let result = LockGuard::acquire(provider.clone(), "short", 1).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
        assert!(provider.get_lock("short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hung_heartbeat_is_retried() {
        let clock = ManualClock::new(1_000);
        let provider = Arc::new(FirstBeatHangs {
            inner: InProcessLockProvider::with_clock(Arc::new(clock.clone())),
            beats: AtomicUsize::new(0),
        });
        let lease = provider.acquire("jobs", 3).await.unwrap().unwrap();
        let guard = LockGuard::with_interval(provider.clone(), lease, TICK);

        clock.advance(2);
        tokio::time::sleep(TICK * 10).await;

        assert!(provider.beats.load(Ordering::SeqCst) >= 2);
        assert!(!guard.is_lost());
        assert_eq!(guard.lease().await.last_heartbeat_on, 1_002);
        guard.release().await.unwrap();
    }
}
