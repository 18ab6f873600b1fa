use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Outstanding-work counter for one breadth-first wave.
///
/// Every task of the wave is registered with [`enter`] before it is
/// handed to a worker pool; the matching exit runs when the returned
/// [`WaveGuard`] drops, so no code path can leak a registration. The
/// driver blocks on [`drained`] between waves.
///
/// [`enter`]: WaveBarrier::enter
/// [`drained`]: WaveBarrier::drained
#[derive(Debug, Clone, Default)]
pub(crate) struct WaveBarrier {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    outstanding: AtomicUsize,
    drained: Notify,
}

impl WaveBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more outstanding task.
    pub fn enter(&self) -> WaveGuard {
        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
        WaveGuard {
            inner: self.inner.clone(),
        }
    }

    /// Waits until every entered task has exited.
    pub async fn drained(&self) {
        loop {
            let mut notified = pin!(self.inner.drained.notified());
            // Register for wakeup before checking, so an exit that lands
            // in between cannot be missed.
            notified.as_mut().enable();
            if self.inner.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Exit token of a single wave task.
#[derive(Debug)]
pub(crate) struct WaveGuard {
    inner: Arc<Inner>,
}

impl Drop for WaveGuard {
    fn drop(&mut self) {
        if self.inner.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn drains_immediately_when_empty() {
        let barrier = WaveBarrier::new();
        timeout(Duration::from_millis(100), barrier.drained())
            .await
            .expect("empty barrier should drain at once");
    }

    #[tokio::test]
    async fn drains_once_every_guard_is_dropped() {
        let barrier = WaveBarrier::new();
        let first = barrier.enter();
        let second = barrier.enter();

        drop(first);
        assert!(
            timeout(Duration::from_millis(20), barrier.drained())
                .await
                .is_err(),
            "one task still outstanding"
        );

        drop(second);
        timeout(Duration::from_millis(100), barrier.drained())
            .await
            .expect("all guards dropped");
    }

    #[tokio::test]
    async fn guard_exits_from_a_spawned_task() {
        let barrier = WaveBarrier::new();
        let guard = barrier.enter();
        tokio::spawn(async move {
            let _exit = guard;
            tokio::time::sleep(Duration::from_millis(10)).await;
        });
        timeout(Duration::from_secs(1), barrier.drained())
            .await
            .expect("guard dropped when the task finished");
    }
}
