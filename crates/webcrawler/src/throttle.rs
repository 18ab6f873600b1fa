use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Per-host admission control.
///
/// Each host gets a lazily created gate of `per_host` slots that lives
/// for the whole crawl; the slot is held only while the page downloads,
/// never across its link extraction. Dropping the returned permit
/// releases the slot.
#[derive(Debug)]
pub(crate) struct HostThrottle {
    per_host: usize,
    gates: DashMap<String, Arc<Semaphore>>,
    closed: AtomicBool,
}

impl HostThrottle {
    pub fn new(per_host: NonZeroUsize) -> Self {
        Self {
            per_host: per_host.get(),
            gates: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Waits for a download slot on `host`. Fails once the throttle is
    /// closed, in which case the caller abandons its task.
    pub async fn acquire(&self, host: &str) -> Result<OwnedSemaphorePermit, AcquireError> {
        let gate = self
            .gates
            .entry(host.to_owned())
            .or_insert_with(|| {
                let gate = Arc::new(Semaphore::new(self.per_host));
                if self.closed.load(Ordering::SeqCst) {
                    gate.close();
                }
                gate
            })
            .clone();
        gate.acquire_owned().await
    }

    /// Closes every gate, waking all waiters with an error.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        for gate in self.gates.iter() {
            gate.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    fn throttle(per_host: usize) -> HostThrottle {
        HostThrottle::new(per_host.try_into().unwrap())
    }

    #[tokio::test]
    async fn second_acquire_waits_for_release() {
        let throttle = throttle(1);
        let slot = throttle.acquire("example.com").await.unwrap();

        assert!(
            timeout(Duration::from_millis(20), throttle.acquire("example.com"))
                .await
                .is_err(),
            "the single slot is taken"
        );

        drop(slot);
        timeout(Duration::from_millis(100), throttle.acquire("example.com"))
            .await
            .expect("released slot unblocks the waiter")
            .unwrap();
    }

    #[tokio::test]
    async fn hosts_are_throttled_independently() {
        let throttle = throttle(1);
        let _one = throttle.acquire("one.example").await.unwrap();
        timeout(Duration::from_millis(100), throttle.acquire("two.example"))
            .await
            .expect("other host has its own gate")
            .unwrap();
    }

    #[tokio::test]
    async fn close_fails_later_acquires() {
        let throttle = throttle(1);
        let _slot = throttle.acquire("one.example").await.unwrap();

        throttle.close();
        assert!(throttle.acquire("one.example").await.is_err());
        assert!(throttle.acquire("never-seen.example").await.is_err());
    }
}
