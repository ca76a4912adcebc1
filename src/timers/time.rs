#[cfg(test)]
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

/// Clock is the only source of time for replication streams and the retry ticker, so tests can
/// drive retries deterministically.
#[async_trait::async_trait]
pub(crate) trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    async fn sleep_until(&mut self, deadline: Instant);

    fn deadline_after(&self, duration: Duration) -> Instant {
        self.now() + duration
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct RealClock;

#[async_trait::async_trait]
impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
pub(crate) fn mocked_clock() -> (MockClock, MockClockController) {
    let start = Instant::now();
    let (tx, rx) = watch::channel(start);

    (
        MockClock { current_time: rx },
        MockClockController {
            current_time: tx,
            start,
        },
    )
}

/// Time only moves when the paired `MockClockController` advances it.
#[cfg(test)]
#[derive(Clone)]
pub(crate) struct MockClock {
    current_time: watch::Receiver<Instant>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current_time.borrow()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        while *self.current_time.borrow() < deadline {
            if self.current_time.changed().await.is_err() {
                // Controller is gone, time will never reach the deadline.
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
pub(crate) struct MockClockController {
    current_time: watch::Sender<Instant>,
    start: Instant,
}

#[cfg(test)]
impl MockClockController {
    pub(crate) fn elapsed(&self) -> Duration {
        *self.current_time.borrow() - self.start
    }

    /// Advance in steps no larger than the granularity you want to observe. A sleeper whose
    /// deadline is passed by a large jump only wakes once, at the new time.
    pub(crate) fn advance(&mut self, duration: Duration) {
        self.current_time.send_modify(|now| *now += duration);
    }
}
