use crate::actor::WeakActorClient;
use crate::timers::time::Clock;
use tokio::sync::oneshot;
use tokio::time::Duration;

/// Keeps the retry ticker task alive. Dropping the handle stops the task immediately, even in the
/// middle of a sleep.
///
/// There is one ticker per leadership term, not one per follower. Each tick is delivered to the
/// actor as a retry event, and every replication stream checks its own deadline against it.
pub(crate) struct RetryTickerHandle {
    _stop: oneshot::Sender<()>,
}

struct RetryTickerTask<C: Clock> {
    interval: Duration,
    actor_client: WeakActorClient,
    clock: C,
    stop: oneshot::Receiver<()>,
}

impl RetryTickerHandle {
    pub(crate) fn spawn<C: Clock>(interval: Duration, actor_client: WeakActorClient, clock: C) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = RetryTickerTask {
            interval,
            actor_client,
            clock,
            stop: stop_rx,
        };
        tokio::task::spawn(task.run());

        RetryTickerHandle { _stop: stop_tx }
    }
}

impl<C: Clock> RetryTickerTask<C> {
    async fn run(mut self) {
        loop {
            let wake_time = self.clock.deadline_after(self.interval);
            tokio::select! {
                _ = &mut self.stop => return,
                _ = self.clock.sleep_until(wake_time) => {}
            }

            if self.actor_client.retry_tick().await.is_err() {
                // Actor has exited, nobody is left to retry for.
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorClient;
    use crate::timers::test_utils::TestUtilActor;
    use crate::timers::time;

    #[tokio::test]
    async fn retry_ticker_lifecycle() {
        // -- setup --
        let interval = Duration::from_millis(100);
        let (actor_client, rx) = ActorClient::new(10);
        let mut actor = TestUtilActor::new(rx);
        let (mock_clock, mut mock_clock_controller) = time::mocked_clock();

        // -- execute & verify --

        // 1. Spawn ticker. Nothing fires before the first interval elapses.
        let handle = RetryTickerHandle::spawn(interval, actor_client.weak(), mock_clock);
        actor.assert_no_event().await;

        // 2. One tick per interval.
        for _ in 0..5 {
            mock_clock_controller.advance(interval);
            actor.assert_retry_tick_event().await;
            actor.assert_no_event().await;
        }

        // 3. Half an interval is not enough.
        mock_clock_controller.advance(interval / 2);
        actor.assert_no_event().await;
        mock_clock_controller.advance(interval / 2);
        actor.assert_retry_tick_event().await;

        // 4. Drop the handle. No more ticks, however far time moves.
        drop(handle);
        for _ in 0..3 {
            mock_clock_controller.advance(interval);
            actor.assert_no_event().await;
        }
    }

    #[tokio::test]
    async fn retry_ticker_exits_when_actor_is_gone() {
        let interval = Duration::from_millis(100);
        let (actor_client, rx) = ActorClient::new(10);
        let weak_client = actor_client.weak();
        drop(actor_client);
        drop(rx);
        let (mock_clock, mut mock_clock_controller) = time::mocked_clock();

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = RetryTickerTask {
            interval,
            actor_client: weak_client,
            clock: mock_clock,
            stop: stop_rx,
        };
        let join_handle = tokio::task::spawn(task.run());

        tokio::time::sleep(Duration::from_millis(10)).await;
        mock_clock_controller.advance(interval);

        tokio::time::timeout(Duration::from_secs(5), join_handle)
            .await
            .expect("Ticker should exit")
            .unwrap();
        drop(stop_tx);
    }
}
