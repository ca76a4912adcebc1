use crate::actor::Event;
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::mpsc;

struct TestUtilReceiver<T> {
    rx: mpsc::Receiver<T>,
}

impl<T: Debug> TestUtilReceiver<T> {
    fn new(rx: mpsc::Receiver<T>) -> Self {
        TestUtilReceiver { rx }
    }

    async fn recv(&mut self) -> T {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("Unexpected timeout")
            .expect("Expected value")
    }

    async fn recv_assert_timeout(&mut self, timeout: Duration) {
        tokio::time::timeout(timeout, self.rx.recv())
            .await
            .expect_err("Expected timeout");
    }
}

/// Stands in for the shipping actor and asserts on the events timers deliver to it.
pub(crate) struct TestUtilActor {
    receiver: TestUtilReceiver<Event>,
    timeout: Duration,
}

impl TestUtilActor {
    pub(crate) fn new(actor_queue_rx: mpsc::Receiver<Event>) -> Self {
        TestUtilActor {
            receiver: TestUtilReceiver::new(actor_queue_rx),
            timeout: Duration::from_millis(10),
        }
    }

    pub(crate) async fn assert_retry_tick_event(&mut self) {
        match self.receiver.recv().await {
            Event::RetryTick => {}
            other => panic!("Unexpected event {:?}", other),
        }
    }

    pub(crate) async fn assert_no_event(&mut self) {
        self.receiver.recv_assert_timeout(self.timeout).await;
    }
}
