use crate::cluster::MemberId;
use crate::shipping::{LeaderContext, ReplicationCommand, ReplicationManager, StreamStatus};
use crate::timers::{Clock, RealClock, RetryTickerHandle};
use std::collections::HashSet;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;

// Every structural operation on the manager goes through this queue, so pause/resume/stop,
// dispatch, membership changes and retry ticks never interleave. The manager itself needs no
// lock.
#[derive(Debug)]
pub(crate) enum Event {
    // Stop and discard all streams. Stop the retry ticker.
    Pause(Callback<()>),

    // Create streams for every replication target. Start the retry ticker.
    Resume(LeaderContext, Callback<()>),

    // Pause, then refuse every later resume.
    Stop(Callback<()>),

    // Apply each command to every stream, in order.
    Dispatch(Vec<ReplicationCommand>, LeaderContext, Callback<()>),

    // Reconcile streams with the membership provider.
    MembershipChanged,

    // Each stream resends whatever is overdue.
    RetryTick,

    ReplicationTargets(Callback<HashSet<MemberId>>),
    StreamStatus(MemberId, Callback<Option<StreamStatus>>),
}

#[derive(Debug)]
pub(crate) struct Callback<T: Debug>(oneshot::Sender<T>);

impl<T: Debug> Callback<T> {
    fn send(self, message: T) {
        let _ = self.0.send(message);
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Log shipping actor has exited")]
pub(crate) struct ActorExited;

#[derive(Clone)]
pub(crate) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

impl ActorClient {
    pub(crate) fn new(buffer_size: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer_size);

        (ActorClient { sender: tx }, rx)
    }

    /// Timers and background tasks hold a weak client so they never keep the actor alive.
    pub(crate) fn weak(&self) -> WeakActorClient {
        WeakActorClient {
            sender: self.sender.downgrade(),
        }
    }

    pub(crate) async fn pause(&self) -> Result<(), ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Pause(Callback(tx))).await?;
        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn resume(&self, context: LeaderContext) -> Result<(), ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Resume(context, Callback(tx))).await?;
        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn stop(&self) -> Result<(), ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Stop(Callback(tx))).await?;
        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn dispatch(
        &self,
        commands: Vec<ReplicationCommand>,
        context: LeaderContext,
    ) -> Result<(), ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Dispatch(commands, context, Callback(tx))).await?;
        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn membership_changed(&self) -> Result<(), ActorExited> {
        self.send(Event::MembershipChanged).await
    }

    pub(crate) async fn replication_targets(&self) -> Result<HashSet<MemberId>, ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::ReplicationTargets(Callback(tx))).await?;
        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn stream_status(&self, member: MemberId) -> Result<Option<StreamStatus>, ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::StreamStatus(member, Callback(tx))).await?;
        rx.await.map_err(|_| ActorExited)
    }

    async fn send(&self, event: Event) -> Result<(), ActorExited> {
        self.sender.send(event).await.map_err(|_| ActorExited)
    }
}

#[derive(Clone)]
pub(crate) struct WeakActorClient {
    sender: mpsc::WeakSender<Event>,
}

impl WeakActorClient {
    pub(crate) async fn retry_tick(&self) -> Result<(), ActorExited> {
        self.send(Event::RetryTick).await
    }

    pub(crate) async fn membership_changed(&self) -> Result<(), ActorExited> {
        self.send(Event::MembershipChanged).await
    }

    async fn send(&self, event: Event) -> Result<(), ActorExited> {
        match self.sender.upgrade() {
            Some(sender) => sender.send(event).await.map_err(|_| ActorExited),
            None => Err(ActorExited),
        }
    }
}

/// ShippingActor runs the replication manager in actor model.
pub(crate) struct ShippingActor<C: Clock = RealClock> {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Event>,
    manager: ReplicationManager<C>,
    actor_client: WeakActorClient,
    clock: C,
    retry_tick_interval: Duration,
    retry_ticker: Option<RetryTickerHandle>,
}

impl<C: Clock> ShippingActor<C> {
    pub(crate) fn new(
        logger: slog::Logger,
        receiver: mpsc::Receiver<Event>,
        manager: ReplicationManager<C>,
        actor_client: WeakActorClient,
        clock: C,
        retry_tick_interval: Duration,
    ) -> Self {
        ShippingActor {
            logger,
            receiver,
            manager,
            actor_client,
            clock,
            retry_tick_interval,
            retry_ticker: None,
        }
    }

    pub(crate) async fn run_event_loop(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
        }

        // Every client is gone. Nobody can resume us again.
        self.manager.stop();
        self.retry_ticker = None;
        slog::info!(self.logger, "Log shipping actor exited");
    }

    // This must NOT be async. Sends are fire-and-forget and log reads are short, so nothing here
    // waits on a peer.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Pause(callback) => {
                self.manager.pause();
                self.retry_ticker = None;
                callback.send(());
            }
            Event::Resume(context, callback) => {
                self.manager.resume(context);
                if self.manager.is_running() && self.retry_ticker.is_none() {
                    self.retry_ticker = Some(RetryTickerHandle::spawn(
                        self.retry_tick_interval,
                        self.actor_client.clone(),
                        self.clock.clone(),
                    ));
                }
                callback.send(());
            }
            Event::Stop(callback) => {
                self.manager.stop();
                self.retry_ticker = None;
                callback.send(());
            }
            Event::Dispatch(commands, context, callback) => {
                self.manager.dispatch(&commands, context);
                callback.send(());
            }
            Event::MembershipChanged => {
                self.manager.on_membership_changed();
            }
            Event::RetryTick => {
                self.manager.retry_tick();
            }
            Event::ReplicationTargets(callback) => {
                callback.send(self.manager.replication_targets());
            }
            Event::StreamStatus(member, callback) => {
                callback.send(self.manager.stream_status(&member));
            }
        }
    }
}
