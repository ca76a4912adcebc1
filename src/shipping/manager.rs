use crate::cluster::{MemberId, MembershipProvider};
use crate::shipping::{LeaderContext, ReplicationCommand, ReplicationStream, StreamResources, StreamStatus};
use crate::timers::{Clock, RealClock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// ReplicationManager owns one replication stream per follower for as long as we are leader.
///
/// It isn't synchronized. The shipping actor is its only owner and applies every operation in
/// arrival order.
pub(crate) struct ReplicationManager<C: Clock = RealClock> {
    logger: slog::Logger,
    myself: MemberId,
    membership: Arc<dyn MembershipProvider>,
    resources: StreamResources<C>,

    streams: HashMap<MemberId, ReplicationStream<C>>,
    last_leader_context: Option<LeaderContext>,
    running: bool,
    stopped: bool,
}

impl<C: Clock> ReplicationManager<C> {
    pub(crate) fn new(
        logger: slog::Logger,
        myself: MemberId,
        membership: Arc<dyn MembershipProvider>,
        resources: StreamResources<C>,
    ) -> Self {
        ReplicationManager {
            logger,
            myself,
            membership,
            resources,
            streams: HashMap::new(),
            last_leader_context: None,
            running: false,
            stopped: false,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    /// We stepped down. Streams are discarded, not kept around for the next term.
    pub(crate) fn pause(&mut self) {
        self.running = false;
        for (_, mut stream) in self.streams.drain() {
            stream.stop();
        }
    }

    pub(crate) fn resume(&mut self, context: LeaderContext) {
        if self.stopped {
            slog::info!(self.logger, "Ignoring resume, log shipping is stopped");
            return;
        }

        slog::info!(self.logger, "Resuming log shipping for term {:?}", context.term);
        self.running = true;
        self.last_leader_context = Some(context);
        for member in self.membership.replication_targets() {
            self.ensure_stream_for(member, &context);
        }
    }

    pub(crate) fn stop(&mut self) {
        self.pause();
        self.stopped = true;
    }

    fn ensure_stream_for(&mut self, member: MemberId, context: &LeaderContext) {
        if member == self.myself || self.streams.contains_key(&member) {
            return;
        }

        let mut stream = ReplicationStream::new(
            &self.logger,
            self.myself.clone(),
            member.clone(),
            context,
            self.resources.clone(),
        );
        if let Err(e) = stream.start() {
            // The stream's retry deadline is armed. It probes again on the next tick.
            slog::warn!(self.logger, "Failed to start replication to {:?}: {}", member, e);
        }
        self.streams.insert(member, stream);
    }

    /// Each command reaches every stream before the next command is applied. One stream failing
    /// never keeps a command from the others.
    pub(crate) fn dispatch(&mut self, commands: &[ReplicationCommand], context: LeaderContext) {
        for command in commands {
            for (member, stream) in self.streams.iter_mut() {
                if let Err(e) = command.apply_to(stream, &context) {
                    slog::warn!(self.logger, "Failed to apply {:?} to {:?}: {}", command, member, e);
                }
            }
        }
        self.last_leader_context = Some(context);
    }

    pub(crate) fn retry_tick(&mut self) {
        if !self.running {
            return;
        }
        if let Some(context) = self.last_leader_context {
            self.dispatch(&[ReplicationCommand::RetryTimeout], context);
        }
    }

    pub(crate) fn on_membership_changed(&mut self) {
        let context = match self.last_leader_context {
            Some(context) if self.running => context,
            _ => return,
        };

        let targets = self.membership.replication_targets();
        let departed: Vec<MemberId> = self
            .streams
            .keys()
            .filter(|member| !targets.contains(*member))
            .cloned()
            .collect();
        for member in departed {
            if let Some(mut stream) = self.streams.remove(&member) {
                slog::info!(self.logger, "Stopping replication to departed member {:?}", member);
                stream.stop();
            }
        }

        for member in targets {
            self.ensure_stream_for(member, &context);
        }
    }

    pub(crate) fn replication_targets(&self) -> HashSet<MemberId> {
        self.streams.keys().cloned().collect()
    }

    pub(crate) fn stream_status(&self, member: &MemberId) -> Option<StreamStatus> {
        self.streams.get(member).map(|stream| stream.status())
    }
}
