use crate::cluster::MemberId;
use crate::commitlog::{DurableLog, EntryCache, Index, LogEntry, Term};
use crate::shipping::{LeaderContext, LogReadError, ShippingError};
use crate::timers::{Clock, RealClock};
use crate::transport::{AppendEntriesRequest, Heartbeat, ShippingMessage, Transport};
use std::cmp;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

#[derive(Copy, Clone, Debug)]
pub(crate) struct StreamConfig {
    pub(crate) retry_time: Duration,
    pub(crate) catchup_batch_size: u64,
    pub(crate) max_allowed_shipping_lag: u64,
}

/// Everything a stream needs that outlives it. Shared by every stream of a manager.
#[derive(Clone)]
pub(crate) struct StreamResources<C: Clock = RealClock> {
    pub(crate) log: Arc<dyn DurableLog>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) entry_cache: EntryCache,
    pub(crate) clock: C,
    pub(crate) config: StreamConfig,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamMode {
    /// Follower is in sync. New entries are shipped as soon as they're appended.
    Pipelining,
    /// Follower is behind. Entries are shipped one batch at a time, each batch after the previous
    /// one is acknowledged.
    CatchingUp,
    /// Follower's log diverges from ours. Probing backwards for the last common entry.
    Mismatched,
}

/// Point in time view of a replication stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamStatus {
    pub mode: StreamMode,
    pub match_index: Option<Index>,
    pub last_sent_index: Index,
    pub outstanding: usize,
}

/// ReplicationStream ships the leader's log to one follower.
///
/// It never waits on the follower. Sends are fire-and-forget and every decision is driven by the
/// commands applied to it: acknowledgments and rejections relayed from the follower, new entries,
/// commit updates, and retry ticks checked against its own deadline.
pub(crate) struct ReplicationStream<C: Clock = RealClock> {
    logger: slog::Logger,
    leader: MemberId,
    follower: MemberId,
    resources: StreamResources<C>,

    mode: StreamMode,
    term: Term,
    leader_commit: Index,
    // Highest index known to match on the follower. None until the first acknowledgment, and
    // again after a rejection below it.
    match_index: Option<Index>,
    // Last index of the most recent append, or the anchor of the most recent probe.
    last_sent_index: Index,
    // Sent and not yet acknowledged. Always the contiguous range after `match_index`.
    outstanding: BTreeSet<Index>,
    retry_deadline: Option<Instant>,
    stopped: bool,
}

impl<C: Clock> ReplicationStream<C> {
    pub(crate) fn new(
        logger: &slog::Logger,
        leader: MemberId,
        follower: MemberId,
        context: &LeaderContext,
        resources: StreamResources<C>,
    ) -> Self {
        ReplicationStream {
            logger: logger.new(slog::o!("Follower" => follower.as_str().to_string())),
            leader,
            follower,
            resources,
            mode: StreamMode::CatchingUp,
            term: context.term,
            leader_commit: context.commit_index,
            match_index: None,
            last_sent_index: Index::zero(),
            outstanding: BTreeSet::new(),
            retry_deadline: None,
            stopped: false,
        }
    }

    pub(crate) fn follower(&self) -> &MemberId {
        &self.follower
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub(crate) fn status(&self) -> StreamStatus {
        StreamStatus {
            mode: self.mode,
            match_index: self.match_index,
            last_sent_index: self.last_sent_index,
            outstanding: self.outstanding.len(),
        }
    }

    /// Probe the follower at our last index. Until it answers we don't know where its log ends.
    pub(crate) fn start(&mut self) -> Result<(), ShippingError> {
        slog::debug!(self.logger, "Starting replication stream");
        self.schedule_retry();
        let last_index = self.resources.log.last_index();
        self.send_probe(last_index)
    }

    pub(crate) fn stop(&mut self) {
        if self.stopped {
            return;
        }
        slog::debug!(self.logger, "Stopping replication stream");
        self.stopped = true;
        self.outstanding.clear();
        self.retry_deadline = None;
    }

    pub(crate) fn observe(&mut self, context: &LeaderContext) {
        self.term = context.term;
        self.ratchet_commit(context.commit_index);
    }

    pub(crate) fn on_new_entries(&mut self, up_to_index: Index) -> Result<(), ShippingError> {
        if self.mode != StreamMode::Pipelining {
            return Ok(());
        }

        let target = cmp::min(up_to_index, self.resources.log.last_index());
        while self.last_sent_index < target {
            if self.needs_catch_up() {
                return self.fall_back_to_catch_up();
            }

            let room = self
                .resources
                .config
                .max_allowed_shipping_lag
                .saturating_sub(self.outstanding.len() as u64);
            let first = self.last_sent_index.plus(1);
            let chunk = cmp::min(room, self.resources.config.catchup_batch_size);
            let last = cmp::min(target, first.plus(chunk - 1));
            // Armed before reading, so a failed read is retried even if nothing else is in flight.
            if self.retry_deadline.is_none() {
                self.schedule_retry();
            }
            self.ship_range(first, last)?;
            self.last_sent_index = last;
        }

        Ok(())
    }

    pub(crate) fn on_commit_update(&mut self, commit_index: Index) {
        self.ratchet_commit(commit_index);

        // Outside pipelining the commit index rides on the next probe or batch.
        if self.mode == StreamMode::Pipelining {
            self.send(ShippingMessage::Heartbeat(Heartbeat {
                leader: self.leader.clone(),
                term: self.term,
                leader_commit: self.leader_commit,
            }));
        }
    }

    pub(crate) fn on_retry_timeout(&mut self) -> Result<(), ShippingError> {
        let deadline = match self.retry_deadline {
            Some(deadline) => deadline,
            None => return Ok(()),
        };
        if self.resources.clock.now() < deadline {
            return Ok(());
        }
        self.schedule_retry();

        if let Some(first) = self.outstanding.iter().next().copied() {
            let last_outstanding = self.outstanding.iter().next_back().copied().unwrap_or(first);
            let last = cmp::min(last_outstanding, first.plus(self.resources.config.catchup_batch_size - 1));
            slog::debug!(self.logger, "Resending {:?}..={:?}", first, last);
            return self.ship_range(first, last);
        }

        match self.mode {
            StreamMode::Pipelining => {
                let last_index = self.resources.log.last_index();
                if self.last_sent_index < last_index {
                    // An earlier send was skipped. Pick up where it left off.
                    self.on_new_entries(last_index)
                } else {
                    self.retry_deadline = None;
                    Ok(())
                }
            }
            StreamMode::CatchingUp if self.match_index == Some(self.last_sent_index) => self.catch_up_step(),
            _ => {
                slog::debug!(self.logger, "Re-probing at {:?}", self.last_sent_index);
                self.send_probe(self.last_sent_index)
            }
        }
    }

    pub(crate) fn on_mismatch(&mut self, last_remote_append_index: Index) -> Result<(), ShippingError> {
        self.transition_to(StreamMode::Mismatched);
        self.outstanding.clear();

        let probed = self.last_sent_index;
        let mut next = cmp::min(probed.saturating_minus(1), last_remote_append_index);
        match self.match_index {
            Some(matched) if matched >= probed || matched > last_remote_append_index => {
                slog::warn!(
                    self.logger,
                    "Rejected at {:?} (remote log ends at {:?}) below believed match {:?}",
                    probed,
                    last_remote_append_index,
                    matched
                );
                self.match_index = None;
            }
            Some(matched) => next = cmp::max(next, matched),
            None => {}
        }

        self.schedule_retry();
        self.send_probe(next)
    }

    pub(crate) fn on_match(&mut self, match_index: Index) -> Result<(), ShippingError> {
        let last_index = self.resources.log.last_index();
        let match_index = if match_index > last_index {
            slog::warn!(
                self.logger,
                "Follower claims match at {:?} beyond our last index {:?}",
                match_index,
                last_index
            );
            last_index
        } else {
            match_index
        };

        let progressed = self.match_index.map_or(true, |matched| match_index > matched);
        if progressed {
            self.match_index = Some(match_index);
        }
        let matched = self.match_index.unwrap_or(match_index);
        self.outstanding = self.outstanding.split_off(&matched.plus(1));

        match self.mode {
            StreamMode::Mismatched => {
                self.transition_to(StreamMode::CatchingUp);
                self.catch_up_step()
            }
            StreamMode::CatchingUp => {
                if matched >= self.last_sent_index {
                    self.catch_up_step()
                } else {
                    Ok(())
                }
            }
            StreamMode::Pipelining => {
                if self.needs_catch_up() {
                    return self.fall_back_to_catch_up();
                }
                if !self.outstanding.is_empty() {
                    if progressed {
                        self.schedule_retry();
                    }
                } else if self.last_sent_index < last_index {
                    // Entries after the last send were skipped. The next retry ships them.
                    if self.retry_deadline.is_none() {
                        self.schedule_retry();
                    }
                } else {
                    self.retry_deadline = None;
                }
                Ok(())
            }
        }
    }

    // Too many entries in flight, or the follower trails the log by more than a batch.
    fn needs_catch_up(&self) -> bool {
        let config = &self.resources.config;
        let matched = self.match_index.unwrap_or_else(Index::zero);

        self.outstanding.len() as u64 >= config.max_allowed_shipping_lag
            || self.resources.log.last_index().distance_from(matched) > config.catchup_batch_size
    }

    fn fall_back_to_catch_up(&mut self) -> Result<(), ShippingError> {
        slog::info!(
            self.logger,
            "Follower at {:?} with {} entries unacknowledged, falling back to catch up",
            self.match_index,
            self.outstanding.len()
        );
        self.transition_to(StreamMode::CatchingUp);

        if self.outstanding.is_empty() {
            self.catch_up_step()
        } else {
            // The next batch goes out once the follower acknowledges what's in flight.
            if self.retry_deadline.is_none() {
                self.schedule_retry();
            }
            Ok(())
        }
    }

    // Ship the batch following the match, or go back to pipelining if there's nothing left.
    fn catch_up_step(&mut self) -> Result<(), ShippingError> {
        let matched = self.match_index.unwrap_or_else(Index::zero);
        let last_index = self.resources.log.last_index();
        self.last_sent_index = matched;

        if matched >= last_index {
            self.transition_to(StreamMode::Pipelining);
            self.retry_deadline = None;
            return Ok(());
        }

        let last = cmp::min(last_index, matched.plus(self.resources.config.catchup_batch_size));
        self.schedule_retry();
        self.ship_range(matched.plus(1), last)?;
        self.last_sent_index = last;

        if last >= last_index {
            self.transition_to(StreamMode::Pipelining);
        }
        Ok(())
    }

    fn ship_range(&mut self, first: Index, last: Index) -> Result<(), ShippingError> {
        let prev_log_index = first.saturating_minus(1);
        let prev_log_term = self.term_at(prev_log_index)?;
        let entries = (first.as_u64()..=last.as_u64())
            .map(|index| self.read_entry(Index::new(index)))
            .collect::<Result<Vec<_>, _>>()?;

        self.outstanding.extend(entries.iter().map(|entry| entry.index));
        self.send_append_entries(prev_log_index, prev_log_term, entries);
        Ok(())
    }

    fn send_probe(&mut self, prev_log_index: Index) -> Result<(), ShippingError> {
        self.last_sent_index = prev_log_index;
        let prev_log_term = self.term_at(prev_log_index)?;
        self.send_append_entries(prev_log_index, prev_log_term, Vec::new());
        Ok(())
    }

    fn send_append_entries(&self, prev_log_index: Index, prev_log_term: Term, entries: Vec<LogEntry>) {
        self.send(ShippingMessage::AppendEntries(AppendEntriesRequest {
            leader: self.leader.clone(),
            term: self.term,
            prev_log_index,
            prev_log_term,
            entries,
            leader_commit: self.leader_commit,
        }));
    }

    fn send(&self, message: ShippingMessage) {
        self.resources.transport.send(&self.follower, message);
    }

    fn term_at(&self, index: Index) -> Result<Term, LogReadError> {
        if index.is_zero() {
            return Ok(Term::default());
        }
        self.read_entry(index).map(|entry| entry.term)
    }

    fn read_entry(&self, index: Index) -> Result<LogEntry, LogReadError> {
        if let Some(entry) = self.resources.entry_cache.get(index) {
            return Ok(entry);
        }

        self.resources
            .log
            .entry_at(index)
            .map_err(|e| LogReadError::Io(index, e))?
            .ok_or(LogReadError::MissingEntry(index))
    }

    fn ratchet_commit(&mut self, commit_index: Index) {
        if commit_index > self.leader_commit {
            self.leader_commit = commit_index;
        }
    }

    fn schedule_retry(&mut self) {
        self.retry_deadline = Some(self.resources.clock.deadline_after(self.resources.config.retry_time));
    }

    fn transition_to(&mut self, mode: StreamMode) {
        if self.mode != mode {
            slog::info!(self.logger, "Replication mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }
}
