use crate::cluster::MemberId;
use crate::commitlog::{Index, LogEntry, Term};

/// Messages the leader ships to a follower.
///
/// Every message carries the leader's commit index, so a commit index advance is piggybacked on
/// whatever is sent next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShippingMessage {
    AppendEntries(AppendEntriesRequest),
    Heartbeat(Heartbeat),
}

impl ShippingMessage {
    pub fn leader_commit(&self) -> Index {
        match self {
            ShippingMessage::AppendEntries(request) => request.leader_commit,
            ShippingMessage::Heartbeat(heartbeat) => heartbeat.leader_commit,
        }
    }
}

/// Asks the follower to append `entries` after `prev_log_index`, provided its entry at
/// `prev_log_index` has `prev_log_term`.
///
/// An empty `entries` is a probe: the follower only reports whether its log matches at
/// `prev_log_index`. The follower answers either "applied up to N" or "mismatch, my log ends at
/// M"; re-sent entries that are already applied must be treated as no-ops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendEntriesRequest {
    pub leader: MemberId,
    pub term: Term,
    pub prev_log_index: Index,
    pub prev_log_term: Term,
    pub entries: Vec<LogEntry>,
    pub leader_commit: Index,
}

impl AppendEntriesRequest {
    /// The index the follower's log ends at if it accepts this request.
    pub fn last_index(&self) -> Index {
        self.prev_log_index.plus(self.entries.len() as u64)
    }

    pub fn is_probe(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heartbeat {
    pub leader: MemberId,
    pub term: Term,
    pub leader_commit: Index,
}
