use crate::cluster::MemberId;
use crate::commitlog::{Index, Term};
use crate::shipping::{ReplicationStream, ShippingError};
use crate::timers::Clock;

/// The leadership epoch a command is issued under. Replaced wholesale on every dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LeaderContext {
    pub term: Term,
    pub commit_index: Index,
}

impl LeaderContext {
    pub fn new(term: Term, commit_index: Index) -> Self {
        LeaderContext { term, commit_index }
    }
}

/// A command is delivered to every replication stream. Variants that name a `target` are no-ops on
/// the streams of every other follower.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicationCommand {
    /// The leader's log now extends to `up_to_index`.
    NewEntries { up_to_index: Index },

    /// The leader's commit index advanced.
    CommitUpdate { commit_index: Index },

    /// Resend whatever is overdue.
    RetryTimeout,

    /// `target` rejected an append. Its log ends at `last_remote_append_index`.
    MismatchDetected {
        target: MemberId,
        last_remote_append_index: Index,
    },

    /// `target` accepted an append and its log now matches ours up to `match_index`.
    Matched { target: MemberId, match_index: Index },
}

impl ReplicationCommand {
    pub(crate) fn apply_to<C: Clock>(
        &self,
        stream: &mut ReplicationStream<C>,
        context: &LeaderContext,
    ) -> Result<(), ShippingError> {
        if stream.is_stopped() {
            return Ok(());
        }
        stream.observe(context);

        match self {
            ReplicationCommand::NewEntries { up_to_index } => stream.on_new_entries(*up_to_index),
            ReplicationCommand::CommitUpdate { commit_index } => {
                stream.on_commit_update(*commit_index);
                Ok(())
            }
            ReplicationCommand::RetryTimeout => stream.on_retry_timeout(),
            ReplicationCommand::MismatchDetected {
                target,
                last_remote_append_index,
            } => {
                if target == stream.follower() {
                    stream.on_mismatch(*last_remote_append_index)
                } else {
                    Ok(())
                }
            }
            ReplicationCommand::Matched { target, match_index } => {
                if target == stream.follower() {
                    stream.on_match(*match_index)
                } else {
                    Ok(())
                }
            }
        }
    }
}
