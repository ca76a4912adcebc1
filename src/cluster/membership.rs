use crate::cluster::MemberId;
use std::collections::HashSet;
use tokio::sync::watch;

/// MembershipProvider tells the leader which members it should replicate its log to.
pub trait MembershipProvider: Send + Sync {
    /// The current replication targets. May include the local member; callers filter it out.
    fn replication_targets(&self) -> HashSet<MemberId>;
}

/// Creates a `ClusterMembership` with `initial_targets` and a listener that is notified every
/// time the targets change.
pub fn cluster_membership(initial_targets: HashSet<MemberId>) -> (ClusterMembership, MembershipChangeListener) {
    let (snd, rcv) = watch::channel(initial_targets);

    (ClusterMembership { snd }, MembershipChangeListener { rcv })
}

/// A `MembershipProvider` whose targets are set directly by the owner of the cluster config.
pub struct ClusterMembership {
    snd: watch::Sender<HashSet<MemberId>>,
}

impl ClusterMembership {
    /// Replaces the replication targets. Listeners are only notified if the set actually changed.
    pub fn set_replication_targets(&self, targets: HashSet<MemberId>) {
        self.snd.send_if_modified(|current| {
            if *current == targets {
                false
            } else {
                *current = targets;
                true
            }
        });
    }

    pub fn add_member(&self, member: MemberId) {
        self.snd.send_if_modified(|current| current.insert(member));
    }

    pub fn remove_member(&self, member: &MemberId) {
        self.snd.send_if_modified(|current| current.remove(member));
    }
}

impl MembershipProvider for ClusterMembership {
    fn replication_targets(&self) -> HashSet<MemberId> {
        self.snd.borrow().clone()
    }
}

/// Intermediate changes are not queued. If the membership changes several times between two
/// calls to `next()`, the caller observes only the most recent set.
pub struct MembershipChangeListener {
    rcv: watch::Receiver<HashSet<MemberId>>,
}

impl MembershipChangeListener {
    /// Waits for the next change. Returns `None` once the `ClusterMembership` has been dropped.
    pub async fn next(&mut self) -> Option<HashSet<MemberId>> {
        match self.rcv.changed().await {
            Ok(_) => Some(self.rcv.borrow().clone()),
            Err(_) => None,
        }
    }
}
