use crate::actor::ActorClient;
use crate::cluster::MemberId;
use crate::shipping::{LeaderContext, ReplicationCommand, StreamStatus};
use std::collections::HashSet;

/// LogShipper is the leader's handle on log shipping. Cheap to clone; every clone drives the same
/// background task, which keeps running until every clone is dropped.
#[derive(Clone)]
pub struct LogShipper {
    actor_client: ActorClient,
}

impl LogShipper {
    pub(crate) fn new(actor_client: ActorClient) -> Self {
        LogShipper { actor_client }
    }

    /// Stop shipping to every follower. Call when stepping down as leader.
    pub async fn pause(&self) -> Result<(), LogShipperError> {
        self.actor_client.pause().await.map_err(|_| LogShipperError::ActorExited)
    }

    /// Start shipping to every replication target. Call on becoming leader. Has no effect once
    /// stopped.
    pub async fn resume(&self, context: LeaderContext) -> Result<(), LogShipperError> {
        self.actor_client.resume(context).await.map_err(|_| LogShipperError::ActorExited)
    }

    /// Stop shipping for good.
    pub async fn stop(&self) -> Result<(), LogShipperError> {
        self.actor_client.stop().await.map_err(|_| LogShipperError::ActorExited)
    }

    /// Apply `commands`, in order, to every follower's stream. Failures on individual streams are
    /// logged, not returned.
    pub async fn dispatch(
        &self,
        commands: Vec<ReplicationCommand>,
        context: LeaderContext,
    ) -> Result<(), LogShipperError> {
        self.actor_client
            .dispatch(commands, context)
            .await
            .map_err(|_| LogShipperError::ActorExited)
    }

    /// Re-read the replication targets. Only needed when the membership provider isn't wired
    /// through a change listener.
    pub async fn membership_changed(&self) -> Result<(), LogShipperError> {
        self.actor_client
            .membership_changed()
            .await
            .map_err(|_| LogShipperError::ActorExited)
    }

    /// Members currently being shipped to.
    pub async fn replication_targets(&self) -> Result<HashSet<MemberId>, LogShipperError> {
        self.actor_client
            .replication_targets()
            .await
            .map_err(|_| LogShipperError::ActorExited)
    }

    pub async fn stream_status(&self, member: MemberId) -> Result<Option<StreamStatus>, LogShipperError> {
        self.actor_client
            .stream_status(member)
            .await
            .map_err(|_| LogShipperError::ActorExited)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogShipperError {
    // Shipping runs on a background task. This error is returned if the task has exited.
    #[error("Log shipping task has exited")]
    ActorExited,
}

