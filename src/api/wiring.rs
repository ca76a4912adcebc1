use crate::actor::{ActorClient, ShippingActor, WeakActorClient};
use crate::api::options::ShippingOptionsValidated;
use crate::api::shipper::LogShipper;
use crate::cluster::{MemberId, MembershipChangeListener, MembershipProvider};
use crate::commitlog::{DurableLog, EntryCache};
use crate::shipping::{ReplicationManager, StreamConfig, StreamResources};
use crate::timers::RealClock;
use crate::transport::Transport;
use crate::ShippingOptions;
use std::convert::TryFrom;
use std::sync::Arc;

pub struct LogShipperConfig {
    pub my_member_id: MemberId,
    pub info_logger: slog::Logger,
    pub membership: Arc<dyn MembershipProvider>,
    // When set, every membership change is applied without calling `LogShipper::membership_changed`.
    pub membership_changes: Option<MembershipChangeListener>,
    pub log: Arc<dyn DurableLog>,
    // Must be the same cache the log-append path writes to, otherwise every read misses.
    pub entry_cache: EntryCache,
    pub transport: Arc<dyn Transport>,
    pub options: ShippingOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum LogShipperCreationError {
    #[error("Illegal options for configuring log shipping: {0}")]
    IllegalShippingOptions(String),
}

/// Spawns the log shipping task and returns a handle to it. Must be called within a tokio runtime.
///
/// Shipping starts paused. Nothing is sent until the first `resume()`.
pub async fn try_create_log_shipper(config: LogShipperConfig) -> Result<LogShipper, LogShipperCreationError> {
    let options = ShippingOptionsValidated::try_from(config.options)
        .map_err(|e| LogShipperCreationError::IllegalShippingOptions(e.to_string()))?;

    let logger = config
        .info_logger
        .new(slog::o!("MemberId" => config.my_member_id.as_str().to_string()));

    let clock = RealClock;
    let resources = StreamResources {
        log: config.log,
        transport: config.transport,
        entry_cache: config.entry_cache,
        clock,
        config: StreamConfig {
            retry_time: options.retry_time,
            catchup_batch_size: options.catchup_batch_size,
            max_allowed_shipping_lag: options.max_allowed_shipping_lag,
        },
    };
    let manager = ReplicationManager::new(logger.clone(), config.my_member_id, config.membership, resources);

    let (actor_client, actor_queue_rx) = ActorClient::new(options.actor_queue_size);
    let actor = ShippingActor::new(
        logger.clone(),
        actor_queue_rx,
        manager,
        actor_client.weak(),
        clock,
        options.retry_tick_interval,
    );
    tokio::spawn(actor.run_event_loop());

    if let Some(listener) = config.membership_changes {
        tokio::spawn(forward_membership_changes(logger, listener, actor_client.weak()));
    }

    Ok(LogShipper::new(actor_client))
}

async fn forward_membership_changes(
    logger: slog::Logger,
    mut listener: MembershipChangeListener,
    actor_client: WeakActorClient,
) {
    while let Some(targets) = listener.next().await {
        slog::debug!(logger, "Replication targets changed: {:?}", targets);
        if actor_client.membership_changed().await.is_err() {
            return;
        }
    }
}
