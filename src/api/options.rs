use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct ShippingOptions {
    // How long an unacknowledged append or probe waits before it is sent again.
    pub retry_time: Option<Duration>,
    // How often streams are checked for overdue retries. Bounds how late a retry can fire.
    pub retry_tick_interval: Option<Duration>,
    pub catchup_batch_size: Option<u64>,
    // Unacknowledged entries a pipelining follower may have before it's made to catch up instead.
    pub max_allowed_shipping_lag: Option<u64>,
    pub actor_queue_size: Option<usize>,
}

#[derive(Debug)]
pub(super) struct ShippingOptionsValidated {
    pub retry_time: Duration,
    pub retry_tick_interval: Duration,
    pub catchup_batch_size: u64,
    pub max_allowed_shipping_lag: u64,
    pub actor_queue_size: usize,
}

impl ShippingOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.catchup_batch_size == 0 {
            return Err("Catch up batch size must be greater than 0");
        }
        if self.max_allowed_shipping_lag == 0 {
            return Err("Max allowed shipping lag must be greater than 0");
        }
        if self.catchup_batch_size > self.max_allowed_shipping_lag {
            return Err("Catch up batch size must not exceed max allowed shipping lag");
        }
        if self.retry_tick_interval == Duration::from_millis(0) {
            return Err("Retry tick interval must be greater than 0");
        }
        if self.retry_tick_interval > self.retry_time {
            return Err("Retry tick interval must not exceed retry time");
        }
        if self.actor_queue_size == 0 {
            return Err("Actor queue size must be greater than 0");
        }

        Ok(())
    }
}

impl TryFrom<ShippingOptions> for ShippingOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ShippingOptions) -> Result<Self, Self::Error> {
        let values = ShippingOptionsValidated {
            retry_time: options.retry_time.unwrap_or(Duration::from_millis(200)),
            retry_tick_interval: options.retry_tick_interval.unwrap_or(Duration::from_millis(50)),
            catchup_batch_size: options.catchup_batch_size.unwrap_or(64),
            max_allowed_shipping_lag: options.max_allowed_shipping_lag.unwrap_or(256),
            actor_queue_size: options.actor_queue_size.unwrap_or(10),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = ShippingOptionsValidated::try_from(ShippingOptions::default()).unwrap();

        assert_eq!(options.retry_time, Duration::from_millis(200));
        assert_eq!(options.retry_tick_interval, Duration::from_millis(50));
        assert_eq!(options.catchup_batch_size, 64);
        assert_eq!(options.max_allowed_shipping_lag, 256);
        assert_eq!(options.actor_queue_size, 10);
    }

    #[test]
    fn batch_larger_than_lag_is_rejected() {
        let options = ShippingOptions {
            catchup_batch_size: Some(10),
            max_allowed_shipping_lag: Some(5),
            ..Default::default()
        };

        assert!(ShippingOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let zero_batch = ShippingOptions {
            catchup_batch_size: Some(0),
            ..Default::default()
        };
        let zero_lag = ShippingOptions {
            max_allowed_shipping_lag: Some(0),
            ..Default::default()
        };
        let zero_queue = ShippingOptions {
            actor_queue_size: Some(0),
            ..Default::default()
        };

        assert!(ShippingOptionsValidated::try_from(zero_batch).is_err());
        assert!(ShippingOptionsValidated::try_from(zero_lag).is_err());
        assert!(ShippingOptionsValidated::try_from(zero_queue).is_err());
    }

    #[test]
    fn tick_must_fit_in_retry_time() {
        let slow_tick = ShippingOptions {
            retry_time: Some(Duration::from_millis(100)),
            retry_tick_interval: Some(Duration::from_millis(150)),
            ..Default::default()
        };
        let no_tick = ShippingOptions {
            retry_tick_interval: Some(Duration::from_millis(0)),
            ..Default::default()
        };

        assert!(ShippingOptionsValidated::try_from(slow_tick).is_err());
        assert!(ShippingOptionsValidated::try_from(no_tick).is_err());
    }
}
