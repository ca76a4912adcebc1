mod retry_ticker;
mod time;

#[cfg(test)]
mod test_utils;

pub(crate) use retry_ticker::RetryTickerHandle;
pub(crate) use time::Clock;
pub(crate) use time::RealClock;

#[cfg(test)]
pub(crate) use time::{mocked_clock, MockClock, MockClockController};
