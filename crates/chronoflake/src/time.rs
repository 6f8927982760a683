use crate::{Error, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Unit of one timestamp tick.
///
/// The unit is part of the ID layout: it fixes both the resolution of the
/// timestamp field and the window over which the counter field must absorb
/// all generated IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Seconds,
    Millis,
}

impl TimeUnit {
    /// Converts a non-negative tick count into a wall-clock duration.
    pub const fn to_duration(self, ticks: i64) -> Duration {
        match self {
            TimeUnit::Seconds => Duration::from_secs(ticks as u64),
            TimeUnit::Millis => Duration::from_millis(ticks as u64),
        }
    }

    /// Converts a duration since the Unix epoch into whole ticks.
    pub const fn ticks(self, since_epoch: Duration) -> i64 {
        match self {
            TimeUnit::Seconds => since_epoch.as_secs() as i64,
            TimeUnit::Millis => since_epoch.as_millis() as i64,
        }
    }
}

/// A source of calendar time for the generator.
///
/// The local reading must track wall-clock time rather than a process-local
/// monotonic counter: encoded timestamps are meant to be roughly real-time
/// and comparable across process restarts. Implementations for tests can
/// return scripted values instead.
///
/// # Example
///
/// ```
/// use chronoflake::{Result, TimeSource, TimeUnit};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn now(&self, _unit: TimeUnit) -> i64 {
///         1234
///     }
///     fn authority_now(&self, _server: &str, _unit: TimeUnit) -> Result<i64> {
///         Ok(1234)
///     }
/// }
///
/// assert_eq!(FixedTime.now(TimeUnit::Seconds), 1234);
/// ```
pub trait TimeSource {
    /// Current calendar time, in whole `unit` ticks since the Unix epoch.
    fn now(&self, unit: TimeUnit) -> i64;

    /// Time reported by an external authority, in whole `unit` ticks since
    /// the Unix epoch.
    ///
    /// Only consulted when the local clock appears to have regressed beyond
    /// tolerance. A failed query is an error for the caller; falling back to
    /// the local clock here would defeat the backtrack detection.
    fn authority_now(&self, server: &str, unit: TimeUnit) -> Result<i64>;
}

/// The default [`TimeSource`]: `SystemTime` for local reads, SNTP for the
/// authority query.
#[derive(Default, Clone, Debug)]
pub struct WallClock;

impl TimeSource for WallClock {
    fn now(&self, unit: TimeUnit) -> i64 {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX_EPOCH");
        unit.ticks(since_epoch)
    }

    fn authority_now(&self, server: &str, unit: TimeUnit) -> Result<i64> {
        let client = rsntp::SntpClient::new();
        let sync = client
            .synchronize(server)
            .map_err(|source| Error::AuthorityUnreachable {
                server: server.to_owned(),
                source,
            })?;
        let since_epoch =
            sync.datetime()
                .unix_timestamp()
                .map_err(|source| Error::AuthorityTime {
                    server: server.to_owned(),
                    source,
                })?;
        Ok(unit.ticks(since_epoch))
    }
}
