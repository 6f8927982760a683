use crate::{Error, Layout, RandSource, Result, ThreadRandom, TimeSource, WallClock};
use std::{
    sync::atomic::{AtomicI64, Ordering},
    thread,
    time::Duration,
};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Interval slept while waiting out a tolerated clock backtrack or an
/// exhausted counter.
const RETRY_PAUSE: Duration = Duration::from_millis(1);

/// Default tolerance for local clock regression.
pub const DEFAULT_MAX_BACKTRACK_WAIT: Duration = Duration::from_secs(3);

/// A lock-free generator of strictly increasing 64-bit IDs.
///
/// The entire generator state is one `AtomicI64` holding the most recently
/// published ID. Each call to [`generate`] decodes that word, computes a
/// successor from the current wall-clock tick, and publishes it with a
/// compare-and-swap; on a lost race it simply retries against the fresh
/// state. There are no locks, so any number of threads may call [`generate`]
/// concurrently through a shared reference.
///
/// Every ID returned by one generator instance is strictly greater than all
/// IDs it returned before, across all threads. Uniqueness across instances
/// holds only when their node ids are disjoint.
///
/// Configuration setters take `&mut self`: complete configuration before
/// sharing the generator (e.g. behind an `Arc`), since the configured fields
/// are read without synchronization during generation.
///
/// # Example
///
/// ```
/// use chronoflake::{Generator, Layout};
///
/// let mut generator = Generator::new(Layout::SECONDS);
/// generator.set_node(3, 5)?;
///
/// let id = generator.generate()?;
/// let (timestamp, counter) = generator.resolve(id);
/// assert!(timestamp > 0);
/// assert!(counter > 0);
/// # Ok::<(), chronoflake::Error>(())
/// ```
///
/// [`generate`]: Generator::generate
pub struct Generator<T = WallClock, R = ThreadRandom>
where
    T: TimeSource,
    R: RandSource,
{
    state: AtomicI64,
    layout: Layout,
    delta: u32,
    random_delta: u32,
    node: u32,
    node_bits: u8,
    max_backtrack_wait: Duration,
    ntp_server: Option<String>,
    time: T,
    rand: R,
}

impl Generator {
    /// Creates a generator for the given layout, backed by the system clock
    /// and the thread-local RNG.
    ///
    /// Defaults: `delta = 1`, no random delta, no node field, a backtrack
    /// tolerance of [`DEFAULT_MAX_BACKTRACK_WAIT`], and no time authority.
    pub fn new(layout: Layout) -> Self {
        Self::with_parts(layout, WallClock, ThreadRandom)
    }
}

impl Default for Generator {
    /// Equivalent to [`Generator::new`] with [`Layout::SECONDS`].
    fn default() -> Self {
        Self::new(Layout::SECONDS)
    }
}

impl<T, R> Generator<T, R>
where
    T: TimeSource,
    R: RandSource,
{
    /// Creates a generator with explicit time and randomness sources.
    ///
    /// Useful for tests that script the clock or pin the random step; prefer
    /// [`Generator::new`] otherwise.
    pub fn with_parts(layout: Layout, time: T, rand: R) -> Self {
        Self {
            state: AtomicI64::new(0),
            layout,
            delta: 1,
            random_delta: 0,
            node: 0,
            node_bits: 0,
            max_backtrack_wait: DEFAULT_MAX_BACKTRACK_WAIT,
            ntp_server: None,
            time,
            rand,
        }
    }

    /// Generates the next ID.
    ///
    /// Transient conditions are absorbed internally and never surface: a
    /// clock regression within tolerance and an exhausted per-tick counter
    /// both pause briefly and retry, and a lost CAS race retries immediately
    /// against the freshly observed state. The counter wait is the only
    /// backpressure mechanism, so sustained throughput is bounded by the
    /// counter capacity per tick.
    ///
    /// # Errors
    ///
    /// Returns an error only when strictly increasing IDs can no longer be
    /// guaranteed: the clock regressed beyond the configured tolerance and no
    /// time authority is set ([`Error::ClockBacktrack`]), the authority could
    /// not be queried ([`Error::AuthorityUnreachable`],
    /// [`Error::AuthorityTime`]), or the authority is itself behind the
    /// recorded state ([`Error::AuthorityBehind`]).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&self) -> Result<i64> {
        loop {
            let old = self.state.load(Ordering::Relaxed);
            let (last_tick, last_counter) = self.layout.unpack(old, self.node_bits);
            let unit = self.layout.time_unit();
            let mut now = self.time.now(unit);

            if now < last_tick {
                let behind = unit.to_duration(last_tick - now);
                if behind <= self.max_backtrack_wait {
                    // Bounded skew; wait for the local clock to catch up.
                    thread::sleep(RETRY_PAUSE);
                    continue;
                }
                now = self.authority_time(last_tick, behind)?;
            }

            let max = self.layout.counter_mask(self.node_bits);
            let counter = if now == last_tick {
                let next = last_counter + self.step();
                if next > max {
                    // Tick capacity exhausted; wait for the next tick.
                    thread::sleep(RETRY_PAUSE);
                    continue;
                }
                next
            } else {
                self.step()
            };

            let candidate = self.layout.pack(now, self.node, self.node_bits, counter);
            if self
                .state
                .compare_exchange(old, candidate, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(candidate);
            }
        }
    }

    /// Splits an encoded ID into its timestamp and counter fields, using the
    /// current field widths.
    pub fn resolve(&self, id: i64) -> (i64, u32) {
        self.layout.unpack(id, self.node_bits)
    }

    /// Resolves a clock regression beyond tolerance through the configured
    /// time authority.
    fn authority_time(&self, last_tick: i64, behind: Duration) -> Result<i64> {
        let Some(server) = self.ntp_server.as_deref() else {
            return Err(Error::ClockBacktrack { behind });
        };
        #[cfg(feature = "tracing")]
        tracing::warn!(
            ?behind,
            server,
            "local clock regressed beyond tolerance, querying time authority"
        );
        let now = self.time.authority_now(server, self.layout.time_unit())?;
        if now < last_tick {
            return Err(Error::AuthorityBehind {
                server: server.to_owned(),
            });
        }
        Ok(now)
    }

    /// The counter increment for this attempt.
    fn step(&self) -> u32 {
        if self.random_delta > 0 {
            self.rand.sample_step(self.random_delta)
        } else {
            self.delta
        }
    }

    /// Sets the fixed counter step.
    ///
    /// The first counter value of a new tick is this step, not zero.
    ///
    /// # Errors
    ///
    /// Rejects 0 and any value that does not leave a free slot in the current
    /// counter field; the previous delta stays in effect.
    pub fn set_delta(&mut self, delta: u32) -> Result<()> {
        let max = self.layout.counter_mask(self.node_bits);
        if delta == 0 || delta >= max {
            return Err(Error::InvalidDelta { delta, max });
        }
        self.delta = delta;
        Ok(())
    }

    /// Sets the upper bound for a uniformly sampled counter step in
    /// `1..=delta`, overriding the fixed delta.
    ///
    /// # Errors
    ///
    /// Same bounds as [`Generator::set_delta`].
    pub fn set_random_delta(&mut self, delta: u32) -> Result<()> {
        let max = self.layout.counter_mask(self.node_bits);
        if delta == 0 || delta >= max {
            return Err(Error::InvalidRandomDelta { delta, max });
        }
        self.random_delta = delta;
        Ok(())
    }

    /// Assigns this instance's node id and the width of the node field.
    ///
    /// # Errors
    ///
    /// Rejects a field narrower than 2 bits or one that leaves fewer than 2
    /// counter bits, a node value that does not fit the field (or is 0 where
    /// the layout reserves it), and any width under which the configured
    /// delta or random delta would no longer fit the counter. Nothing is
    /// applied on rejection.
    pub fn set_node(&mut self, node: u32, node_bits: u8) -> Result<()> {
        let max_bits = self.layout.reserved_low_bits() - 2;
        if node_bits < 2 || node_bits > max_bits {
            return Err(Error::InvalidNodeBits {
                node_bits,
                max: max_bits,
            });
        }
        if (self.layout.zero_node_reserved() && node == 0) || node > (1 << node_bits) - 1 {
            return Err(Error::InvalidNode { node, node_bits });
        }
        let max = self.layout.counter_mask(node_bits);
        if self.delta >= max {
            return Err(Error::InvalidDelta {
                delta: self.delta,
                max,
            });
        }
        if self.random_delta >= max {
            return Err(Error::InvalidRandomDelta {
                delta: self.random_delta,
                max,
            });
        }
        self.node = node;
        self.node_bits = node_bits;
        Ok(())
    }

    /// Resizes the timestamp field, where the layout allows it.
    ///
    /// # Errors
    ///
    /// Rejects widths the layout does not support, and any resize under which
    /// the configured node field, delta, or random delta would no longer fit
    /// the shrunken low bits.
    pub fn set_timestamp_bits(&mut self, bits: u8) -> Result<()> {
        let layout = self.layout.with_timestamp_bits(bits)?;
        if self.node_bits != 0 && self.node_bits > layout.reserved_low_bits() - 2 {
            return Err(Error::InvalidNodeBits {
                node_bits: self.node_bits,
                max: layout.reserved_low_bits() - 2,
            });
        }
        let max = layout.counter_mask(self.node_bits);
        if self.delta >= max {
            return Err(Error::InvalidDelta {
                delta: self.delta,
                max,
            });
        }
        if self.random_delta >= max {
            return Err(Error::InvalidRandomDelta {
                delta: self.random_delta,
                max,
            });
        }
        self.layout = layout;
        Ok(())
    }

    /// Sets the tolerated magnitude of local clock regression.
    ///
    /// Regressions up to this duration are waited out; anything larger
    /// escalates to the time authority, or fails when none is configured.
    pub fn set_max_backtrack_wait(&mut self, wait: Duration) {
        self.max_backtrack_wait = wait;
    }

    /// Configures the host queried when the local clock regresses beyond
    /// tolerance.
    pub fn set_ntp_server(&mut self, server: impl Into<String>) {
        self.ntp_server = Some(server.into());
    }

    /// The fixed counter step.
    pub fn delta(&self) -> u32 {
        self.delta
    }

    /// The random step upper bound, 0 when disabled.
    pub fn random_delta(&self) -> u32 {
        self.random_delta
    }

    /// The node id and node field width.
    pub fn node(&self) -> (u32, u8) {
        (self.node, self.node_bits)
    }

    /// The tolerated clock regression.
    pub fn max_backtrack_wait(&self) -> Duration {
        self.max_backtrack_wait
    }

    /// The configured time authority, if any.
    pub fn ntp_server(&self) -> Option<&str> {
        self.ntp_server.as_deref()
    }

    /// The active bit layout.
    pub fn layout(&self) -> Layout {
        self.layout
    }
}
