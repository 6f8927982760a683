use core::time::Duration;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `chronoflake` can emit.
///
/// Two classes exist. Configuration errors are reported synchronously by the
/// setters and leave the previous valid configuration in effect. Operational
/// errors are returned by [`Generator::generate`] when the generator can no
/// longer guarantee strictly increasing IDs; they are not retried internally.
///
/// [`Generator::generate`]: crate::Generator::generate
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// `delta` must be non-zero and strictly below the counter capacity. One
    /// counter slot stays reserved so a step can never wrap into the node
    /// field.
    #[error("delta {delta} out of range: must be in 1..{max}")]
    InvalidDelta { delta: u32, max: u32 },

    /// Same bound as [`Error::InvalidDelta`], applied to the random step
    /// upper limit.
    #[error("random delta {delta} out of range: must be in 1..{max}")]
    InvalidRandomDelta { delta: u32, max: u32 },

    /// The node value does not fit the requested field width, or the value is
    /// reserved by the active layout.
    #[error("node {node} is invalid for a {node_bits}-bit node field")]
    InvalidNode { node: u32, node_bits: u8 },

    /// A node field must be at least 2 bits wide and leave at least 2 bits of
    /// counter space.
    #[error("node bits {node_bits} out of range: must be in 2..={max}")]
    InvalidNodeBits { node_bits: u8, max: u8 },

    /// The active layout does not support the requested timestamp width.
    #[error("timestamp width {bits} is not supported by this layout")]
    InvalidTimestampBits { bits: u8 },

    /// The local clock regressed past the recorded tick by more than the
    /// configured tolerance, and no time authority is set.
    #[error("clock moved back {behind:?} (beyond tolerance) and no time authority is configured")]
    ClockBacktrack { behind: Duration },

    /// The time authority also reports a time behind the recorded tick. The
    /// generator state is ahead of every trusted clock; this is unrecoverable.
    #[error("time authority {server} is behind the last recorded tick")]
    AuthorityBehind { server: String },

    /// The time authority could not be queried. The local clock is suspect,
    /// so this is fatal for the in-progress call rather than a silent
    /// fallback.
    #[error("time authority {server} is unreachable")]
    AuthorityUnreachable {
        server: String,
        #[source]
        source: rsntp::SynchronizationError,
    },

    /// The time authority answered with a timestamp that cannot be expressed
    /// as time since the Unix epoch.
    #[error("time authority {server} returned an unusable timestamp")]
    AuthorityTime {
        server: String,
        #[source]
        source: rsntp::ConversionError,
    },

    /// Local network interfaces could not be enumerated while deriving a node
    /// id.
    #[error("failed to enumerate network interfaces")]
    Interfaces(#[source] std::io::Error),

    /// No non-loopback IPv4 address exists on this host.
    #[error("no non-loopback IPv4 address found")]
    NoIpv4,

    /// A derived node id must be truncated to between 1 and 32 bits.
    #[error("node id width {bits} out of range: must be in 1..=32")]
    InvalidNodeIdWidth { bits: u8 },
}
