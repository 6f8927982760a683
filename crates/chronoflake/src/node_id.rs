//! Node-id derivation from host identity.
//!
//! A candidate node id is the SHA-256 of `"<hostname>_<ipv4>"`, truncated to
//! a caller-chosen width. Two hosts with distinct names or addresses land on
//! distinct ids with high probability, which makes this a reasonable default
//! for small fleets; it is not a substitute for coordinated assignment when
//! collisions are unacceptable. The generator itself never calls into this
//! module; the result is handed to [`Generator::set_node`] by the caller.
//!
//! [`Generator::set_node`]: crate::Generator::set_node

use crate::{Error, Result};
use gethostname::gethostname;
use sha2::{Digest, Sha256};
use std::net::{IpAddr, Ipv4Addr};

/// Derives a candidate node id for this host, truncated to `bits` bits.
///
/// Fails when `bits` is outside `1..=32` or when the host has no non-loopback
/// IPv4 address.
///
/// # Example
///
/// ```no_run
/// let node = chronoflake::node_id::derive(10)?;
/// assert!(node < 1 << 10);
/// # Ok::<(), chronoflake::Error>(())
/// ```
pub fn derive(bits: u8) -> Result<u32> {
    if !(1..=32).contains(&bits) {
        return Err(Error::InvalidNodeIdWidth { bits });
    }
    let hostname = gethostname().to_string_lossy().into_owned();
    let ip = local_ipv4()?;
    Ok(from_identity(&hostname, ip, bits))
}

/// Returns the first non-loopback IPv4 address among local interfaces.
pub fn local_ipv4() -> Result<Ipv4Addr> {
    let interfaces = if_addrs::get_if_addrs().map_err(Error::Interfaces)?;
    first_non_loopback_v4(interfaces.iter().map(|interface| interface.ip())).ok_or(Error::NoIpv4)
}

fn first_non_loopback_v4(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr {
        IpAddr::V4(v4) if !v4.is_loopback() => Some(v4),
        _ => None,
    })
}

fn from_identity(hostname: &str, ip: Ipv4Addr, bits: u8) -> u32 {
    let digest = Sha256::digest(format!("{hostname}_{ip}").as_bytes());
    let word = u64::from_be_bytes(digest[..8].try_into().expect("digest shorter than 8 bytes"));
    (word & ((1u64 << bits) - 1)) as u32
}
