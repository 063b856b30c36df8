//! IP utility functions for interface address handling.

use std::net::Ipv4Addr;

use ipnet::{ipv4_mask_to_prefix, Ipv4Net, PrefixLenError};

/// Convert a dotted-quad subnet mask to its prefix length (`255.255.255.0` -> 24).
///
/// Fails for non-contiguous masks such as `255.0.255.0`.
pub fn mask_to_prefix_len(mask: Ipv4Addr) -> Result<u8, PrefixLenError> {
    ipv4_mask_to_prefix(mask)
}

/// Derive the network an address belongs to by applying its mask.
///
/// Host bits are masked off rather than rejected, so `192.168.1.5` with
/// `255.255.255.0` yields `192.168.1.0/24`.
pub fn compute_network(ip: Ipv4Addr, mask: Ipv4Addr) -> Result<Ipv4Net, PrefixLenError> {
    let prefix_len = mask_to_prefix_len(mask)?;
    Ok(Ipv4Net::new(ip, prefix_len)?.trunc())
}
