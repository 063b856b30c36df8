//! Shared utilities: IPv4 mask and network helpers.

pub mod ip_utils;

pub use ip_utils::{compute_network, mask_to_prefix_len};
