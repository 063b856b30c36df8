//! Device configuration model and parser.
//!
//! Raw configuration text for one router or switch is turned into a
//! [`Device`] record by [`parse_device`].

pub mod parser;
pub mod types;

pub use parser::{expand_vlan_list, parse_device, parse_device_named, ConfigParser, ParseError};
pub use types::*;
