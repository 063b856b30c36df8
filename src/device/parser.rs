//! Line-oriented parser for router and switch configurations.
//!
//! The parser walks trimmed lines in order and keeps two cursors: the
//! interface currently being populated and the VLAN currently being
//! populated. Each cursor moves only when its own block header
//! (`interface <name>` / `vlan <id>`) is seen. Routing statements are scoped
//! by the most recent `router ospf` / `router bgp` header.
//!
//! Lines that match no known form are skipped. Lines that match a form but
//! are truncated or carry unparsable values produce a [`ParseError`] naming
//! the source, line number and offending text.

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::types::*;
use crate::utils::ip_utils::{compute_network, mask_to_prefix_len};

/// Source name used when parsing text that did not come from a file
pub const INLINE_SOURCE: &str = "<input>";

/// Match an inclusive VLAN range token such as `20-22`
static VLAN_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").expect("Invalid VLAN range regex"));

/// Errors raised while parsing a device configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{source_name}:{line_no}: '{line}' expects at least {expected} tokens, found {found}")]
    MissingTokens {
        source_name: String,
        line_no: usize,
        line: String,
        expected: usize,
        found: usize,
    },

    #[error("{source_name}:{line_no}: invalid {field} '{value}' in '{line}'")]
    InvalidValue {
        source_name: String,
        line_no: usize,
        line: String,
        field: &'static str,
        value: String,
    },

    #[error("{source_name}: configuration has no 'hostname' line")]
    MissingHostname { source_name: String },
}

/// One trimmed configuration line with its position
struct ConfigLine<'a> {
    source_name: &'a str,
    number: usize,
    text: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> ConfigLine<'a> {
    fn new(source_name: &'a str, number: usize, text: &'a str) -> Self {
        Self {
            source_name,
            number,
            text,
            tokens: text.split_whitespace().collect(),
        }
    }

    fn require(&self, expected: usize) -> Result<(), ParseError> {
        if self.tokens.len() < expected {
            return Err(ParseError::MissingTokens {
                source_name: self.source_name.to_string(),
                line_no: self.number,
                line: self.text.to_string(),
                expected,
                found: self.tokens.len(),
            });
        }
        Ok(())
    }

    fn invalid(&self, field: &'static str, value: &str) -> ParseError {
        ParseError::InvalidValue {
            source_name: self.source_name.to_string(),
            line_no: self.number,
            line: self.text.to_string(),
            field,
            value: value.to_string(),
        }
    }

    /// Parse token `idx`, which must already be covered by `require`
    fn value<T: FromStr>(&self, idx: usize, field: &'static str) -> Result<T, ParseError> {
        let token = self.tokens[idx];
        token.parse::<T>().map_err(|_| self.invalid(field, token))
    }

    fn vlan_id(&self, token: &str) -> Result<VlanId, ParseError> {
        parse_vlan_id(token).ok_or_else(|| self.invalid("vlan id", token))
    }

    /// Everything after the first token, verbatim
    fn rest(&self) -> Result<&'a str, ParseError> {
        self.require(2)?;
        Ok(self
            .text
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest)
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoutingContext {
    None,
    Ospf,
    Bgp,
}

/// Stateful configuration parser for a single device
pub struct ConfigParser {
    source_name: String,
    hostname: Option<String>,
    interfaces: Vec<Interface>,
    vlans: Vec<VlanDecl>,
    routing: RoutingConfig,
    features: Features,
    current_interface: Option<usize>,
    current_vlan: Option<usize>,
    routing_context: RoutingContext,
}

impl ConfigParser {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            hostname: None,
            interfaces: Vec::new(),
            vlans: Vec::new(),
            routing: RoutingConfig::default(),
            features: Features::default(),
            current_interface: None,
            current_vlan: None,
            routing_context: RoutingContext::None,
        }
    }

    /// Consume the parser and produce a device from configuration text
    pub fn parse(mut self, text: &str) -> Result<Device, ParseError> {
        let source_name = self.source_name.clone();

        for (idx, raw) in text.lines().enumerate() {
            let line = ConfigLine::new(&source_name, idx + 1, raw.trim());
            if line.tokens.is_empty() {
                continue;
            }
            if !self.apply(&line)? {
                debug!("{}:{}: skipping '{}'", source_name, line.number, line.text);
            }
        }

        let hostname = self
            .hostname
            .ok_or_else(|| ParseError::MissingHostname { source_name: source_name.clone() })?;

        debug!(
            "Parsed {} from {}: {} interfaces, {} VLANs",
            hostname,
            source_name,
            self.interfaces.len(),
            self.vlans.len()
        );

        Ok(Device {
            hostname,
            interfaces: self.interfaces,
            vlans: self.vlans,
            routing: self.routing,
            features: self.features,
        })
    }

    /// Apply one line; returns false when the line matches no known form
    fn apply(&mut self, line: &ConfigLine<'_>) -> Result<bool, ParseError> {
        let in_interface = self.current_interface.is_some();
        let in_vlan = self.current_vlan.is_some();
        let tokens = line.tokens.as_slice();

        match tokens {
            ["hostname", ..] => {
                line.require(2)?;
                self.hostname = Some(tokens[1].to_string());
            }
            ["interface", ..] => {
                line.require(2)?;
                self.interfaces.push(Interface::new(tokens[1]));
                self.current_interface = Some(self.interfaces.len() - 1);
            }
            ["description", ..] if in_interface => {
                let description = line.rest()?.to_string();
                self.with_interface(|iface| iface.description = Some(description));
            }
            ["ip", "address", ..] if in_interface => {
                line.require(4)?;
                let ip: Ipv4Addr = line.value(2, "ip address")?;
                let mask: Ipv4Addr = line.value(3, "mask")?;
                let prefix_len = mask_to_prefix_len(mask).map_err(|_| line.invalid("mask", tokens[3]))?;
                let network = compute_network(ip, mask).map_err(|_| line.invalid("mask", tokens[3]))?;
                self.with_interface(|iface| {
                    iface.ip = Some(ip);
                    iface.mask = Some(mask);
                    iface.prefix_len = Some(prefix_len);
                    iface.network = Some(network);
                });
            }
            ["mtu", ..] if in_interface => {
                line.require(2)?;
                let mtu: u32 = line.value(1, "mtu")?;
                self.with_interface(|iface| iface.mtu = Some(mtu));
            }
            ["bandwidth", ..] if in_interface => {
                line.require(2)?;
                let bandwidth: u64 = line.value(1, "bandwidth")?;
                self.with_interface(|iface| iface.bandwidth = Some(bandwidth));
            }
            ["switchport", "mode", ..] if in_interface => {
                line.require(3)?;
                let mode = SwitchportMode::from_keyword(tokens[2]);
                self.with_interface(|iface| iface.mode = Some(mode));
            }
            ["switchport", "access", "vlan", ..] if in_interface => {
                line.require(4)?;
                let vlan = line.vlan_id(tokens[3])?;
                self.with_interface(|iface| iface.vlans = vec![vlan]);
            }
            ["switchport", "trunk", "allowed", "vlan", ..] if in_interface => {
                line.require(5)?;
                let list = tokens[tokens.len() - 1];
                let vlans = expand_vlan_list(list).map_err(|token| line.invalid("vlan list", &token))?;
                self.with_interface(|iface| iface.vlans = vlans);
            }
            ["vlan", ..] => {
                line.require(2)?;
                let id = line.vlan_id(tokens[1])?;
                self.vlans.push(VlanDecl { id, name: None });
                self.current_vlan = Some(self.vlans.len() - 1);
            }
            ["name", ..] if in_vlan => {
                let name = line.rest()?.to_string();
                if let Some(vlan) = self.current_vlan.and_then(|idx| self.vlans.get_mut(idx)) {
                    vlan.name = Some(name);
                }
            }
            ["router", "ospf", ..] => {
                self.routing_context = RoutingContext::Ospf;
                self.routing.ospf.push(OspfInstance {
                    process_id: tokens.get(2).map(|pid| pid.to_string()),
                    networks: Vec::new(),
                });
            }
            ["network", ..] if self.routing_context == RoutingContext::Ospf => {
                line.require(5)?;
                let statement = OspfNetwork {
                    network: line.value(1, "network")?,
                    wildcard: line.value(2, "wildcard mask")?,
                    area: tokens[4].to_string(),
                };
                if let Some(instance) = self.routing.ospf.last_mut() {
                    instance.networks.push(statement);
                }
            }
            ["router", "bgp", ..] => {
                line.require(3)?;
                let asn: u32 = line.value(2, "asn")?;
                self.routing_context = RoutingContext::Bgp;
                self.routing.bgp.push(BgpInstance { asn, neighbors: Vec::new() });
            }
            // Any other routing process ends the OSPF or BGP block
            ["router", ..] => {
                debug!("{}:{}: unmodelled routing process '{}'", line.source_name, line.number, line.text);
                self.routing_context = RoutingContext::None;
            }
            ["neighbor", ..]
                if self.routing_context == RoutingContext::Bgp
                    && tokens.get(2).map_or(true, |kw| *kw == "remote-as") =>
            {
                line.require(4)?;
                let neighbor = BgpNeighbor {
                    ip: line.value(1, "neighbor ip")?,
                    remote_as: line.value(3, "remote-as")?,
                };
                if let Some(instance) = self.routing.bgp.last_mut() {
                    instance.neighbors.push(neighbor);
                }
            }
            ["ip", "route", ..] => {
                line.require(5)?;
                self.routing.static_routes.push(StaticRoute {
                    prefix: line.value(2, "route prefix")?,
                    mask: line.value(3, "route mask")?,
                    next_hop: tokens[4].to_string(),
                });
            }
            _ if line.text == "cdp run" => self.features.cdp = true,
            _ if line.text == "lldp run" => self.features.lldp = true,
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn with_interface(&mut self, update: impl FnOnce(&mut Interface)) {
        if let Some(iface) = self.current_interface.and_then(|idx| self.interfaces.get_mut(idx)) {
            update(iface);
        }
    }
}

/// Parse a single VLAN id, rejecting values above 4095
pub fn parse_vlan_id(token: &str) -> Option<VlanId> {
    token.parse::<VlanId>().ok().filter(|id| *id <= MAX_VLAN_ID)
}

/// Expand a trunk allowed-VLAN list such as `10,20-22` into `[10, 20, 21, 22]`.
///
/// Order is preserved and duplicates are kept. An inverted range expands to
/// nothing. On failure the offending token is returned.
pub fn expand_vlan_list(list: &str) -> Result<Vec<VlanId>, String> {
    let mut vlans = Vec::new();

    for token in list.split(',') {
        if let Some(caps) = VLAN_RANGE.captures(token) {
            let start = parse_vlan_id(&caps[1]).ok_or_else(|| token.to_string())?;
            let end = parse_vlan_id(&caps[2]).ok_or_else(|| token.to_string())?;
            if start > end {
                log::warn!("VLAN range '{}' is inverted and expands to nothing", token);
            }
            vlans.extend(start..=end);
        } else {
            vlans.push(parse_vlan_id(token).ok_or_else(|| token.to_string())?);
        }
    }

    Ok(vlans)
}

/// Parse configuration text that has no file name attached
pub fn parse_device(text: &str) -> Result<Device, ParseError> {
    ConfigParser::new(INLINE_SOURCE).parse(text)
}

/// Parse configuration text, naming `source_name` in any error
pub fn parse_device_named(source_name: &str, text: &str) -> Result<Device, ParseError> {
    ConfigParser::new(source_name).parse(text)
}
