use std::collections::HashSet;
use std::net::IpAddr;

use log::{debug, info};
use pnet::datalink;

use crate::flow::{Direction, Privacy};

/// Addresses considered local to this host. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalAddressSet {
    addresses: HashSet<IpAddr>,
}

impl LocalAddressSet {
    pub fn new<I: IntoIterator<Item = IpAddr>>(addresses: I) -> Self {
        LocalAddressSet {
            addresses: addresses.into_iter().collect(),
        }
    }

    /// Collects every address bound to a host interface.
    pub fn discover() -> Self {
        let mut addresses = HashSet::new();

        for iface in datalink::interfaces() {
            for network in iface.ips.iter() {
                debug!("local address {} on interface {}", network.ip(), iface.name);
                addresses.insert(network.ip());
            }
        }

        info!("discovered {} local addresses", addresses.len());
        LocalAddressSet { addresses }
    }

    pub fn extend<I: IntoIterator<Item = IpAddr>>(&mut self, addresses: I) {
        self.addresses.extend(addresses);
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.addresses.contains(ip)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Loopback, link-local and private-use ranges (RFC1918, RFC4193).
pub fn is_private_address(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local(),
        IpAddr::V6(ipv6) => {
            if let Some(ipv4) = ipv6.to_ipv4_mapped() {
                return is_private_address(&IpAddr::V4(ipv4));
            }

            let segments = ipv6.segments();
            ipv6.is_loopback()
                || (segments[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (segments[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

/// Destination membership is checked first, so a flow between two local
/// addresses is always inbound.
pub fn classify(
    ip_src: &IpAddr,
    ip_dst: &IpAddr,
    local_addresses: &LocalAddressSet,
) -> (Direction, Privacy) {
    let direction = if local_addresses.contains(ip_dst) {
        Direction::In
    } else if local_addresses.contains(ip_src) {
        Direction::Out
    } else {
        Direction::Unknown
    };

    let privacy = if is_private_address(ip_src) && is_private_address(ip_dst) {
        Privacy::Private
    } else {
        Privacy::Public
    };

    (direction, privacy)
}
