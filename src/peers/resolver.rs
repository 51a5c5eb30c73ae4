use core::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use log::warn;

use super::lookup::{AsnLookup, CityLookup};
use crate::flow::FlowError;

/// Resolved identity of one flow endpoint. Unresolved fields stay empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub ip: IpAddr,
    pub country: String,
    pub country_iso: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub asn: String,
    pub asn_org: String,
}

impl Peer {
    pub fn unresolved(ip: IpAddr) -> Self {
        Peer {
            ip,
            country: String::new(),
            country_iso: String::new(),
            city: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            asn: String::new(),
            asn_org: String::new(),
        }
    }
}

#[derive(Clone)]
pub struct PeerResolver {
    city: Arc<dyn CityLookup>,
    asn: Arc<dyn AsnLookup>,
}

impl fmt::Debug for PeerResolver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PeerResolver")
    }
}

impl PeerResolver {
    pub fn new(city: Arc<dyn CityLookup>, asn: Arc<dyn AsnLookup>) -> Self {
        PeerResolver { city, asn }
    }

    /// Resolves a textual address. Only an unparseable address is an error;
    /// lookup misses and lookup failures leave the matching fields empty.
    pub fn resolve(&self, raw_ip: &str) -> Result<Peer, FlowError> {
        let ip: IpAddr = raw_ip
            .parse()
            .map_err(|_| FlowError::InvalidAddress(raw_ip.to_owned()))?;

        let mut peer = Peer::unresolved(ip);

        match self.city.lookup_city(ip) {
            Ok(Some(record)) => {
                peer.country = record.country;
                peer.country_iso = record.country_iso;
                peer.city = record.city;
                peer.latitude = record.latitude;
                peer.longitude = record.longitude;
            }
            Ok(None) => {}
            Err(e) => warn!("city lookup failed for {}: {:?}", ip, e),
        }

        match self.asn.lookup_asn(ip) {
            Ok(Some(record)) => {
                peer.asn = record.number.to_string();
                peer.asn_org = record.organization;
            }
            Ok(None) => {}
            Err(e) => warn!("asn lookup failed for {}: {:?}", ip, e),
        }

        Ok(peer)
    }
}
