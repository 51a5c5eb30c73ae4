use std::net::IpAddr;

use super::errors::LookupError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityRecord {
    pub country: String,
    pub country_iso: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsnRecord {
    pub number: u32,
    pub organization: String,
}

/// Read-only geolocation lookup. `Ok(None)` is a miss, not a failure.
pub trait CityLookup: Sync + Send {
    fn lookup_city(&self, ip: IpAddr) -> Result<Option<CityRecord>, LookupError>;
}

/// Read-only network-number lookup. `Ok(None)` is a miss, not a failure.
pub trait AsnLookup: Sync + Send {
    fn lookup_asn(&self, ip: IpAddr) -> Result<Option<AsnRecord>, LookupError>;
}
