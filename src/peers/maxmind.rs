use core::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use log::info;
use maxminddb::{geoip2, MaxMindDBError, Reader};

use super::errors::LookupError;
use super::lookup::{AsnLookup, AsnRecord, CityLookup, CityRecord};

const NAME_LANGUAGE: &str = "en";

fn open_database(path: &Path) -> Result<Reader<Vec<u8>>, LookupError> {
    let reader = Reader::open_readfile(path).map_err(LookupError::DatabaseOpen)?;
    info!(
        "opened {} database at: [{}]",
        reader.metadata.database_type,
        path.display()
    );

    Ok(reader)
}

// Address misses are a normal outcome for private and reserved ranges
fn lookup<'de, T: serde::Deserialize<'de>>(
    reader: &'de Reader<Vec<u8>>,
    ip: IpAddr,
) -> Result<Option<T>, LookupError> {
    match reader.lookup::<T>(ip) {
        Ok(record) => Ok(Some(record)),
        Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub struct MaxmindCity {
    reader: Reader<Vec<u8>>,
    path: PathBuf,
}

impl fmt::Debug for MaxmindCity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MaxmindCity {{ path: {:?} }}", self.path)
    }
}

impl MaxmindCity {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LookupError> {
        let path = path.as_ref();
        Ok(MaxmindCity {
            reader: open_database(path)?,
            path: path.to_owned(),
        })
    }
}

impl CityLookup for MaxmindCity {
    fn lookup_city(&self, ip: IpAddr) -> Result<Option<CityRecord>, LookupError> {
        let record = match lookup::<geoip2::City>(&self.reader, ip)? {
            Some(r) => r,
            None => return Ok(None),
        };

        let mut city_record = CityRecord::default();

        if let Some(country) = record.country {
            city_record.country = country
                .names
                .and_then(|n| n.get(NAME_LANGUAGE).map(|s| s.to_string()))
                .unwrap_or_default();
            city_record.country_iso = country.iso_code.unwrap_or_default().to_string();
        }

        if let Some(city) = record.city {
            city_record.city = city
                .names
                .and_then(|n| n.get(NAME_LANGUAGE).map(|s| s.to_string()))
                .unwrap_or_default();
        }

        if let Some(location) = record.location {
            city_record.latitude = location.latitude.unwrap_or_default();
            city_record.longitude = location.longitude.unwrap_or_default();
        }

        Ok(Some(city_record))
    }
}

pub struct MaxmindAsn {
    reader: Reader<Vec<u8>>,
    path: PathBuf,
}

impl fmt::Debug for MaxmindAsn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MaxmindAsn {{ path: {:?} }}", self.path)
    }
}

impl MaxmindAsn {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LookupError> {
        let path = path.as_ref();
        Ok(MaxmindAsn {
            reader: open_database(path)?,
            path: path.to_owned(),
        })
    }
}

impl AsnLookup for MaxmindAsn {
    fn lookup_asn(&self, ip: IpAddr) -> Result<Option<AsnRecord>, LookupError> {
        let record = match lookup::<geoip2::Asn>(&self.reader, ip)? {
            Some(r) => r,
            None => return Ok(None),
        };

        // a record without a number carries nothing worth labelling
        let number = match record.autonomous_system_number {
            Some(n) => n,
            None => return Ok(None),
        };

        Ok(Some(AsnRecord {
            number,
            organization: record
                .autonomous_system_organization
                .unwrap_or_default()
                .to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_database() {
        match MaxmindCity::open("./does-not-exist.mmdb") {
            Err(LookupError::DatabaseOpen(_)) => {}
            other => panic!("expected database open error, got {:?}", other),
        }

        match MaxmindAsn::open("./does-not-exist.mmdb") {
            Err(LookupError::DatabaseOpen(_)) => {}
            other => panic!("expected database open error, got {:?}", other),
        }
    }
}
