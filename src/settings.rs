use core::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use serde::Deserialize;

use crate::classifier::LocalAddressSet;
use crate::importers::errors::ImporterError;
use crate::importers::{CollectorProcess, Import, LineImporter, PmacctSettings};
use crate::metrics::MetricsSettings;
use crate::peers::{LookupError, MaxmindAsn, MaxmindCity, PeerResolver};

const DEFAULT_PMACCT_COMMAND: &str = "pmacctd";
const DEFAULT_PMACCT_ARGS: &str = "-r 1 -c src_host,dst_host,proto -P print -O json";

#[derive(Debug)]
pub enum ConstructorErr {
    PmacctErr(ImporterError),
    GeoErr(LookupError),
    LocalAddressErr(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub enum ImporterVariants {
    #[serde(rename = "pmacct")]
    Pmacct,
    #[serde(rename = "stdin")]
    Stdin,
}

pub type ConstructedImporter = (Box<dyn Import>, Option<CollectorProcess>);

impl ImporterVariants {
    pub fn construct_importer(
        &self,
        settings: ImporterSettings,
    ) -> Result<ConstructedImporter, ConstructorErr> {
        match *self {
            Self::Pmacct => {
                let (process, importer) = CollectorProcess::spawn(settings.pmacct())
                    .map_err(ConstructorErr::PmacctErr)?;
                Ok((Box::new(importer), Some(process)))
            }
            Self::Stdin => Ok((
                Box::new(LineImporter::new(
                    tokio::io::BufReader::new(tokio::io::stdin()),
                    "stdin",
                )),
                None,
            )),
        }
    }
}

impl From<ImporterVariants> for String {
    fn from(variant: ImporterVariants) -> Self {
        variant.to_string()
    }
}

impl fmt::Display for ImporterVariants {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Pmacct => "pmacct",
            Self::Stdin => "stdin",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Importer {
    pub source: ImporterVariants,

    #[serde(default)]
    pub settings: ImporterSettings,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ImporterSettings {
    pub pmacct_command: Option<String>,

    pub pmacct_args: Option<String>,
}

impl ImporterSettings {
    pub fn pmacct(&self) -> PmacctSettings {
        PmacctSettings {
            command: self
                .pmacct_command
                .clone()
                .unwrap_or_else(|| DEFAULT_PMACCT_COMMAND.to_string()),
            args: self
                .pmacct_args
                .as_deref()
                .unwrap_or(DEFAULT_PMACCT_ARGS)
                .split_whitespace()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn default_city_database() -> String {
    "GeoLite2-City.mmdb".to_string()
}

fn default_asn_database() -> String {
    "GeoLite2-ASN.mmdb".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GeoSettings {
    #[serde(default = "default_city_database")]
    pub city_database: String,

    #[serde(default = "default_asn_database")]
    pub asn_database: String,
}

impl Default for GeoSettings {
    fn default() -> Self {
        GeoSettings {
            city_database: default_city_database(),
            asn_database: default_asn_database(),
        }
    }
}

impl GeoSettings {
    pub fn construct_resolver(&self) -> Result<PeerResolver, ConstructorErr> {
        let city = MaxmindCity::open(&self.city_database).map_err(ConstructorErr::GeoErr)?;
        let asn = MaxmindAsn::open(&self.asn_database).map_err(ConstructorErr::GeoErr)?;

        Ok(PeerResolver::new(Arc::new(city), Arc::new(asn)))
    }
}

fn default_discover() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LocalAddressSettings {
    #[serde(default = "default_discover")]
    pub discover: bool,

    /// Comma separated list of additional local addresses
    pub extra: Option<String>,
}

impl Default for LocalAddressSettings {
    fn default() -> Self {
        LocalAddressSettings {
            discover: default_discover(),
            extra: None,
        }
    }
}

impl LocalAddressSettings {
    pub fn extra_addresses(&self) -> Result<Vec<IpAddr>, ConstructorErr> {
        self.extra
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse()
                    .map_err(|_| ConstructorErr::LocalAddressErr(s.to_string()))
            })
            .collect()
    }

    pub fn construct_local_addresses(&self) -> Result<LocalAddressSet, ConstructorErr> {
        let mut local_addresses = if self.discover {
            LocalAddressSet::discover()
        } else {
            LocalAddressSet::default()
        };
        local_addresses.extend(self.extra_addresses()?);

        Ok(local_addresses)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Configuration {
    pub importer: Importer,

    #[serde(default)]
    pub geo: GeoSettings,

    #[serde(default)]
    pub metrics: MetricsSettings,

    #[serde(default)]
    pub local_addresses: LocalAddressSettings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigCache;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::env;
    use test_case::test_case;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg: Configuration = serde_yaml::from_str(
            "
        importer:
            source: pmacct
        ",
        )
        .expect("unable to deserialize config");

        assert_eq!(
            cfg,
            Configuration {
                importer: Importer {
                    source: ImporterVariants::Pmacct,
                    settings: ImporterSettings::default(),
                },
                geo: GeoSettings {
                    city_database: "GeoLite2-City.mmdb".to_string(),
                    asn_database: "GeoLite2-ASN.mmdb".to_string(),
                },
                metrics: MetricsSettings {
                    address: "0.0.0.0:9590".to_string(),
                },
                local_addresses: LocalAddressSettings {
                    discover: true,
                    extra: None,
                },
            }
        );
        assert_eq!(
            cfg.importer.settings.pmacct(),
            PmacctSettings {
                command: "pmacctd".to_string(),
                args: vec!["-r", "1", "-c", "src_host,dst_host,proto", "-P", "print", "-O", "json"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }
        );
    }

    #[test]
    fn test_full_config_deserialization() {
        let cfg: Configuration = serde_yaml::from_str(
            r#"
        importer:
            source: stdin
            settings:
              pmacct_command: /usr/sbin/pmacctd
              pmacct_args: "-f /etc/pmacct/pmacctd.conf"
        geo:
            city_database: /var/lib/geoip/City.mmdb
            asn_database: /var/lib/geoip/ASN.mmdb
        metrics:
            address: "127.0.0.1:9100"
        local_addresses:
            discover: false
            extra: "10.0.0.1, ::1"
        "#,
        )
        .expect("unable to deserialize config");

        assert_eq!(cfg.importer.source, ImporterVariants::Stdin);
        assert_eq!(
            cfg.importer.settings.pmacct().args,
            vec!["-f".to_string(), "/etc/pmacct/pmacctd.conf".to_string()]
        );
        assert_eq!(cfg.geo.city_database, "/var/lib/geoip/City.mmdb");
        assert_eq!(cfg.metrics.address, "127.0.0.1:9100");
        assert!(!cfg.local_addresses.discover);

        let local = cfg.local_addresses.construct_local_addresses().unwrap();
        assert_eq!(local.len(), 2);
        assert!(local.contains(&"::1".parse().unwrap()));
    }

    #[test_case(None, 0; "no extras")]
    #[test_case(Some("10.0.0.1"), 1; "single")]
    #[test_case(Some("10.0.0.1,10.0.0.2,"), 2; "trailing comma")]
    #[test_case(Some(""), 0; "empty")]
    fn test_extra_addresses(extra: Option<&str>, expected: usize) {
        let settings = LocalAddressSettings {
            discover: false,
            extra: extra.map(String::from),
        };

        assert_eq!(settings.extra_addresses().unwrap().len(), expected);
    }

    #[test]
    fn test_invalid_extra_address() {
        let settings = LocalAddressSettings {
            discover: false,
            extra: Some("10.0.0.1,localhost".to_string()),
        };

        match settings.extra_addresses() {
            Err(ConstructorErr::LocalAddressErr(s)) => assert_eq!(s, "localhost"),
            other => panic!("expected local address error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_geo_database() {
        let settings = GeoSettings {
            city_database: "./missing-city.mmdb".to_string(),
            asn_database: "./missing-asn.mmdb".to_string(),
        };

        assert!(matches!(
            settings.construct_resolver(),
            Err(ConstructorErr::GeoErr(LookupError::DatabaseOpen(_)))
        ));
    }

    #[test_case(ImporterVariants::Pmacct, "/usr/sbin/pmacctd", "127.0.0.1:9590"; "pmacct")]
    #[test_case(ImporterVariants::Stdin, "pmacctd", "[::]:9590"; "stdin")]
    #[serial]
    fn test_env_configs(source: ImporterVariants, command: &str, address: &str) {
        env::set_var("GEOFLOW__IMPORTER__SOURCE", String::from(source.clone()));
        env::set_var("GEOFLOW__IMPORTER__SETTINGS__PMACCT_COMMAND", command);
        env::set_var("GEOFLOW__METRICS__ADDRESS", address);
        env::set_var("GEOFLOW__LOCAL_ADDRESSES__DISCOVER", "false");

        // ConfigCache without configuration file
        let config = ConfigCache::new("")
            .and_then(|c| c.get_config::<Configuration>())
            .expect("configuration from env");

        env::remove_var("GEOFLOW__IMPORTER__SOURCE");
        env::remove_var("GEOFLOW__IMPORTER__SETTINGS__PMACCT_COMMAND");
        env::remove_var("GEOFLOW__METRICS__ADDRESS");
        env::remove_var("GEOFLOW__LOCAL_ADDRESSES__DISCOVER");

        assert_eq!(config.importer.source, source);
        assert_eq!(config.importer.settings.pmacct().command, command);
        assert_eq!(config.metrics.address, address);
        assert!(!config.local_addresses.discover);
        assert_eq!(config.geo, GeoSettings::default());
    }
}
