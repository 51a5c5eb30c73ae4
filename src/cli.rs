use clap::Parser;

pub const DEFAULT_CONFIG_PATH: &str = "./geoflow.yaml";

/// Enriches pmacct flow records with GeoIP data and exposes them as Prometheus counters
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the yaml configuration file, environment variables prefixed with GEOFLOW__ override it
    #[clap(short, long, value_parser, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Be chatty, logs every enriched flow
    #[clap(short, long, action)]
    pub verbose: bool,
}

impl Args {
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["geoflow"]);

        assert_eq!(args.config, DEFAULT_CONFIG_PATH);
        assert_eq!(args.log_filter(), "info");
    }

    #[test]
    fn test_verbose_with_config() {
        let args = Args::parse_from(["geoflow", "--verbose", "-c", "/etc/geoflow.yaml"]);

        assert_eq!(args.config, "/etc/geoflow.yaml");
        assert_eq!(args.log_filter(), "debug");
    }
}
