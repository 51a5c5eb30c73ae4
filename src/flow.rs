use core::fmt;
use std::net::IpAddr;

use serde::Deserialize;

use crate::peers::Peer;

/// Wire shape of one collector line. Unknown keys such as `event_type` are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RawFlowRecord {
    pub ip_src: String,
    pub ip_dst: String,
    pub packets: u64,
    pub bytes: u64,

    /// pmacct names it `ip_proto` when the `proto` primitive is aggregated
    #[serde(default, alias = "ip_proto")]
    pub proto: Option<String>,
}

#[derive(Debug)]
pub enum FlowError {
    MalformedRecord(serde_json::Error),
    InvalidAddress(String),
}

impl FlowError {
    /// Short machine friendly reason, used as a metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedRecord(_) => "malformed_record",
            Self::InvalidAddress(_) => "invalid_address",
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MalformedRecord(e) => write!(f, "malformed flow record: {}", e),
            Self::InvalidAddress(ip) => write!(f, "invalid ip address: {:?}", ip),
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(error: serde_json::Error) -> Self {
        Self::MalformedRecord(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privacy {
    Private,
    Public,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One enriched flow event, built from a single input line.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub ip_src: IpAddr,
    pub ip_dst: IpAddr,
    pub packets: u64,
    pub bytes: u64,
    pub proto: Option<String>,
    pub direction: Direction,
    pub privacy: Privacy,
    pub source: Peer,
    pub destination: Peer,
}

impl Flow {
    /// Endpoint the traffic is attributed to. `None` for unattributable flows.
    pub fn remote(&self) -> Option<&Peer> {
        match self.direction {
            Direction::In => Some(&self.source),
            Direction::Out => Some(&self.destination),
            Direction::Unknown => None,
        }
    }
}

/// A line is a flow record candidate only if it starts with `{` after leading whitespace.
pub fn is_flow_record(line: &str) -> bool {
    line.trim_start().starts_with('{')
}

pub fn parse(line: &str) -> Result<RawFlowRecord, FlowError> {
    let record = serde_json::from_str(line.trim())?;
    Ok(record)
}
