use crate::classifier::{classify, LocalAddressSet};
use crate::flow::{self, Flow, FlowError};
use crate::peers::PeerResolver;

/// Turns one raw flow line into an annotated [`Flow`]. Stateless between calls.
#[derive(Debug, Clone)]
pub struct FlowEnricher {
    resolver: PeerResolver,
    local_addresses: LocalAddressSet,
}

impl FlowEnricher {
    pub fn new(resolver: PeerResolver, local_addresses: LocalAddressSet) -> Self {
        FlowEnricher {
            resolver,
            local_addresses,
        }
    }

    pub fn enrich(&self, line: &str) -> Result<Flow, FlowError> {
        let record = flow::parse(line)?;

        let source = self.resolver.resolve(&record.ip_src)?;
        let destination = self.resolver.resolve(&record.ip_dst)?;

        let (direction, privacy) = classify(&source.ip, &destination.ip, &self.local_addresses);

        Ok(Flow {
            ip_src: source.ip,
            ip_dst: destination.ip,
            packets: record.packets,
            bytes: record.bytes,
            proto: record.proto,
            direction,
            privacy,
            source,
            destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Direction, Privacy};
    use crate::peers::{AsnLookup, AsnRecord, CityLookup, CityRecord, LookupError, Peer};
    use pretty_assertions::assert_eq;
    use std::net::IpAddr;
    use std::sync::Arc;
    use test_case::test_case;

    struct NoRecords;

    impl CityLookup for NoRecords {
        fn lookup_city(&self, _ip: IpAddr) -> Result<Option<CityRecord>, LookupError> {
            Ok(None)
        }
    }

    impl AsnLookup for NoRecords {
        fn lookup_asn(&self, _ip: IpAddr) -> Result<Option<AsnRecord>, LookupError> {
            Ok(None)
        }
    }

    fn enricher(locals: &[&str]) -> FlowEnricher {
        let resolver = PeerResolver::new(Arc::new(NoRecords), Arc::new(NoRecords));
        FlowEnricher::new(
            resolver,
            LocalAddressSet::new(locals.iter().map(|a| a.parse().unwrap())),
        )
    }

    #[test]
    fn test_enrich_inbound_private_flow() {
        let enricher = enricher(&["10.0.2.1"]);

        let flow = enricher
            .enrich(r#"{"ip_src":"10.0.1.1","ip_dst":"10.0.2.1","packets":2,"bytes":143}"#)
            .expect("flow should be enriched");

        let src: IpAddr = "10.0.1.1".parse().unwrap();
        let dst: IpAddr = "10.0.2.1".parse().unwrap();
        assert_eq!(
            flow,
            Flow {
                ip_src: src,
                ip_dst: dst,
                packets: 2,
                bytes: 143,
                proto: None,
                direction: Direction::In,
                privacy: Privacy::Private,
                source: Peer::unresolved(src),
                destination: Peer::unresolved(dst),
            }
        );
        assert_eq!(flow.remote(), Some(&Peer::unresolved(src)));
    }

    #[test]
    fn test_enrich_outbound_public_flow() {
        let enricher = enricher(&["192.168.1.10"]);

        let flow = enricher
            .enrich(r#"{"ip_src":"192.168.1.10","ip_dst":"1.1.1.1","packets":10,"bytes":4000,"proto":"udp"}"#)
            .unwrap();

        assert_eq!(flow.direction, Direction::Out);
        assert_eq!(flow.privacy, Privacy::Public);
        assert_eq!(flow.proto, Some("udp".to_string()));
        assert_eq!(flow.remote().map(|p| p.ip), Some("1.1.1.1".parse().unwrap()));
    }

    #[test_case(r#"{"ip_src":"not-an-ip","bytes":10}"#, "malformed_record"; "missing fields")]
    #[test_case(r#"{"ip_src":"not-an-ip","ip_dst":"10.0.0.1","packets":1,"bytes":10}"#, "invalid_address"; "invalid source")]
    #[test_case(r#"{"ip_src":"10.0.0.1","ip_dst":"10.0.0","packets":1,"bytes":10}"#, "invalid_address"; "invalid destination")]
    #[test_case(r#"{"ip_src":"10.0.0.1","ip_dst":"10.0.0.2","packets":1,"bytes":-10}"#, "malformed_record"; "negative bytes")]
    fn test_enrich_rejects(line: &str, reason: &str) {
        let enricher = enricher(&["10.0.0.1"]);

        match enricher.enrich(line) {
            Err(e) => assert_eq!(e.reason(), reason),
            Ok(flow) => panic!("expected rejection, got {:?}", flow),
        }
    }
}
