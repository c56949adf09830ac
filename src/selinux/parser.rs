//! Parser for the columnar output of `semanage port -l`.
//!
//! Example input:
//! ```text
//! SELinux Port Type              Proto    Port Number
//!
//! http_port_t                    tcp      80, 81, 443, 488, 8008, 8009, 8443, 9000
//! ssh_port_t                     tcp      22
//! ```

use crate::port::Protocol;

/// One row of the label table: a type owning a set of ports/ranges for one
/// protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortLabelMapping {
    pub se_type: String,
    pub protocol: Protocol,
    pub ports: Vec<PortRange>,
}

impl PortLabelMapping {
    /// Whether this row covers `port`, either exactly or inside a range.
    pub fn covers(&self, port: u16) -> bool {
        self.ports.iter().any(|r| r.contains(port))
    }

    /// Ports column as semanage printed it, for display.
    pub fn ports_display(&self) -> String {
        self.ports
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A single port or an inclusive `lo-hi` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub lo: u16,
    pub hi: u16,
}

impl PortRange {
    pub fn contains(&self, port: u16) -> bool {
        self.lo <= port && port <= self.hi
    }

    fn parse(token: &str) -> Option<Self> {
        match token.split_once('-') {
            Some((lo, hi)) => {
                let lo = lo.trim().parse().ok()?;
                let hi = hi.trim().parse().ok()?;
                Some(PortRange { lo, hi })
            }
            None => {
                let port = token.trim().parse().ok()?;
                Some(PortRange { lo: port, hi: port })
            }
        }
    }
}

impl std::fmt::Display for PortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lo == self.hi {
            write!(f, "{}", self.lo)
        } else {
            write!(f, "{}-{}", self.lo, self.hi)
        }
    }
}

/// Parse the whole listing. Header, blank and unrecognized-protocol lines
/// (sctp, dccp) are skipped rather than treated as errors.
pub fn parse_port_listing(output: &str) -> Vec<PortLabelMapping> {
    let mut mappings = Vec::new();

    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        let (Some(se_type), Some(proto)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let Ok(protocol) = proto.parse::<Protocol>() else {
            continue;
        };

        let ports: Vec<PortRange> = tokens
            .filter_map(|t| PortRange::parse(t.trim_matches(',')))
            .collect();
        if ports.is_empty() {
            continue;
        }

        mappings.push(PortLabelMapping {
            se_type: se_type.to_string(),
            protocol,
            ports,
        });
    }

    mappings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_header_and_blank_lines() {
        let output = "\
SELinux Port Type              Proto    Port Number

ssh_port_t                     tcp      22
";
        let mappings = parse_port_listing(output);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].se_type, "ssh_port_t");
        assert_eq!(mappings[0].protocol, Protocol::Tcp);
        assert_eq!(mappings[0].ports, vec![PortRange { lo: 22, hi: 22 }]);
    }

    #[test]
    fn test_parse_port_lists_and_ranges() {
        let output = "\
http_port_t                    tcp      80, 81, 443, 8008-8010
";
        let mappings = parse_port_listing(output);
        assert_eq!(mappings[0].ports.len(), 4);
        assert!(mappings[0].covers(80));
        assert!(mappings[0].covers(8009));
        assert!(!mappings[0].covers(8011));
        assert_eq!(mappings[0].ports_display(), "80, 81, 443, 8008-8010");
    }

    #[test]
    fn test_parse_skips_unknown_protocols() {
        let output = "\
sctp_example_t                 sctp     9999
ssh_port_t                     tcp      22
";
        let mappings = parse_port_listing(output);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].se_type, "ssh_port_t");
    }

    #[test]
    fn test_same_type_appears_per_protocol() {
        let output = "\
dns_port_t                     tcp      53
dns_port_t                     udp      53
";
        let mappings = parse_port_listing(output);
        assert_eq!(mappings.len(), 2);
        assert_ne!(mappings[0].protocol, mappings[1].protocol);
    }
}
