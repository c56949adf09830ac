use std::fmt;

use crate::port::PortSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Ipv4 => write!(f, "ipv4"),
            Family::Ipv6 => write!(f, "ipv6"),
        }
    }
}

/// A source-scoped accept rule. The rendered string is what firewalld sees;
/// the same `RichRule` must render byte-identically for add and remove so the
/// removal matches exactly what was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichRule {
    pub family: Family,
    pub source: String,
    pub port: PortSpec,
}

impl RichRule {
    /// Family detection is a heuristic, not CIDR validation: anything with a
    /// colon is treated as IPv6. Malformed descriptors pass through and fail
    /// inside firewalld, which is the actual validator.
    pub fn new(source: &str, port: PortSpec) -> Self {
        let family = if source.contains(':') {
            Family::Ipv6
        } else {
            Family::Ipv4
        };
        Self {
            family,
            source: source.to_string(),
            port,
        }
    }
}

impl fmt::Display for RichRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule family=\"{}\" source address=\"{}\" port port=\"{}\" protocol=\"{}\" accept",
            self.family, self.source, self.port.number, self.port.protocol
        )
    }
}
