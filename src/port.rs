use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    static ref PORT_SPEC_RE: Regex = Regex::new(r"^(\d{1,5})/(tcp|udp)$").unwrap();
}

#[derive(Debug, Error)]
pub enum PortSpecError {
    #[error("invalid port specification '{0}' (expected <1-65535>/<tcp|udp>)")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl FromStr for Protocol {
    type Err = PortSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(PortSpecError::Invalid(other.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated `<number>/<protocol>` port token. Immutable once parsed;
/// anything that reaches the firewall or label subsystems went through here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub number: u16,
    pub protocol: Protocol,
}

impl FromStr for PortSpec {
    type Err = PortSpecError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let caps = PORT_SPEC_RE
            .captures(token)
            .ok_or_else(|| PortSpecError::Invalid(token.to_string()))?;

        // The regex admits up to 5 digits, so 0 and 65536..=99999 still get here.
        let number: u32 = caps[1]
            .parse()
            .map_err(|_| PortSpecError::Invalid(token.to_string()))?;
        if number == 0 || number > u16::MAX as u32 {
            return Err(PortSpecError::Invalid(token.to_string()));
        }

        let protocol = caps[2].parse()?;

        Ok(PortSpec {
            number: number as u16,
            protocol,
        })
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.protocol)
    }
}

/// Parse a batch of port tokens, failing on the first invalid one.
pub fn parse_port_tokens(tokens: &[String]) -> Result<Vec<PortSpec>, PortSpecError> {
    tokens.iter().map(|t| t.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_specs() {
        let spec: PortSpec = "9090/tcp".parse().unwrap();
        assert_eq!(spec.number, 9090);
        assert_eq!(spec.protocol, Protocol::Tcp);

        let spec: PortSpec = "53/udp".parse().unwrap();
        assert_eq!(spec.number, 53);
        assert_eq!(spec.protocol, Protocol::Udp);

        let spec: PortSpec = "1/tcp".parse().unwrap();
        assert_eq!(spec.number, 1);

        let spec: PortSpec = "65535/tcp".parse().unwrap();
        assert_eq!(spec.number, 65535);
    }

    #[test]
    fn test_reject_out_of_range() {
        assert!("0/tcp".parse::<PortSpec>().is_err());
        assert!("65536/tcp".parse::<PortSpec>().is_err());
        assert!("123456/tcp".parse::<PortSpec>().is_err());
    }

    #[test]
    fn test_reject_bad_protocol() {
        assert!("8080/http".parse::<PortSpec>().is_err());
        assert!("8080/TCP".parse::<PortSpec>().is_err());
        assert!("8080".parse::<PortSpec>().is_err());
        assert!("/tcp".parse::<PortSpec>().is_err());
        assert!("8080/tcp/extra".parse::<PortSpec>().is_err());
    }

    #[test]
    fn test_batch_fail_fast() {
        let tokens = vec![
            "80/tcp".to_string(),
            "bogus".to_string(),
            "443/tcp".to_string(),
        ];
        let err = parse_port_tokens(&tokens).unwrap_err();
        assert!(err.to_string().contains("bogus"));

        let tokens = vec!["80/tcp".to_string(), "443/tcp".to_string()];
        assert_eq!(parse_port_tokens(&tokens).unwrap().len(), 2);
    }

    #[test]
    fn test_display_round_trip() {
        let spec: PortSpec = "4422/tcp".parse().unwrap();
        assert_eq!(spec.to_string(), "4422/tcp");
    }
}
