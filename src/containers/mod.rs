use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::executor::{CommandExecutor, ExecutorError, OutputError};
use crate::port::PortSpec;

lazy_static! {
    // Published-port segments as the engines print them:
    //   0.0.0.0:8080->80/tcp        (IPv4 host)
    //   :::8080->80/tcp             (IPv6 wildcard)
    //   [::1]:8080->80/tcp          (bracketed IPv6 host)
    static ref V4_BINDING_RE: Regex =
        Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}:(\d+)->\d+/(tcp|udp)$").unwrap();
    static ref V6_BINDING_RE: Regex =
        Regex::new(r"^\[?[0-9A-Fa-f:]+\]?:(\d+)->\d+/(tcp|udp)$").unwrap();
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Podman,
    Docker,
}

impl Engine {
    pub const ALL: [Engine; 2] = [Engine::Podman, Engine::Docker];

    pub fn command(&self) -> &'static str {
        match self {
            Engine::Podman => "podman",
            Engine::Docker => "docker",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// A running container whose published ports include the queried port.
/// Read-only, sourced live from the engine, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerBinding {
    pub engine: Engine,
    pub container_name: String,
    pub binding_text: String,
}

// `ps --format {{json .}}` differs between engines: docker emits `Names` and
// `Ports` as strings, podman as arrays.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn joined(&self) -> String {
        match self {
            StringOrList::One(s) => s.clone(),
            StringOrList::Many(items) => items.join(", "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PsEntry {
    #[serde(rename = "Names")]
    names: StringOrList,
    #[serde(rename = "Ports", default)]
    ports: Option<StringOrList>,
}

/// Does one binding segment publish host port `spec`?
pub fn segment_matches(segment: &str, spec: &PortSpec) -> bool {
    let caps = V4_BINDING_RE
        .captures(segment)
        .or_else(|| V6_BINDING_RE.captures(segment));
    let Some(caps) = caps else {
        return false;
    };

    let host_port_matches = caps[1]
        .parse::<u16>()
        .map(|p| p == spec.number)
        .unwrap_or(false);
    host_port_matches && &caps[2] == spec.protocol.as_str()
}

/// Match every comma/space-separated segment of a ports field independently,
/// returning the segments that publish `spec`.
pub fn matching_segments(ports_text: &str, spec: &PortSpec) -> Vec<String> {
    ports_text
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| segment_matches(s, spec))
        .map(str::to_string)
        .collect()
}

/// Queries container engines for published-port collisions with a target
/// port. An absent engine is skipped; a failing engine is logged and skipped;
/// neither is an error.
pub struct ContainerScanner<'a> {
    executor: &'a mut (dyn CommandExecutor + Send),
}

impl<'a> ContainerScanner<'a> {
    pub fn new(executor: &'a mut (dyn CommandExecutor + Send)) -> Self {
        Self { executor }
    }

    pub async fn scan(&mut self, spec: &PortSpec) -> Result<Vec<ContainerBinding>, ContainerError> {
        let mut bindings = Vec::new();

        for engine in Engine::ALL {
            if !self.engine_available(engine).await? {
                debug!("{} not found in PATH, skipping", engine);
                continue;
            }
            bindings.extend(self.scan_engine(engine, spec).await?);
        }

        Ok(bindings)
    }

    async fn engine_available(&mut self, engine: Engine) -> Result<bool, ContainerError> {
        let result = self
            .executor
            .execute_command(&format!("which {}", engine.command()))
            .await?;
        Ok(result.is_success())
    }

    async fn scan_engine(
        &mut self,
        engine: Engine,
        spec: &PortSpec,
    ) -> Result<Vec<ContainerBinding>, ContainerError> {
        let cmd = format!("{} ps --format '{{{{json .}}}}'", engine.command());
        let result = self.executor.execute_command(&cmd).await?;

        if !result.is_success() {
            // Advisory-only data source: an unreachable daemon must not fail
            // the invocation.
            warn!(
                "'{}' failed ({}), skipping container check for {}",
                cmd,
                result.output.to_stderr_string()?.trim(),
                engine
            );
            return Ok(Vec::new());
        }

        let mut bindings = Vec::new();
        for line in result.output.stdout_lines()? {
            let entry: PsEntry = match serde_json::from_str(&line) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unparseable {} ps line: {}", engine, e);
                    continue;
                }
            };

            let Some(ports) = &entry.ports else {
                continue;
            };
            let name = entry.names.joined();

            for segment in matching_segments(&ports.joined(), spec) {
                bindings.push(ContainerBinding {
                    engine,
                    container_name: name.clone(),
                    binding_text: segment,
                });
            }
        }

        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::mock::MockExecutor;

    fn spec(token: &str) -> PortSpec {
        token.parse().unwrap()
    }

    #[test]
    fn test_ipv4_segment_match() {
        assert!(segment_matches("0.0.0.0:8080->80/tcp", &spec("8080/tcp")));
        assert!(segment_matches("127.0.0.1:53->53/udp", &spec("53/udp")));
    }

    #[test]
    fn test_ipv4_segment_mismatch() {
        assert!(!segment_matches("0.0.0.0:8080->80/tcp", &spec("8081/tcp")));
        assert!(!segment_matches("0.0.0.0:8080->80/tcp", &spec("8080/udp")));
        // Container-side port must not be confused with the host port.
        assert!(!segment_matches("0.0.0.0:8080->80/tcp", &spec("80/tcp")));
    }

    #[test]
    fn test_ipv6_segment_forms() {
        assert!(segment_matches(":::8080->80/tcp", &spec("8080/tcp")));
        assert!(segment_matches("[::1]:8080->80/tcp", &spec("8080/tcp")));
        assert!(segment_matches(
            "[2001:db8::1]:8080->80/tcp",
            &spec("8080/tcp")
        ));
        assert!(!segment_matches(":::8081->80/tcp", &spec("8080/tcp")));
    }

    #[test]
    fn test_unpublished_ports_do_not_match() {
        // Exposed-but-unpublished form has no host part.
        assert!(!segment_matches("80/tcp", &spec("80/tcp")));
        assert!(!segment_matches("", &spec("80/tcp")));
    }

    #[test]
    fn test_multi_segment_field() {
        let text = "0.0.0.0:8080->80/tcp, :::8080->80/tcp, 0.0.0.0:9443->443/tcp";
        let hits = matching_segments(text, &spec("8080/tcp"));
        assert_eq!(hits, vec!["0.0.0.0:8080->80/tcp", ":::8080->80/tcp"]);
        assert!(matching_segments(text, &spec("8081/tcp")).is_empty());
    }

    #[tokio::test]
    async fn test_scan_no_engines_is_empty() {
        let mut executor = MockExecutor::new();
        executor.add_failure("which podman", 1, "");
        executor.add_failure("which docker", 1, "");

        let mut scanner = ContainerScanner::new(&mut executor);
        let bindings = scanner.scan(&spec("8080/tcp")).await.unwrap();
        assert!(bindings.is_empty());
    }

    #[tokio::test]
    async fn test_scan_docker_string_fields() {
        let mut executor = MockExecutor::new();
        executor.add_failure("which podman", 1, "");
        executor.add_success("which docker", "/usr/bin/docker");
        executor.add_success(
            "docker ps --format '{{json .}}'",
            r#"{"Names":"web","Ports":"0.0.0.0:8080->80/tcp, :::8080->80/tcp"}
{"Names":"db","Ports":"127.0.0.1:5432->5432/tcp"}"#,
        );

        let mut scanner = ContainerScanner::new(&mut executor);
        let bindings = scanner.scan(&spec("8080/tcp")).await.unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].engine, Engine::Docker);
        assert_eq!(bindings[0].container_name, "web");
        assert_eq!(bindings[0].binding_text, "0.0.0.0:8080->80/tcp");
    }

    #[tokio::test]
    async fn test_scan_podman_array_fields() {
        let mut executor = MockExecutor::new();
        executor.add_success("which podman", "/usr/bin/podman");
        executor.add_failure("which docker", 1, "");
        executor.add_success(
            "podman ps --format '{{json .}}'",
            r#"{"Names":["proxy"],"Ports":["0.0.0.0:9443->443/tcp"]}"#,
        );

        let mut scanner = ContainerScanner::new(&mut executor);
        let bindings = scanner.scan(&spec("9443/tcp")).await.unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].engine, Engine::Podman);
        assert_eq!(bindings[0].container_name, "proxy");
    }

    #[tokio::test]
    async fn test_failing_engine_is_absorbed() {
        let mut executor = MockExecutor::new();
        executor.add_success("which podman", "/usr/bin/podman");
        executor.add_failure(
            "podman ps --format '{{json .}}'",
            125,
            "cannot connect to podman socket",
        );
        executor.add_failure("which docker", 1, "");

        let mut scanner = ContainerScanner::new(&mut executor);
        let bindings = scanner.scan(&spec("8080/tcp")).await.unwrap();
        assert!(bindings.is_empty());
    }
}
