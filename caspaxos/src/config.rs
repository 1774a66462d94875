use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use yaml_rust::{Yaml, YamlLoader};

use crate::error::ConfigError;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Static description of one node and the cluster it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub node_id: u64,
    /// Address this node serves on.
    pub listen: String,
    /// Every acceptor in the cluster, in a fixed order shared by all nodes.
    pub acceptors: Vec<String>,
    /// Bound on each request to a remote acceptor.
    pub request_timeout: Duration,
    pub log_level: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(&path)?;
        Self::parse(&s)
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let docs = YamlLoader::load_from_str(s)?;
        let doc = docs.first().ok_or(ConfigError::Empty)?;

        let node_id = match &doc["node_id"] {
            Yaml::BadValue => return Err(ConfigError::Missing("node_id")),
            value => value
                .as_i64()
                .and_then(|id| u64::try_from(id).ok())
                .ok_or_else(|| invalid("node_id", "expected a non-negative integer"))?,
        };

        let listen = doc["listen"]
            .as_str()
            .ok_or(ConfigError::Missing("listen"))?
            .to_string();

        let raw = doc["acceptors"]
            .as_vec()
            .ok_or(ConfigError::Missing("acceptors"))?;
        if raw.is_empty() {
            return Err(invalid("acceptors", "at least one acceptor is required"));
        }
        let mut acceptors = Vec::with_capacity(raw.len());
        let mut seen = HashSet::new();
        for entry in raw {
            let address = entry
                .as_str()
                .ok_or_else(|| invalid("acceptors", "entries must be strings"))?;
            if !seen.insert(address) {
                return Err(invalid("acceptors", &format!("duplicate entry `{}`", address)));
            }
            acceptors.push(address.to_string());
        }

        let request_timeout_ms = match &doc["request_timeout_ms"] {
            Yaml::BadValue => DEFAULT_REQUEST_TIMEOUT_MS,
            value => value
                .as_i64()
                .filter(|ms| *ms > 0)
                .map(|ms| ms as u64)
                .ok_or_else(|| invalid("request_timeout_ms", "expected a positive integer"))?,
        };

        let log_level = match &doc["log_level"] {
            Yaml::BadValue => DEFAULT_LOG_LEVEL.to_string(),
            value => value
                .as_str()
                .ok_or_else(|| invalid("log_level", "expected a string"))?
                .to_string(),
        };

        Ok(Config {
            node_id,
            listen,
            acceptors,
            request_timeout: Duration::from_millis(request_timeout_ms),
            log_level,
        })
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
