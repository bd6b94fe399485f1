//! Daemon configuration: a raw, serde-deserialised TOML document resolved
//! and validated into the [`Config`] the rest of the engine consumes.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{AdmindError, Result};

fn default_ping_period_ms() -> u64 {
    1000
}

fn default_ping_timeout_ms() -> u64 {
    5000
}

fn default_multicast_port() -> u16 {
    38_272
}

fn default_data_dir() -> String {
    "/var/lib/exanodes/admind".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_enabled() -> bool {
    false
}

fn default_metrics_port() -> u16 {
    9_272
}

/// As read from the TOML file, before validation. Mirrors the project's
/// raw/resolved split: every field either has a default or is required.
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub cluster_uuid: String,
    pub node_id: u32,
    pub node_name: String,
    pub incarnation: u32,

    #[serde(default = "default_ping_period_ms")]
    pub ping_period_ms: u64,
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,

    pub multicast_group: String,
    #[serde(default = "default_multicast_port")]
    pub multicast_port: u16,

    pub known_nodes: Vec<KnownNodeRaw>,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub metrics: MetricsConfigRaw,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnownNodeRaw {
    pub node_id: u32,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MetricsConfigRaw {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Fully resolved, validated configuration. Construct only through
/// [`Config::from_file`] or [`Config::try_from_raw`] so invariants always hold.
#[derive(Debug, Clone)]
pub struct Config {
    pub cluster_uuid: String,
    pub node_id: u32,
    pub node_name: String,
    pub incarnation: u32,
    pub ping_period: Duration,
    pub ping_timeout: Duration,
    pub multicast_group: IpAddr,
    pub multicast_port: u16,
    pub known_nodes: Vec<KnownNode>,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone)]
pub struct KnownNode {
    pub node_id: u32,
    pub name: String,
    pub address: IpAddr,
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Config {
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&text)?;
        Self::try_from_raw(raw)
    }

    pub fn try_from_raw(raw: RawConfig) -> Result<Self> {
        if raw.cluster_uuid.trim().is_empty() {
            return Err(AdmindError::Config("cluster_uuid must not be empty".into()));
        }
        if raw.ping_timeout_ms <= raw.ping_period_ms {
            return Err(AdmindError::Config(
                "ping_timeout_ms must be greater than ping_period_ms".into(),
            ));
        }
        if raw.incarnation == 0 {
            return Err(AdmindError::Config("incarnation must be nonzero".into()));
        }
        if raw.known_nodes.is_empty() {
            return Err(AdmindError::Config("known_nodes must not be empty".into()));
        }
        if !raw.known_nodes.iter().any(|n| n.node_id == raw.node_id) {
            return Err(AdmindError::Config(
                "known_nodes must include the local node_id".into(),
            ));
        }
        {
            let mut ids: Vec<u32> = raw.known_nodes.iter().map(|n| n.node_id).collect();
            ids.sort_unstable();
            if ids.windows(2).any(|w| w[0] == w[1]) {
                return Err(AdmindError::Config(
                    "known_nodes contains a duplicate node_id".into(),
                ));
            }
        }

        let multicast_group: IpAddr = raw
            .multicast_group
            .parse()
            .map_err(|_| AdmindError::Config(format!("invalid multicast_group: {}", raw.multicast_group)))?;
        if !multicast_group.is_multicast() {
            return Err(AdmindError::Config(format!(
                "{} is not a multicast address",
                multicast_group
            )));
        }

        let mut known_nodes = Vec::with_capacity(raw.known_nodes.len());
        for n in raw.known_nodes {
            let address: IpAddr = n
                .address
                .parse()
                .map_err(|_| AdmindError::Config(format!("invalid address for node {}: {}", n.node_id, n.address)))?;
            known_nodes.push(KnownNode {
                node_id: n.node_id,
                name: n.name,
                address,
            });
        }

        if raw.metrics.port == raw.multicast_port {
            return Err(AdmindError::Config(
                "metrics.port must differ from multicast_port".into(),
            ));
        }

        Ok(Config {
            cluster_uuid: raw.cluster_uuid,
            node_id: raw.node_id,
            node_name: raw.node_name,
            incarnation: raw.incarnation,
            ping_period: Duration::from_millis(raw.ping_period_ms),
            ping_timeout: Duration::from_millis(raw.ping_timeout_ms),
            multicast_group,
            multicast_port: raw.multicast_port,
            known_nodes,
            data_dir: PathBuf::from(raw.data_dir),
            log_level: raw.log_level,
            metrics: MetricsConfig {
                enabled: raw.metrics.enabled,
                port: raw.metrics.port,
            },
        })
    }
}

impl Default for RawConfig {
    fn default() -> Self {
        RawConfig {
            cluster_uuid: String::new(),
            node_id: 0,
            node_name: "node0".to_string(),
            incarnation: 1,
            ping_period_ms: default_ping_period_ms(),
            ping_timeout_ms: default_ping_timeout_ms(),
            multicast_group: Ipv4Addr::new(239, 1, 1, 1).to_string(),
            multicast_port: default_multicast_port(),
            known_nodes: Vec::new(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            metrics: MetricsConfigRaw::default(),
        }
    }
}
