use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::blocklist::RuleKind;
use corvid_blocklist::SourceFormat;

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub zone: ZoneConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub alias: AliasConfig,
    #[serde(default)]
    pub blocklists: BlocklistsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
        let conf = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::default().separator("_"))
            .build()?;
        conf.try_deserialize()
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct DnsConfig {
    #[serde(default = "DnsConfig::default_host")]
    pub host: IpAddr,
    #[serde(default = "DnsConfig::default_port")]
    pub port: u16,
}

impl DnsConfig {
    fn default_host() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
    }

    fn default_port() -> u16 {
        53
    }

    pub fn address(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// `dir`, when set, is scanned at startup for `*.toml` zone files (see
/// [`crate::zoneload`]). Zone file syntax is an external concern; this is
/// just the knob that tells the core where to look.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ZoneConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, serde::Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "UpstreamConfig::default_servers")]
    pub servers: Vec<SocketAddr>,
    #[serde(default = "UpstreamConfig::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "UpstreamConfig::default_parallel")]
    pub parallel: bool,
}

impl UpstreamConfig {
    fn default_servers() -> Vec<SocketAddr> {
        vec![
            SocketAddr::from(([1, 1, 1, 1], 53)),
            SocketAddr::from(([1, 0, 0, 1], 53)),
        ]
    }

    fn default_timeout_ms() -> u64 {
        2_000
    }

    fn default_parallel() -> bool {
        true
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn mode(&self) -> corvid_resolver::ForwardMode {
        if self.parallel {
            corvid_resolver::ForwardMode::Parallel
        } else {
            corvid_resolver::ForwardMode::Serial
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            servers: Self::default_servers(),
            timeout_ms: Self::default_timeout_ms(),
            parallel: Self::default_parallel(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_capacity")]
    pub capacity: u64,
}

impl CacheConfig {
    fn default_capacity() -> u64 {
        10_000
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct AliasConfig {
    #[serde(default = "AliasConfig::default_max_depth")]
    pub max_depth: u32,
}

impl AliasConfig {
    fn default_max_depth() -> u32 {
        16
    }
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct BlocklistSourceConfig {
    pub url: String,
    pub format: SourceFormat,
    pub kind: RuleKindConfig,
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKindConfig {
    Exact,
    Suffix,
}

impl From<RuleKindConfig> for RuleKind {
    fn from(value: RuleKindConfig) -> Self {
        match value {
            RuleKindConfig::Exact => RuleKind::Exact,
            RuleKindConfig::Suffix => RuleKind::Suffix,
        }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct BlocklistsConfig {
    #[serde(flatten)]
    pub sources: BTreeMap<String, BlocklistSourceConfig>,
}

#[derive(Debug, serde::Deserialize)]
pub struct LogConfig {
    #[serde(default = "LogConfig::default_level")]
    pub level: String,
}

impl LogConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}
