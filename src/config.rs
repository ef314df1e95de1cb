use std::{collections::HashMap, num::NonZeroUsize, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::{batch::DEFAULT_ROLLUP_NUM, error::ConfigError};

pub const SERVER: &str = "server";
pub const ROLLUP_NUM: &str = "rollupNum";
pub const TTL_IN_SECONDS: &str = "ttlInSeconds";
pub const TIMEOUT: &str = "timeout";

/// 48 hours.
pub const DEFAULT_TTL_IN_SECONDS: u64 = 172_800;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Int(i64),
    Str(String),
}
impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_owned())
    }
}
impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

pub type ConfigMap = HashMap<String, ConfigValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Str,
    Int,
}
impl ConfigKind {
    fn admits(&self, value: &ConfigValue) -> bool {
        matches!(
            (self, value),
            (ConfigKind::Str, ConfigValue::Str(_)) | (ConfigKind::Int, ConfigValue::Int(_))
        )
    }
    fn expected(&self) -> &'static str {
        match self {
            ConfigKind::Str => "a string",
            ConfigKind::Int => "an integer",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigRule {
    pub key: &'static str,
    pub kind: ConfigKind,
    pub required: bool,
    pub default: Option<ConfigValue>,
    pub description: &'static str,
}

/// Declares the config keys a host must supply before publishing.
#[derive(Debug, Clone)]
pub struct ConfigPolicy {
    rules: Vec<ConfigRule>,
}
impl ConfigPolicy {
    pub fn blueflood() -> Self {
        let rules = vec![
            ConfigRule {
                key: SERVER,
                kind: ConfigKind::Str,
                required: true,
                default: None,
                description: "Blueflood host address",
            },
            ConfigRule {
                key: ROLLUP_NUM,
                kind: ConfigKind::Int,
                required: false,
                default: Some(ConfigValue::Int(DEFAULT_ROLLUP_NUM.get() as i64)),
                description: "Number of metrics per Blueflood ingest request",
            },
            ConfigRule {
                key: TTL_IN_SECONDS,
                kind: ConfigKind::Int,
                required: false,
                default: Some(ConfigValue::Int(DEFAULT_TTL_IN_SECONDS as i64)),
                description: "Seconds before ingested data expires in Blueflood",
            },
            ConfigRule {
                key: TIMEOUT,
                kind: ConfigKind::Int,
                required: false,
                default: Some(ConfigValue::Int(0)),
                description: "Seconds before requests to the Blueflood server time out, 0 for none",
            },
        ];
        Self { rules }
    }

    pub fn rules(&self) -> &[ConfigRule] {
        &self.rules
    }

    /// Fills in defaults and checks required keys and value types.
    pub fn process(&self, config: &ConfigMap) -> Result<ConfigMap, ConfigError> {
        let mut processed = config.clone();
        for rule in &self.rules {
            match config.get(rule.key) {
                Some(value) if rule.kind.admits(value) => {}
                Some(_) => {
                    return Err(ConfigError::WrongType {
                        key: rule.key,
                        expected: rule.kind.expected(),
                    })
                }
                None => match &rule.default {
                    Some(default) => {
                        processed.insert(rule.key.to_owned(), default.clone());
                    }
                    None if rule.required => return Err(ConfigError::Missing(rule.key)),
                    None => {}
                },
            }
        }
        Ok(processed)
    }
}

/// Settings for one publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    pub server: Url,
    pub rollup_num: NonZeroUsize,
    pub ttl_in_seconds: u64,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}
impl PublisherConfig {
    pub fn new(server: Url) -> Self {
        Self {
            server,
            rollup_num: DEFAULT_ROLLUP_NUM,
            ttl_in_seconds: DEFAULT_TTL_IN_SECONDS,
            timeout: None,
        }
    }
}
impl TryFrom<&ConfigMap> for PublisherConfig {
    type Error = ConfigError;

    fn try_from(config: &ConfigMap) -> Result<Self, Self::Error> {
        let config = ConfigPolicy::blueflood().process(config)?;
        let server = match config.get(SERVER) {
            Some(ConfigValue::Str(server)) => server,
            _ => return Err(ConfigError::Missing(SERVER)),
        };
        let server = Url::parse(server).map_err(|source| ConfigError::InvalidServer {
            server: server.clone(),
            source,
        })?;
        let rollup_num = int(&config, ROLLUP_NUM)?;
        let rollup_num = usize::try_from(rollup_num)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(ConfigError::OutOfRange {
                key: ROLLUP_NUM,
                value: rollup_num,
            })?;
        let ttl_in_seconds = non_negative(&config, TTL_IN_SECONDS)?;
        let timeout = match non_negative(&config, TIMEOUT)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Ok(Self {
            server,
            rollup_num,
            ttl_in_seconds,
            timeout,
        })
    }
}

fn int(config: &ConfigMap, key: &'static str) -> Result<i64, ConfigError> {
    match config.get(key) {
        Some(ConfigValue::Int(value)) => Ok(*value),
        Some(ConfigValue::Str(_)) => Err(ConfigError::WrongType {
            key,
            expected: ConfigKind::Int.expected(),
        }),
        None => Err(ConfigError::Missing(key)),
    }
}

fn non_negative(config: &ConfigMap, key: &'static str) -> Result<u64, ConfigError> {
    let value = int(config, key)?;
    u64::try_from(value).map_err(|_| ConfigError::OutOfRange { key, value })
}
