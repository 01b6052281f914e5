use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub redis_url: String,
    pub kafka_brokers: String,
    pub topic: String,
    pub buffer_key: String,
    pub batch_size: usize,
    pub buffer_ttl: Duration,
    pub drain_interval: Duration,
    pub publish_timeout: Duration,
    pub channel_capacity: usize,
    pub http_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
            kafka_brokers: "127.0.0.1:9092".to_string(),
            topic: "logs-topic".to_string(),
            buffer_key: "logs:list".to_string(),
            batch_size: 1000,
            buffer_ttl: Duration::from_secs(60 * 60 * 24),
            drain_interval: Duration::from_secs(10),
            publish_timeout: Duration::from_secs(10),
            channel_capacity: 256,
            http_addr: "127.0.0.1:8686".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    redis_url: Option<String>,
    kafka_brokers: Option<String>,
    topic: Option<String>,
    buffer_key: Option<String>,
    batch_size: Option<usize>,
    buffer_ttl: Option<String>,
    drain_interval: Option<String>,
    publish_timeout: Option<String>,
    channel_capacity: Option<usize>,
    http_addr: Option<String>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("LOGRELAY_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("logrelay/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| RelayError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| RelayError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<ConfigOverrides> {
    let batch_size = match env::var("LOGRELAY_BATCH_SIZE") {
        Ok(v) => Some(v.parse::<usize>().map_err(|e| {
            RelayError::Config(format!("bad LOGRELAY_BATCH_SIZE in environment: {e}"))
        })?),
        Err(_) => None,
    };
    let channel_capacity = match env::var("LOGRELAY_CHANNEL_CAPACITY") {
        Ok(v) => Some(v.parse::<usize>().map_err(|e| {
            RelayError::Config(format!("bad LOGRELAY_CHANNEL_CAPACITY in environment: {e}"))
        })?),
        Err(_) => None,
    };

    Ok(ConfigOverrides {
        redis_url: env::var("LOGRELAY_REDIS_URL").ok(),
        kafka_brokers: env::var("LOGRELAY_KAFKA_BROKERS").ok(),
        topic: env::var("LOGRELAY_TOPIC").ok(),
        buffer_key: env::var("LOGRELAY_BUFFER_KEY").ok(),
        batch_size,
        buffer_ttl: env::var("LOGRELAY_BUFFER_TTL").ok(),
        drain_interval: env::var("LOGRELAY_DRAIN_INTERVAL").ok(),
        publish_timeout: env::var("LOGRELAY_PUBLISH_TIMEOUT").ok(),
        channel_capacity,
        http_addr: env::var("LOGRELAY_HTTP_ADDR").ok(),
    })
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.redis_url {
        cfg.redis_url = v;
    }
    if let Some(v) = overrides.kafka_brokers {
        cfg.kafka_brokers = v;
    }
    if let Some(v) = overrides.topic {
        cfg.topic = v;
    }
    if let Some(v) = overrides.buffer_key {
        cfg.buffer_key = v;
    }
    if let Some(v) = overrides.batch_size {
        if v == 0 {
            return Err(RelayError::Config(format!(
                "batch_size in {source} must be at least 1"
            )));
        }
        cfg.batch_size = v;
    }
    if let Some(v) = overrides.buffer_ttl {
        cfg.buffer_ttl = humantime::parse_duration(&v).map_err(|e| {
            RelayError::Config(format!("bad buffer_ttl in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.drain_interval {
        cfg.drain_interval = humantime::parse_duration(&v).map_err(|e| {
            RelayError::Config(format!("bad drain_interval in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.publish_timeout {
        cfg.publish_timeout = humantime::parse_duration(&v).map_err(|e| {
            RelayError::Config(format!("bad publish_timeout in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.channel_capacity {
        cfg.channel_capacity = v;
    }
    if let Some(v) = overrides.http_addr {
        cfg.http_addr = v;
    }
    Ok(())
}
