use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File as ConfigFile};
use nfid_registry::{BurnPolicy, RegistryPolicy, RemintPolicy, DEFAULT_EVENT_CAPACITY};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/nfid.toml";
/// Prefix of the environment variables layered over the config file.
pub const ENV_PREFIX: &str = "NFID";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_path: Option<PathBuf>,
    pub node_id: String,

    // RPC
    pub rpc_host: String,
    pub rpc_port: u16,
    pub request_timeout: Duration,

    // Registry
    pub registry: RegistryPolicy,

    // Observability
    pub prometheus_enabled: bool,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl AppConfig {
    pub fn load(config_path_override: Option<&str>) -> Result<Self> {
        let resolved_path = if let Some(path) = config_path_override {
            let path = PathBuf::from(path);
            if !path.exists() {
                anyhow::bail!(
                    "Configuration file {} not found (specified via --config)",
                    path.display()
                );
            }
            Some(path)
        } else {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if path.exists() {
                Some(path)
            } else {
                None
            }
        };

        let config = layered_sources(
            resolved_path.as_deref(),
            Environment::with_prefix(ENV_PREFIX),
        )?;
        Self::from_config(&config, resolved_path)
    }

    /// Read every setting from an already layered `Config`.
    pub fn from_config(config: &Config, config_path: Option<PathBuf>) -> Result<Self> {
        let node_id = get_string_value(config, &["node_id", "node.id"])
            .unwrap_or_else(|| "nfid-node".to_string());

        let rpc_host = get_string_value(config, &["rpc_host", "rpc.host"])
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let rpc_port = get_u64_value(config, &["rpc_port", "rpc.port"])?
            .map(|port| u16::try_from(port).map_err(|_| anyhow!("rpc port {port} out of range")))
            .transpose()?
            .unwrap_or(8080);
        let request_timeout = Duration::from_millis(
            get_u64_value(config, &["request_timeout_ms", "rpc.request_timeout_ms"])?
                .unwrap_or(10_000),
        );

        let remint = match get_string_value(config, &["remint_policy", "registry.remint"]) {
            Some(value) => value.parse::<RemintPolicy>().map_err(|err| anyhow!(err))?,
            None => RemintPolicy::default(),
        };
        let burn = match get_string_value(config, &["burn_policy", "registry.burn"]) {
            Some(value) => value.parse::<BurnPolicy>().map_err(|err| anyhow!(err))?,
            None => BurnPolicy::default(),
        };
        let allow_zero_id = get_bool_value(
            config,
            &["allow_zero_id", "registry.allow_zero_id"],
            true,
        )?;
        let event_capacity = get_u64_value(config, &["event_capacity", "registry.event_capacity"])?
            .map(|value| value as usize)
            .unwrap_or(DEFAULT_EVENT_CAPACITY);

        let prometheus_enabled = get_bool_value(
            config,
            &["prometheus_enabled", "metrics.prometheus_enabled"],
            true,
        )?;

        let log_level = get_string_value(config, &["log_level", "log.level"])
            .unwrap_or_else(|| "info".to_string());
        let log_format = get_string_value(config, &["log_format", "log.format"])
            .unwrap_or_else(|| "pretty".to_string());
        if log_format != "pretty" && log_format != "json" {
            anyhow::bail!("unknown log format '{log_format}' (expected 'pretty' or 'json')");
        }

        Ok(Self {
            config_path,
            node_id,
            rpc_host,
            rpc_port,
            request_timeout,
            registry: RegistryPolicy {
                remint,
                burn,
                allow_zero_id,
                event_capacity,
            },
            prometheus_enabled,
            log_level,
            log_format,
        })
    }

    pub fn rpc_addr(&self) -> String {
        format!("{}:{}", self.rpc_host, self.rpc_port)
    }
}

/// Optional config file with the environment layered on top.
fn layered_sources(path: Option<&Path>, env: Environment) -> Result<Config> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(ConfigFile::from(path));
    }

    Ok(builder.add_source(env).build()?)
}

fn get_string_value(config: &Config, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        config
            .get_string(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

fn get_bool_value(config: &Config, keys: &[&str], default: bool) -> Result<bool> {
    for key in keys {
        if let Ok(value) = config.get_bool(key) {
            return Ok(value);
        }
        if let Some(raw) = get_string_value(config, &[key]) {
            anyhow::bail!("invalid boolean '{raw}' for {key}");
        }
    }
    Ok(default)
}

fn get_u64_value(config: &Config, keys: &[&str]) -> Result<Option<u64>> {
    for key in keys {
        if let Some(raw) = get_string_value(config, &[key]) {
            let value = raw
                .parse::<u64>()
                .with_context(|| format!("invalid value '{raw}' for {key}"))?;
            return Ok(Some(value));
        }
    }
    Ok(None)
}
