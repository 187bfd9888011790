use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TracespecError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub trace_dir: Option<PathBuf>,
    pub spec_dir: Option<PathBuf>,
    pub query_tcp_addr: String,
    pub uds_path: PathBuf,
    pub default_lookback: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let xdg_runtime = env::var("XDG_RUNTIME_DIR").ok();
        let data_home = env::var("XDG_DATA_HOME").ok();

        let data_root = data_home
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(home).join(".local/share"));

        let uds_path = xdg_runtime
            .map(PathBuf::from)
            .unwrap_or_else(|| data_root.join("tracespec"))
            .join("tracespec.sock");

        Self {
            trace_dir: None,
            spec_dir: None,
            query_tcp_addr: "127.0.0.1:1787".to_string(),
            uds_path,
            default_lookback: Duration::from_secs(60 * 60),
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
        apply_overrides(&mut cfg, load_env_overrides(), "environment")?;
        Ok(cfg)
    }

    /// Lookback in whole hours, rounded up so a sub-hour value still covers something.
    pub fn default_lookback_hours(&self) -> u64 {
        self.default_lookback.as_secs().div_ceil(3600).max(1)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    trace_dir: Option<PathBuf>,
    spec_dir: Option<PathBuf>,
    query_tcp_addr: Option<String>,
    uds_path: Option<PathBuf>,
    default_lookback: Option<String>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("TRACESPEC_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("tracespec/config.toml")
}

fn load_file_overrides(path: &Path) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| TracespecError::Config(format!("failed reading {}: {e}", path.display())))?;
    parse_overrides(&raw)
        .map(Some)
        .map_err(|e| TracespecError::Config(format!("failed parsing {}: {e}", path.display())))
}

fn parse_overrides(raw: &str) -> std::result::Result<ConfigOverrides, toml::de::Error> {
    toml::from_str(raw)
}

fn load_env_overrides() -> ConfigOverrides {
    ConfigOverrides {
        trace_dir: env::var("TRACESPEC_TRACE_DIR").ok().map(PathBuf::from),
        spec_dir: env::var("TRACESPEC_SPEC_DIR").ok().map(PathBuf::from),
        query_tcp_addr: env::var("TRACESPEC_QUERY_TCP_ADDR").ok(),
        uds_path: env::var("TRACESPEC_QUERY_UDS_PATH").ok().map(PathBuf::from),
        default_lookback: env::var("TRACESPEC_DEFAULT_LOOKBACK").ok(),
    }
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.trace_dir {
        cfg.trace_dir = Some(v);
    }
    if let Some(v) = overrides.spec_dir {
        cfg.spec_dir = Some(v);
    }
    if let Some(v) = overrides.query_tcp_addr {
        cfg.query_tcp_addr = v;
    }
    if let Some(v) = overrides.uds_path {
        cfg.uds_path = v;
    }
    if let Some(v) = overrides.default_lookback {
        cfg.default_lookback = humantime::parse_duration(&v).map_err(|e| {
            TracespecError::Config(format!("bad default_lookback in {source}: {e} (value={v})"))
        })?;
    }
    Ok(())
}
