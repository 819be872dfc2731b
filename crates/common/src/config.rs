use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 12300;
pub const DEFAULT_INTERVAL_MS: u64 = 100;

/// All runtime configuration, read from environment variables at startup.
/// Every variable is optional; a value that is present but unparsable is an
/// `InvalidConfig` error.
#[derive(Debug, Clone)]
pub struct Config {
    // Stream endpoint
    pub host: String,
    pub port: u16,

    // Publisher pacing
    pub interval: Duration,

    // Bar source
    pub dataset_path: Option<PathBuf>,
    /// File whose content is the dataset path. Used when `dataset_path` is unset.
    pub dataset_pointer: PathBuf,

    // Trading bot
    pub strategy_config_path: Option<String>,
    pub initial_cash: f64,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_ms: u64 = parsed(&lookup, "STREAM_INTERVAL_MS", DEFAULT_INTERVAL_MS)?;
        let initial_cash: f64 = parsed(&lookup, "INITIAL_CASH", 1000.0)?;
        if !initial_cash.is_finite() || initial_cash < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "INITIAL_CASH must be a non-negative number, got {initial_cash}"
            )));
        }

        Ok(Config {
            host: lookup("STREAM_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "STREAM_PORT", DEFAULT_PORT)?,
            interval: Duration::from_millis(interval_ms),
            dataset_path: lookup("DATASET_PATH").map(PathBuf::from),
            dataset_pointer: lookup("DATASET_POINTER")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("datasets/btcusd-1min.path.txt")),
            strategy_config_path: lookup("STRATEGY_CONFIG_PATH"),
            initial_cash,
        })
    }

    /// `host:port` the publisher binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// WebSocket URL subscribers connect to.
    pub fn stream_url(&self) -> String {
        format!("ws://{}:{}/", self.host, self.port)
    }

    /// Dataset location: `DATASET_PATH` if set, otherwise the path stored in
    /// the pointer file.
    pub fn resolve_dataset(&self) -> Result<PathBuf> {
        if let Some(path) = &self.dataset_path {
            return Ok(path.clone());
        }
        read_pointer(&self.dataset_pointer)
    }
}

fn read_pointer(pointer: &Path) -> Result<PathBuf> {
    let content = std::fs::read_to_string(pointer).map_err(|source| Error::SourceUnavailable {
        path: pointer.to_path_buf(),
        source,
    })?;
    let target = content.trim();
    if target.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "dataset pointer '{}' is empty",
            pointer.display()
        )));
    }
    Ok(PathBuf::from(target))
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            Error::InvalidConfig(format!("{key} has invalid value '{raw}': {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.interval, Duration::from_millis(100));
        assert_eq!(cfg.stream_url(), "ws://127.0.0.1:12300/");
        assert_eq!(cfg.initial_cash, 1000.0);
        assert!(cfg.dataset_path.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("STREAM_HOST", "0.0.0.0"),
            ("STREAM_PORT", "9000"),
            ("STREAM_INTERVAL_MS", "5"),
            ("DATASET_PATH", "/data/bars.csv"),
            ("INITIAL_CASH", "250.5"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_address(), "0.0.0.0:9000");
        assert_eq!(cfg.interval, Duration::from_millis(5));
        assert_eq!(cfg.resolve_dataset().unwrap(), PathBuf::from("/data/bars.csv"));
        assert_eq!(cfg.initial_cash, 250.5);
    }

    #[test]
    fn bad_values_are_invalid_config() {
        let err = Config::from_lookup(lookup_from(&[("STREAM_PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Config::from_lookup(lookup_from(&[("INITIAL_CASH", "-1")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn dataset_resolved_through_pointer_file() {
        let dir = std::env::temp_dir();
        let pointer = dir.join(format!("barstream-pointer-{}.txt", std::process::id()));
        std::fs::write(&pointer, "/srv/data/btcusd-1min.csv\n").unwrap();

        let cfg = Config::from_lookup(lookup_from(&[(
            "DATASET_POINTER",
            pointer.to_str().unwrap(),
        )]))
        .unwrap();
        assert_eq!(
            cfg.resolve_dataset().unwrap(),
            PathBuf::from("/srv/data/btcusd-1min.csv")
        );
        std::fs::remove_file(&pointer).unwrap();
    }

    #[test]
    fn missing_pointer_file_is_source_unavailable() {
        let cfg = Config::from_lookup(lookup_from(&[(
            "DATASET_POINTER",
            "/definitely/not/here.path.txt",
        )]))
        .unwrap();
        assert!(matches!(
            cfg.resolve_dataset(),
            Err(Error::SourceUnavailable { .. })
        ));
    }
}
