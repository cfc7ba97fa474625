//! Process configuration from `STOREKEEP_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use storekeep_auth::password::DEFAULT_ITERATIONS;

const DEV_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_SESSION_IDLE_MINUTES: u32 = 30;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Csv,
    Memory,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorekeepConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    pub data_dir: PathBuf,
    pub admin_password: String,
    pub hash_iterations: u32,
    /// Sessions unused for this long are dropped.
    pub session_idle_minutes: u32,
}

impl StorekeepConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or blank keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("STOREKEEP_BIND_ADDR") {
            Some(v) => v.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "STOREKEEP_BIND_ADDR",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let storage = match get("STOREKEEP_STORAGE").as_deref().map(str::to_ascii_lowercase) {
            None => StorageBackend::Csv,
            Some(v) if v == "csv" => StorageBackend::Csv,
            Some(v) if v == "memory" => StorageBackend::Memory,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    key: "STOREKEEP_STORAGE",
                    value: v,
                    reason: "expected 'csv' or 'memory'".to_string(),
                });
            }
        };

        let data_dir = get("STOREKEEP_DATA_DIR").map_or_else(|| PathBuf::from("./data"), PathBuf::from);

        let admin_password = get("STOREKEEP_ADMIN_PASSWORD").unwrap_or_else(|| {
            warn!("STOREKEEP_ADMIN_PASSWORD not set; using insecure dev default");
            DEV_ADMIN_PASSWORD.to_string()
        });

        let hash_iterations = positive(&get, "STOREKEEP_HASH_ITERATIONS")?.unwrap_or(DEFAULT_ITERATIONS);
        let session_idle_minutes =
            positive(&get, "STOREKEEP_SESSION_IDLE_MINUTES")?.unwrap_or(DEFAULT_SESSION_IDLE_MINUTES);

        Ok(Self {
            bind_addr,
            storage,
            data_dir,
            admin_password,
            hash_iterations,
            session_idle_minutes,
        })
    }
}

fn positive(get: impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<u32>, ConfigError> {
    let Some(value) = get(key) else {
        return Ok(None);
    };
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        Ok(_) => Err(ConfigError::Invalid {
            key,
            value,
            reason: "must be at least 1".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<StorekeepConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StorekeepConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(c.storage, StorageBackend::Csv);
        assert_eq!(c.data_dir, PathBuf::from("./data"));
        assert_eq!(c.admin_password, DEV_ADMIN_PASSWORD);
        assert_eq!(c.hash_iterations, DEFAULT_ITERATIONS);
        assert_eq!(c.session_idle_minutes, DEFAULT_SESSION_IDLE_MINUTES);
    }

    #[test]
    fn overrides() {
        let c = config(&[
            ("STOREKEEP_BIND_ADDR", "127.0.0.1:9000"),
            ("STOREKEEP_STORAGE", "Memory"),
            ("STOREKEEP_DATA_DIR", "/var/lib/storekeep"),
            ("STOREKEEP_ADMIN_PASSWORD", "s3cret"),
            ("STOREKEEP_HASH_ITERATIONS", "25"),
            ("STOREKEEP_SESSION_IDLE_MINUTES", "5"),
        ])
        .unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.storage, StorageBackend::Memory);
        assert_eq!(c.data_dir, PathBuf::from("/var/lib/storekeep"));
        assert_eq!(c.admin_password, "s3cret");
        assert_eq!(c.hash_iterations, 25);
        assert_eq!(c.session_idle_minutes, 5);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let c = config(&[("STOREKEEP_STORAGE", "  "), ("STOREKEEP_ADMIN_PASSWORD", "")]).unwrap();
        assert_eq!(c.storage, StorageBackend::Csv);
        assert_eq!(c.admin_password, DEV_ADMIN_PASSWORD);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (key, value) in [
            ("STOREKEEP_BIND_ADDR", "localhost"),
            ("STOREKEEP_STORAGE", "postgres"),
            ("STOREKEEP_HASH_ITERATIONS", "0"),
            ("STOREKEEP_HASH_ITERATIONS", "many"),
            ("STOREKEEP_SESSION_IDLE_MINUTES", "0"),
        ] {
            let err = config(&[(key, value)]).unwrap_err();
            let ConfigError::Invalid { key: got, .. } = err;
            assert_eq!(got, key);
        }
    }
}
