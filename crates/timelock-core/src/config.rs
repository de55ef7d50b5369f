use crate::error::{Result, TimelockError};
use crate::io;
use crate::ledger::abi;
use crate::paths;
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Address of the timelock program that gates the governed targets.
    #[serde(default)]
    pub timelock_address: Option<Address>,
    /// Account the node signs `eth_sendTransaction` calls with.
    #[serde(default)]
    pub sender: Option<Address>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Revert-reason fragments meaning "buffer not elapsed yet".
    #[serde(default = "default_not_ready_markers")]
    pub not_ready_markers: Vec<String>,
    #[serde(default = "default_ready_timestamp_fn")]
    pub ready_timestamp_fn: String,
    #[serde(default = "default_schedule_fn")]
    pub schedule_fn: String,
    #[serde(default = "default_execute_fn")]
    pub execute_fn: String,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".into()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_confirmation_timeout() -> u64 {
    180
}

fn default_poll_interval() -> u64 {
    2_000
}

fn default_not_ready_markers() -> Vec<String> {
    vec![
        "action time not yet passed".into(),
        "operation is not ready".into(),
    ]
}

fn default_ready_timestamp_fn() -> String {
    "getReadyTimestamp(bytes32)".into()
}

fn default_schedule_fn() -> String {
    "scheduleAction(address,uint256,bytes,bytes32)".into()
}

fn default_execute_fn() -> String {
    "executeAction(address,uint256,bytes,bytes32)".into()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            timelock_address: None,
            sender: None,
            request_timeout_secs: default_request_timeout(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            poll_interval_ms: default_poll_interval(),
            not_ready_markers: default_not_ready_markers(),
            ready_timestamp_fn: default_ready_timestamp_fn(),
            schedule_fn: default_schedule_fn(),
            execute_fn: default_execute_fn(),
        }
    }
}

impl LedgerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Timelock and sender, or an error naming whichever is missing.
    pub fn require_accounts(&self) -> Result<(Address, Address)> {
        let timelock = self.timelock_address.ok_or_else(|| {
            TimelockError::InvalidConfig("ledger.timelock_address is not set".into())
        })?;
        let sender = self
            .sender
            .ok_or_else(|| TimelockError::InvalidConfig("ledger.sender is not set".into()))?;
        Ok((timelock, sender))
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Json,
    Redb,
}

impl std::str::FromStr for StoreBackend {
    type Err = TimelockError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "redb" => Ok(Self::Redb),
            other => Err(TimelockError::InvalidConfig(format!(
                "unknown store backend '{other}' (expected json or redb)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            ledger: LedgerConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let Some(data) = io::read_optional(&path)? else {
            return Err(TimelockError::NotInitialized);
        };
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&paths::config_path(root), data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut out = Vec::new();
        let mut error = |message: String| {
            out.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        let l = &self.ledger;
        if !(l.rpc_url.starts_with("http://") || l.rpc_url.starts_with("https://")) {
            error(format!(
                "ledger.rpc_url '{}' must be an http(s) URL",
                l.rpc_url
            ));
        }
        if l.timelock_address.is_none() {
            error("ledger.timelock_address is not set".into());
        }
        if l.sender.is_none() {
            error("ledger.sender is not set".into());
        }
        if l.request_timeout_secs == 0 {
            error("ledger.request_timeout_secs must be greater than zero".into());
        }
        if l.confirmation_timeout_secs == 0 {
            error("ledger.confirmation_timeout_secs must be greater than zero".into());
        }
        for (key, sig, params) in [
            ("ready_timestamp_fn", &l.ready_timestamp_fn, abi::id_call_params()),
            ("schedule_fn", &l.schedule_fn, abi::action_call_params()),
            ("execute_fn", &l.execute_fn, abi::action_call_params()),
        ] {
            if let Err(e) = abi::parse_function(sig, &params) {
                error(format!("ledger.{key}: {e}"));
            }
        }

        if l.poll_interval_ms == 0 {
            out.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "ledger.poll_interval_ms is 0; receipts will be polled in a tight loop"
                    .into(),
            });
        }
        if l.not_ready_markers.is_empty() {
            out.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "ledger.not_ready_markers is empty; early executions will be reported \
                          as failures instead of still-pending"
                    .into(),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn complete() -> Config {
        let mut c = Config::default();
        c.ledger.timelock_address = Some(Address::repeat_byte(1));
        c.ledger.sender = Some(Address::repeat_byte(2));
        c
    }

    #[test]
    fn load_missing_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(TimelockError::NotInitialized)
        ));
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".timelock")).unwrap();
        std::fs::write(
            dir.path().join(".timelock/config.yaml"),
            "ledger:\n  rpc_url: https://rpc.example.org\nstore:\n  backend: redb\n",
        )
        .unwrap();
        let c = Config::load(dir.path()).unwrap();
        assert_eq!(c.ledger.rpc_url, "https://rpc.example.org");
        assert_eq!(c.ledger.request_timeout_secs, 30);
        assert_eq!(c.store.backend, StoreBackend::Redb);
        assert_eq!(c.ledger.schedule_fn, default_schedule_fn());
    }

    #[test]
    fn save_then_load_keeps_addresses() {
        let dir = TempDir::new().unwrap();
        let c = complete();
        c.save(dir.path()).unwrap();
        let back = Config::load(dir.path()).unwrap();
        assert_eq!(back.ledger.timelock_address, c.ledger.timelock_address);
    }

    #[test]
    fn complete_config_has_no_errors() {
        let warnings = complete().validate();
        assert!(
            warnings.iter().all(|w| w.level != WarnLevel::Error),
            "{warnings:?}"
        );
    }

    #[test]
    fn missing_accounts_are_errors() {
        let warnings = Config::default().validate();
        let errors: Vec<_> = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(Config::default().ledger.require_accounts().is_err());
    }

    #[test]
    fn signature_shape_is_checked() {
        let mut c = complete();
        c.ledger.execute_fn = "execute(address,bytes)".into();
        let warnings = c.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("execute_fn")));
    }

    #[test]
    fn malformed_signature_is_an_error() {
        let mut c = complete();
        c.ledger.ready_timestamp_fn = "getReadyTimestamp(bytes32".into();
        let warnings = c.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("ready_timestamp_fn")));
    }
}
