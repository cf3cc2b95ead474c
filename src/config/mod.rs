//! Packager configuration — config/packager.toml + RN_PACKAGER_* 환경변수
//!
//! Every field has a named default, so an empty or missing file yields a
//! working configuration pointed at `localhost:8081`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

pub const DEFAULT_ENDPOINT: &str = "localhost:8081";
pub const DEFAULT_RETRY_COUNT: u32 = 30;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_CONFIG_PATH: &str = "config/packager.toml";
pub const STARTUP_FAILURE_MESSAGE: &str = "Could not start the packager.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("{key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Platform-resolved launch details: which executable starts the packager
/// and which extra arguments follow `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSettings {
    #[serde(default = "default_command_name")]
    pub command_name: String,

    #[serde(default)]
    pub extra_parameters: Vec<String>,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            command_name: default_command_name(),
            extra_parameters: Vec::new(),
        }
    }
}

/// 디버거 재진입 방지용 환경변수 (REACT_DEBUGGER를 no-op echo로 교체)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebuggerEnv {
    #[serde(default = "default_debugger_env_name")]
    pub name: String,

    #[serde(default = "default_debugger_env_value")]
    pub value: String,
}

impl Default for DebuggerEnv {
    fn default() -> Self {
        Self {
            name: default_debugger_env_name(),
            value: default_debugger_env_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagerConfig {
    /// host:port of the packager status service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Working directory for the launched packager (the app's project root)
    #[serde(default = "default_project_path")]
    pub project_path: PathBuf,

    #[serde(default)]
    pub platform: PlatformSettings,

    #[serde(default)]
    pub debugger_env: DebuggerEnv,
}

fn default_endpoint() -> String { DEFAULT_ENDPOINT.to_string() }
fn default_retry_count() -> u32 { DEFAULT_RETRY_COUNT }
fn default_retry_delay_ms() -> u64 { DEFAULT_RETRY_DELAY_MS }
fn default_project_path() -> PathBuf { PathBuf::from(".") }
fn default_debugger_env_name() -> String { "REACT_DEBUGGER".to_string() }
fn default_debugger_env_value() -> String { "echo A debugger is not needed: ".to_string() }

fn default_command_name() -> String {
    if cfg!(target_os = "windows") {
        "react-native.cmd".to_string()
    } else {
        "react-native".to_string()
    }
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            project_path: default_project_path(),
            platform: PlatformSettings::default(),
            debugger_env: DebuggerEnv::default(),
        }
    }
}

impl PackagerConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[Config] {} not found, using defaults", shown);
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path: shown, source }),
        };

        let cfg: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: shown.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!("[Config] Loaded {}", shown);
        Ok(cfg)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    /// Layer RN_PACKAGER_* variables from the process environment on top.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// injectable lookup, so tests don't touch the real environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("RN_PACKAGER_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(raw) = lookup("RN_PACKAGER_RETRY_COUNT") {
            self.retry_count = parse_number("RN_PACKAGER_RETRY_COUNT", &raw)?;
        }
        if let Some(raw) = lookup("RN_PACKAGER_RETRY_DELAY_MS") {
            self.retry_delay_ms = parse_number("RN_PACKAGER_RETRY_DELAY_MS", &raw)?;
        }
        if let Some(path) = lookup("RN_PACKAGER_PROJECT_PATH") {
            self.project_path = PathBuf::from(path);
        }
        if let Some(command) = lookup("RN_PACKAGER_COMMAND") {
            self.platform.command_name = command;
        }
        if let Some(params) = lookup("RN_PACKAGER_EXTRA_PARAMS") {
            self.platform.extra_parameters = params.split_whitespace().map(String::from).collect();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(invalid("endpoint", "must not be empty"));
        }
        if self.endpoint.contains("://") || self.endpoint.contains('/') {
            return Err(invalid("endpoint", "expected host:port without scheme or path"));
        }
        if self.retry_count == 0 {
            return Err(invalid("retry_count", "must be at least 1"));
        }
        if self.platform.command_name.trim().is_empty() {
            return Err(invalid("platform.command_name", "must not be empty"));
        }
        Ok(())
    }

    pub fn status_url(&self) -> String {
        format!("http://{}/status", self.endpoint)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_count, self.retry_delay(), STARTUP_FAILURE_MESSAGE)
    }

    /// Environment variables layered over the parent environment at launch.
    pub fn launch_env_overrides(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(self.debugger_env.name.clone(), self.debugger_env.value.clone());
        env
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            message: e.to_string(),
        })
    }
}

fn parse_number<N: std::str::FromStr>(key: &str, raw: &str) -> Result<N, ConfigError>
where
    N::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: N::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{:?} is not a valid number ({})", raw, e),
    })
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = PackagerConfig::default();
        assert_eq!(cfg.endpoint, "localhost:8081");
        assert_eq!(cfg.retry_count, 30);
        assert_eq!(cfg.retry_delay(), Duration::from_millis(2000));
        assert_eq!(cfg.status_url(), "http://localhost:8081/status");
        assert!(cfg.platform.extra_parameters.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let cfg = PackagerConfig {
            retry_count: 5,
            retry_delay_ms: 10,
            ..Default::default()
        };
        let policy = cfg.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_millis(10));
        assert_eq!(policy.failure_message, "Could not start the packager.");
    }

    #[test]
    fn test_launch_env_overrides() {
        let env = PackagerConfig::default().launch_env_overrides();
        assert_eq!(env.len(), 1);
        assert_eq!(
            env.get("REACT_DEBUGGER").map(String::as_str),
            Some("echo A debugger is not needed: ")
        );
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PackagerConfig::load(dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, PackagerConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packager.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
endpoint = "127.0.0.1:9090"
retry_count = 4

[platform]
extra_parameters = ["--port", "9090"]
"#
        )
        .unwrap();

        let cfg = PackagerConfig::load(&path).unwrap();
        assert_eq!(cfg.endpoint, "127.0.0.1:9090");
        assert_eq!(cfg.retry_count, 4);
        assert_eq!(cfg.retry_delay_ms, 2000);
        assert_eq!(cfg.platform.extra_parameters, vec!["--port", "9090"]);
        assert_eq!(cfg.platform.command_name, default_command_name());
        assert_eq!(cfg.debugger_env, DebuggerEnv::default());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packager.toml");
        std::fs::write(&path, "retry_count = \"many\"").unwrap();

        let err = PackagerConfig::load(&path).unwrap_err();
        match err {
            ConfigError::Parse { path: shown, .. } => assert!(shown.ends_with("packager.toml")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_path_is_read_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        // 디렉터리는 NotFound가 아닌 읽기 오류
        let err = PackagerConfig::load(dir.path()).unwrap_err();
        match err {
            ConfigError::Read { path, .. } => {
                assert_eq!(path, dir.path().display().to_string());
            }
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RN_PACKAGER_ENDPOINT", "10.0.2.2:8088"),
            ("RN_PACKAGER_RETRY_COUNT", "7"),
            ("RN_PACKAGER_RETRY_DELAY_MS", "250"),
            ("RN_PACKAGER_COMMAND", "npx"),
            ("RN_PACKAGER_EXTRA_PARAMS", "--reset-cache  --port 8088"),
        ]
        .into_iter()
        .collect();

        let mut cfg = PackagerConfig::default();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.endpoint, "10.0.2.2:8088");
        assert_eq!(cfg.retry_count, 7);
        assert_eq!(cfg.retry_delay_ms, 250);
        assert_eq!(cfg.platform.command_name, "npx");
        assert_eq!(
            cfg.platform.extra_parameters,
            vec!["--reset-cache", "--port", "8088"]
        );
        assert_eq!(cfg.project_path, PathBuf::from("."));
    }

    #[test]
    fn test_bad_numeric_override() {
        let mut cfg = PackagerConfig::default();
        let err = cfg
            .apply_overrides(|k| (k == "RN_PACKAGER_RETRY_COUNT").then(|| "thirty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("RN_PACKAGER_RETRY_COUNT"));
        assert_eq!(cfg.retry_count, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero = PackagerConfig { retry_count: 0, ..Default::default() };
        assert!(zero.validate().is_err());

        let with_scheme = PackagerConfig {
            endpoint: "http://localhost:8081".to_string(),
            ..Default::default()
        };
        assert!(with_scheme.validate().is_err());

        let mut no_command = PackagerConfig::default();
        no_command.platform.command_name = "  ".to_string();
        assert!(no_command.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let cfg = PackagerConfig::default();
        let text = cfg.to_toml().unwrap();
        assert!(text.contains("endpoint = 'localhost:8081'"));
        let back: PackagerConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.endpoint, "localhost:8081");
        assert_eq!(back, cfg);
    }
}
