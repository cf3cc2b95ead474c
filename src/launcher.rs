//! Packager process launch.
//!
//! Builds the `<command> start <extra params...>` invocation and spawns it
//! detached. Nothing here waits for the child: the packager keeps running
//! for the whole debug session, and its output and exit status are not ours
//! to observe.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::config::PackagerConfig;
use crate::utils::apply_detach_flags;

/// First argument of every packager launch.
pub const START_ARG: &str = "start";

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("invalid launch command: {0}")]
    InvalidCommand(String),

    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything needed to spawn the packager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub working_directory: PathBuf,
    pub command_name: String,
    pub arguments: Vec<String>,
    /// Merged over the parent environment, not a replacement for it.
    pub environment_overrides: BTreeMap<String, String>,
}

impl LaunchConfig {
    pub fn for_packager(config: &PackagerConfig) -> Self {
        let mut arguments = vec![START_ARG.to_string()];
        arguments.extend(config.platform.extra_parameters.iter().cloned());

        Self {
            working_directory: config.project_path.clone(),
            command_name: config.platform.command_name.clone(),
            arguments,
            environment_overrides: config.launch_env_overrides(),
        }
    }

    /// `command arg1 arg2 ...`, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command_name.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a launch attempt. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched,
    LaunchFailed(String),
}

impl From<Result<(), LaunchError>> for LaunchOutcome {
    fn from(result: Result<(), LaunchError>) -> Self {
        match result {
            Ok(()) => Self::Launched,
            Err(e) => Self::LaunchFailed(e.to_string()),
        }
    }
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Start the process and return without waiting for it.
    async fn spawn_detached(&self, config: &LaunchConfig) -> Result<(), LaunchError>;
}

/// Spawns with `tokio::process`, stdio to null, in its own process group.
#[derive(Debug, Default, Clone)]
pub struct DetachedLauncher;

impl DetachedLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessLauncher for DetachedLauncher {
    async fn spawn_detached(&self, config: &LaunchConfig) -> Result<(), LaunchError> {
        if config.command_name.trim().is_empty() {
            return Err(LaunchError::InvalidCommand("empty command name".to_string()));
        }

        let mut cmd = Command::new(&config.command_name);
        cmd.args(&config.arguments)
            .current_dir(&config.working_directory)
            .envs(&config.environment_overrides)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        apply_detach_flags(&mut cmd);

        // 핸들은 보관하지 않음 — tokio가 종료된 자식 프로세스를 백그라운드에서 회수
        let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            command: config.command_name.clone(),
            source,
        })?;

        tracing::info!(
            "[Launcher] Spawned `{}` in {} (pid {:?})",
            config.command_line(),
            config.working_directory.display(),
            child.id()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformSettings;

    fn config_with_params(params: &[&str]) -> PackagerConfig {
        PackagerConfig {
            project_path: PathBuf::from("/work/app"),
            platform: PlatformSettings {
                command_name: "react-native".to_string(),
                extra_parameters: params.iter().map(|s| s.to_string()).collect(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_start_comes_first() {
        let launch = LaunchConfig::for_packager(&config_with_params(&["--port", "8088"]));
        assert_eq!(launch.arguments, vec!["start", "--port", "8088"]);
        assert_eq!(launch.command_name, "react-native");
        assert_eq!(launch.working_directory, PathBuf::from("/work/app"));
        assert_eq!(launch.command_line(), "react-native start --port 8088");
    }

    #[test]
    fn test_no_extra_params() {
        let launch = LaunchConfig::for_packager(&config_with_params(&[]));
        assert_eq!(launch.arguments, vec!["start"]);
    }

    #[test]
    fn test_debugger_is_suppressed() {
        let launch = LaunchConfig::for_packager(&config_with_params(&[]));
        assert_eq!(
            launch.environment_overrides.get("REACT_DEBUGGER").map(String::as_str),
            Some("echo A debugger is not needed: ")
        );
    }

    #[test]
    fn test_outcome_from_result() {
        assert_eq!(LaunchOutcome::from(Ok::<(), LaunchError>(())), LaunchOutcome::Launched);
        let failed = LaunchOutcome::from(Err::<(), _>(LaunchError::InvalidCommand("x".into())));
        assert!(matches!(failed, LaunchOutcome::LaunchFailed(ref r) if r.contains("x")));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let mut launch = LaunchConfig::for_packager(&config_with_params(&[]));
        launch.command_name = "rn-packager-definitely-not-installed".to_string();
        launch.working_directory = std::env::temp_dir();

        let err = DetachedLauncher::new().spawn_detached(&launch).await.unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let mut launch = LaunchConfig::for_packager(&config_with_params(&[]));
        launch.command_name = String::new();
        let err = DetachedLauncher::new().spawn_detached(&launch).await.unwrap_err();
        assert!(matches!(err, LaunchError::InvalidCommand(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_does_not_wait_for_exit() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("env.txt");
        let launch = LaunchConfig {
            working_directory: dir.path().to_path_buf(),
            command_name: "sh".to_string(),
            arguments: vec![
                "-c".to_string(),
                format!("sleep 1; printf %s \"$REACT_DEBUGGER\" > {}", marker.display()),
            ],
            environment_overrides: PackagerConfig::default().launch_env_overrides(),
        };

        let started = std::time::Instant::now();
        DetachedLauncher::new().spawn_detached(&launch).await.unwrap();
        assert!(started.elapsed() < std::time::Duration::from_millis(900));

        let mut written = String::new();
        for _ in 0..80 {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            if let Ok(s) = std::fs::read_to_string(&marker) {
                if !s.is_empty() {
                    written = s;
                    break;
                }
            }
        }
        assert_eq!(written, "echo A debugger is not needed: ");
    }
}
