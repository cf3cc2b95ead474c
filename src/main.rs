//! rn-packager CLI
//!
//! ## 사용법
//! ```text
//! rn-packager start [--config <path>] [--project <dir>]   # 필요하면 packager 실행 후 준비될 때까지 대기
//! rn-packager status [--json] [--config <path>]          # /status 1회 확인
//! rn-packager config [--config <path>]                   # 적용된 설정 출력 (TOML)
//! rn-packager help                                       # 도움말
//! ```
//!
//! ## 종료 코드
//! - `0` — 성공 (start: 준비 완료, status: 실행 중)
//! - `1` — 에러 (start: 준비 시간 초과, 잘못된 설정)
//! - `2` — status: 실행 중 아님
//!
//! `start` 실패 시 stderr에 `✗ [<error_code>] <message>` 형식으로 출력

use std::path::PathBuf;

use anyhow::Context;
use rn_packager::config::DEFAULT_CONFIG_PATH;
use rn_packager::{Packager, PackagerConfig, PackagerError};

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    command: String,
    config_path: Option<PathBuf>,
    project: Option<PathBuf>,
    json: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs {
        command: "start".to_string(),
        ..Default::default()
    };
    let mut command_seen = false;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let value = iter.next().context("--config requires a path")?;
                parsed.config_path = Some(PathBuf::from(value));
            }
            "--project" | "-p" => {
                let value = iter.next().context("--project requires a directory")?;
                parsed.project = Some(PathBuf::from(value));
            }
            "--json" => parsed.json = true,
            "--help" | "-h" => {
                parsed.command = "help".to_string();
                command_seen = true;
            }
            other if other.starts_with('-') => anyhow::bail!("Unknown option: {}", other),
            other if !command_seen => {
                parsed.command = other.to_string();
                command_seen = true;
            }
            other => anyhow::bail!("Unexpected argument: {}", other),
        }
    }

    Ok(parsed)
}

fn load_config(args: &CliArgs) -> anyhow::Result<PackagerConfig> {
    let path = args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = PackagerConfig::load(&path)?;
    config.apply_env_overrides()?;
    if let Some(project) = &args.project {
        config.project_path = project.clone();
    }
    config.validate()?;
    Ok(config)
}

/// `start` 실패 시 stderr로 출력되는 한 줄 — 에러 코드 + 메시지
fn failure_line(err: &PackagerError) -> String {
    format!("✗ [{}] {}", err.error_code(), err)
}

fn print_help() {
    println!("rn-packager — ensure the React Native packager is up before debugging");
    println!();
    println!("Usage:");
    println!("  rn-packager start [--config <path>] [--project <dir>]");
    println!("  rn-packager status [--json] [--config <path>]");
    println!("  rn-packager config [--config <path>]");
    println!("  rn-packager help");
    println!();
    println!("Environment:");
    println!("  RN_PACKAGER_ENDPOINT, RN_PACKAGER_RETRY_COUNT, RN_PACKAGER_RETRY_DELAY_MS,");
    println!("  RN_PACKAGER_PROJECT_PATH, RN_PACKAGER_COMMAND, RN_PACKAGER_EXTRA_PARAMS");
    println!("  RUST_LOG (default: info)");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stderr로 로깅 — stdout의 JSON 출력을 오염시키지 않음
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw)?;

    match args.command.as_str() {
        "start" => {
            let config = load_config(&args)?;
            let packager = Packager::new(config)?;
            if let Err(e) = packager.start().await {
                eprintln!("{}", failure_line(&e));
                std::process::exit(1);
            }
            println!("✓ Packager is running at {}", packager.config().endpoint);
        }
        "status" => {
            let config = load_config(&args)?;
            let endpoint = config.endpoint.clone();
            let packager = Packager::new(config)?;
            let running = packager.is_running().await;
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({ "endpoint": endpoint, "running": running })
                );
            } else if running {
                println!("running ({})", endpoint);
            } else {
                println!("not running ({})", endpoint);
            }
            if !running {
                std::process::exit(2);
            }
        }
        "config" => {
            let config = load_config(&args)?;
            print!("{}", config.to_toml()?);
        }
        "help" => print_help(),
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}
