//! Storeship command-line interface
//!
//! `storeship <command> [config-path]` runs one publish flow end to end.
//! The config path falls back to `STORESHIP_CONFIG`. Exit code 1 is
//! reserved for configuration and credential failures; step-level failures
//! are reported in the run summary and exit 0.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use storeship_core::{
    summarize, AnsiFormatter, ApiClient, LineFormatter, PlainFormatter, PublishContext,
};
use storeship_domain::constants::{ANDROID_PUBLISHER_BASE_URL, APP_STORE_CONNECT_BASE_URL};
use storeship_domain::{PublishConfig, Result};
use storeship_infra::appstore::{app_store_flow, shared_secret_flow};
use storeship_infra::play::play_flow;
use storeship_infra::{
    load_config, load_config_from_env, ConnectTokenProvider, HttpExecutor,
    ServiceAccountTokenProvider,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
storeship - store publishing automation

USAGE:
    storeship <COMMAND> [CONFIG_PATH]

COMMANDS:
    app-store      Publish the configured version to App Store Connect
    play           Publish the configured release to Google Play
    shared-secret  Regenerate the app-specific shared secret

CONFIG_PATH defaults to the file named by STORESHIP_CONFIG.
Set RUST_LOG to adjust log verbosity (default: info).";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let config_path = args.next().map(PathBuf::from);

    match command.as_str() {
        "app-store" => run_reported(config_path, run_app_store).await,
        "play" => run_reported(config_path, run_play).await,
        "shared-secret" => match load(config_path.as_deref()) {
            Ok(config) => match run_shared_secret(&config).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    error!(%err, "shared secret regeneration failed");
                    ExitCode::FAILURE
                }
            },
            Err(err) => {
                error!(%err, "startup failed");
                ExitCode::FAILURE
            }
        },
        "help" | "--help" | "-h" => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("unknown command `{other}`\n\n{USAGE}");
            ExitCode::FAILURE
        }
    }
}

/// Load config, run the flow, print the summary. Only startup failures
/// (config, credentials) map to a failing exit code.
async fn run_reported<F, Fut>(config_path: Option<PathBuf>, flow: F) -> ExitCode
where
    F: FnOnce(PublishConfig) -> Fut,
    Fut: std::future::Future<Output = Result<storeship_core::RunReport>>,
{
    let config = match load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    match flow(config).await {
        Ok(report) => {
            println!("{}", summarize(&report, formatter().as_ref()));
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "startup failed");
            ExitCode::FAILURE
        }
    }
}

fn load(path: Option<&Path>) -> Result<PublishConfig> {
    match path {
        Some(path) => load_config(path),
        None => load_config_from_env(),
    }
}

fn formatter() -> Box<dyn LineFormatter> {
    if std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
        Box::new(AnsiFormatter)
    } else {
        Box::new(PlainFormatter)
    }
}

fn connect_client(config: &PublishConfig) -> Result<(ApiClient, String)> {
    let app_store = config.require_app_store()?;
    let tokens = ConnectTokenProvider::from_key_file(
        &app_store.key_path,
        &app_store.key_id,
        &app_store.issuer_id,
    )?;
    let executor = HttpExecutor::new(APP_STORE_CONNECT_BASE_URL)?;
    Ok((ApiClient::new(Arc::new(executor), Arc::new(tokens)), app_store.bundle_id.clone()))
}

async fn run_app_store(config: PublishConfig) -> Result<storeship_core::RunReport> {
    let app_store = config.require_app_store()?;
    let (api, _) = connect_client(&config)?;
    Ok(app_store_flow(&api, app_store).run(PublishContext::new()).await)
}

async fn run_play(config: PublishConfig) -> Result<storeship_core::RunReport> {
    let play = config.require_play()?;
    let tokens = ServiceAccountTokenProvider::from_key_file(&play.service_account_key_path)?;
    let executor = HttpExecutor::new(format!(
        "{ANDROID_PUBLISHER_BASE_URL}/applications/{}",
        play.package_name
    ))?;
    let api = ApiClient::new(Arc::new(executor), Arc::new(tokens));
    Ok(play_flow(&api, play).run(PublishContext::new()).await)
}

async fn run_shared_secret(config: &PublishConfig) -> Result<()> {
    let (api, bundle_id) = connect_client(config)?;
    let out_dir = std::env::current_dir()
        .map_err(|e| storeship_domain::PublishError::Io(format!("current dir: {e}")))?;

    let secret = shared_secret_flow(&api, &bundle_id, &out_dir).await?;
    println!("shared secret regenerated: {}", secret.artifact_path.display());
    Ok(())
}
