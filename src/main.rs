use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use agencyd::ai::ReasoningClient;
use agencyd::config::AgencyConfig;
use agencyd::store::{RestStore, StoreBackend};
use agencyd::{doctor, rest, AppContext};

#[derive(Parser)]
#[command(
    name = "agencyd",
    about = "Agency management API — clients, projects, tasks, AI drafting",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP API port
    #[arg(long, env = "AGENCYD_PORT")]
    port: Option<u16>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "AGENCYD_BIND")]
    bind_address: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "AGENCYD_LOG")]
    log: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "AGENCYD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,

    /// Path to config.toml (default: ./config.toml)
    #[arg(long, env = "AGENCYD_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the API server (default when no subcommand given).
    ///
    /// Examples:
    ///   agencyd serve
    ///   agencyd
    Serve,
    /// Run connectivity checks against the store and the reasoning service.
    ///
    /// Exit code 0 if all checks pass, 1 if any check fails.
    ///
    /// Examples:
    ///   agencyd doctor
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first — clap env-backed args and the config loader both read the
    // process environment.
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // ── Logging setup ────────────────────────────────────────────────────────
    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info").to_owned();
    let log_format =
        std::env::var("AGENCYD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let _file_guard = setup_logging(&log_level, args.log_file.as_deref(), &log_format);

    match args.command {
        Some(Command::Doctor) => {
            let config = AgencyConfig::new(
                args.port,
                args.bind_address,
                Some("error".to_string()),
                args.config,
            );
            let results = doctor::run_doctor(&config).await;
            doctor::print_doctor_results(&results);
            let failed = results.iter().filter(|r| !r.passed).count();
            std::process::exit(if failed == 0 { 0 } else { 1 });
        }
        None | Some(Command::Serve) => {
            run_server(args.port, args.bind_address, args.log, args.config).await?;
        }
    }

    Ok(())
}

async fn run_server(
    port: Option<u16>,
    bind_address: Option<String>,
    log: Option<String>,
    config_path: Option<std::path::PathBuf>,
) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "agencyd starting");

    let config = Arc::new(AgencyConfig::new(port, bind_address, log, config_path));
    info!(
        port = config.port,
        bind = %config.bind_address,
        model = %config.model,
        "config loaded"
    );

    let store_url = config
        .store_url
        .clone()
        .context("SUPABASE_URL is not set (env, .env, or store_url in config.toml)")?;
    let store_key = config
        .store_key
        .clone()
        .context("SUPABASE_KEY is not set (env, .env, or store_key in config.toml)")?;
    let openai_api_key = config
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY is not set (env, .env, or openai_api_key in config.toml)")?;

    let store: Arc<dyn StoreBackend> = Arc::new(RestStore::new(
        &store_url,
        &store_key,
        config.http_timeout_secs,
    )?);
    let reasoning = Arc::new(ReasoningClient::new(
        &config.openai_base_url,
        &openai_api_key,
        &config.model,
        config.http_timeout_secs,
    )?);

    let ctx = Arc::new(AppContext {
        config: config.clone(),
        store,
        reasoning,
        started_at: std::time::Instant::now(),
    });

    rest::serve(ctx).await
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("agencyd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
