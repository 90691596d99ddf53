//! pipdock - detach web videos into a popup window and drive them into
//! Picture-in-Picture.
//!
//! Main entry point: wires the browser host, the popup window controller, the
//! message router, and the HTTP API.

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pipdock_api::{ApiServer, AppState};
use pipdock_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use pipdock_controller::router::DEFAULT_QUEUE_CAPACITY;
use pipdock_controller::{
    ControllerSettings, HostServices, InMemoryHistory, PopupWindowController, Router, bridge,
};
use pipdock_host_cdp::{CdpHost, CdpHostConfig};
use pipdock_protocols::HistoryStore;

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and file output.
///
/// `RUST_LOG` wins over `logging.level`. Log files rotate daily.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = logging.resolved_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("pipdock")
        .filename_suffix("log")
        .max_log_files(logging.max_files)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // the writer flushes until the guard drops
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = ConfigLoader::load_or_default(&cli.config)?;

    let overrides = match cli.command {
        Some(Commands::CheckConfig) => return check_config(&cli.config, &config),
        Some(Commands::Run(args)) => args.or(cli.run),
        None => cli.run,
    };
    overrides.apply(&mut config);
    init_tracing(&config.logging)?;
    run(config).await
}

fn check_config(path: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }
    if result.is_valid() {
        println!("{}: ok", path.display());
        Ok(())
    } else {
        Err(format!("{}: {} error(s)", path.display(), result.errors.len()).into())
    }
}

/// Run the controller until Ctrl-C.
async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting pipdock v{}", env!("CARGO_PKG_VERSION"));

    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if !validation.is_valid() {
        for e in &validation.errors {
            error!("Config {}: {}", e.path, e.message);
        }
        return Err("invalid configuration".into());
    }

    let (bridge_client, bridge_server) = bridge::channel(config.bridge.ready_timeout());

    let host = CdpHost::connect(&CdpHostConfig::from_config(&config.browser), bridge_client).await?;
    let mut removed_windows = host.watch_removed_windows().await?;

    let hosts = HostServices {
        windowing: host.clone(),
        tabs: host.clone(),
        injection: host.clone(),
    };
    let controller = Arc::new(PopupWindowController::new(
        hosts,
        ControllerSettings::from_config(&config),
    ));
    let history: Arc<dyn HistoryStore> = Arc::new(InMemoryHistory::new());

    let (router, router_task) =
        Router::new(controller.clone(), history.clone()).spawn(DEFAULT_QUEUE_CAPACITY);
    tokio::spawn(bridge_server.serve(router.clone()));

    let removal_controller = controller.clone();
    tokio::spawn(async move {
        while let Some(window) = removed_windows.recv().await {
            removal_controller.on_window_removed(window).await;
        }
    });

    let state = Arc::new(AppState::new(router, controller.clone(), history));
    let server = ApiServer::new(config.server.bind_addr(), state);

    info!("pipdock ready:");
    info!("  API Server:  http://{}", server.addr());
    info!("  Browser:     {}", config.browser.endpoint);
    info!("");
    info!("API Endpoints:");
    info!("  POST /messages  - controller requests");
    info!("  GET  /history   - viewing history");
    info!("  GET  /health    - session state");

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("Shutting down...");
    controller.close().await;
    router_task.abort();
    Ok(())
}
