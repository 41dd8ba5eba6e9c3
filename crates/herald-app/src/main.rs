mod app;
mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use herald_config::schema::HeraldConfig;
use herald_config::PreferenceStore;
use herald_notify::{DesktopHost, NotificationPipeline, PipelineSettings};
use herald_realtime::WebSocketTransport;
use tracing_subscriber::EnvFilter;

use crate::app::App;

/// Runs before the subscriber exists, so failures go to stderr.
fn load_config(args: &cli::Args) -> HeraldConfig {
    let loaded = match &args.config {
        Some(path) => herald_config::load_config_from(path),
        None => herald_config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("herald: config load failed, using defaults: {e}");
        HeraldConfig::default()
    })
}

/// `RUST_LOG` wins, then `--log-level`, then `[logging] level`.
fn init_logging(args: &cli::Args, config: &HeraldConfig) {
    let directive = match &args.log_level {
        Some(level) => format!("herald={level}"),
        None => config.logging.directive("herald"),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("herald=info"))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_pipeline(config: &HeraldConfig, args: &cli::Args) -> NotificationPipeline {
    let host = Arc::new(match &args.asset_dir {
        Some(dir) => DesktopHost::with_asset_root(dir),
        None => DesktopHost::new(),
    });
    let pipeline = NotificationPipeline::new(
        host.clone(),
        host.clone(),
        host,
        PipelineSettings::from_config(&config.notifications),
    );
    match PreferenceStore::at_default_location() {
        Ok(store) => pipeline.with_preferences(store),
        Err(e) => {
            tracing::warn!("Notification preference unavailable, defaulting to on: {e}");
            pipeline
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    let mut config = load_config(&args);
    init_logging(&args, &config);
    app::apply_overrides(&mut config, &args);

    tracing::info!("Herald v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    tracing::info!(url = %config.connection.url, "Broker endpoint");

    let transport = Arc::new(WebSocketTransport::new(config.connection.url.clone()));
    let pipeline = build_pipeline(&config, &args);
    let app = App::new(transport, &config, pipeline);
    tracing::info!(
        client_id = %app.identity().client_id,
        visitor = app.identity().is_visitor(),
        notifications = app.notifications().pipeline().is_enabled(),
        "Identity chosen"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    match app.run(shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Herald stopped: {e}");
            ExitCode::FAILURE
        }
    }
}
