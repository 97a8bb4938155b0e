use anyhow::{Context, Result};
use clap::Parser;
use softphone_recorder::{
    create_router, register_native_elements, App, AppState, Capabilities, Config,
    ContactEventSubscriber, ElementRegistry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "softphone-recorder", about = "Per-call dual-channel softphone recorder")]
struct Args {
    /// Config file path (without extension)
    #[arg(short, long, default_value = "config/softphone-recorder")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    let level = cfg.service.log_level.parse::<Level>();
    tracing_subscriber::fmt()
        .with_max_level(level.as_ref().copied().unwrap_or(Level::INFO))
        .init();
    if level.is_err() {
        warn!("Unknown log level '{}', using info", cfg.service.log_level);
    }

    info!("Softphone Recorder v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let elements = Arc::new(ElementRegistry::new());
    let traces = register_native_elements(&cfg, &elements);
    let capabilities = Capabilities::native(&cfg)?;
    let app = App::start(&cfg, capabilities, elements);

    let nats_task = match &cfg.nats.url {
        Some(url) => {
            match ContactEventSubscriber::start(url, &cfg.nats.subject, Arc::clone(&app.adapter)).await {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!("NATS unavailable, accepting events over HTTP only: {:#}", e);
                    None
                }
            }
        }
        None => None,
    };

    let state = AppState::new(
        Arc::clone(&app.adapter),
        app.coordinator.clone(),
        Arc::clone(&app.object_urls),
        traces,
    );
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(task) = nats_task {
        task.abort();
    }
    app.shutdown().await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
