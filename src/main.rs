use cardiosense::api::{create_router, AppState};
use cardiosense::cli::{self, Cli, Commands};
use cardiosense::config::{AppConfig, LoggingConfig};
use cardiosense::ml::ModelLoader;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            init_logging_simple();
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match &cli.command {
        None | Some(Commands::Serve) => {
            init_logging(&config.logging);
            run_server(&config).await?;
        }
        Some(Commands::CheckModel) => {
            init_logging_simple();
            cli::check_model(&config)?;
        }
        Some(Commands::Predict { json }) => {
            init_logging_simple();
            let response = cli::predict_once(&config, json)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    info!("Starting cardiovascular risk prediction API...");

    let model = match ModelLoader::from_config(&config.model) {
        Ok(loader) => loader.load(),
        Err(e) => {
            error!("Error resolving model path: {}", e);
            cardiosense::ml::ModelState::unloaded(e.to_string())
        }
    };
    if !model.is_loaded() {
        warn!("Serving in degraded mode: /api/predict will report 'Model not loaded'");
    }

    let app = create_router(AppState::new(model));

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_logging_simple() {
    // Minimal logging for CLI commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
