//! zone-metrics-agent - version 0.1.0
//!
//! Per-zone metrics agent with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cache;
mod cli;
mod commands;
mod config;
mod handlers;
mod startup_checks;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info};

use cache::MetricsCache;
use cli::{Args, Commands};
use commands::{command_catalog, command_check, command_config, command_test};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR,
    DEFAULT_CACHE_TTL, DEFAULT_PORT,
};
use handlers::{health_handler, metrics_handler, refresh_handler};
use state::{build_engine, AgentStats, AppState};

/// Initializes tracing logging subsystem with the effective log level.
///
/// Precedence: `--log-level` > config file `log_level` > info.
fn setup_logging(config: &Config) {
    let log_level = config.log_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level.filter())
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {}", log_level.as_str());
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    if let Some(command) = &args.command {
        if let Commands::Catalog { verbose, group } = command {
            return command_catalog(*verbose, group.clone());
        }
        if let Commands::Config { output, format } = command {
            return command_config(output.clone(), format.clone());
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config);

        return match command {
            Commands::Check => command_check(&config),
            Commands::Test { verbose, format } => command_test(*verbose, format.clone(), &config),
            Commands::Catalog { .. } => unreachable!("Catalog handled above"),
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config);

    info!("Starting zone-metrics-agent");

    if let Err(e) = startup_checks::validate_requirements(&config) {
        error!("❌ Startup validation failed: {}", e);
        error!("   The agent will start but may not function correctly!");
    }

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR).to_string();
    let port = config.port.unwrap_or(DEFAULT_PORT);

    // Configure parallel collection
    if let Some(threads) = config.parallelism {
        if threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .unwrap_or_else(|e| error!("Failed to set rayon thread pool: {}", e));
            debug!("Rayon thread pool configured with {} threads", threads);
        }
    }

    let cache_ttl = Duration::from_secs(config.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL));
    let engine = Arc::new(build_engine(&config));

    let state = Arc::new(AppState {
        engine: engine.clone(),
        cache: MetricsCache::new(cache_ttl),
        config: Arc::new(config),
        stats: AgentStats::default(),
        start_time: Instant::now(),
    });

    // Initial zone discovery
    info!("Performing initial zone discovery");
    match tokio::task::spawn_blocking(move || engine.refresh()).await? {
        Ok(count) => info!("Initial zone discovery found {} zones", count),
        Err(e) => {
            AgentStats::inc(&state.stats.enumeration_failures);
            error!("Initial zone discovery failed: {}", e);
        }
    }

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let app = Router::new()
        .route("/v1/{zone}/metrics", get(metrics_handler))
        .route("/v1/refresh", post(refresh_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!("zone-metrics-agent listening on http://{}:{}", bind_ip_str, port);

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("zone-metrics-agent stopped gracefully");
    Ok(())
}
