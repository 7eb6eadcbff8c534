use std::sync::Arc;

use clap::Parser;
use redline_core::{ModerationEngine, RedlineConfig};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use redline_server::server;
use redline_server::subsystems::ingest;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "redline.toml")]
    config: String,

    /// Load config and seed catalog, report, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match RedlineConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging: RUST_LOG wins, then the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let engine = Arc::new(ModerationEngine::from_config(&config));

    if let Some(seed_path) = &config.ingest.seed_path {
        match ingest::import_catalog_file(seed_path, &engine) {
            Ok(report) => tracing::info!(
                "Seeded {} records from {} ({} rejected)",
                report.inserted,
                seed_path,
                report.rejected.len()
            ),
            Err(e) => {
                eprintln!("Failed to import seed catalog {}: {}", seed_path, e);
                std::process::exit(1);
            }
        }
    }

    if args.check {
        println!("✅ Config loaded from {}", args.config);
        println!("✅ Flag threshold: {}", engine.classifier().flag_threshold());
        println!("✅ Records loaded: {}", engine.store().len());
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    if config.http.enabled {
        let http_engine = Arc::clone(&engine);
        let http_config = config.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) =
                redline_server::http::start_http_server(http_engine, http_config, http_shutdown).await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = config.service.socket_path.clone();
    server::run_unix_server(&socket_path, engine, config, tx.subscribe()).await?;

    Ok(())
}
