use actix_web::{App, HttpServer, web};
use clap::{Parser, Subcommand};
use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

mod api;
mod config;
mod db;
mod error;
mod ids;
mod logging;
mod matching;
mod models;
mod seed;
mod shutdown;

use crate::api::{
    health::health_config,
    job::{job_config, JobService},
    swipe::{swipe_config, SwipeService},
    validation,
    worker::{worker_config, WorkerService},
};
use crate::config::Config;
use crate::db::{memory::MemoryStore, postgres::PgDocumentStore, RecordBatcher, SharedStore};
use crate::matching::{MatchDetector, SharedDetector};
use crate::seed::{SeedOptions, SeedOrchestrator};
use crate::shutdown::ShutdownCoordinator;

#[derive(Parser)]
#[command(name = "swipe-match", version, about = "Job marketplace backend with swipe matching")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Populate the store with fake users, jobs and swipes
    Seed {
        #[arg(long, default_value_t = 10)]
        num_workers: usize,
        #[arg(long, default_value_t = 5)]
        num_businesses: usize,
        #[arg(long, default_value_t = 20)]
        num_jobs: usize,
        /// Fixed RNG seed for a reproducible population
        #[arg(long)]
        rng_seed: Option<u64>,
        /// Only workers swipe; no business likes, hence no matches
        #[arg(long)]
        no_business_swipes: bool,
    },
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = Config::from_env().map_err(io::Error::other)?;
    logging::init(&config.log_dir)?;

    info!("Configuration loaded successfully:");
    info!("  - Bind address: {}", config.bind_address);
    info!("  - Max payload size: {} bytes", config.max_payload_size);
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Batch operation ceiling: {}", config.batch_max_ops);

    let store = open_store(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, store).await,
        Command::Seed {
            num_workers,
            num_businesses,
            num_jobs,
            rng_seed,
            no_business_swipes,
        } => {
            let options = SeedOptions {
                num_workers,
                num_businesses,
                num_jobs,
                rng_seed,
                business_swipes: !no_business_swipes,
                batch_max_ops: config.batch_max_ops,
            };
            let report = SeedOrchestrator::new(options).run(store.as_ref()).await;
            store.close().await;

            let summary = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
            println!("{}", summary);
            if report.batches.is_clean() {
                Ok(())
            } else {
                Err(io::Error::other(format!(
                    "{} of {} chunks failed to commit",
                    report.batches.chunks_failed, report.batches.chunks_attempted
                )))
            }
        }
    }
}

/// Postgres when DATABASE_URL is set, otherwise an in-process store
async fn open_store(config: &Config) -> io::Result<SharedStore> {
    let Some(database_url) = &config.database_url else {
        warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = db::connection::get_connection(database_url, config.max_db_connections)
        .await
        .map_err(io::Error::other)?;
    info!("Database connection pool established");

    // Run migrations on startup
    db::migrations::run_migrations(&pool)
        .await
        .map_err(io::Error::other)?;

    Ok(Arc::new(PgDocumentStore::new(pool)))
}

/// Rebuild match state and persist any match found missing
async fn restore_matches(store: &SharedStore, batch_max_ops: usize) -> io::Result<MatchDetector> {
    let mut detector = MatchDetector::hydrate(store.as_ref())
        .await
        .map_err(io::Error::other)?;

    let missing = detector.reconcile();
    if !missing.is_empty() {
        let mut batcher = RecordBatcher::with_limit(store.as_ref(), batch_max_ops);
        for m in &missing {
            batcher.push_group(m.write_ops()).await;
        }
        let report = batcher.finalize().await;
        if report.is_clean() {
            info!("Persisted {} reconciled matches", missing.len());
        } else {
            error!(
                "Reconciled matches only partly persisted: {} of {} chunks failed",
                report.chunks_failed, report.chunks_attempted
            );
        }
    }
    Ok(detector)
}

async fn serve(config: Config, store: SharedStore) -> io::Result<()> {
    info!("Starting swipe-match server");

    let detector: SharedDetector = Arc::new(Mutex::new(restore_matches(&store, config.batch_max_ops).await?));

    let store_data = web::Data::new(store.clone());
    let worker_service = web::Data::new(WorkerService::new(store.clone(), detector.clone()));
    let job_service = web::Data::new(JobService::new(store.clone(), detector.clone()));
    let swipe_service = web::Data::new(SwipeService::new(store.clone(), detector));
    let max_payload_size = config.max_payload_size;

    let server = HttpServer::new(move || {
        // Configure payload size limits globally
        let payload_config = web::PayloadConfig::default().limit(max_payload_size);

        App::new()
            .app_data(store_data.clone())
            .app_data(worker_service.clone())
            .app_data(job_service.clone())
            .app_data(swipe_service.clone())
            .app_data(payload_config)
            .app_data(web::JsonConfig::default().limit(max_payload_size))
            .app_data(validation::json_config().limit(max_payload_size))
            .configure(health_config)
            .configure(worker_config)
            .configure(job_config)
            .configure(swipe_config)
    });

    info!("Server starting on http://{}", config.bind_address);

    let server = server.bind(config.bind_address.as_str())?.run();

    // Get server handle for graceful shutdown
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    ShutdownCoordinator::new(server_handle, server_task, store)
        .wait_for_shutdown()
        .await
}
