//! prarthana-ingest - spreadsheet content into MongoDB

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prarthana_ingest::{
    config::Args,
    db::{MongoClient, MongoStore},
    server,
    source::{FileRowSource, RowSource, SheetRowSource},
    AppState, Pipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("prarthana_ingest={},info", args.log_level).into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Prarthana Ingest v{}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("MongoDB: {} / {}", args.mongodb_uri, args.mongodb_db);
    info!(
        "References: {}",
        if args.lenient_references { "LENIENT" } else { "STRICT" }
    );
    info!("Mode: {}", if args.run_once { "RUN ONCE" } else { "SERVER" });
    info!("======================================");

    let source: Arc<dyn RowSource> = match (&args.sheet.rows_dir, args.sheet.sheet_config()) {
        (Some(dir), _) => Arc::new(FileRowSource::new(dir.clone())),
        (None, Some(config)) => Arc::new(SheetRowSource::new(config)?),
        (None, None) => anyhow::bail!("no row source configured"),
    };
    info!("Row source: {}", source.describe());

    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => client,
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };
    mongo.ensure_indexes().await?;

    let store = Arc::new(MongoStore::new(mongo));
    let pipeline = Pipeline::new(source, store.clone(), store, args.pipeline_config());

    if args.run_once {
        let report = pipeline.ingest_all().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let state = Arc::new(AppState::new(args, pipeline));
    server::run(state).await?;

    Ok(())
}
