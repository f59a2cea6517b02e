// crates/bizclass-server/src/main.rs
// bizclass - multi-strategy business industry classifier

use anyhow::{Result, bail};
use bizclass::cache::{HttpContentSource, SharedCache, SqliteSharedCache};
use bizclass::config::{ClassifierConfig, EnvConfig};
use bizclass::db::{DatabasePool, seed::is_seeded, seed_default_taxonomy};
use bizclass::http::create_shared_client;
use bizclass::ml::{HttpMlClient, ModelVariant};
use bizclass::service::{ClassificationService, ServiceDeps};
use bizclass::store::SqliteTaxonomyStore;
use bizclass::web;
use bizclass_types::ClassificationRequest;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// How often expired shared-cache rows are purged while serving
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Parser)]
#[command(name = "bizclass")]
#[command(about = "Classify businesses into industries with MCC/SIC/NAICS codes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Port to listen on (overrides BIZCLASS_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Classify one business and print the result as JSON
    Classify {
        /// Business name
        #[arg(short, long)]
        name: String,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,

        /// Website URL to fetch
        #[arg(short, long)]
        website: Option<String>,

        /// Use the low-latency ML model
        #[arg(long)]
        fast: bool,
    },

    /// Load the built-in taxonomy into the database
    Seed {
        /// Database path (overrides BIZCLASS_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Open the database and seed it on first use
async fn open_database(path: &Path) -> Result<Arc<DatabasePool>> {
    let pool = Arc::new(DatabasePool::open(path).await?);
    let seeded = pool
        .interact(|conn| {
            if is_seeded(conn)? {
                return Ok(false);
            }
            seed_default_taxonomy(conn)?;
            Ok(true)
        })
        .await?;
    if seeded {
        info!(db = %path.display(), "Seeded built-in taxonomy");
    }
    Ok(pool)
}

/// The service plus the handles the server keeps for maintenance and stats
struct Services {
    service: Arc<ClassificationService>,
    shared: Arc<SqliteSharedCache>,
    pool: Arc<DatabasePool>,
}

async fn build_service(env: &EnvConfig) -> Result<Services> {
    let validation = env.validate();
    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    if !validation.is_valid() {
        bail!("{}", validation.report());
    }

    let config = ClassifierConfig::load(env.config_path.as_deref());
    let pool = open_database(&env.db_path).await?;
    let http = create_shared_client();

    let store = Arc::new(SqliteTaxonomyStore::new(pool.clone(), config.cache.index_ttl()));
    let shared = Arc::new(SqliteSharedCache::new(pool.clone()));
    let mut deps = ServiceDeps::new(store)
        .with_shared_cache(shared.clone() as Arc<dyn SharedCache>)
        .with_content_source(Arc::new(HttpContentSource::new(http.clone())));

    if env.has_ml_service()
        && let Some(url) = &env.ml_url
    {
        info!(url = %url, "ML service enabled");
        deps = deps.with_ml(Arc::new(HttpMlClient::new(http, url.clone())));
    } else {
        info!("ML service disabled, multi-strategy only");
    }

    Ok(Services {
        service: ClassificationService::new(config, deps),
        shared,
        pool,
    })
}

async fn run_server(env: EnvConfig, port: Option<u16>) -> Result<()> {
    let Services {
        service,
        shared,
        pool,
    } = build_service(&env).await?;
    let port = port.unwrap_or(env.port);

    let purge_stop = CancellationToken::new();
    let purge_token = purge_stop.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = purge_token.cancelled() => break,
                _ = interval.tick() => match shared.purge_expired().await {
                    Ok(0) => {}
                    Ok(n) => info!(rows = n, "Purged expired shared cache entries"),
                    Err(e) => warn!(error = %e, "Shared cache purge failed"),
                },
            }
        }
    });

    let app = web::create_router(web::state::AppState::new(service.clone()).with_pool(pool));
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("bizclass listening on http://localhost:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    purge_stop.cancel();
    service.shutdown();
    Ok(())
}

async fn run_classify(
    env: EnvConfig,
    request: ClassificationRequest,
    variant: ModelVariant,
) -> Result<()> {
    let service = build_service(&env).await?.service;
    let token = CancellationToken::new();

    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let response = service.classify(request, variant, &token).await?;
    service.shutdown();
    println!("{}", serde_json::to_string_pretty(&response.result)?);
    Ok(())
}

async fn run_seed(env: EnvConfig, db: Option<PathBuf>) -> Result<()> {
    let path = db.unwrap_or(env.db_path);
    let pool = DatabasePool::open(&path).await?;
    let stats = pool.interact(seed_default_taxonomy).await?;

    println!(
        "Seeded {} industries, {} keywords, {} topics, {} patterns, {} codes, {} crosswalks into {}",
        stats.industries,
        stats.keywords,
        stats.topics,
        stats.patterns,
        stats.codes,
        stats.crosswalks,
        path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".bizclass/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = match &cli.command {
        Some(Commands::Serve { .. }) | None => Level::INFO,
        Some(Commands::Classify { .. }) => Level::WARN, // Keep stdout clean for JSON
        Some(Commands::Seed { .. }) => Level::INFO,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let env = EnvConfig::load();

    match cli.command {
        None => run_server(env, None).await?,
        Some(Commands::Serve { port }) => run_server(env, port).await?,
        Some(Commands::Classify {
            name,
            description,
            website,
            fast,
        }) => {
            let mut request = ClassificationRequest::new(name);
            request.description = description;
            request.website_url = website;
            let variant = if fast {
                ModelVariant::Fast
            } else {
                ModelVariant::Full
            };
            run_classify(env, request, variant).await?;
        }
        Some(Commands::Seed { db }) => run_seed(env, db).await?,
    }

    Ok(())
}
