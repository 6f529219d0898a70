use anyhow::Context;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use clap::Parser;
use poll_aggregator::{
    routes, AppState, Config, GeminiAdapter, MemoryPollStore, NewsApiFetcher, NewsSource,
    NextPollTime, PgPollStore, PollGenerator, PollScheduler, PollService, PollStore,
    TextGenerator,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    install_panic_hook();

    let config = Config::parse();
    info!("Starting poll aggregator");

    let store: Arc<dyn PollStore> = if config.in_memory {
        warn!("Using in-memory poll store, polls will not survive a restart");
        Arc::new(MemoryPollStore::new())
    } else {
        info!("Connecting to database: {}", config.redacted_database_url());
        let store = PgPollStore::connect(&config.database_url, config.db_connect_retries)
            .await
            .context("failed to connect to the database")?;
        store.migrate().await.context("failed to apply migrations")?;
        Arc::new(store)
    };

    let upstream = config.upstream();
    if upstream.news_api_key.is_empty() || upstream.gemini_api_key.is_empty() {
        warn!("NEWS_API_KEY or GEMINI_API_KEY is not set, poll generation will fail");
    }
    let news: Arc<dyn NewsSource> = Arc::new(NewsApiFetcher::new(&upstream)?);
    let llm: Arc<dyn TextGenerator> = Arc::new(GeminiAdapter::new(&upstream)?);

    let schedule = config.schedule();
    let next_poll = NextPollTime::starting_now(schedule.generation_window());

    let generator = Arc::new(PollGenerator::new(
        news.clone(),
        llm,
        store.clone(),
        upstream.timeout(),
    ));
    let service = Arc::new(PollService::new(
        store.clone(),
        next_poll.clone(),
        schedule.retention_window(),
    ));

    let state = AppState::new(
        service,
        generator.clone(),
        news,
        next_poll.clone(),
        schedule.generation_window(),
    );
    let scheduler = PollScheduler::new(generator, store, next_poll, schedule).start();

    let app = routes::router(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    let address = config.socket_addr().context("invalid listen address")?;
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("Server running on {}", address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.shutdown().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Poll aggregator finished");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

/// A panic anywhere is treated as fatal: log it and exit rather than keep
/// serving from a possibly corrupted state.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic| {
        error!("Fatal: {}", panic);
        std::process::exit(1);
    }));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
