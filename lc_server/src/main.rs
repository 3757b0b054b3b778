//! Serves a school's lunch menus as an iCalendar feed at `/<school>.ics`.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use lc_core::{
    config::{
        Config, DEFAULT_CACHE_DIR, DEFAULT_CACHE_THRESHOLD, DEFAULT_CACHE_TIMEOUT,
        DEFAULT_CALENDAR_URL, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT,
    },
    menu_client::HttpMenuSource,
    page::ClassExtractor,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{cache::FileCache, route::AppState};

mod cache;
mod route;

#[derive(Debug, Parser)]
#[command(version)]
pub struct Arguments {
    /// root url of the published menu pages
    #[arg(long, env = "CALENDAR_URL", default_value = DEFAULT_CALENDAR_URL)]
    pub calendar_url: String,
    /// seconds a served calendar stays cached, 0 never expires
    #[arg(long, env = "CACHE_TIMEOUT", default_value_t = DEFAULT_CACHE_TIMEOUT)]
    pub cache_timeout: u64,
    /// directory of the calendar cache
    #[arg(long, env = "CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,
    /// maximum number of cached calendars
    #[arg(long, env = "CACHE_THRESHOLD", default_value_t = DEFAULT_CACHE_THRESHOLD)]
    pub cache_threshold: usize,
    /// seconds to wait for a menu page
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: u64,
    /// log level, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
    /// port to listen on
    #[arg(long, env = "PORT", default_value_t = 8008)]
    pub port: u16,
}

impl From<&Arguments> for Config {
    fn from(value: &Arguments) -> Self {
        Config {
            calendar_url: value.calendar_url.clone(),
            request_timeout: Duration::from_secs(value.request_timeout),
            cache_timeout: Duration::from_secs(value.cache_timeout),
            cache_dir: value.cache_dir.clone(),
            cache_threshold: value.cache_threshold,
            log_level: value.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Arguments::parse();
    let config = Config::from(&args);
    init_tracing(&config.log_level);
    let state = AppState {
        source: Arc::new(HttpMenuSource::new(&config)?),
        extractor: Arc::new(ClassExtractor::default()),
        cache: Arc::new(FileCache::from_config(&config)),
    };
    let app = route::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("serving menus of {} on {addr}", config.calendar_root());
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.to_lowercase())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
