use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use env_logger::Env;
use log::info;

use valut::api::{self, AppState};
use valut::config::AppConfig;
use valut::feed_client::CbrClient;
use valut::ingest::Ingestor;
use valut::query::RateQueryService;
use valut::store::{PgRateStore, RateStore};
use valut::worker_pool::WorkerPool;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    info!(
        "Starting with feed {} and {} workers",
        config.feed_url, config.worker_pool_size
    );

    let store: Arc<dyn RateStore> = Arc::new(
        PgRateStore::connect(&config.database_url, config.database_max_connections).await?,
    );
    let feed = Arc::new(CbrClient::new(&config.feed_url, config.feed_timeout)?);
    let pool = WorkerPool::new(config.worker_pool_size, config.worker_queue_capacity);

    let ingestor = Arc::new(Ingestor::new(feed, Arc::clone(&store), pool.clone()));
    let schedule = Arc::clone(&ingestor).spawn_schedule(config.schedule_interval);

    let state = web::Data::new(AppState {
        ingestor,
        query: RateQueryService::new(store, &config.base_currency),
    });

    info!("Listening on {}", config.bind_addr);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .bind(config.bind_addr.as_str())
        .with_context(|| format!("Can't bind to {}", config.bind_addr))?
        .run()
        .await?;

    schedule.abort();
    info!("Waiting for {} pending saves", pool.pending());
    pool.wait_idle().await;

    Ok(())
}
