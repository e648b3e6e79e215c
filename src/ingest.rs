use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::IngestError;
use crate::feed_client::FeedSource;
use crate::normalize::normalize;
use crate::store::RateStore;
use crate::val_curs::{self, FEED_DATE_FORMAT, Valute};
use crate::worker_pool::WorkerPool;

pub const DEFAULT_SCHEDULE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// What a cycle handed to the worker pool. Says nothing about whether the saves succeed.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    pub date: NaiveDate,
    /// The feed date was unreadable and today's date was used instead.
    pub date_fallback: bool,
    pub submitted: usize,
}

/// Runs fetch, parse and per-currency persistence.
pub struct Ingestor {
    feed: Arc<dyn FeedSource>,
    store: Arc<dyn RateStore>,
    pool: WorkerPool,
}

impl Ingestor {
    pub fn new(feed: Arc<dyn FeedSource>, store: Arc<dyn RateStore>, pool: WorkerPool) -> Self {
        Self { feed, store, pool }
    }

    /// Fetches and parses the feed, then queues one save per currency and returns
    /// without waiting for the saves.
    pub async fn run_cycle(&self) -> Result<CycleSummary, IngestError> {
        let text = self.feed.fetch().await?;
        let val_curs = val_curs::parse(&text)?;
        if val_curs.valute.is_empty() {
            return Err(IngestError::NoEntries);
        }

        let (date, date_fallback) = match publication_date(&val_curs.date) {
            Some(date) => {
                info!("Rates date: {date}");
                (date, false)
            }
            None => {
                let today = Utc::now().date_naive();
                warn!(
                    "Can't parse feed date {:?}, using {today} instead",
                    val_curs.date
                );
                (today, true)
            }
        };

        let submitted = val_curs.valute.len();
        info!("Found {submitted} currencies to store");
        for valute in val_curs.valute {
            let store = Arc::clone(&self.store);
            self.pool.submit(save_valute(store, valute, date)).await;
        }
        info!("All {submitted} currencies submitted to the worker pool");

        Ok(CycleSummary {
            date,
            date_fallback,
            submitted,
        })
    }

    /// Runs a cycle and logs how it ended.
    pub async fn trigger(&self) {
        if let Err(err) = self.run_cycle().await {
            error!("Ingestion cycle aborted: {err}");
        }
    }

    /// Starts a cycle every `period`, the first one right away. Each cycle runs in
    /// its own task, so a slow cycle never delays the next start.
    pub fn spawn_schedule(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                info!("Scheduled rates update started");
                let ingestor = Arc::clone(&self);
                tokio::spawn(async move { ingestor.trigger().await });
            }
        })
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

fn publication_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), FEED_DATE_FORMAT).ok()
}

async fn save_valute(store: Arc<dyn RateStore>, valute: Valute, date: NaiveDate) {
    let rate = match normalize(&valute, date) {
        Ok(rate) => rate,
        Err(err) => {
            error!("Skipping {}: {err}", valute.char_code);
            return;
        }
    };

    match store.insert(rate).await {
        Ok(saved) => info!(
            "Stored rate for {}: {} (nominal: {})",
            saved.char_code, saved.rate, valute.nominal
        ),
        Err(err) => error!("Can't store rate for {}: {err:#}", valute.char_code),
    }
}
