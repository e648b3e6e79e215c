pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::currency_rate::{CurrencyRate, NewCurrencyRate};

pub use memory::MemoryRateStore;
pub use postgres::PgRateStore;

/// How many records [`RateStore::find_most_recent_by_code`] returns by default.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Durable collection of rate records. Records are only ever appended.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Stores the rate under a fresh id. Never merges with an existing row.
    async fn insert(&self, rate: NewCurrencyRate) -> Result<CurrencyRate>;

    /// Every stored record, in no particular order.
    async fn find_all(&self) -> Result<Vec<CurrencyRate>>;

    async fn find_by_date_and_codes(
        &self,
        date: NaiveDate,
        codes: &[String],
    ) -> Result<Vec<CurrencyRate>>;

    /// Up to `limit` records for `code`, newest date first.
    async fn find_most_recent_by_code(&self, code: &str, limit: usize)
    -> Result<Vec<CurrencyRate>>;
}
