use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::RateStore;
use crate::currency_rate::{CurrencyRate, NewCurrencyRate};

/// In-process rate store, kept in insertion order.
#[derive(Default)]
pub struct MemoryRateStore {
    rows: RwLock<Vec<CurrencyRate>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn insert(&self, rate: NewCurrencyRate) -> Result<CurrencyRate> {
        let saved = rate.with_id(Uuid::new_v4());
        self.rows.write().await.push(saved.clone());
        debug!("Stored {} for {} in memory", saved.char_code, saved.date);
        Ok(saved)
    }

    async fn find_all(&self) -> Result<Vec<CurrencyRate>> {
        Ok(self.rows.read().await.clone())
    }

    async fn find_by_date_and_codes(
        &self,
        date: NaiveDate,
        codes: &[String],
    ) -> Result<Vec<CurrencyRate>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| row.date == date && codes.contains(&row.char_code))
            .cloned()
            .collect())
    }

    async fn find_most_recent_by_code(
        &self,
        code: &str,
        limit: usize,
    ) -> Result<Vec<CurrencyRate>> {
        let rows = self.rows.read().await;
        let mut found: Vec<_> = rows
            .iter()
            .filter(|row| row.char_code == code)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        found.truncate(limit);
        Ok(found)
    }
}
