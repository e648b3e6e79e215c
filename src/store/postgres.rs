use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::RateStore;
use crate::currency_rate::{CurrencyRate, NewCurrencyRate};

/// Rate store backed by the `currency_rate` table.
#[derive(Clone)]
pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Can't connect to the database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Can't apply database migrations")?;
        info!("Database schema is up to date");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn insert(&self, rate: NewCurrencyRate) -> Result<CurrencyRate> {
        let saved = sqlx::query_as::<_, CurrencyRate>(
            "INSERT INTO currency_rate (id, char_code, name, rate, date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, char_code, name, rate, date",
        )
        .bind(Uuid::new_v4())
        .bind(&rate.char_code)
        .bind(&rate.name)
        .bind(rate.rate)
        .bind(rate.date)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Can't insert rate for {}", rate.char_code))?;

        Ok(saved)
    }

    async fn find_all(&self) -> Result<Vec<CurrencyRate>> {
        let rows = sqlx::query_as::<_, CurrencyRate>(
            "SELECT id, char_code, name, rate, date FROM currency_rate",
        )
        .fetch_all(&self.pool)
        .await
        .context("Can't load rates")?;

        Ok(rows)
    }

    async fn find_by_date_and_codes(
        &self,
        date: NaiveDate,
        codes: &[String],
    ) -> Result<Vec<CurrencyRate>> {
        let rows = sqlx::query_as::<_, CurrencyRate>(
            "SELECT id, char_code, name, rate, date FROM currency_rate
             WHERE date = $1 AND char_code = ANY($2)",
        )
        .bind(date)
        .bind(codes)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Can't load rates for {date}"))?;

        Ok(rows)
    }

    async fn find_most_recent_by_code(
        &self,
        code: &str,
        limit: usize,
    ) -> Result<Vec<CurrencyRate>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, CurrencyRate>(
            "SELECT id, char_code, name, rate, date FROM currency_rate
             WHERE char_code = $1
             ORDER BY date DESC
             LIMIT $2",
        )
        .bind(code)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Can't load recent rates for {code}"))?;

        Ok(rows)
    }
}
