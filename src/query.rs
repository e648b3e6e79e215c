use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use log::info;

use crate::currency_rate::CurrencyRate;
use crate::store::RateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Most recent first.
    #[default]
    Date,
    /// Highest rate first.
    Rate,
    Name,
    CharCode,
}

impl SortKey {
    /// Case-insensitive. Anything unrecognised sorts by date.
    pub fn parse(key: &str) -> Self {
        match key.to_lowercase().as_str() {
            "rate" => SortKey::Rate,
            "name" => SortKey::Name,
            "charcode" => SortKey::CharCode,
            _ => SortKey::Date,
        }
    }

    fn compare(self, a: &CurrencyRate, b: &CurrencyRate) -> Ordering {
        match self {
            SortKey::Date => b.date.cmp(&a.date),
            SortKey::Rate => b.rate.total_cmp(&a.rate),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::CharCode => a.char_code.cmp(&b.char_code),
        }
    }
}

/// Result of converting an amount of base currency into another currency.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Converted {
        amount: f64,
        code: String,
        /// Rounded to 2 decimals.
        converted: f64,
        /// Rounded to 4 decimals.
        rate: f64,
        base_currency: String,
    },
    NotFound {
        code: String,
    },
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conversion::Converted {
                amount,
                code,
                converted,
                rate,
                base_currency,
            } => write!(
                f,
                "{amount:.2} {base_currency} = {converted:.2} {code} (rate: 1 {code} = {rate:.4} {base_currency})"
            ),
            Conversion::NotFound { code } => write!(f, "Rate for currency {code} not found"),
        }
    }
}

/// Read side over the rate store. Never touches the network.
#[derive(Clone)]
pub struct RateQueryService {
    store: Arc<dyn RateStore>,
    base_currency: String,
}

impl RateQueryService {
    pub fn new(store: Arc<dyn RateStore>, base_currency: &str) -> Self {
        Self {
            store,
            base_currency: base_currency.to_string(),
        }
    }

    pub async fn list_sorted(&self, sort_by: &str) -> Result<Vec<CurrencyRate>> {
        let mut rates = self.store.find_all().await?;
        info!("Loaded {} rates for sorting", rates.len());

        let key = SortKey::parse(sort_by);
        rates.sort_by(|a, b| key.compare(a, b));
        Ok(rates)
    }

    pub async fn find_by_date_and_codes(
        &self,
        date: NaiveDate,
        codes: &[String],
    ) -> Result<Vec<CurrencyRate>> {
        info!("Looking up rates for {date}: {codes:?}");
        let rates = self.store.find_by_date_and_codes(date, codes).await?;
        info!("Found {} rates", rates.len());
        Ok(rates)
    }

    pub async fn most_recent(&self, code: &str, limit: usize) -> Result<Vec<CurrencyRate>> {
        self.store.find_most_recent_by_code(code, limit).await
    }

    /// Distinct stored dates, newest first.
    pub async fn available_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<_> = self
            .store
            .find_all()
            .await?
            .into_iter()
            .map(|rate| rate.date)
            .collect();
        dates.sort_by(|a, b| b.cmp(a));
        dates.dedup();
        Ok(dates)
    }

    /// Converts `amount` of the base currency into `code` using the newest stored rate.
    /// `code` must match exactly.
    pub async fn convert(&self, amount: f64, code: &str) -> Result<Conversion> {
        let rates = self.list_sorted("date").await?;
        let Some(target) = rates.into_iter().find(|rate| rate.char_code == code) else {
            return Ok(Conversion::NotFound {
                code: code.to_string(),
            });
        };

        Ok(Conversion::Converted {
            amount,
            code: code.to_string(),
            converted: round_to(amount / target.rate, 2),
            rate: round_to(target.rate, 4),
            base_currency: self.base_currency.clone(),
        })
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
