use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored rate: how many units of the base currency one unit of `char_code` costs
/// on `date`, the feed's publication date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub id: Uuid,
    pub char_code: String,
    pub name: String,
    pub rate: f64,
    pub date: NaiveDate,
}

/// A rate that has not been stored yet. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCurrencyRate {
    pub char_code: String,
    pub name: String,
    pub rate: f64,
    pub date: NaiveDate,
}

impl NewCurrencyRate {
    pub fn with_id(self, id: Uuid) -> CurrencyRate {
        CurrencyRate {
            id,
            char_code: self.char_code,
            name: self.name,
            rate: self.rate,
            date: self.date,
        }
    }
}
