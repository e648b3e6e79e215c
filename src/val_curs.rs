use log::{debug, info};
use serde::Deserialize;
use serde::Serialize;

use crate::error::ParseError;

/// Pattern of the `Date` attribute on the feed root.
pub const FEED_DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Valute {
    #[serde(rename = "@ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "NumCode", default, skip_serializing_if = "Option::is_none")]
    pub num_code: Option<String>,
    #[serde(rename = "CharCode")]
    pub char_code: String,
    /// Unit count the value is quoted for, checked per entry by `normalize`.
    #[serde(rename = "Nominal")]
    pub nominal: String,
    #[serde(rename = "Name")]
    pub name: String,
    /// Rate for `nominal` units, comma as the decimal separator.
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "VunitRate", default, skip_serializing_if = "Option::is_none")]
    pub vunit_rate: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ValCurs {
    /// Publication date as written in the feed, see [`FEED_DATE_FORMAT`].
    #[serde(rename = "@Date")]
    pub date: String,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Valute", default)]
    pub valute: Vec<Valute>,
}

/// Parses already decoded feed text. Unknown elements and attributes are ignored.
pub fn parse(text: &str) -> Result<ValCurs, ParseError> {
    let val_curs: ValCurs = quick_xml::de::from_str(text)?;

    info!(
        "Parsed feed for {} with {} currencies",
        val_curs.date,
        val_curs.valute.len()
    );
    for valute in val_curs.valute.iter().take(3) {
        debug!(
            "Currency: {} - {} = {}",
            valute.char_code, valute.name, valute.value
        );
    }

    Ok(val_curs)
}
