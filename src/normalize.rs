use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::currency_rate::NewCurrencyRate;
use crate::error::NormalizeError;
use crate::val_curs::Valute;

/// Turns a feed entry into a rate per one unit of the currency.
pub fn normalize(valute: &Valute, date: NaiveDate) -> Result<NewCurrencyRate, NormalizeError> {
    let malformed = || NormalizeError::MalformedNumber {
        code: valute.char_code.clone(),
        value: valute.value.clone(),
    };

    let nominal = match valute.nominal.trim().parse::<u32>() {
        Ok(nominal) if nominal >= 1 => nominal,
        _ => {
            return Err(NormalizeError::InvalidNominal {
                code: valute.char_code.clone(),
                nominal: valute.nominal.clone(),
            });
        }
    };

    let normalized_string = normalize_decimal_string(&valute.value);
    let value = Decimal::from_str(normalized_string.trim()).map_err(|_| malformed())?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(malformed());
    }

    let rate = value
        .checked_div(Decimal::from(nominal))
        .and_then(|rate| rate.to_f64())
        .ok_or_else(malformed)?;

    Ok(NewCurrencyRate {
        char_code: valute.char_code.clone(),
        name: valute.name.clone(),
        rate,
        date,
    })
}

fn normalize_decimal_string(s: &str) -> String {
    s.replace(',', ".")
}
