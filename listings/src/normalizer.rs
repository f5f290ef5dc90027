//! Raw text to typed values.
//!
//! Nothing in here fails. Text that does not hold a usable number turns
//! into an absent value and a warning.

use std::{collections::BTreeMap, sync::LazyLock};

use common::{
    config::{AREA_SELECTOR, PRICE_SELECTOR, TITLE_SELECTOR},
    result::base::{NormalizedRecord, RawRecord, URL_FIELD},
};
use regex::Regex;
use tracing::warn;

// first run of digits, allowing grouping separators and spaces inside it
static NUMBER_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d[\d.,\s]*").expect("Regex should compile as nothing has changed")
});

#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    decimal_separator: char,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new('.')
    }
}

impl Normalizer {
    pub fn new(decimal_separator: char) -> Self {
        Self { decimal_separator }
    }

    /// Is capable of parsing the following:
    /// 1. "€ 1,250.50" -> 1250.5
    /// 2. "85 m²" -> 85
    /// 3. "1 200 000 kr" -> 1200000
    /// 4. "250.000,00 €" -> 250000 (with ',' as decimal separator)
    pub fn parse_number(&self, text: &str) -> Option<f64> {
        let run = NUMBER_RUN.find(text)?.as_str();
        let run = run.trim_end_matches(|c: char| c.is_whitespace() || c == '.' || c == ',');

        let cleaned: String = run
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == self.decimal_separator)
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect();

        let value = cleaned.parse::<f64>().ok()?;

        (value.is_finite() && value >= 0.0).then_some(value)
    }

    fn parse_field(&self, field: &str, text: Option<&str>) -> Option<f64> {
        let text = text?;
        let parsed = self.parse_number(text);

        if parsed.is_none() {
            warn!("Could not read {} from {:?}, leaving it empty", field, text);
        }

        parsed
    }

    pub fn normalize(&self, mut raw: RawRecord) -> NormalizedRecord {
        let title = raw.take(TITLE_SELECTOR).map(|title| title.trim().to_string());
        let url = raw.take(URL_FIELD).map(|url| url.trim().to_string());
        let price_text = raw.take(PRICE_SELECTOR).map(|price| price.trim().to_string());
        let area_text = raw.take(AREA_SELECTOR).map(|area| area.trim().to_string());

        let price_amount = self.parse_field(PRICE_SELECTOR, price_text.as_deref());
        let area_value = self.parse_field(AREA_SELECTOR, area_text.as_deref());

        let extra: BTreeMap<String, Option<String>> = raw
            .into_fields()
            .into_iter()
            .map(|(field, value)| (field, value.map(|value| value.trim().to_string())))
            .collect();

        NormalizedRecord {
            title,
            price_amount,
            area_value,
            url,
            price_text,
            area_text,
            extra,
        }
    }
}

/// Normalizes with `.` as the decimal separator.
pub fn normalize(raw: RawRecord) -> NormalizedRecord {
    Normalizer::default().normalize(raw)
}
