use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{AREA_SELECTOR, LINK_SELECTOR, PRICE_SELECTOR, TITLE_SELECTOR};

/// Field name under which the resolved listing link is stored.
pub const URL_FIELD: &str = "url";

/// One listing element as read off the page, before any typing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: BTreeMap<String, Option<String>>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: Option<&str>) -> Self {
        self.insert(field, value.map(String::from));
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|value| value.as_deref())
    }

    pub fn take(&mut self, field: &str) -> Option<String> {
        self.fields.remove(field).flatten()
    }

    pub fn into_fields(self) -> BTreeMap<String, Option<String>> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub title: Option<String>,
    /// Non-negative and finite whenever present.
    pub price_amount: Option<f64>,
    pub area_value: Option<f64>,
    pub url: Option<String>,
    pub price_text: Option<String>,
    pub area_text: Option<String>,
    /// Selector fields the pipeline does not interpret.
    pub extra: BTreeMap<String, Option<String>>,
}

impl NormalizedRecord {
    /// Listing URL when there is one, otherwise title and price glued
    /// together.
    pub fn identity_key(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let price = self
            .price_amount
            .map(|price| price.to_string())
            .or_else(|| self.price_text.clone())
            .unwrap_or_default();

        format!("{}|{}", self.title.as_deref().unwrap_or_default(), price)
    }

    pub fn has_field(&self, field: &str) -> bool {
        match field {
            TITLE_SELECTOR => self.title.is_some(),
            PRICE_SELECTOR => self.price_amount.is_some(),
            AREA_SELECTOR => self.area_value.is_some(),
            URL_FIELD | LINK_SELECTOR => self.url.is_some(),
            other => self
                .extra
                .get(other)
                .is_some_and(|value| value.is_some()),
        }
    }

    pub fn price_per_area(&self) -> Option<f64> {
        match (self.price_amount, self.area_value) {
            (Some(price), Some(area)) if area > 0.0 => Some(price / area),
            _ => None,
        }
    }

    /// `title: price (area)`, built from the text the page showed.
    pub fn summary(&self) -> String {
        let price = self
            .price_text
            .clone()
            .or_else(|| self.price_amount.map(|price| price.to_string()))
            .unwrap_or_else(|| "n/a".into());
        let area = self
            .area_text
            .clone()
            .or_else(|| self.area_value.map(|area| area.to_string()))
            .unwrap_or_else(|| "n/a".into());

        format!(
            "{}: {} ({})",
            self.title.as_deref().unwrap_or("<untitled>"),
            price,
            area
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> NormalizedRecord {
        NormalizedRecord {
            title: Some("T2 in Alfama".into()),
            price_amount: Some(250000.0),
            area_value: Some(80.0),
            url: None,
            price_text: Some("€250,000".into()),
            area_text: Some("80 m²".into()),
            extra: BTreeMap::from([("rooms".to_string(), None)]),
        }
    }

    #[test]
    fn identity_prefers_url() {
        let mut record = record();
        assert_eq!(record.identity_key(), "T2 in Alfama|250000");

        record.url = Some("https://example.com/l/1".into());
        assert_eq!(record.identity_key(), "https://example.com/l/1");
    }

    #[test]
    fn summary_uses_page_text() {
        assert_eq!(record().summary(), "T2 in Alfama: €250,000 (80 m²)");

        let bare = NormalizedRecord::default();
        assert_eq!(bare.summary(), "<untitled>: n/a (n/a)");
    }

    #[test]
    fn field_presence() {
        let record = record();

        assert!(record.has_field("title"));
        assert!(record.has_field("price"));
        assert!(!record.has_field("url"));
        assert!(!record.has_field("rooms"));
        assert!(!record.has_field("floor"));
        assert_eq!(record.price_per_area(), Some(3125.0));
    }

    #[test]
    fn raw_record_distinguishes_absent_values() {
        let mut raw = RawRecord::new()
            .with("title", Some("Flat"))
            .with("area", None);

        assert_eq!(raw.get("title"), Some("Flat"));
        assert_eq!(raw.get("area"), None);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.take("title"), Some("Flat".to_string()));
        assert_eq!(raw.take("title"), None);
    }
}
