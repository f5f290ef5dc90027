//! Compiled form of the selector map.

use common::{
    config::{LINK_SELECTOR, LISTING_SELECTOR, SelectorMap},
    result::base::URL_FIELD,
};
use scraper::Selector;

use crate::errors::ConfigurationError;

const LINK_ATTR: &str = "href";

/// A child selector plus where to read the value from: text content, or an
/// attribute when written as `selector@attr`.
#[derive(Debug)]
pub struct FieldSelector {
    pub(crate) selector: Selector,
    pub(crate) attr: Option<String>,
}

impl FieldSelector {
    pub fn parse(field: &str, expression: &str) -> Result<Self, ConfigurationError> {
        let (css, attr) = split_attr(expression);

        let selector =
            Selector::parse(css).map_err(|err| ConfigurationError::InvalidSelector {
                field: field.into(),
                selector: expression.into(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            selector,
            attr: attr.map(String::from),
        })
    }
}

fn is_attr_name(name: &str) -> bool {
    let mut chars = name.chars();

    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn split_attr(expression: &str) -> (&str, Option<&str>) {
    match expression.rsplit_once('@') {
        Some((css, attr)) if !css.trim().is_empty() && is_attr_name(attr.trim()) => {
            (css.trim(), Some(attr.trim()))
        }
        _ => (expression.trim(), None),
    }
}

#[derive(Debug)]
pub struct ListingSelectors {
    pub(crate) listing: Selector,
    /// Output field name and its selector, `link` is stored as `url`.
    pub(crate) fields: Vec<(String, FieldSelector)>,
}

impl ListingSelectors {
    pub fn compile(selectors: &SelectorMap) -> Result<Self, ConfigurationError> {
        let missing = selectors.missing_required();
        if !missing.is_empty() {
            return Err(ConfigurationError::MissingSelectors(missing.join(", ")));
        }

        let mut listing = None;
        let mut fields = Vec::new();

        for (field, expression) in selectors.iter() {
            if field == LISTING_SELECTOR {
                listing = Some(FieldSelector::parse(field, expression)?.selector);
                continue;
            }

            let mut field_selector = FieldSelector::parse(field, expression)?;

            if field == LINK_SELECTOR {
                field_selector.attr.get_or_insert_with(|| LINK_ATTR.into());
                fields.push((URL_FIELD.to_string(), field_selector));
            } else {
                fields.push((field.to_string(), field_selector));
            }
        }

        let Some(listing) = listing else {
            return Err(ConfigurationError::MissingSelectors(LISTING_SELECTOR.into()));
        };

        Ok(Self { listing, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector_map() -> SelectorMap {
        SelectorMap::new()
            .with("listing", ".listing-item")
            .with("title", ".listing-title")
            .with("price", ".listing-price")
            .with("area", ".listing-area")
            .with("link", "a.listing-link")
            .with("photo", "img.photo @ src")
    }

    #[test]
    fn splits_attribute_suffix() {
        assert_eq!(split_attr("img.photo@src"), ("img.photo", Some("src")));
        assert_eq!(split_attr(".price"), (".price", None));
        assert_eq!(
            split_attr(r#"a[href^="mailto:me@x"]"#),
            (r#"a[href^="mailto:me@x"]"#, None)
        );
    }

    #[test]
    fn link_reads_href_by_default() {
        let selectors = ListingSelectors::compile(&selector_map()).unwrap();

        let (_, link) = selectors
            .fields
            .iter()
            .find(|(name, _)| name == "url")
            .unwrap();
        assert_eq!(link.attr.as_deref(), Some("href"));

        let (_, photo) = selectors
            .fields
            .iter()
            .find(|(name, _)| name == "photo")
            .unwrap();
        assert_eq!(photo.attr.as_deref(), Some("src"));
    }

    #[test]
    fn missing_selectors_fail_fast() {
        let map = SelectorMap::new().with("listing", ".item").with("title", ".t");

        let err = ListingSelectors::compile(&map).unwrap_err();

        assert!(matches!(err, ConfigurationError::MissingSelectors(ref keys) if keys == "price, area, link"));
    }

    #[test]
    fn invalid_css_is_rejected() {
        let map = selector_map().with("price", "div[[");

        let err = ListingSelectors::compile(&map).unwrap_err();

        assert!(matches!(err, ConfigurationError::InvalidSelector { ref field, .. } if field == "price"));
    }
}
