//! Field extraction: one raw record per repeating listing element.

use common::result::base::RawRecord;
use crawler::{errors::PageAccessError, traits::PageHandle};
use reqwest::Url;
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::{
    selectors::{FieldSelector, ListingSelectors},
    utils::html::{element_extract_attr, element_to_text, resolve_link},
};

/// Reads every listing element on a loaded page. A child selector that
/// matches nothing leaves that field absent instead of dropping the record.
pub fn extract(
    page: &PageHandle,
    selectors: &ListingSelectors,
) -> Result<Vec<RawRecord>, PageAccessError> {
    if !page.is_ready() {
        return Err(PageAccessError::NotReady(page.url.clone()));
    }

    let document = Html::parse_document(&page.body);
    let base_url = Url::parse(&page.url).ok();

    let records: Vec<RawRecord> = document
        .select(&selectors.listing)
        .map(|listing| extract_record(listing, selectors, base_url.as_ref()))
        .collect();

    debug!("Extracted {} listings from {}", records.len(), page.url);

    Ok(records)
}

fn extract_record(
    listing: ElementRef,
    selectors: &ListingSelectors,
    base_url: Option<&Url>,
) -> RawRecord {
    let mut record = RawRecord::new();

    for (field, field_selector) in selectors.fields.iter() {
        let value = read_field(listing, field_selector).map(|value| match field_selector.attr {
            // only URL-ish attributes are worth resolving
            Some(ref attr) if attr == "href" || attr == "src" => resolve_link(base_url, value),
            _ => value,
        });

        record.insert(field.clone(), value);
    }

    record
}

fn read_field(listing: ElementRef, field_selector: &FieldSelector) -> Option<String> {
    let element = listing.select(&field_selector.selector).next()?;

    match &field_selector.attr {
        Some(attr) => element_extract_attr(element, attr),
        None => Some(element_to_text(element)),
    }
}

#[cfg(test)]
mod tests {
    use common::config::SelectorMap;

    use super::*;

    const PAGE: &str = r#"
    <html><body>
      <ul>
        <li class="listing-item">
          <h2 class="listing-title">  Bright T2 near the river </h2>
          <span class="listing-price">€ 250.000</span>
          <span class="listing-area">85 m²</span>
          <a class="listing-link" href="/imovel/1">details</a>
          <img class="photo" src="img/1.jpg">
        </li>
        <li class="listing-item">
          <h2 class="listing-title">Studio</h2>
          <a class="listing-link" href="https://example.com/imovel/2">details</a>
        </li>
        <li class="listing-item">
          <h2 class="listing-title"></h2>
        </li>
      </ul>
    </body></html>
    "#;

    fn selectors() -> ListingSelectors {
        let map = SelectorMap::new()
            .with("listing", ".listing-item")
            .with("title", ".listing-title")
            .with("price", ".listing-price")
            .with("area", ".listing-area")
            .with("link", "a.listing-link")
            .with("photo", "img.photo@src");

        ListingSelectors::compile(&map).unwrap()
    }

    #[test]
    fn extracts_all_listing_elements() {
        let page = PageHandle::loaded("https://example.com/listings?page=1", PAGE);

        let records = extract(&page, &selectors()).unwrap();

        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.get("title"), Some("Bright T2 near the river"));
        assert_eq!(first.get("price"), Some("€ 250.000"));
        assert_eq!(first.get("area"), Some("85 m²"));
        assert_eq!(first.get("url"), Some("https://example.com/imovel/1"));
        assert_eq!(first.get("photo"), Some("https://example.com/img/1.jpg"));
    }

    #[test]
    fn missing_children_leave_fields_absent() {
        let page = PageHandle::loaded("https://example.com/listings", PAGE);

        let records = extract(&page, &selectors()).unwrap();

        let studio = &records[1];
        assert_eq!(studio.get("price"), None);
        assert_eq!(studio.get("url"), Some("https://example.com/imovel/2"));
        assert_eq!(studio.len(), 5);

        // present but empty is not the same as absent
        assert_eq!(records[2].get("title"), Some(""));
        assert_eq!(records[2].get("url"), None);
    }

    #[test]
    fn page_without_listings_is_empty() {
        let page = PageHandle::loaded("https://example.com", "<html><body><p>none</p></body></html>");

        assert!(extract(&page, &selectors()).unwrap().is_empty());
    }

    #[test]
    fn unfinished_page_is_an_access_error() {
        let page = PageHandle::pending("https://example.com/listings");

        assert!(matches!(
            extract(&page, &selectors()),
            Err(PageAccessError::NotReady(_))
        ));
    }
}
