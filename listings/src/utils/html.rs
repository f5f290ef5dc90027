use reqwest::Url;
use scraper::ElementRef;
use tracing::trace;

pub(crate) fn element_to_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().into()
}

pub(crate) fn element_extract_attr(element: ElementRef, attr_name: &str) -> Option<String> {
    let Some(attr_value) = element.attr(attr_name) else {
        trace!(
            "Attribute {} missing from element {:?}",
            attr_name,
            element.value()
        );
        return None;
    };

    Some(attr_value.trim().into())
}

/// Makes a link absolute against the page it was found on. Links that do
/// not parse are kept as written.
pub(crate) fn resolve_link(base: Option<&Url>, href: String) -> String {
    let Some(base) = base else {
        return href;
    };

    match base.join(&href) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_links() {
        let base = Url::parse("https://example.com/listings?page=2").unwrap();

        assert_eq!(
            resolve_link(Some(&base), "/listing/42".into()),
            "https://example.com/listing/42"
        );
        assert_eq!(
            resolve_link(Some(&base), "https://other.example/x".into()),
            "https://other.example/x"
        );
        assert_eq!(resolve_link(None, "/listing/42".into()), "/listing/42");
    }
}
