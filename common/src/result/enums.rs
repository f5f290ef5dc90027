use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Output ordering of a finished crawl.
#[derive(Debug, Default, Deserialize, Serialize, EnumString, Display, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Sort {
    #[default]
    PageOrder,
    PriceAsc,
    PriceDesc,
    PricePerArea,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn parses_kebab_case() {
        assert_eq!(Sort::from_str("price-per-area").unwrap(), Sort::PricePerArea);
        assert_eq!(Sort::PriceAsc.to_string(), "price-asc");
        assert!(Sort::from_str("cheapest").is_err());
    }
}
