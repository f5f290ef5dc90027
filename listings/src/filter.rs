use common::{config::FilterCriteria, result::base::NormalizedRecord};

fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    // an active bound disqualifies records without a value
    let Some(value) = value else {
        return false;
    };

    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

/// Pure predicate, bounds are inclusive.
pub fn passes(record: &NormalizedRecord, criteria: &FilterCriteria) -> bool {
    criteria
        .require_fields
        .iter()
        .all(|field| record.has_field(field))
        && (!criteria.has_price_bounds()
            || within(record.price_amount, criteria.min_price, criteria.max_price))
        && (!criteria.has_area_bounds()
            || within(record.area_value, criteria.min_area, criteria.max_area))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(price: Option<f64>, area: Option<f64>) -> NormalizedRecord {
        NormalizedRecord {
            title: Some("listing".into()),
            price_amount: price,
            area_value: area,
            ..Default::default()
        }
    }

    fn price_filter() -> FilterCriteria {
        FilterCriteria::default().with_price_range(Some(10.0), Some(100.0))
    }

    #[test]
    fn unbounded_criteria_accept_records_without_values() {
        let criteria = FilterCriteria::default();

        assert!(!criteria.has_price_bounds());
        assert!(!criteria.has_area_bounds());
        assert!(passes(&priced(None, None), &criteria));
    }

    #[test]
    fn price_outside_range_is_excluded() {
        assert!(!passes(&priced(Some(150.0), None), &price_filter()));
        assert!(!passes(&priced(Some(9.99), None), &price_filter()));
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(passes(&priced(Some(10.0), None), &price_filter()));
        assert!(passes(&priced(Some(100.0), None), &price_filter()));
    }

    #[test]
    fn missing_price_fails_an_active_price_filter() {
        assert!(!passes(&priced(None, Some(70.0)), &price_filter()));
        assert!(passes(&priced(None, Some(70.0)), &FilterCriteria::default()));
    }

    #[test]
    fn area_is_ignored_without_area_bounds() {
        assert!(passes(&priced(Some(50.0), None), &price_filter()));
        assert!(passes(&priced(Some(50.0), Some(1.0)), &price_filter()));
    }

    #[test]
    fn open_ended_area_bound() {
        let criteria = FilterCriteria::default().with_area_range(Some(50.0), None);

        assert!(passes(&priced(None, Some(50.0)), &criteria));
        assert!(passes(&priced(None, Some(5000.0)), &criteria));
        assert!(!passes(&priced(None, Some(49.0)), &criteria));
        assert!(!passes(&priced(None, None), &criteria));
    }

    #[test]
    fn required_fields_must_be_present() {
        let criteria = FilterCriteria::default().require("title").require("price");

        assert!(passes(&priced(Some(1.0), None), &criteria));
        assert!(!passes(&priced(None, None), &criteria));

        let mut untitled = priced(Some(1.0), None);
        untitled.title = None;
        assert!(!passes(&untitled, &criteria));

        // empty is still present
        untitled.title = Some(String::new());
        assert!(passes(&untitled, &criteria));
    }
}
