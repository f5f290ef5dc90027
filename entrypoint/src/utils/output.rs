use common::result::{base::NormalizedRecord, enums::Sort};
use listings::ResultSet;

use crate::errors::MonitorError;

pub fn render_text(results: &ResultSet, sort: Sort) -> String {
    let mut output = format!("Found {} listings:\n", results.len());

    for record in results.sorted(sort) {
        output.push_str(&format!("- {}", record.summary()));

        if let Some(url) = &record.url {
            output.push_str(&format!(" <{url}>"));
        }

        output.push('\n');
    }

    output
}

pub fn render_json(results: &ResultSet, sort: Sort) -> Result<String, MonitorError> {
    let records: Vec<&NormalizedRecord> = results.sorted(sort);

    Ok(serde_json::to_string_pretty(&records)?)
}
