//! `probe run <spec>` - execute every operation and print the records.

use super::{RunOptions, load_config};
use probe_core::CallRecord;
use probe_runtime::RunSummary;
use std::path::Path;

pub async fn run(
    spec: &str,
    config_path: Option<&Path>,
    options: &RunOptions,
    summary: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path, options)?;
    let records = probe_runtime::run_spec(spec, &config).await?;

    println!("{}", serde_json::to_string_pretty(&records)?);

    if summary {
        eprint!("{}", summary_table(&records));
        eprintln!("{}", RunSummary::from_records(&records));
    }
    Ok(())
}

/// One line per record: method, status (or `-`/`skip`), url.
fn summary_table(records: &[CallRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let status = match record.status() {
            Some(status) => status.to_string(),
            None if record.is_skipped() => "skip".to_string(),
            None => "-".to_string(),
        };
        out.push_str(&format!(
            "{:<7} {:>4}  {}\n",
            record.method.as_str().to_uppercase(),
            status,
            record.url
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_core::{CallOutcome, HttpMethod};
    use serde_json::{Map, json};

    fn record(method: HttpMethod, url: &str, outcome: CallOutcome) -> CallRecord {
        CallRecord {
            method,
            url: url.to_string(),
            parameters: Map::new(),
            outcome,
        }
    }

    #[test]
    fn test_summary_table() {
        let records = vec![
            record(
                HttpMethod::Post,
                "http://api.test/pet",
                CallOutcome::Response { status: 200, response: json!({}) },
            ),
            record(
                HttpMethod::Delete,
                "http://api.test/pet/{petId}",
                CallOutcome::Skipped { skipped: "unresolved path parameter petId".into() },
            ),
            record(
                HttpMethod::Get,
                "http://api.test/down",
                CallOutcome::Error { status: None, error: json!("connection refused") },
            ),
        ];

        assert_eq!(
            summary_table(&records),
            "POST     200  http://api.test/pet\n\
             DELETE  skip  http://api.test/pet/{petId}\n\
             GET        -  http://api.test/down\n"
        );
    }
}
