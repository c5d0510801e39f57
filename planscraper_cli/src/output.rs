use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use planscraper_lib::NormalizedRecord;
use tabled::{Table, Tabled};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Delimited file at --output, one row per application
    Csv,
    /// Pretty JSON on stdout
    Json,
    /// Summary table on stdout
    Table,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Application")]
    application_number: String,
    #[tabled(rename = "Type")]
    application_type: String,
    #[tabled(rename = "Site Address")]
    site_address: String,
    #[tabled(rename = "Decision")]
    council_decision: String,
    #[tabled(rename = "Received")]
    received: String,
    #[tabled(rename = "Easting")]
    easting: String,
    #[tabled(rename = "Northing")]
    northing: String,
    #[tabled(rename = "Portal Ref")]
    planning_portal_reference: String,
}

fn build_record_rows(records: &[NormalizedRecord]) -> Vec<RecordRow> {
    records
        .iter()
        .map(|r| RecordRow {
            application_number: r.application_number.to_string(),
            application_type: r.application_type.to_string(),
            site_address: truncate(r.site_address.as_str(), 40),
            council_decision: r.council_decision.to_string(),
            received: r.received.to_string(),
            easting: r.easting.to_string(),
            northing: r.northing.to_string(),
            planning_portal_reference: r.planning_portal_reference.to_string(),
        })
        .collect()
}

pub fn write_records(records: &[NormalizedRecord], format: ExportFormat, path: &Path) -> Result<()> {
    match format {
        ExportFormat::Csv => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_csv(file, records)?;
            eprintln!("Wrote {} records to {}", records.len(), path.display());
        }
        ExportFormat::Json => print_json(records),
        ExportFormat::Table => println!("{}", Table::new(build_record_rows(records))),
    }
    Ok(())
}

/// Writes the header row and one row per record, in schema column order.
pub fn write_csv<W: io::Write>(writer: W, records: &[NormalizedRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(NormalizedRecord::COLUMNS)?;
    for record in records {
        wtr.write_record(record.values())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_json<T: serde::Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
