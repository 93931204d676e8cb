// src/core/csv_io.rs
//! Company-list input and result-row output in CSV form.

use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::path::Path;

use crate::app_log;
use crate::types::ResultRow;

pub const COMPANY_COLUMN: &str = "Company";
pub const OUTPUT_HEADERS: [&str; 5] = ["Company", "Best LinkedIn URL", "Message", "Confidence", "Error"];

/// Read the `Company` column of a CSV, in file order.
pub fn read_companies<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();

    let column = headers
        .iter()
        .position(|h| {
            h.trim_start_matches('\u{feff}')
                .trim()
                .eq_ignore_ascii_case(COMPANY_COLUMN)
        })
        .with_context(|| {
            format!(
                "CSV must have a '{}' column. Found: {}",
                COMPANY_COLUMN,
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })?;

    let mut companies = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", line + 2))?;
        companies.push(record.get(column).unwrap_or_default().to_string());
    }

    Ok(companies)
}

pub async fn read_companies_from_path(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let companies = read_companies(content.as_slice())
        .with_context(|| format!("Invalid company list: {}", path.display()))?;
    app_log!(info, "Loaded {} companies from {}", companies.len(), path.display());
    Ok(companies)
}

pub fn write_rows<W: Write>(writer: W, rows: &[ResultRow]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer
        .write_record(OUTPUT_HEADERS)
        .context("Failed to write CSV header")?;
    for row in rows {
        csv_writer
            .serialize(row)
            .with_context(|| format!("Failed to write row for {}", row.company))?;
    }
    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn rows_to_csv(rows: &[ResultRow]) -> Result<String> {
    let mut buffer = Vec::new();
    write_rows(&mut buffer, rows)?;
    String::from_utf8(buffer).context("CSV output is not valid UTF-8")
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ResultRow>> {
    csv::Reader::from_reader(reader)
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Failed to parse result row {}", i + 2)))
        .collect()
}

pub async fn write_rows_to_path(path: &Path, rows: &[ResultRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let content = rows_to_csv(rows)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    app_log!(info, "Results saved to: {}", path.display());
    Ok(())
}
