//! Tabular source input (headers plus string rows)

use crate::error::{Result, TqlError};
use crate::schema::INDEX_COLUMN;
use std::fs;
use std::path::Path;

/// A CSV-shaped table: column headers and rows of string cells
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Read a CSV file into a `SourceTable`
pub fn read_csv(path: &Path) -> Result<SourceTable> {
    let content = fs::read_to_string(path)?;
    let table = parse_csv(&content)?;
    log::debug!(
        "Read {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

/// Naive CSV parsing: commas split cells, double quotes toggle quoting
///
/// No escaped quotes and no multi-line cells. The first line is the header.
pub fn parse_csv(content: &str) -> Result<SourceTable> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(TqlError::invalid_input("CSV file is empty"));
    }

    let mut lines = trimmed.lines().map(split_csv_line);
    let headers = lines.next().unwrap_or_default();
    if headers.iter().any(|h| h == INDEX_COLUMN) {
        return Err(TqlError::invalid_input(format!(
            "source column '{INDEX_COLUMN}' is reserved"
        )));
    }
    let rows = lines
        .map(|mut cells| {
            if cells.len() < headers.len() {
                cells.resize(headers.len(), String::new());
            }
            cells
        })
        .collect();

    Ok(SourceTable { headers, rows })
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.trim_end_matches('\r').chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    cells.push(current.trim().to_string());
    cells
}
