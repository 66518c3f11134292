//! Pipe-table codec
//!
//! Renders rows as an aligned `| a | b |` block with a dashed separator line and
//! parses such lines back into trimmed cells.

use regex::Regex;
use std::sync::LazyLock;

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|[-\s|]+\|$").expect("valid separator pattern"));

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI pattern"));

/// Display width of a cell, counted in characters
pub fn display_width(text: &str) -> usize {
    text.chars().count()
}

/// Left-align `text` in a field of `width` characters
pub fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    let mut padded = String::with_capacity(text.len() + fill);
    padded.push_str(text);
    padded.extend(std::iter::repeat(' ').take(fill));
    padded
}

/// Column widths: the longest of the header and every cell in that column
pub fn column_widths<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| display_width(cell))
                .fold(display_width(header.as_ref()), usize::max)
        })
        .collect()
}

/// `| a   | b |` line for already-padded cells
pub fn join_cells<S: AsRef<str>>(cells: &[S]) -> String {
    let inner: Vec<&str> = cells.iter().map(AsRef::as_ref).collect();
    format!("| {} |", inner.join(" | "))
}

/// `|-----|---|` line for the given widths
pub fn separator_line(widths: &[usize]) -> String {
    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    format!("|{}|", dashes.join("|"))
}

/// Render a header line, a separator line and one line per row
pub fn render_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> Vec<String> {
    let widths = column_widths(headers, rows);
    let mut lines = Vec::with_capacity(rows.len() + 2);

    let header_cells: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h.as_ref(), *w))
        .collect();
    lines.push(join_cells(&header_cells));
    lines.push(separator_line(&widths));

    for row in rows {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| pad(row.get(i).map(String::as_str).unwrap_or(""), *w))
            .collect();
        lines.push(join_cells(&cells));
    }

    lines
}

/// `render_table` joined with newlines
pub fn render_block<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    render_table(headers, rows).join("\n")
}

pub fn is_separator(line: &str) -> bool {
    SEPARATOR.is_match(line.trim())
}

pub fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Split a `| a | b |` line into trimmed cells
pub fn parse_table_line(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// Parse a whole block into its header and data rows; separator lines are skipped
pub fn parse_block(text: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for line in text.lines().filter(|l| is_table_line(l)) {
        if is_separator(line) {
            continue;
        }
        match headers {
            None => headers = Some(parse_table_line(line)),
            Some(_) => rows.push(parse_table_line(line)),
        }
    }

    (headers.unwrap_or_default(), rows)
}

/// Remove ANSI colour escape sequences
pub fn strip_ansi(line: &str) -> String {
    ANSI_ESCAPE.replace_all(line, "").into_owned()
}
