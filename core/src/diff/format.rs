//! Text form of a diff
//!
//! Each changed facet is written as `@facet[<changes>]:` followed by a delta
//! table whose first column holds `+` or `-`. A modified row takes two lines, the
//! old values under `-` and the new values under `+`. Reading the text back
//! merges such a pair into one modified change but cannot restore the changed
//! field names or the row counts.

use super::{Diff, FacetDiff, FacetStatus, RowChange};
use crate::error::{Result, TqlError};
use crate::parser::facet_marker;
use crate::row::{Fields, Row};
use crate::schema::{FacetKind, INDEX_COLUMN};
use crate::table;

pub const DELTA_HEADER: &str = "Δ";
pub const NO_CHANGES: &str = "No changes detected.";

const GREEN: &str = "\u{1b}[32m";
const RED: &str = "\u{1b}[31m";
const RESET: &str = "\u{1b}[0m";
const MIN_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delta {
    Plus,
    Minus,
}

impl Delta {
    fn symbol(self) -> &'static str {
        match self {
            Delta::Plus => "+",
            Delta::Minus => "-",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Delta::Plus => GREEN,
            Delta::Minus => RED,
        }
    }
}

/// How a diff is rendered as text
#[derive(Debug, Clone, Default)]
pub struct DiffFormat {
    /// Wrap `+` lines in green and `-` lines in red
    pub color: bool,
}

impl DiffFormat {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn colored() -> Self {
        Self { color: true }
    }
}

/// Render the changed facets of `diff`, or `No changes detected.`
pub fn serialize_diff(diff: &Diff, format: &DiffFormat) -> String {
    let sections: Vec<String> = diff
        .changed_facets()
        .map(|facet| serialize_facet(facet, format))
        .collect();

    if sections.is_empty() {
        NO_CHANGES.to_string()
    } else {
        sections.join("\n\n")
    }
}

fn serialize_facet(facet: &FacetDiff, format: &DiffFormat) -> String {
    let mut lines = vec![format!("@{}[{}]:", facet.facet.name(), facet.changes.len())];

    let mut entries: Vec<(Delta, &Row)> = Vec::with_capacity(facet.changes.len());
    for change in &facet.changes {
        match change {
            RowChange::Added { after, .. } => entries.push((Delta::Plus, after)),
            RowChange::Removed { before, .. } => entries.push((Delta::Minus, before)),
            RowChange::Modified { before, after, .. } => {
                entries.push((Delta::Minus, before));
                entries.push((Delta::Plus, after));
            }
        }
    }

    if entries.is_empty() {
        return lines.join("\n");
    }

    // Union of the rows' columns, so a column present on one side only is shown
    let mut columns: Vec<String> = Vec::new();
    for (_, row) in &entries {
        for column in row.column_names() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }

    let cells: Vec<Vec<String>> = entries
        .iter()
        .map(|(_, row)| columns.iter().map(|column| row.cell(column)).collect())
        .collect();

    let mut headers = vec![DELTA_HEADER.to_string()];
    headers.extend(columns.iter().cloned());
    let mut widths = vec![MIN_WIDTH];
    widths.extend(
        table::column_widths(&columns, &cells)
            .into_iter()
            .map(|w| w.max(MIN_WIDTH)),
    );

    let header_cells: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| table::pad(header, *width))
        .collect();
    lines.push(String::new());
    lines.push(table::join_cells(&header_cells));
    lines.push(table::separator_line(&widths));

    for ((delta, _), row_cells) in entries.iter().zip(&cells) {
        lines.push(delta_line(*delta, row_cells, &widths, format));
    }

    lines.join("\n")
}

fn delta_line(delta: Delta, cells: &[String], widths: &[usize], format: &DiffFormat) -> String {
    let mut marker = table::pad(delta.symbol(), widths[0]);
    if format.color {
        marker = format!("{}{}{}{}", delta.color(), delta.symbol(), RESET, &marker[1..]);
    }

    let mut padded = vec![marker];
    padded.extend(
        cells
            .iter()
            .zip(&widths[1..])
            .map(|(cell, width)| table::pad(cell, *width)),
    );
    let line = table::join_cells(&padded);

    if format.color {
        format!("{}{}{}", delta.color(), line, RESET)
    } else {
        line
    }
}

/// Facet being read back from text
struct OpenFacet {
    kind: Option<FacetKind>,
    headers: Vec<String>,
    in_table: bool,
}

/// Read a diff back from its text form.
///
/// Colour codes are ignored. A `-` line directly followed by a `+` line for the
/// same index becomes one modified change with empty `modified_fields`. Row
/// counts come back as 0 and a facet with changes is always `modified`.
pub fn deserialize_diff(text: &str) -> Result<Diff> {
    let mut changes: [Vec<RowChange>; 9] = Default::default();
    let mut open: Option<OpenFacet> = None;

    for (number, raw) in text.lines().enumerate() {
        let line_no = number + 1;
        let stripped = table::strip_ansi(raw);
        let line = stripped.trim();

        if let Some((name, _)) = facet_marker(line) {
            let kind = FacetKind::from_marker(&name);
            if kind.is_none() {
                log::warn!("Ignoring unknown facet @{name} in diff on line {line_no}");
            }
            open = Some(OpenFacet {
                kind,
                headers: Vec::new(),
                in_table: false,
            });
            continue;
        }

        let Some(facet) = open.as_mut() else {
            continue;
        };
        if line.is_empty() {
            if facet.in_table {
                open = None;
            }
            continue;
        }
        if !table::is_table_line(line) {
            continue;
        }
        if table::is_separator(line) {
            facet.in_table = true;
            continue;
        }
        if !facet.in_table {
            if facet.headers.is_empty() {
                facet.headers = table::parse_table_line(line);
            }
            continue;
        }

        let Some(kind) = facet.kind else {
            continue;
        };
        let (delta, row) = delta_row(kind, &facet.headers, line, line_no)?;
        push_change(&mut changes[kind.ordinal()], delta, row);
    }

    let facets = FacetKind::ALL
        .into_iter()
        .zip(changes)
        .map(|(kind, changes)| FacetDiff {
            facet: kind,
            rows_before: 0,
            rows_after: 0,
            status: if changes.is_empty() {
                FacetStatus::Unchanged
            } else {
                FacetStatus::Modified
            },
            changes,
        })
        .collect();

    Ok(Diff::from_facets(facets))
}

fn delta_row(kind: FacetKind, headers: &[String], line: &str, line_no: usize) -> Result<(Delta, Row)> {
    let cells = table::parse_table_line(line);
    let delta = match cells.first().map(String::as_str) {
        Some("+") => Delta::Plus,
        Some("-") => Delta::Minus,
        other => {
            return Err(TqlError::parse(
                line_no,
                format!("expected '+' or '-' delta, found '{}'", other.unwrap_or("")),
            ))
        }
    };

    let mut fields = Fields::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate().skip(1) {
        fields.insert(header.clone(), cells.get(i).cloned().unwrap_or_default());
    }

    let index = fields
        .get(INDEX_COLUMN)
        .and_then(|value| value.parse::<usize>().ok())
        .ok_or_else(|| TqlError::parse(line_no, format!("missing row index in @{} diff", kind.name())))?;

    Ok((delta, Row::for_facet(kind, index, fields)))
}

fn push_change(changes: &mut Vec<RowChange>, delta: Delta, row: Row) {
    let index = row.index;
    match delta {
        Delta::Minus => changes.push(RowChange::Removed { index, before: row }),
        Delta::Plus => match changes.pop() {
            Some(RowChange::Removed {
                index: removed,
                before,
            }) if removed == index => changes.push(RowChange::Modified {
                index,
                before,
                after: row,
                modified_fields: Vec::new(),
            }),
            previous => {
                changes.extend(previous);
                changes.push(RowChange::Added { index, after: row });
            }
        },
    }
}
