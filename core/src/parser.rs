//! TQL text → Document
//!
//! A single pass over the lines with three states. `@name[N]:` opens a facet
//! block, the first pipe line is its header, the separator line starts the data
//! rows and a blank line inside the data rows closes the block.

use crate::document::Document;
use crate::error::{Result, TqlError};
use crate::row::{Fields, Row};
use crate::schema::{FacetKind, INDEX_COLUMN};
use crate::table;
use regex::Regex;
use std::sync::LazyLock;

static FACET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(\w+)\[(\d+)\]:").expect("valid facet marker pattern"));

/// Parser settings
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Reject facet blocks whose `[N]` disagrees with the rows they contain
    pub validate_row_counts: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            validate_row_counts: true,
        }
    }
}

impl ParseOptions {
    pub fn lenient() -> Self {
        Self {
            validate_row_counts: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    HeaderPending,
    InTable,
}

/// The facet block currently being read
#[derive(Debug)]
struct OpenBlock {
    name: String,
    kind: Option<FacetKind>,
    declared: usize,
    headers: Vec<String>,
    rows: usize,
}

/// Split an `@name[N]:` line into its name and declared count
pub(crate) fn facet_marker(line: &str) -> Option<(String, &str)> {
    let caps = FACET_MARKER.captures(line)?;
    let count = caps.get(2)?.as_str();
    Some((caps[1].to_string(), count))
}

/// Parse TQL text with default options
pub fn parse_document(text: &str) -> Result<Document> {
    parse_document_with(text, &ParseOptions::default())
}

pub fn parse_document_with(text: &str, options: &ParseOptions) -> Result<Document> {
    let mut doc = Document::new();
    let mut state = State::Scanning;
    let mut open: Option<OpenBlock> = None;
    let mut blocks = 0usize;

    for (number, raw) in text.lines().enumerate() {
        let line_no = number + 1;
        let line = raw.trim();

        if let Some((name, count)) = facet_marker(line) {
            close_block(open.take(), options)?;
            let declared = count.parse::<usize>().map_err(|_| {
                TqlError::parse(line_no, format!("row count '{count}' out of range"))
            })?;
            let kind = FacetKind::from_marker(&name);
            if kind.is_none() {
                log::warn!("Ignoring unknown facet @{name} on line {line_no}");
            }
            open = Some(OpenBlock {
                name,
                kind,
                declared,
                headers: Vec::new(),
                rows: 0,
            });
            state = State::HeaderPending;
            blocks += 1;
            continue;
        }

        if line.is_empty() {
            if state == State::InTable {
                close_block(open.take(), options)?;
                state = State::Scanning;
            }
            continue;
        }

        let Some(block) = open.as_mut() else {
            continue;
        };
        if !table::is_table_line(line) {
            continue;
        }
        if table::is_separator(line) {
            state = State::InTable;
            continue;
        }

        match state {
            State::HeaderPending => {
                if block.headers.is_empty() {
                    block.headers = table::parse_table_line(line);
                }
            }
            State::InTable => {
                block.rows += 1;
                if let Some(kind) = block.kind {
                    let row = build_row(&doc, kind, &block.headers, line, line_no)?;
                    doc.push_row(kind, row);
                }
            }
            State::Scanning => {}
        }
    }
    close_block(open.take(), options)?;

    log::debug!("Parsed {blocks} facet blocks ({} rows)", doc.total_rows());
    Ok(doc)
}

fn build_row(
    doc: &Document,
    kind: FacetKind,
    headers: &[String],
    line: &str,
    line_no: usize,
) -> Result<Row> {
    let cells = table::parse_table_line(line);
    let mut fields = Fields::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        fields.insert(header.clone(), cells.get(i).cloned().unwrap_or_default());
    }

    let index = match fields.get(INDEX_COLUMN) {
        Some(value) => value
            .parse::<usize>()
            .ok()
            .filter(|index| *index > 0)
            .ok_or_else(|| {
                TqlError::parse(
                    line_no,
                    format!("invalid row index '{value}' in @{}", kind.name()),
                )
            })?,
        // Older files were written without an index column
        None => doc.facet(kind).len() + 1,
    };

    Ok(Row::for_facet(kind, index, fields))
}

fn close_block(block: Option<OpenBlock>, options: &ParseOptions) -> Result<()> {
    let Some(block) = block else {
        return Ok(());
    };
    if options.validate_row_counts && block.kind.is_some() && block.declared != block.rows {
        return Err(TqlError::RowCountMismatch {
            facet: block.name,
            declared: block.declared,
            actual: block.rows,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate_document, generate_from_source, GenerateOptions};
    use crate::row::fields;
    use crate::source::SourceTable;

    const SAMPLE: &str = "@table[2]:
| index | transfer_id | amount |
|-------|-------------|--------|
| 1     | t-1         | 10     |
| 2     | t-2         | 25     |

@context[1]:
| index | key           | value |
|-------|---------------|-------|
| 1     | user_timezone | MST   |";

    #[test]
    fn test_parse_sample() {
        let doc = parse_document(SAMPLE).unwrap();
        let anchor = doc.facet(FacetKind::Table);
        assert_eq!(anchor.len(), 2);
        assert_eq!(anchor.rows()[1].value("transfer_id"), "t-2");
        assert_eq!(anchor.rows()[1].index, 2);

        let context = doc.facet(FacetKind::Context);
        assert_eq!(context.rows()[0].value("value"), "MST");
        assert!(doc.facet(FacetKind::Meaning).is_empty());
    }

    #[test]
    fn test_round_trip_sparse() {
        let doc = parse_document(SAMPLE).unwrap();
        assert_eq!(generate_document(&doc), SAMPLE);
        assert_eq!(parse_document(&generate_document(&doc)).unwrap(), doc);
    }

    #[test]
    fn test_round_trip_dense() {
        let source = SourceTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["x".to_string(), "y".to_string()]],
        );
        let text = generate_from_source(&source, &GenerateOptions::default());
        let doc = parse_document(&text).unwrap();
        assert_eq!(doc, Document::from_source(&source));
    }

    #[test]
    fn test_unknown_facet_is_dropped() {
        let text = "@glossary[1]:
| index | term |
|-------|------|
| 1     | foo  |

@context[1]:
| index | key | value |
|-------|-----|-------|
| 1     | k   | v     |";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.total_rows(), 1);
        assert_eq!(doc.facet(FacetKind::Context).rows()[0].value("key"), "k");
    }

    #[test]
    fn test_declared_count_is_validated() {
        let text = "@context[2]:
| index | key | value |
|-------|-----|-------|
| 1     | k   | v     |";
        let err = parse_document(text).unwrap_err();
        assert!(matches!(
            err,
            TqlError::RowCountMismatch {
                declared: 2,
                actual: 1,
                ..
            }
        ));

        let doc = parse_document_with(text, &ParseOptions::lenient()).unwrap();
        assert_eq!(doc.facet(FacetKind::Context).len(), 1);
    }

    #[test]
    fn test_legacy_data_facet_without_index() {
        let text = "@data[2]:
| name  | age |
|-------|-----|
| Alice | 30  |
| Bob   | 25  |

@meaning[2]:
| column | definition | user_confirmed |
|--------|------------|----------------|
| name   |            |                |
| age    | Years      |                |";
        let doc = parse_document(text).unwrap();
        let anchor = doc.facet(FacetKind::Table);
        assert_eq!(anchor.rows()[1].index, 2);
        assert_eq!(anchor.rows()[1].fields, fields([("name", "Bob"), ("age", "25")]));
        assert_eq!(doc.facet(FacetKind::Meaning).rows()[1].value("definition"), "Years");
    }

    #[test]
    fn test_invalid_index_is_a_parse_error() {
        let text = "@context[1]:
| index | key | value |
|-------|-----|-------|
| one   | k   | v     |";
        match parse_document(text).unwrap_err() {
            TqlError::Parse { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_line_before_header_is_ignored() {
        let text = "@score[1]:

| index | measure | value |
|-------|---------|-------|
| 1     | m       | 0.5   |";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.facet(FacetKind::Score).rows()[0].value("value"), "0.5");
    }

    #[test]
    fn test_missing_cells_become_blank() {
        let text = "@context[1]:
| index | key | value |
|-------|-----|-------|
| 1     | k |";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.facet(FacetKind::Context).rows()[0].value("value"), "");
    }
}
