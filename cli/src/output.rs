//! Output formatting utilities

use serde::Serialize;
use std::path::Path;
use tql_core::error::Result;
use tql_core::{Diff, Document, FacetKind, SourceTable};

/// One line of `tql history`
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistoryEntry {
    Document {
        index: usize,
        rows: usize,
        facets: Vec<FacetCount>,
    },
    Diff {
        from: usize,
        to: usize,
        facets_changed: Vec<FacetKind>,
        row_changes: usize,
    },
}

#[derive(Debug, Serialize)]
pub struct FacetCount {
    pub facet: FacetKind,
    pub rows: usize,
}

impl HistoryEntry {
    pub fn document(slot: usize, document: &Document) -> Self {
        HistoryEntry::Document {
            index: slot,
            rows: document.total_rows(),
            facets: document
                .facets()
                .filter(|f| !f.is_empty())
                .map(|f| FacetCount {
                    facet: f.kind(),
                    rows: f.len(),
                })
                .collect(),
        }
    }

    pub fn diff(from: usize, to: usize, diff: &Diff) -> Self {
        HistoryEntry::Diff {
            from,
            to,
            facets_changed: diff.changed_facets().map(|f| f.facet).collect(),
            row_changes: diff.summary.total_row_changes,
        }
    }
}

/// Pretty printer for tql output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print the result of `tql create`
    pub fn print_created(output: &Path, facets: &[FacetKind], table: &SourceTable) {
        let names: Vec<String> = facets.iter().map(|f| format!("@{f}")).collect();
        println!("✅ Created {}", output.display());
        println!("├─ Facets: {}", names.join(", "));
        println!("├─ Data rows: {}", table.row_count());
        println!("└─ Columns: {}", table.column_count());
    }

    /// Print the document counts around a mutation and the diff it appended
    pub fn print_document_change(before: usize, after: usize) {
        println!("├─ Documents: {before} → {after}");
        println!(
            "└─ Diff: $diff[+{}→+{}]",
            before.saturating_sub(1),
            after.saturating_sub(1)
        );
    }

    /// Print the sequence of a conversation
    pub fn print_history(file: &Path, entries: &[HistoryEntry]) {
        println!("📜 History of {}", file.display());
        for (i, entry) in entries.iter().enumerate() {
            let prefix = if i == entries.len() - 1 {
                "└─"
            } else {
                "├─"
            };
            match entry {
                HistoryEntry::Document { index, rows, facets } => {
                    let counts: Vec<String> =
                        facets.iter().map(|c| format!("@{}[{}]", c.facet, c.rows)).collect();
                    println!("{prefix} #document[+{index}]: {rows} rows ({})", counts.join(", "));
                }
                HistoryEntry::Diff {
                    from,
                    to,
                    facets_changed,
                    row_changes,
                } => {
                    let names: Vec<String> = facets_changed.iter().map(|f| format!("@{f}")).collect();
                    let changed = if names.is_empty() {
                        "no changes".to_string()
                    } else {
                        names.join(", ")
                    };
                    println!("{prefix} $diff[+{from}→+{to}]: {row_changes} row changes ({changed})");
                }
            }
        }
    }
}

/// JSON formatter for tql output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tql_core::row::fields;
    use tql_core::{compute_diff, crud};

    #[test]
    fn test_history_entries() {
        let mut before = Document::new();
        crud::insert_row(&mut before, FacetKind::Table, fields([("a", "x")])).unwrap();
        let mut after = before.clone();
        crud::insert_row(&mut after, FacetKind::Context, fields([("key", "k")])).unwrap();

        let json = serde_json::to_value(HistoryEntry::document(1, &after)).unwrap();
        assert_eq!(json["type"], "document");
        assert_eq!(json["rows"], 2);
        assert_eq!(json["facets"][1]["facet"], "context");

        let diff = compute_diff(&before, &after).unwrap();
        let json = serde_json::to_value(HistoryEntry::diff(0, 1, &diff)).unwrap();
        assert_eq!(json["facets_changed"], serde_json::json!(["context"]));
        assert_eq!(json["row_changes"], 1);
    }
}
