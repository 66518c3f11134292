//! Document → TQL text

use crate::document::{Document, Facet};
use crate::schema::{Columns, FacetKind, INDEX_COLUMN};
use crate::source::SourceTable;
use crate::table;

/// Options for generating a document from source data
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Facets to emit; canonical order is always kept
    pub facets: Vec<FacetKind>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            facets: FacetKind::ALL.to_vec(),
        }
    }
}

/// Generate TQL text for a fresh document built from source data.
///
/// Dense output: every selected facet is written, empty ones as a 0-row table.
pub fn generate_from_source(source: &SourceTable, options: &GenerateOptions) -> String {
    let doc = Document::from_source(source);
    generate_dense(&doc, &source.headers, &options.facets)
}

/// Generate TQL text for an edited document, omitting facets without rows.
pub fn generate_document(doc: &Document) -> String {
    let blocks: Vec<String> = doc
        .facets()
        .filter(|facet| !facet.is_empty())
        .map(|facet| render_facet(facet, &[]))
        .collect();
    log::debug!("Generated {} facet blocks ({} rows)", blocks.len(), doc.total_rows());
    blocks.join("\n\n")
}

/// Generate every facet listed in `facets`, including empty ones.
///
/// `anchor_headers` supplies the anchor columns when the anchor facet is empty.
pub fn generate_dense(doc: &Document, anchor_headers: &[String], facets: &[FacetKind]) -> String {
    FacetKind::ALL
        .into_iter()
        .filter(|kind| facets.contains(kind))
        .map(|kind| render_facet(doc.facet(kind), anchor_headers))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The `@name[N]:` marker line
pub fn facet_marker(kind: FacetKind, count: usize) -> String {
    format!("@{}[{}]:", kind.name(), count)
}

/// Columns written for a facet: `index`, the schema (or first-seen anchor)
/// columns, then any extra columns carried by rows.
pub fn facet_headers(facet: &Facet, anchor_hint: &[String]) -> Vec<String> {
    let mut headers = vec![INDEX_COLUMN.to_string()];

    match facet.kind().columns() {
        Columns::Fixed(_) => {
            for column in facet.kind().value_columns() {
                push_unique(&mut headers, column);
            }
        }
        Columns::Derived => {
            if facet.is_empty() {
                for column in anchor_hint {
                    push_unique(&mut headers, column);
                }
            }
        }
    }

    for row in facet.rows() {
        for column in row.fields.keys() {
            push_unique(&mut headers, column);
        }
    }

    headers
}

fn push_unique(headers: &mut Vec<String>, column: &str) {
    if !headers.iter().any(|h| h == column) {
        headers.push(column.to_string());
    }
}

fn render_facet(facet: &Facet, anchor_hint: &[String]) -> String {
    let headers = facet_headers(facet, anchor_hint);
    let cells: Vec<Vec<String>> = facet
        .rows()
        .iter()
        .map(|row| headers.iter().map(|h| row.cell(h)).collect())
        .collect();

    let mut lines = vec![facet_marker(facet.kind(), facet.len())];
    lines.extend(table::render_table(&headers, &cells));
    lines.join("\n")
}
