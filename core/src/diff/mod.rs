//! Structural diff between two documents
//!
//! Two documents may only be compared when their anchor facets hold exactly the
//! same rows: a diff describes a change of interpretation of one dataset, never a
//! change of dataset.

pub mod format;

use crate::document::{Document, Facet};
use crate::error::{Result, TqlError};
use crate::row::Row;
use crate::schema::{FacetKind, INDEX_COLUMN};
use indexmap::IndexMap;
use serde::Serialize;

pub use format::{deserialize_diff, serialize_diff, DiffFormat};

/// Facet-level outcome of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetStatus {
    Unchanged,
    Added,
    Removed,
    Modified,
}

impl FacetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FacetStatus::Unchanged => "unchanged",
            FacetStatus::Added => "added",
            FacetStatus::Removed => "removed",
            FacetStatus::Modified => "modified",
        }
    }
}

/// One row-level change, keyed by the row's `index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RowChange {
    Added {
        index: usize,
        after: Row,
    },
    Removed {
        index: usize,
        before: Row,
    },
    Modified {
        index: usize,
        before: Row,
        after: Row,
        #[serde(rename = "modifiedFields")]
        modified_fields: Vec<String>,
    },
}

impl RowChange {
    pub fn index(&self) -> usize {
        match self {
            RowChange::Added { index, .. }
            | RowChange::Removed { index, .. }
            | RowChange::Modified { index, .. } => *index,
        }
    }

    pub fn before(&self) -> Option<&Row> {
        match self {
            RowChange::Added { .. } => None,
            RowChange::Removed { before, .. } | RowChange::Modified { before, .. } => Some(before),
        }
    }

    pub fn after(&self) -> Option<&Row> {
        match self {
            RowChange::Removed { .. } => None,
            RowChange::Added { after, .. } | RowChange::Modified { after, .. } => Some(after),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RowChange::Added { .. } => "added",
            RowChange::Removed { .. } => "removed",
            RowChange::Modified { .. } => "modified",
        }
    }
}

/// Comparison of one facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetDiff {
    #[serde(rename = "facetName")]
    pub facet: FacetKind,
    pub rows_before: usize,
    pub rows_after: usize,
    pub status: FacetStatus,
    pub changes: Vec<RowChange>,
}

impl FacetDiff {
    pub fn unchanged(facet: FacetKind) -> Self {
        Self {
            facet,
            rows_before: 0,
            rows_after: 0,
            status: FacetStatus::Unchanged,
            changes: Vec::new(),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.status != FacetStatus::Unchanged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub total_facets_changed: usize,
    pub total_facets_unchanged: usize,
    pub total_row_changes: usize,
}

impl DiffSummary {
    pub fn from_facets(facets: &[FacetDiff]) -> Self {
        let changed = facets.iter().filter(|f| f.has_changes()).count();
        Self {
            total_facets_changed: changed,
            total_facets_unchanged: facets.len() - changed,
            total_row_changes: facets.iter().map(|f| f.changes.len()).sum(),
        }
    }
}

/// Facet-by-facet comparison of two documents, always covering all nine facets.
///
/// A diff computed by [`compute_diff`] is the source of truth. The text form
/// produced by [`serialize_diff`] is a display format: reading it back with
/// [`deserialize_diff`] loses `modified_fields`, row counts and the
/// added/removed facet statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub facets: Vec<FacetDiff>,
    pub summary: DiffSummary,
}

impl Diff {
    pub fn from_facets(facets: Vec<FacetDiff>) -> Self {
        let summary = DiffSummary::from_facets(&facets);
        Self { facets, summary }
    }

    pub fn facet(&self, kind: FacetKind) -> Option<&FacetDiff> {
        self.facets.iter().find(|f| f.facet == kind)
    }

    pub fn changed_facets(&self) -> impl Iterator<Item = &FacetDiff> {
        self.facets.iter().filter(|f| f.has_changes())
    }

    pub fn has_changes(&self) -> bool {
        self.summary.total_facets_changed > 0
    }

    /// Pretty-printed JSON of the structured form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compare `before` with `after`.
///
/// Fails with `AnchorMismatch` when the anchor facets differ in any way.
pub fn compute_diff(before: &Document, after: &Document) -> Result<Diff> {
    if before.anchor_rows() != after.anchor_rows() {
        return Err(TqlError::AnchorMismatch);
    }

    let facets = FacetKind::ALL
        .into_iter()
        .map(|kind| diff_facet(before.facet(kind), after.facet(kind)))
        .collect();
    let diff = Diff::from_facets(facets);

    log::debug!(
        "Computed diff: {} facets changed, {} row changes",
        diff.summary.total_facets_changed,
        diff.summary.total_row_changes
    );
    Ok(diff)
}

fn diff_facet(before: &Facet, after: &Facet) -> FacetDiff {
    let before_rows = index_rows(before.rows());
    let after_rows = index_rows(after.rows());

    let mut indices: Vec<usize> = before_rows.keys().copied().collect();
    indices.sort_unstable();
    indices.extend(after_rows.keys().filter(|i| !before_rows.contains_key(*i)));

    let mut changes = Vec::new();
    for index in indices {
        match (before_rows.get(&index), after_rows.get(&index)) {
            (None, Some(after_row)) => changes.push(RowChange::Added {
                index,
                after: (*after_row).clone(),
            }),
            (Some(before_row), None) => changes.push(RowChange::Removed {
                index,
                before: (*before_row).clone(),
            }),
            (Some(before_row), Some(after_row)) => {
                let modified_fields = modified_fields(before_row, after_row);
                if !modified_fields.is_empty() {
                    changes.push(RowChange::Modified {
                        index,
                        before: (*before_row).clone(),
                        after: (*after_row).clone(),
                        modified_fields,
                    });
                }
            }
            (None, None) => {}
        }
    }

    let status = if before.is_empty() && !after.is_empty() {
        FacetStatus::Added
    } else if !before.is_empty() && after.is_empty() {
        FacetStatus::Removed
    } else if !changes.is_empty() {
        FacetStatus::Modified
    } else {
        FacetStatus::Unchanged
    };

    FacetDiff {
        facet: before.kind(),
        rows_before: before.len(),
        rows_after: after.len(),
        status,
        changes,
    }
}

/// Rows keyed by `index`; a repeated index keeps its first position and its last row
fn index_rows(rows: &[Row]) -> IndexMap<usize, &Row> {
    let mut map = IndexMap::with_capacity(rows.len());
    for row in rows {
        map.insert(row.index, row);
    }
    map
}

/// Names of the fields whose values differ, `index` excluded.
///
/// Keys of `after` come first, then keys only present in `before`. A key absent
/// on one side counts as a difference.
pub fn modified_fields(before: &Row, after: &Row) -> Vec<String> {
    let keys = after
        .fields
        .keys()
        .chain(before.fields.keys().filter(|k| !after.fields.contains_key(*k)));

    keys.filter(|key| key.as_str() != INDEX_COLUMN)
        .filter(|key| before.get(key) != after.get(key))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crud;
    use crate::row::fields;

    fn anchored() -> Document {
        let mut doc = Document::new();
        doc.push_row(
            FacetKind::Table,
            Row::for_facet(FacetKind::Table, 1, fields([("a", "x")])),
        );
        doc
    }

    #[test]
    fn test_meaning_added_scenario() {
        let before = anchored();
        let mut after = before.clone();
        crud::insert_row(
            &mut after,
            FacetKind::Meaning,
            fields([("column", "a"), ("definition", "foo")]),
        )
        .unwrap();

        let diff = compute_diff(&before, &after).unwrap();
        assert_eq!(diff.facets.len(), 9);

        let meaning = diff.facet(FacetKind::Meaning).unwrap();
        assert_eq!(meaning.rows_before, 0);
        assert_eq!(meaning.rows_after, 1);
        assert_eq!(meaning.status, FacetStatus::Added);
        assert_eq!(meaning.changes.len(), 1);
        match &meaning.changes[0] {
            RowChange::Added { index, after } => {
                assert_eq!(*index, 1);
                assert_eq!(after.value("definition"), "foo");
            }
            other => panic!("unexpected change: {other:?}"),
        }

        for facet in diff.facets.iter().filter(|f| f.facet != FacetKind::Meaning) {
            assert_eq!(facet.status, FacetStatus::Unchanged);
            assert!(facet.changes.is_empty());
        }
        assert_eq!(diff.summary.total_facets_changed, 1);
        assert_eq!(diff.summary.total_facets_unchanged, 8);
        assert_eq!(diff.summary.total_row_changes, 1);
    }

    #[test]
    fn test_anchor_mismatch_fails_fast() {
        let before = anchored();
        let mut after = Document::new();
        after.push_row(
            FacetKind::Table,
            Row::for_facet(FacetKind::Table, 1, fields([("a", "y")])),
        );
        assert!(matches!(
            compute_diff(&before, &after),
            Err(TqlError::AnchorMismatch)
        ));
    }

    #[test]
    fn test_anchor_column_order_matters() {
        let mut before = Document::new();
        before.push_row(
            FacetKind::Table,
            Row::for_facet(FacetKind::Table, 1, fields([("a", "x"), ("b", "y")])),
        );
        let mut after = Document::new();
        after.push_row(
            FacetKind::Table,
            Row::for_facet(FacetKind::Table, 1, fields([("b", "y"), ("a", "x")])),
        );
        assert!(matches!(
            compute_diff(&before, &after),
            Err(TqlError::AnchorMismatch)
        ));
    }

    #[test]
    fn test_before_indices_are_visited_in_ascending_order() {
        let mut before = anchored();
        for index in [3, 1] {
            before.push_row(
                FacetKind::Context,
                Row::for_facet(FacetKind::Context, index, fields([("key", "k")])),
            );
        }
        let mut after = anchored();
        after.push_row(
            FacetKind::Context,
            Row::for_facet(FacetKind::Context, 2, fields([("key", "k")])),
        );

        let diff = compute_diff(&before, &after).unwrap();
        let kinds: Vec<(usize, &str)> = diff
            .facet(FacetKind::Context)
            .unwrap()
            .changes
            .iter()
            .map(|c| (c.index(), c.kind()))
            .collect();
        assert_eq!(kinds, vec![(1, "removed"), (3, "removed"), (2, "added")]);
    }

    #[test]
    fn test_single_field_modification() {
        let mut before = anchored();
        crud::insert_row(
            &mut before,
            FacetKind::Context,
            fields([("key", "tz"), ("value", "MST")]),
        )
        .unwrap();
        let mut after = before.clone();
        crud::update_row(&mut after, FacetKind::Context, 1, fields([("value", "PST")])).unwrap();

        let diff = compute_diff(&before, &after).unwrap();
        let context = diff.facet(FacetKind::Context).unwrap();
        assert_eq!(context.status, FacetStatus::Modified);
        assert_eq!(context.changes.len(), 1);
        match &context.changes[0] {
            RowChange::Modified {
                modified_fields, ..
            } => assert_eq!(modified_fields, &vec!["value".to_string()]),
            other => panic!("unexpected change: {other:?}"),
        }
    }

    #[test]
    fn test_removed_facet_and_ordering() {
        let mut before = anchored();
        crud::insert_rows(
            &mut before,
            FacetKind::Tasks,
            vec![fields([("name", "one")]), fields([("name", "two")])],
        )
        .unwrap();
        let mut after = before.clone();
        crud::delete_rows(&mut after, FacetKind::Tasks, &[1, 2]).unwrap();

        let diff = compute_diff(&before, &after).unwrap();
        let tasks = diff.facet(FacetKind::Tasks).unwrap();
        assert_eq!(tasks.status, FacetStatus::Removed);
        let indices: Vec<usize> = tasks.changes.iter().map(RowChange::index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_before_indices_come_first() {
        let mut before = anchored();
        crud::insert_rows(
            &mut before,
            FacetKind::Context,
            vec![fields([("key", "a")]), fields([("key", "b")])],
        )
        .unwrap();
        let mut after = before.clone();
        crud::delete_row(&mut after, FacetKind::Context, 1).unwrap();
        crud::insert_rows(
            &mut after,
            FacetKind::Context,
            vec![fields([("key", "c")]), fields([("key", "d")])],
        )
        .unwrap();

        let diff = compute_diff(&before, &after).unwrap();
        let kinds: Vec<(usize, &str)> = diff
            .facet(FacetKind::Context)
            .unwrap()
            .changes
            .iter()
            .map(|c| (c.index(), c.kind()))
            .collect();
        assert_eq!(kinds, vec![(1, "modified"), (2, "modified"), (3, "added")]);
    }

    #[test]
    fn test_missing_key_counts_as_modified() {
        let before = Row::new(1, fields([("key", "a"), ("value", "")]));
        let after = Row::new(1, fields([("key", "a")]));
        assert_eq!(modified_fields(&before, &after), vec!["value".to_string()]);
        assert!(modified_fields(&before, &before).is_empty());
    }

    #[test]
    fn test_identical_documents_are_unchanged() {
        let doc = anchored();
        let diff = compute_diff(&doc, &doc.clone()).unwrap();
        assert!(!diff.has_changes());
        assert_eq!(diff.summary.total_facets_unchanged, 9);
    }

    #[test]
    fn test_json_structured_form() {
        let before = anchored();
        let mut after = before.clone();
        crud::insert_row(&mut after, FacetKind::Score, fields([("measure", "m")])).unwrap();
        let diff = compute_diff(&before, &after).unwrap();

        let json: serde_json::Value = serde_json::from_str(&diff.to_json().unwrap()).unwrap();
        let score = &json["facets"][8];
        assert_eq!(score["facetName"], "score");
        assert_eq!(score["rowsBefore"], 0);
        assert_eq!(score["status"], "added");
        assert_eq!(score["changes"][0]["type"], "added");
        assert_eq!(score["changes"][0]["after"]["measure"], "m");
        assert_eq!(json["summary"]["totalRowChanges"], 1);
    }
}
