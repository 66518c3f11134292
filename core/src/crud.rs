//! Row mutators
//!
//! The only write path into a [`Document`]. Every structural change leaves the
//! facet numbered `1..=len`.

use crate::document::Document;
use crate::error::{Result, TqlError};
use crate::row::{Fields, Row};
use crate::schema::{FacetKind, INDEX_COLUMN};

/// Append a row; its index is the facet's new length. Returns the assigned index.
pub fn insert_row(doc: &mut Document, facet: FacetKind, fields: Fields) -> Result<usize> {
    let index = doc.facet(facet).len() + 1;
    doc.push_row(facet, Row::for_facet(facet, index, fields));
    Ok(index)
}

/// Append several rows in order. Returns the assigned indices.
pub fn insert_rows(doc: &mut Document, facet: FacetKind, batch: Vec<Fields>) -> Result<Vec<usize>> {
    let mut next = doc.facet(facet).len() + 1;
    let mut assigned = Vec::with_capacity(batch.len());
    for fields in batch {
        doc.push_row(facet, Row::for_facet(facet, next, fields));
        assigned.push(next);
        next += 1;
    }
    Ok(assigned)
}

/// Remove the row whose `index` equals `index`, then renumber the facet.
pub fn delete_row(doc: &mut Document, facet: FacetKind, index: usize) -> Result<Row> {
    let target = doc.facet_mut(facet);
    let position = target
        .position_of(index)
        .ok_or_else(|| row_not_found(facet, vec![index]))?;
    let removed = target.rows_mut().remove(position);
    target.reindex();
    Ok(removed)
}

/// Remove every listed row that exists, then renumber once.
///
/// Indices that are not present are skipped; the call only fails when none of
/// them exist. Returns the number of rows removed.
pub fn delete_rows(doc: &mut Document, facet: FacetKind, indices: &[usize]) -> Result<usize> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();

    let target = doc.facet_mut(facet);
    let mut deleted = 0;
    for index in &sorted {
        if let Some(position) = target.position_of(*index) {
            target.rows_mut().remove(position);
            deleted += 1;
        }
    }

    if deleted == 0 {
        return Err(row_not_found(facet, sorted.into_iter().rev().collect()));
    }
    target.reindex();

    log::debug!("Deleted {deleted} of {} requested rows from @{facet}", indices.len());
    Ok(deleted)
}

/// Merge `changes` over the row with the given index. The index itself is kept.
pub fn update_row(doc: &mut Document, facet: FacetKind, index: usize, changes: Fields) -> Result<()> {
    let target = doc.facet_mut(facet);
    let position = target
        .position_of(index)
        .ok_or_else(|| row_not_found(facet, vec![index]))?;

    let row = &mut target.rows_mut()[position];
    let mut merged = std::mem::take(&mut row.fields);
    for (column, value) in changes {
        if column != INDEX_COLUMN {
            merged.insert(column, value);
        }
    }
    // Re-shaped so that blanking an extra column removes it
    *row = Row::for_facet(facet, index, merged);
    Ok(())
}

fn row_not_found(facet: FacetKind, indices: Vec<usize>) -> TqlError {
    TqlError::RowNotFound {
        facet: facet.name().to_string(),
        indices,
    }
}
