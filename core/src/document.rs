//! In-memory TQL document model

use crate::row::{Fields, Row};
use crate::schema::{FacetKind, DEFAULT_SCORE_MEASURES};
use crate::source::SourceTable;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

/// One named table of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    kind: FacetKind,
    rows: Vec<Row>,
}

impl Facet {
    pub fn new(kind: FacetKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn kind(&self) -> FacetKind {
        self.kind
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look a row up by its `index` value (not by position)
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.iter().find(|row| row.index == index)
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub(crate) fn position_of(&self, index: usize) -> Option<usize> {
        self.rows.iter().position(|row| row.index == index)
    }

    /// Renumber rows to `1..=len`
    pub(crate) fn reindex(&mut self) {
        for (position, row) in self.rows.iter_mut().enumerate() {
            row.index = position + 1;
        }
    }
}

impl Serialize for Facet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Facet", 1)?;
        state.serialize_field("rows", &self.rows)?;
        state.end()
    }
}

/// A single TQL snapshot: exactly one facet of each kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    facets: [Facet; 9],
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document
    pub fn new() -> Self {
        Self {
            facets: FacetKind::ALL.map(Facet::new),
        }
    }

    /// Document freshly created from source data.
    ///
    /// The anchor facet holds the source rows, `@meaning` and `@structure` get
    /// one blank row per source column, and `@score` the default measures.
    pub fn from_source(source: &SourceTable) -> Self {
        let mut doc = Self::new();

        for (position, cells) in source.rows.iter().enumerate() {
            let fields: Fields = source
                .headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), cells.get(i).cloned().unwrap_or_default()))
                .collect();
            doc.push_row(FacetKind::Table, Row::for_facet(FacetKind::Table, position + 1, fields));
        }

        for (position, header) in source.headers.iter().enumerate() {
            for kind in [FacetKind::Meaning, FacetKind::Structure] {
                let fields = crate::row::fields([("column", header.as_str())]);
                doc.push_row(kind, Row::for_facet(kind, position + 1, fields));
            }
        }

        for (position, measure) in DEFAULT_SCORE_MEASURES.iter().enumerate() {
            let fields = crate::row::fields([("measure", *measure)]);
            doc.push_row(
                FacetKind::Score,
                Row::for_facet(FacetKind::Score, position + 1, fields),
            );
        }

        doc
    }

    pub fn facet(&self, kind: FacetKind) -> &Facet {
        &self.facets[kind.ordinal()]
    }

    pub fn facets(&self) -> impl Iterator<Item = &Facet> {
        self.facets.iter()
    }

    /// Rows of the anchor facet
    pub fn anchor_rows(&self) -> &[Row] {
        self.facet(FacetKind::Table).rows()
    }

    pub fn total_rows(&self) -> usize {
        self.facets.iter().map(Facet::len).sum()
    }

    pub(crate) fn facet_mut(&mut self, kind: FacetKind) -> &mut Facet {
        &mut self.facets[kind.ordinal()]
    }

    pub(crate) fn push_row(&mut self, kind: FacetKind, row: Row) {
        self.facet_mut(kind).rows.push(row);
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.facets.len()))?;
        for facet in &self.facets {
            map.serialize_entry(facet.kind.name(), facet)?;
        }
        map.end()
    }
}
