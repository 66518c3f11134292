//! Facet schema registry
//!
//! Every TQL document carries the same nine facets. Eight of them have a fixed
//! column list; the anchor facet (`@table`) mirrors the headers of the source
//! data it was created from.

use crate::error::{Result, TqlError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Name of the mandatory row position column present in every facet
pub const INDEX_COLUMN: &str = "index";

/// Measures seeded into `@score` when a document is created from source data
pub const DEFAULT_SCORE_MEASURES: [&str; 4] = [
    "range-values",
    "number-of-interpretations",
    "Uncertainty Ratio (UR)",
    "Missing Certainty Ratio",
];

const MEANING_COLUMNS: &[&str] = &["index", "column", "definition", "user_confirmed"];
const STRUCTURE_COLUMNS: &[&str] = &[
    "index",
    "column",
    "nullAllowed",
    "dataType",
    "minValue",
    "maxValue",
    "format",
    "user_confirmed",
];
const AMBIGUITY_COLUMNS: &[&str] = &["index", "query_trigger", "ambiguity_type", "ambiguity_risk"];
const INTENT_COLUMNS: &[&str] = &[
    "index",
    "query_trigger",
    "clarifying_question",
    "options",
    "user_response",
    "user_confirmed",
];
const CONTEXT_COLUMNS: &[&str] = &["index", "key", "value"];
const QUERY_COLUMNS: &[&str] = &["index", "user_message", "timestamp_utc"];
const TASKS_COLUMNS: &[&str] = &["index", "name", "description", "formula"];
const SCORE_COLUMNS: &[&str] = &["index", "measure", "value"];

/// The nine facet kinds, declared in canonical document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FacetKind {
    Table,
    Meaning,
    Structure,
    Ambiguity,
    Intent,
    Context,
    Query,
    Tasks,
    Score,
}

/// Column layout of a facet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Columns {
    /// Columns come from the source data headers
    Derived,
    /// Fixed, ordered column list (including `index`)
    Fixed(&'static [&'static str]),
}

impl FacetKind {
    pub const ALL: [FacetKind; 9] = [
        FacetKind::Table,
        FacetKind::Meaning,
        FacetKind::Structure,
        FacetKind::Ambiguity,
        FacetKind::Intent,
        FacetKind::Context,
        FacetKind::Query,
        FacetKind::Tasks,
        FacetKind::Score,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FacetKind::Table => "table",
            FacetKind::Meaning => "meaning",
            FacetKind::Structure => "structure",
            FacetKind::Ambiguity => "ambiguity",
            FacetKind::Intent => "intent",
            FacetKind::Context => "context",
            FacetKind::Query => "query",
            FacetKind::Tasks => "tasks",
            FacetKind::Score => "score",
        }
    }

    pub fn columns(self) -> Columns {
        match self {
            FacetKind::Table => Columns::Derived,
            FacetKind::Meaning => Columns::Fixed(MEANING_COLUMNS),
            FacetKind::Structure => Columns::Fixed(STRUCTURE_COLUMNS),
            FacetKind::Ambiguity => Columns::Fixed(AMBIGUITY_COLUMNS),
            FacetKind::Intent => Columns::Fixed(INTENT_COLUMNS),
            FacetKind::Context => Columns::Fixed(CONTEXT_COLUMNS),
            FacetKind::Query => Columns::Fixed(QUERY_COLUMNS),
            FacetKind::Tasks => Columns::Fixed(TASKS_COLUMNS),
            FacetKind::Score => Columns::Fixed(SCORE_COLUMNS),
        }
    }

    /// Fixed value columns, without `index`. Empty for the anchor facet.
    pub fn value_columns(self) -> &'static [&'static str] {
        match self.columns() {
            Columns::Derived => &[],
            Columns::Fixed(columns) => &columns[1..],
        }
    }

    pub fn is_anchor(self) -> bool {
        matches!(self, FacetKind::Table)
    }

    /// Position in canonical order
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Resolve the name found in an `@name[N]:` marker.
    ///
    /// Unknown names yield `None`; `data` is the legacy spelling of `table`.
    pub fn from_marker(name: &str) -> Option<FacetKind> {
        match name {
            "data" => Some(FacetKind::Table),
            _ => FacetKind::ALL.into_iter().find(|kind| kind.name() == name),
        }
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FacetKind {
    type Err = TqlError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().trim_start_matches('@');
        FacetKind::from_marker(name).ok_or_else(|| TqlError::UnknownFacet {
            name: s.to_string(),
        })
    }
}

impl Serialize for FacetKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for FacetKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a comma-separated facet list such as `table,meaning,score`
pub fn parse_facet_list(list: &str) -> Result<Vec<FacetKind>> {
    let mut facets = Vec::new();
    for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let kind: FacetKind = name.parse()?;
        if !facets.contains(&kind) {
            facets.push(kind);
        }
    }
    facets.sort();
    Ok(facets)
}
