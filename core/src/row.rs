//! Facet rows

use crate::schema::{Columns, FacetKind, INDEX_COLUMN};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Ordered column → value pairs of a row, excluding `index`
pub type Fields = IndexMap<String, String>;

/// One row of a facet: a 1-based position plus its values
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub index: usize,
    pub fields: Fields,
}

/// Rows are equal when their index, columns, column order and values all match
impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.fields.iter().eq(other.fields.iter())
    }
}

impl Eq for Row {}

impl Row {
    pub fn new(index: usize, fields: Fields) -> Self {
        Self { index, fields }
    }

    /// Build a row shaped for `kind`.
    ///
    /// Fixed facets get their schema columns first (blank when absent), followed
    /// by any non-empty extra columns in the order given. Anchor rows keep
    /// `fields` as is. An `index` key inside `fields` is discarded.
    ///
    /// An extra column is written into the header of the whole facet, so the
    /// other rows read it back as a blank cell; an empty extra is never stored.
    pub fn for_facet(kind: FacetKind, index: usize, mut fields: Fields) -> Self {
        fields.shift_remove(INDEX_COLUMN);
        let fields = match kind.columns() {
            Columns::Derived => fields,
            Columns::Fixed(_) => {
                let mut shaped = Fields::with_capacity(fields.len());
                for column in kind.value_columns() {
                    let value = fields.shift_remove(*column).unwrap_or_default();
                    shaped.insert((*column).to_string(), value);
                }
                shaped.extend(fields.into_iter().filter(|(_, value)| !value.is_empty()));
                shaped
            }
        };
        Self { index, fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Value of `column`, or an empty string when the row has no such column
    pub fn value(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    /// Rendered cell for `column`, including the `index` column
    pub fn cell(&self, column: &str) -> String {
        if column == INDEX_COLUMN {
            self.index.to_string()
        } else {
            self.value(column).to_string()
        }
    }

    /// Column names in row order, `index` first
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once(INDEX_COLUMN.to_string())
            .chain(self.fields.keys().cloned())
            .collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(INDEX_COLUMN, &self.index)?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Build a `Fields` map from `(column, value)` pairs
pub fn fields<K, V, I>(pairs: I) -> Fields
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
