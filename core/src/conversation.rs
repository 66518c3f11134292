//! Conversations: document snapshots interleaved with the diffs between them
//!
//! ```text
//! #conversation[2]:
//!
//! #document[+0]:
//! @table[1]:
//! ...
//!
//! $diff[+0→+1]:
//! @meaning[1]:
//! ...
//!
//! #document[+1]:
//! ...
//! ```
//!
//! Text without the `#conversation[N]:` header is a single bare document.

use crate::diff::{compute_diff, deserialize_diff, serialize_diff, Diff, DiffFormat};
use crate::document::Document;
use crate::error::{Result, TqlError};
use crate::generator::generate_document;
use crate::parser::{parse_document_with, ParseOptions};
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::LazyLock;

static CONVERSATION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#conversation\[(\d+)\]:$").expect("valid conversation header pattern")
});

static DOCUMENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#document\[\+(\d+)\]:$").expect("valid document marker pattern"));

static DIFF_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$diff\[\+(\d+)\s*(?:→|->)\s*\+(\d+)\]:$").expect("valid diff marker pattern")
});

/// One entry of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SequenceItem {
    Document {
        #[serde(rename = "index")]
        slot: usize,
        document: Document,
    },
    Diff {
        from: usize,
        to: usize,
        diff: Diff,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    sequence: Vec<SequenceItem>,
    legacy: bool,
}

impl Conversation {
    /// A conversation holding one bare document, written back without the wrapper
    pub fn from_document(document: Document) -> Self {
        Self {
            sequence: vec![SequenceItem::Document { slot: 0, document }],
            legacy: true,
        }
    }

    pub fn sequence(&self) -> &[SequenceItem] {
        &self.sequence
    }

    /// Whether the text had no `#conversation` header
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.sequence.iter().filter_map(|item| match item {
            SequenceItem::Document { document, .. } => Some(document),
            SequenceItem::Diff { .. } => None,
        })
    }

    /// `(from, to, diff)` for every stored diff, in sequence order
    pub fn diffs(&self) -> impl Iterator<Item = (usize, usize, &Diff)> {
        self.sequence.iter().filter_map(|item| match item {
            SequenceItem::Diff { from, to, diff } => Some((*from, *to, diff)),
            SequenceItem::Document { .. } => None,
        })
    }

    pub fn document_count(&self) -> usize {
        self.documents().count()
    }

    pub fn document(&self, slot: usize) -> Result<&Document> {
        self.documents()
            .nth(slot)
            .ok_or(TqlError::DocumentNotFound { slot })
    }

    /// The most recent snapshot
    pub fn latest(&self) -> Option<&Document> {
        self.documents().last()
    }

    /// Diff any two snapshots by slot
    pub fn diff_between(&self, from: usize, to: usize) -> Result<Diff> {
        compute_diff(self.document(from)?, self.document(to)?)
    }

    /// Run `mutation` on a copy of snapshot `from_slot` (the latest by default)
    /// and return a new conversation that ends with the diff and the new snapshot.
    ///
    /// `self` is left untouched; on any error no conversation is produced.
    pub fn apply_change<F>(&self, mutation: F, from_slot: Option<usize>) -> Result<Conversation>
    where
        F: FnOnce(&mut Document) -> Result<()>,
    {
        let count = self.document_count();
        let from = match from_slot {
            Some(slot) => slot,
            None => count
                .checked_sub(1)
                .ok_or(TqlError::DocumentNotFound { slot: 0 })?,
        };
        let base = self.document(from)?;

        let mut document = base.clone();
        mutation(&mut document)?;
        let diff = compute_diff(base, &document)?;

        let to = count;
        log::debug!(
            "Appending document +{to} ({} row changes from +{from})",
            diff.summary.total_row_changes
        );

        let mut sequence = self.sequence.clone();
        sequence.push(SequenceItem::Diff { from, to, diff });
        sequence.push(SequenceItem::Document { slot: to, document });
        Ok(Conversation {
            sequence,
            legacy: false,
        })
    }
}

impl Serialize for Conversation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Conversation", 2)?;
        state.serialize_field("count", &self.document_count())?;
        state.serialize_field("sequence", &self.sequence)?;
        state.end()
    }
}

/// Block being collected between two markers
enum Pending {
    Document { slot: usize },
    Diff { from: usize, to: usize },
}

pub fn parse_conversation(text: &str) -> Result<Conversation> {
    parse_conversation_with(text, &ParseOptions::default())
}

pub fn parse_conversation_with(text: &str, options: &ParseOptions) -> Result<Conversation> {
    let mut lines = text.lines().enumerate().skip_while(|(_, l)| l.trim().is_empty());

    let declared = match lines.next() {
        Some((_, first)) => CONVERSATION_HEADER
            .captures(first.trim())
            .map(|caps| parse_slot(&caps[1])),
        None => None,
    };
    let Some(declared) = declared else {
        let document = parse_document_with(text, options)?;
        return Ok(Conversation::from_document(document));
    };
    let declared = declared?;

    let mut sequence = Vec::new();
    let mut pending: Option<(Pending, usize)> = None;
    let mut body: Vec<&str> = Vec::new();

    for (number, raw) in lines {
        let line = raw.trim();
        let marker = if let Some(caps) = DOCUMENT_MARKER.captures(line) {
            Some(Pending::Document {
                slot: parse_slot(&caps[1])?,
            })
        } else if let Some(caps) = DIFF_MARKER.captures(line) {
            Some(Pending::Diff {
                from: parse_slot(&caps[1])?,
                to: parse_slot(&caps[2])?,
            })
        } else {
            None
        };

        match marker {
            Some(next) => {
                if let Some((block, start)) = pending.take() {
                    let item = close_item(block, &body, start, &sequence, options)?;
                    sequence.push(item);
                }
                body.clear();
                pending = Some((next, number + 1));
            }
            None if pending.is_some() => body.push(raw),
            None if !line.is_empty() => {
                log::warn!("Ignoring text outside any block on line {}", number + 1);
            }
            None => {}
        }
    }
    if let Some((block, start)) = pending.take() {
        let item = close_item(block, &body, start, &sequence, options)?;
        sequence.push(item);
    }

    let conversation = Conversation {
        sequence,
        legacy: false,
    };
    validate(&conversation, declared)?;

    log::debug!(
        "Parsed conversation with {} documents and {} diffs",
        conversation.document_count(),
        conversation.diffs().count()
    );
    Ok(conversation)
}

fn parse_slot(digits: &str) -> Result<usize> {
    digits
        .parse()
        .map_err(|_| TqlError::malformed_conversation(format!("slot '{digits}' out of range")))
}

/// Parse one block; `marker_line` is the 1-based line of its marker
fn close_item(
    block: Pending,
    body: &[&str],
    marker_line: usize,
    sequence: &[SequenceItem],
    options: &ParseOptions,
) -> Result<SequenceItem> {
    let text = body.join("\n");
    let shift = |err: TqlError| match err {
        TqlError::Parse { line, message } => TqlError::Parse {
            line: line + marker_line,
            message,
        },
        other => other,
    };

    match block {
        Pending::Document { slot } => {
            let expected = sequence
                .iter()
                .filter(|item| matches!(item, SequenceItem::Document { .. }))
                .count();
            if slot != expected {
                return Err(TqlError::malformed_conversation(format!(
                    "expected #document[+{expected}] on line {marker_line}, found #document[+{slot}]"
                )));
            }
            let document = parse_document_with(&text, options).map_err(shift)?;
            Ok(SequenceItem::Document { slot, document })
        }
        Pending::Diff { from, to } => {
            let diff = deserialize_diff(&text).map_err(shift)?;
            Ok(SequenceItem::Diff { from, to, diff })
        }
    }
}

fn validate(conversation: &Conversation, declared: usize) -> Result<()> {
    let count = conversation.document_count();
    if count != declared {
        return Err(TqlError::malformed_conversation(format!(
            "header declares {declared} documents but {count} were found"
        )));
    }
    for (from, to, _) in conversation.diffs() {
        if from >= count || to >= count {
            return Err(TqlError::malformed_conversation(format!(
                "$diff[+{from}→+{to}] refers to a missing document"
            )));
        }
    }
    Ok(())
}

/// Write a conversation back to text.
///
/// A legacy conversation that still holds a single document is written as a
/// bare document.
pub fn generate_conversation(conversation: &Conversation, format: &DiffFormat) -> String {
    if conversation.legacy && conversation.sequence.len() == 1 {
        if let Some(document) = conversation.latest() {
            return generate_document(document);
        }
    }

    let mut blocks = vec![format!("#conversation[{}]:", conversation.document_count())];
    for item in &conversation.sequence {
        let (marker, body) = match item {
            SequenceItem::Document { slot, document } => {
                (format!("#document[+{slot}]:"), generate_document(document))
            }
            SequenceItem::Diff { from, to, diff } => {
                (format!("$diff[+{from}→+{to}]:"), serialize_diff(diff, format))
            }
        };
        if body.is_empty() {
            blocks.push(marker);
        } else {
            blocks.push(format!("{marker}\n{body}"));
        }
    }
    blocks.join("\n\n")
}
