//! # tql-core
//!
//! Core library for tql - a plain-text format that keeps a dataset together with
//! its interpretation (column meanings, constraints, ambiguities, context, user
//! queries) as nine "facet" tables, and records edits as a conversation of
//! document snapshots and the diffs between them.
//!
//! This crate provides the format engine that can be used by different
//! interfaces (the `tql` CLI, other tools embedding the format).

pub mod config;
pub mod conversation;
pub mod crud;
pub mod diff;
pub mod document;
pub mod error;
pub mod generator;
pub mod parser;
pub mod row;
pub mod schema;
pub mod source;
pub mod storage;
pub mod table;

// Re-export the most commonly used types for convenience
pub use config::Config;
pub use conversation::{
    generate_conversation, parse_conversation, parse_conversation_with, Conversation, SequenceItem,
};
pub use diff::{
    compute_diff, deserialize_diff, serialize_diff, Diff, DiffFormat, DiffSummary, FacetDiff,
    FacetStatus, RowChange,
};
pub use document::{Document, Facet};
pub use error::{Result, TqlError};
pub use generator::{generate_dense, generate_document, generate_from_source, GenerateOptions};
pub use parser::{parse_document, parse_document_with, ParseOptions};
pub use row::{Fields, Row};
pub use schema::FacetKind;
pub use source::SourceTable;
