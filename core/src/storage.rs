//! Whole-file reads and all-or-nothing writes
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target. Concurrent writers to the same file are not
//! coordinated.

use crate::conversation::{generate_conversation, parse_conversation_with, Conversation};
use crate::diff::DiffFormat;
use crate::error::Result;
use crate::parser::ParseOptions;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub fn read_text(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)?;
    log::debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

/// Read a conversation file; a bare document comes back as a one-item conversation
pub fn read_conversation(path: &Path, options: &ParseOptions) -> Result<Conversation> {
    parse_conversation_with(&read_text(path)?, options)
}

pub fn write_conversation(path: &Path, conversation: &Conversation, format: &DiffFormat) -> Result<()> {
    write_text(path, &generate_conversation(conversation, format))
}

/// Pretty JSON of any structured value (document, conversation, diff)
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_text(path, &serde_json::to_string_pretty(value)?)
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    file.persist(path)?;

    log::info!("✅ Wrote {}", path.display());
    Ok(())
}
