//! Command implementations for tql CLI

use crate::cli::{Commands, ConfigCommand, SourceFormat};
use crate::output::{HistoryEntry, JsonFormatter, PrettyPrinter};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tql_core::config::{self, Config};
use tql_core::error::{Result, TqlError};
use tql_core::schema::parse_facet_list;
use tql_core::{
    crud, generate_from_source, serialize_diff, source, storage, Conversation, DiffFormat,
    Document, FacetKind, Fields, SequenceItem,
};

/// Execute a command
pub fn execute_command(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config(config_path)?;

    match command {
        Commands::Create {
            source,
            input,
            out,
            facets,
        } => create_command(&config, source, &input, out, facets.as_deref()),
        Commands::Get {
            file,
            facet,
            index,
            field,
            document,
        } => get_command(&config, &file, facet, index, field.as_deref(), document),
        Commands::Insert {
            file,
            facet,
            data,
            key,
            value,
            message,
        } => {
            let fields = insert_payload(facet, data, key, value, message)?;
            insert_command(&config, &file, facet, fields)
        }
        Commands::Delete {
            file,
            facet,
            index,
            indices,
        } => match (index, indices) {
            (Some(index), _) => delete_command(&config, &file, facet, index),
            (None, Some(indices)) => delete_many_command(&config, &file, facet, &indices),
            (None, None) => Err(TqlError::invalid_input(
                "Must provide either --index or --indices",
            )),
        },
        Commands::Update {
            file,
            facet,
            index,
            data,
        } => update_command(&config, &file, facet, index, parse_row_payload(&data)?),
        Commands::Diff {
            file,
            from,
            to,
            json,
            no_color,
        } => diff_command(&config, &file, from, to, json, no_color),
        Commands::History { file, json } => history_command(&config, &file, json),
        Commands::Export {
            file,
            out,
            document,
        } => export_command(&config, &file, &out, document),
        Commands::Config { command } => config_command(&config, &command),
    }
}

/// Create a TQL file from tabular data
fn create_command(
    config: &Config,
    source_format: SourceFormat,
    input: &Path,
    out: Option<PathBuf>,
    facets: Option<&str>,
) -> Result<()> {
    let table = match source_format {
        SourceFormat::Csv => source::read_csv(input)?,
    };

    let mut options = config.generate_options();
    if let Some(list) = facets {
        options.facets = parse_facet_list(list)?;
    }
    if options.facets.is_empty() {
        return Err(TqlError::invalid_input("No facets selected"));
    }

    let output = out.unwrap_or_else(|| input.with_extension("tql"));
    storage::write_text(&output, &generate_from_source(&table, &options))?;

    PrettyPrinter::print_created(&output, &options.facets, &table);
    Ok(())
}

fn get_command(
    config: &Config,
    file: &Path,
    facet: FacetKind,
    index: Option<usize>,
    field: Option<&str>,
    document: Option<usize>,
) -> Result<()> {
    let conversation = storage::read_conversation(file, &config.parse_options())?;
    let doc = select_document(&conversation, document)?;
    let rows = doc.facet(facet);

    let Some(index) = index else {
        println!("{}", JsonFormatter::format(&rows.rows())?);
        return Ok(());
    };

    let row = rows.row(index).ok_or_else(|| TqlError::RowNotFound {
        facet: facet.name().to_string(),
        indices: vec![index],
    })?;

    match field {
        Some("index") => println!("{}", row.index),
        Some(name) => {
            let value = row
                .get(name)
                .ok_or_else(|| TqlError::invalid_input(format!("Field \"{name}\" not found in row")))?;
            println!("{value}");
        }
        None => println!("{}", JsonFormatter::format(row)?),
    }
    Ok(())
}

fn insert_command(config: &Config, file: &Path, facet: FacetKind, fields: Fields) -> Result<()> {
    let mut assigned = 0;
    let (before, after) = apply_to_file(config, file, |doc| {
        assigned = crud::insert_row(doc, facet, fields)?;
        Ok(())
    })?;

    println!("✅ Inserted 1 row into @{facet} (index {assigned})");
    PrettyPrinter::print_document_change(before, after);
    Ok(())
}

fn delete_command(config: &Config, file: &Path, facet: FacetKind, index: usize) -> Result<()> {
    let (before, after) = apply_to_file(config, file, |doc| {
        crud::delete_row(doc, facet, index)?;
        Ok(())
    })?;

    println!("✅ Deleted @{facet}[{index}]");
    PrettyPrinter::print_document_change(before, after);
    Ok(())
}

fn delete_many_command(config: &Config, file: &Path, facet: FacetKind, indices: &[usize]) -> Result<()> {
    let mut deleted = 0;
    let (before, after) = apply_to_file(config, file, |doc| {
        deleted = crud::delete_rows(doc, facet, indices)?;
        Ok(())
    })?;

    println!("✅ Deleted {deleted} of {} rows from @{facet}", indices.len());
    PrettyPrinter::print_document_change(before, after);
    Ok(())
}

fn update_command(config: &Config, file: &Path, facet: FacetKind, index: usize, fields: Fields) -> Result<()> {
    let changed: Vec<String> = fields.keys().cloned().collect();
    let (before, after) = apply_to_file(config, file, |doc| crud::update_row(doc, facet, index, fields))?;

    println!("✅ Updated @{facet}[{index}]: {}", changed.join(", "));
    PrettyPrinter::print_document_change(before, after);
    Ok(())
}

fn diff_command(
    config: &Config,
    file: &Path,
    from: Option<usize>,
    to: Option<usize>,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let conversation = storage::read_conversation(file, &config.parse_options())?;
    let latest = conversation
        .document_count()
        .checked_sub(1)
        .ok_or(TqlError::DocumentNotFound { slot: 0 })?;
    let to = to.unwrap_or(latest);
    let from = from.unwrap_or_else(|| to.saturating_sub(1));

    let diff = conversation.diff_between(from, to)?;
    if json {
        println!("{}", diff.to_json()?);
        return Ok(());
    }

    let format = if no_color {
        DiffFormat::plain()
    } else {
        config.terminal_format()
    };
    println!("$diff[+{from}→+{to}]:");
    println!("{}", serialize_diff(&diff, &format));
    Ok(())
}

fn history_command(config: &Config, file: &Path, json: bool) -> Result<()> {
    let conversation = storage::read_conversation(file, &config.parse_options())?;
    let entries: Vec<HistoryEntry> = conversation
        .sequence()
        .iter()
        .map(|item| match item {
            SequenceItem::Document { slot, document } => HistoryEntry::document(*slot, document),
            SequenceItem::Diff { from, to, diff } => HistoryEntry::diff(*from, *to, diff),
        })
        .collect();

    if json {
        println!("{}", JsonFormatter::format(&entries)?);
    } else {
        PrettyPrinter::print_history(file, &entries);
    }
    Ok(())
}

fn export_command(config: &Config, file: &Path, out: &Path, document: Option<usize>) -> Result<()> {
    let conversation = storage::read_conversation(file, &config.parse_options())?;
    match document {
        Some(slot) => storage::write_json(out, conversation.document(slot)?)?,
        None => storage::write_json(out, &conversation)?,
    }
    println!("✅ Exported {} to {}", file.display(), out.display());
    Ok(())
}

fn config_command(config: &Config, command: &ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show_current_config(config),
        ConfigCommand::Init { global, force } => init_config(*global, *force),
    }
}

fn show_current_config(config: &Config) -> Result<()> {
    println!("⚙️  Current configuration:");
    if let Some(local) = config::local_config_path().filter(|p| p.exists()) {
        println!("📁 Local config: {}", local.display());
    }
    let global = config::global_config_path();
    if global.exists() {
        println!("📁 Global config: {}", global.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).map_err(anyhow::Error::from)?;
    print!("{rendered}");
    Ok(())
}

fn init_config(global: bool, force: bool) -> Result<()> {
    let path = if global {
        config::global_config_path()
    } else {
        config::local_config_path()
            .ok_or_else(|| TqlError::invalid_input("Cannot determine current directory"))?
    };
    if path.exists() && !force {
        return Err(TqlError::invalid_input(format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    config::save_config(&Config::default(), &path)?;
    println!("✅ Wrote default configuration to {}", path.display());
    Ok(())
}

/// Read `file`, apply `mutation` to its latest document and write the result back.
///
/// Returns the document counts before and after.
fn apply_to_file<F>(config: &Config, file: &Path, mutation: F) -> Result<(usize, usize)>
where
    F: FnOnce(&mut Document) -> Result<()>,
{
    let conversation = storage::read_conversation(file, &config.parse_options())?;
    let before = conversation.document_count();
    let updated = conversation.apply_change(mutation, None)?;
    storage::write_conversation(file, &updated, &config.file_format())?;
    Ok((before, updated.document_count()))
}

fn select_document(conversation: &Conversation, slot: Option<usize>) -> Result<&Document> {
    match slot {
        Some(slot) => conversation.document(slot),
        None => conversation
            .latest()
            .ok_or(TqlError::DocumentNotFound { slot: 0 }),
    }
}

/// Row fields for `insert` from whichever flags were given
fn insert_payload(
    facet: FacetKind,
    data: Option<String>,
    key: Option<String>,
    value: Option<String>,
    message: Option<String>,
) -> Result<Fields> {
    if let Some(data) = data {
        return parse_row_payload(&data);
    }

    let mut fields = Fields::new();
    match (facet, key, value, message) {
        (FacetKind::Context, Some(key), Some(value), None) => {
            fields.insert("key".to_string(), key);
            fields.insert("value".to_string(), value);
        }
        (FacetKind::Tasks, Some(name), Some(description), None) => {
            fields.insert("name".to_string(), name);
            fields.insert("description".to_string(), description);
            fields.insert("formula".to_string(), String::new());
        }
        (FacetKind::Query, None, None, Some(message)) => {
            fields.insert("user_message".to_string(), message);
            fields.insert(
                "timestamp_utc".to_string(),
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            );
        }
        _ => {
            return Err(TqlError::invalid_input(
                "Must provide --data, --key and --value (context, tasks) or --message (query)",
            ))
        }
    }
    Ok(fields)
}

/// Parse a JSON object into row fields; scalar values are stored as text
fn parse_row_payload(data: &str) -> Result<Fields> {
    let value: Value = serde_json::from_str(data)
        .map_err(|e| TqlError::invalid_input(format!("Invalid JSON in --data: {e}")))?;
    let Value::Object(object) = value else {
        return Err(TqlError::invalid_input("--data must be a JSON object"));
    };

    let mut fields = Fields::with_capacity(object.len());
    for (key, value) in object {
        let text = match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            Value::Bool(_) | Value::Number(_) => value.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(TqlError::invalid_input(format!(
                    "Field \"{key}\" must be a string, number or boolean"
                )))
            }
        };
        fields.insert(key, text);
    }
    Ok(fields)
}
