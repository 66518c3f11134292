//! Command-line interface for tql

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tql_core::FacetKind;

#[derive(Parser)]
#[command(name = "tql")]
#[command(about = "Keep a dataset and its interpretation together in one text file")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this config file instead of ./tql.toml or ~/.tql/global.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a TQL file from a data source
    Create {
        /// Source data format
        #[arg(long, value_enum, default_value = "csv")]
        source: SourceFormat,

        /// Input file path
        #[arg(long = "in")]
        input: PathBuf,

        /// Output file path (defaults to the input path with a .tql extension)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Comma-separated list of facets to generate (e.g. "table,meaning,score")
        #[arg(long)]
        facets: Option<String>,
    },

    /// Get a row or a whole facet as JSON
    Get {
        /// Path to the TQL file
        #[arg(long)]
        file: PathBuf,

        /// Facet to read from
        #[arg(short, long)]
        facet: FacetKind,

        /// Index of the row to get; all rows when omitted
        #[arg(short, long)]
        index: Option<usize>,

        /// Print a single field of the row
        #[arg(long, requires = "index")]
        field: Option<String>,

        /// Document slot to read (defaults to the latest)
        #[arg(short, long)]
        document: Option<usize>,
    },

    /// Insert a row into a facet
    Insert {
        /// Path to the TQL file
        #[arg(long)]
        file: PathBuf,

        /// Facet to insert into
        #[arg(short, long)]
        facet: FacetKind,

        /// Row data as a JSON object (without index)
        #[arg(short, long, conflicts_with_all = ["key", "value", "message"])]
        data: Option<String>,

        /// Key (context) or name (tasks)
        #[arg(short, long, requires = "value")]
        key: Option<String>,

        /// Value (context) or description (tasks)
        #[arg(long, requires = "key")]
        value: Option<String>,

        /// User message for the query facet, stamped with the current UTC time
        #[arg(short, long, conflicts_with_all = ["key", "value"])]
        message: Option<String>,
    },

    /// Delete one or more rows from a facet
    Delete {
        /// Path to the TQL file
        #[arg(long)]
        file: PathBuf,

        /// Facet to delete from
        #[arg(short, long)]
        facet: FacetKind,

        /// Index of the row to delete
        #[arg(short, long, conflicts_with = "indices", required_unless_present = "indices")]
        index: Option<usize>,

        /// Comma-separated list of indices to delete (e.g. "1,2,3")
        #[arg(long, value_delimiter = ',')]
        indices: Option<Vec<usize>>,
    },

    /// Update fields of a row
    Update {
        /// Path to the TQL file
        #[arg(long)]
        file: PathBuf,

        /// Facet containing the row
        #[arg(short, long)]
        facet: FacetKind,

        /// Index of the row to update
        #[arg(short, long)]
        index: usize,

        /// Fields to change as a JSON object
        #[arg(short, long)]
        data: String,
    },

    /// Show the changes between two documents of a conversation
    Diff {
        /// Path to the TQL file
        #[arg(long)]
        file: PathBuf,

        /// Document slot to compare from (defaults to the one before --to)
        #[arg(long)]
        from: Option<usize>,

        /// Document slot to compare to (defaults to the latest)
        #[arg(long)]
        to: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Disable colours
        #[arg(long)]
        no_color: bool,
    },

    /// List the documents and diffs of a conversation
    History {
        /// Path to the TQL file
        #[arg(long)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a conversation or a single document as JSON
    Export {
        /// Path to the TQL file
        #[arg(long)]
        file: PathBuf,

        /// Output JSON file
        #[arg(long)]
        out: PathBuf,

        /// Export only this document slot
        #[arg(short, long)]
        document: Option<usize>,
    },

    /// Configure tql settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Write ~/.tql/global.toml instead of ./tql.toml
        #[arg(long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::ValueEnum, Clone)]
pub enum SourceFormat {
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_facet_argument_parses_names() {
        let cli = Cli::try_parse_from(["tql", "get", "--file", "a.tql", "--facet", "@data"]).unwrap();
        match cli.command {
            Commands::Get { facet, .. } => assert_eq!(facet, FacetKind::Table),
            _ => panic!("expected get"),
        }
        assert!(Cli::try_parse_from(["tql", "get", "--file", "a.tql", "--facet", "glossary"]).is_err());
    }

    #[test]
    fn test_delete_requires_a_target() {
        assert!(Cli::try_parse_from(["tql", "delete", "--file", "a.tql", "--facet", "context"]).is_err());
        let cli = Cli::try_parse_from([
            "tql", "delete", "--file", "a.tql", "--facet", "context", "--indices", "1,3",
        ])
        .unwrap();
        match cli.command {
            Commands::Delete { indices, .. } => assert_eq!(indices, Some(vec![1, 3])),
            _ => panic!("expected delete"),
        }
    }
}
