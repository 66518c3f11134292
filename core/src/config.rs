use crate::diff::DiffFormat;
use crate::generator::GenerateOptions;
use crate::parser::ParseOptions;
use crate::schema::FacetKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "TQL_CONFIG";
pub const LOCAL_CONFIG_FILE: &str = "tql.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseConfig {
    /// Reject facets whose declared `[N]` disagrees with their rows
    #[serde(default = "default_true")]
    pub validate_row_counts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Colourise diffs printed to the terminal
    #[serde(default = "default_true")]
    pub color: bool,
    /// Keep colour codes in diffs stored inside conversation files
    #[serde(default)]
    pub color_in_files: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateConfig {
    /// Facets written by `create`
    #[serde(default = "all_facets")]
    pub facets: Vec<FacetKind>,
}

fn default_true() -> bool {
    true
}

fn all_facets() -> Vec<FacetKind> {
    FacetKind::ALL.to_vec()
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            validate_row_counts: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            color_in_files: false,
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            facets: all_facets(),
        }
    }
}

impl Config {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            validate_row_counts: self.parse.validate_row_counts,
        }
    }

    pub fn generate_options(&self) -> GenerateOptions {
        let mut facets = self.generate.facets.clone();
        facets.sort();
        facets.dedup();
        GenerateOptions { facets }
    }

    /// Format for diffs shown on the terminal
    pub fn terminal_format(&self) -> DiffFormat {
        DiffFormat {
            color: self.output.color,
        }
    }

    /// Format for diffs written into conversation files
    pub fn file_format(&self) -> DiffFormat {
        DiffFormat {
            color: self.output.color_in_files,
        }
    }

    /// `NO_COLOR` turns every colour setting off
    fn apply_env_overrides(&mut self) {
        if env::var_os("NO_COLOR").is_some() {
            self.output.color = false;
            self.output.color_in_files = false;
        }
    }
}

pub fn global_config_dir() -> PathBuf {
    if let Some(home_dir) = dirs::home_dir() {
        home_dir.join(".tql")
    } else {
        PathBuf::from(".tql")
    }
}

pub fn global_config_path() -> PathBuf {
    global_config_dir().join("global.toml")
}

pub fn local_config_path() -> Option<PathBuf> {
    env::current_dir()
        .ok()
        .map(|dir| dir.join(LOCAL_CONFIG_FILE))
}

/// Resolve the configuration.
///
/// Priority order (highest to lowest):
/// 1. `explicit` path, or the file named by `TQL_CONFIG`
/// 2. Local config file (`./tql.toml`)
/// 3. Global config file (`~/.tql/global.toml`)
/// 4. Defaults
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

    let mut config = match explicit {
        Some(path) => read_config_file(&path)?,
        None => {
            let candidates = local_config_path()
                .into_iter()
                .chain(std::iter::once(global_config_path()));
            let mut found = None;
            for path in candidates.filter(|p| p.exists()) {
                match read_config_file(&path) {
                    Ok(config) => {
                        found = Some(config);
                        break;
                    }
                    Err(e) => log::warn!("Skipping config file {}: {e:#}", path.display()),
                }
            }
            found.unwrap_or_default()
        }
    };

    config.apply_env_overrides();
    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = toml::from_str::<Config>(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let config_toml = toml::to_string_pretty(config)?;
    fs::write(path, config_toml)?;
    Ok(())
}
