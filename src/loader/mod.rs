//! Input discovery and loading.
//!
//! This module finds the extract files in the input directory and reads
//! them, in sorted order, into a single [`Relation`]. Every file must share
//! the header of the first one.

mod error;

pub use error::LoadError;

use crate::models::{Record, Relation};
use csv::StringRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Configuration for input loading.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// File extension to include (without dot).
    pub extension: String,
    /// Column holding the classification code.
    pub classification_column: String,
    /// Column holding the compound activity code.
    pub activity_column: String,
    /// Column holding the state abbreviation.
    pub state_column: String,
    /// Column holding the income bracket code.
    pub income_column: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::from(&crate::config::InputConfig::default())
    }
}

impl From<&crate::config::InputConfig> for LoadConfig {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            extension: config.extension.clone(),
            classification_column: config.classification_column.clone(),
            activity_column: config.activity_column.clone(),
            state_column: config.state_column.clone(),
            income_column: config.income_column.clone(),
        }
    }
}

/// Positions of the columns the reports read.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    classification: usize,
    activity: usize,
    state: usize,
    income: usize,
}

impl ColumnIndex {
    fn resolve(
        headers: &StringRecord,
        config: &LoadConfig,
        path: &Path,
    ) -> Result<Self, LoadError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| LoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        };

        Ok(Self {
            classification: find(&config.classification_column)?,
            activity: find(&config.activity_column)?,
            state: find(&config.state_column)?,
            income: find(&config.income_column)?,
        })
    }
}

/// Loader for a directory of extract files.
pub struct InputLoader {
    config: LoadConfig,
    input_dir: PathBuf,
}

impl InputLoader {
    /// Create a new loader.
    pub fn new(input_dir: PathBuf, config: LoadConfig) -> Self {
        Self { config, input_dir }
    }

    /// List the input files, sorted by name.
    pub fn scan(&self) -> Result<Vec<PathBuf>, LoadError> {
        if !self.input_dir.exists() {
            return Err(LoadError::MissingDirectory(self.input_dir.clone()));
        }
        if !self.input_dir.is_dir() {
            return Err(LoadError::NotADirectory(self.input_dir.clone()));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.input_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| LoadError::Io {
                path: self.input_dir.clone(),
                source: e.into(),
            })?;
            let path = entry.path();

            if entry.file_type().is_file() && self.matches(path) {
                files.push(path.to_path_buf());
            } else {
                debug!("Skipping {}", path.display());
            }
        }

        if files.is_empty() {
            return Err(LoadError::NoInputFiles {
                dir: self.input_dir.clone(),
                extension: self.config.extension.clone(),
            });
        }

        Ok(files)
    }

    /// Check if a file is an input file.
    pub fn matches(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(true, |n| n.starts_with('.'));
        if hidden {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.config.extension))
    }

    /// Read every input file into one relation.
    pub fn load(&self, show_progress: bool) -> Result<Relation, LoadError> {
        let files = self.scan()?;
        info!(
            "Found {} input files in {}",
            files.len(),
            self.input_dir.display()
        );

        let progress = show_progress.then(|| {
            let pb = ProgressBar::new(files.len() as u64);
            let style = ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb
        });

        let mut relation = Relation::default();

        for path in &files {
            if let Some(ref pb) = progress {
                pb.set_message(
                    path.file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                );
            }

            let rows = self.read_file(path, &mut relation)?;
            debug!("Read {} rows from {}", rows, path.display());
            relation.sources.push(path.clone());

            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        info!(
            "Loaded {} records from {} files",
            relation.len(),
            relation.sources.len()
        );

        Ok(relation)
    }

    /// Append the rows of one file to the relation.
    fn read_file(&self, path: &Path, relation: &mut Relation) -> Result<usize, LoadError> {
        let csv_err = |source: csv::Error| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?.clone();
        let columns = ColumnIndex::resolve(&headers, &self.config, path)?;
        let header_names: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

        if relation.headers.is_empty() {
            relation.headers = header_names;
        } else if relation.headers != header_names {
            return Err(LoadError::SchemaMismatch {
                path: path.to_path_buf(),
            });
        }

        let mut rows = 0;
        for (i, row) in reader.records().enumerate() {
            let row = row.map_err(csv_err)?;
            let income = parse_income(row.get(columns.income).unwrap_or(""), path, i + 1)?;

            relation.records.push(Record {
                classification: text_field(&row, columns.classification),
                activity: text_field(&row, columns.activity),
                state: text_field(&row, columns.state).map(|s| s.to_ascii_uppercase()),
                income,
                fields: row.iter().map(String::from).collect(),
                ..Default::default()
            });
            rows += 1;
        }

        Ok(rows)
    }
}

/// Trimmed field value; empty values are missing.
fn text_field(row: &StringRecord, index: usize) -> Option<String> {
    row.get(index)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Parse an income bracket code in 0..=9; empty values are missing.
///
/// `row` is the 1-based data row within `path`, used in the error.
fn parse_income(raw: &str, path: &Path, row: usize) -> Result<Option<u8>, LoadError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<u8>() {
        Ok(code) if crate::models::INCOME_BRACKETS.contains(&code) => Ok(Some(code)),
        _ => Err(LoadError::InvalidIncome {
            path: path.to_path_buf(),
            row,
            value: raw.to_string(),
        }),
    }
}
