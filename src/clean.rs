//! Cleaning stage: `root/N/data.csv` → `root/N/metadata.txt`.
//!
//! The cleaning policy is pluggable through [`TableCleaner`]; the default
//! [`PassthroughCleaner`] returns the table unchanged.

use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const DATA_FILE: &str = "data.csv";
pub const CLEANED_FILE: &str = "metadata.txt";

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

/// A deterministic table transformation.
pub trait TableCleaner: Send + Sync {
    fn clean(&self, df: DataFrame) -> Result<DataFrame, CleanError>;
}

/// Identity cleaner.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCleaner;

impl TableCleaner for PassthroughCleaner {
    fn clean(&self, df: DataFrame) -> Result<DataFrame, CleanError> {
        Ok(df)
    }
}

#[derive(Debug, Default, Clone)]
pub struct CleanSummary {
    pub cleaned: Vec<PathBuf>,
    /// Numbered directories without a `data.csv`
    pub skipped: Vec<PathBuf>,
}

pub fn load_csv(path: &Path) -> Result<DataFrame, CleanError> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(10000))
        .finish()?
        .collect()?;
    Ok(df)
}

pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<(), CleanError> {
    let file = fs::File::create(path)?;
    CsvWriter::new(file).include_header(true).finish(df)?;
    Ok(())
}

/// Integer-named subdirectories of `root`, in ascending numeric order.
pub fn numbered_dirs(root: &Path) -> Result<Vec<(usize, PathBuf)>, CleanError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(index) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<usize>().ok())
        {
            dirs.push((index, path));
        }
    }
    dirs.sort_by_key(|(index, _)| *index);
    Ok(dirs)
}

pub struct Cleaner<T: TableCleaner> {
    cleaner: T,
}

impl<T: TableCleaner> Cleaner<T> {
    pub fn new(cleaner: T) -> Self {
        Self { cleaner }
    }

    /// Cleans one dataset directory; returns the written file.
    pub fn clean_dir(&self, dir: &Path) -> Result<PathBuf, CleanError> {
        let df = load_csv(&dir.join(DATA_FILE))?;
        let rows = df.height();
        let mut cleaned = self.cleaner.clean(df)?;
        let out = dir.join(CLEANED_FILE);
        save_csv(&mut cleaned, &out)?;
        info!(
            path = %out.display(),
            rows_in = rows,
            rows_out = cleaned.height(),
            "Table cleaned"
        );
        Ok(out)
    }

    pub fn run(&self, root: &Path) -> Result<CleanSummary, CleanError> {
        let mut summary = CleanSummary::default();
        for (_, dir) in numbered_dirs(root)? {
            if !dir.join(DATA_FILE).is_file() {
                warn!(path = %dir.display(), "No {} found, skipping", DATA_FILE);
                summary.skipped.push(dir);
                continue;
            }
            summary.cleaned.push(self.clean_dir(&dir)?);
        }
        info!(
            cleaned = summary.cleaned.len(),
            skipped = summary.skipped.len(),
            "Cleaning completed"
        );
        Ok(summary)
    }
}
