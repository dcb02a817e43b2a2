//! Numbered output directories under the data root.
//!
//! Layout: `root/N/description.txt` and `root/N/metadata.json`. Writes are
//! not transactional; a crash between steps leaves a partial directory.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::model::DatasetRecord;
use crate::traits::HarvestError;

pub const DESCRIPTION_FILE: &str = "description.txt";
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone)]
pub struct DatasetWriter {
    root: PathBuf,
}

impl DatasetWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn dataset_dir(&self, index: usize) -> PathBuf {
        self.root.join(index.to_string())
    }

    /// Empties `root/index` if it exists (the directory itself is kept),
    /// otherwise creates it.
    pub fn prepare(&self, index: usize) -> io::Result<PathBuf> {
        let dir = self.dataset_dir(index);
        if dir.exists() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    fs::remove_dir_all(&path)?;
                } else {
                    fs::remove_file(&path)?;
                }
            }
        } else {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// Writes `record` into directory `index` and returns its path.
    pub fn write(&self, index: usize, record: &DatasetRecord) -> Result<PathBuf, HarvestError> {
        let dir = self.prepare(index)?;
        fs::write(dir.join(DESCRIPTION_FILE), &record.description)?;
        let metadata = serde_json::to_string_pretty(&record.files)?;
        fs::write(dir.join(METADATA_FILE), metadata)?;
        Ok(dir)
    }
}
