use crate::harvest::codebook::Codebook;
use crate::model::{DatasetSummary, DatasetVersion, FileId};
use async_trait::async_trait;
use thiserror::Error;

/// Fatal errors: any of these ends the harvest run.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Codebook retrieval failure for a single file. Recoverable: the file is
/// skipped and the harvest continues.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to get metadata for file {file_id}: {body}")]
    Status {
        file_id: FileId,
        status: u16,
        body: String,
    },
    #[error("Request for file {file_id} metadata failed: {source}")]
    Transport {
        file_id: FileId,
        #[source]
        source: reqwest::Error,
    },
    #[error("Metadata for file {file_id} is not a DDI codebook: {source}")]
    Codebook {
        file_id: FileId,
        #[source]
        source: quick_xml::DeError,
    },
}

/// The four Dataverse calls the harvester depends on.
#[async_trait]
pub trait DataverseApi: Send + Sync {
    /// Datasets whose title contains `term` (`q=title:*term*&type=dataset`).
    async fn search_datasets(&self, term: &str) -> Result<Vec<DatasetSummary>, HarvestError>;

    /// Resolves a persistent identifier to its numeric id and latest version.
    ///
    /// `Ok(None)` means the lookup answered but without the id or version
    /// number; callers skip the dataset.
    async fn resolve_version(&self, global_id: &str)
        -> Result<Option<DatasetVersion>, HarvestError>;

    /// File ids attached to `version`, in listing order.
    async fn list_files(&self, version: DatasetVersion) -> Result<Vec<FileId>, HarvestError>;

    /// Downloads and parses the DDI codebook of one tabular file.
    async fn fetch_codebook(&self, file_id: FileId) -> Result<Codebook, FetchError>;
}
