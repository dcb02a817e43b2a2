//! reqwest-backed [`DataverseApi`] implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::config::DataverseConfig;
use crate::harvest::codebook::{parse_codebook, Codebook};
use crate::model::{DatasetSummary, DatasetVersion, FileId};
use crate::traits::{DataverseApi, FetchError, HarvestError};

pub const API_KEY_HEADER: &str = "X-Dataverse-key";

/// Endpoint paths of the native Dataverse API.
#[derive(Clone, Debug)]
pub struct DataverseEndpoints {
    pub api_base: String,
}

impl DataverseEndpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            api_base: format!("{}/api", base_url.trim_end_matches('/')),
        }
    }

    pub fn search(&self) -> String {
        format!("{}/search", self.api_base)
    }

    pub fn dataset_by_persistent_id(&self) -> String {
        format!("{}/datasets/:persistentId/", self.api_base)
    }

    pub fn version_files(&self, version: DatasetVersion) -> String {
        format!(
            "{}/datasets/{}/versions/{}/files",
            self.api_base, version.dataset_id, version.version_number
        )
    }

    pub fn ddi_metadata(&self, file_id: FileId) -> String {
        format!("{}/access/datafile/{}/metadata/ddi", self.api_base, file_id)
    }
}

// ============================================================================
// Response envelopes
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    items: Vec<DatasetSummary>,
}

#[derive(Debug, Deserialize)]
struct LookupEnvelope {
    #[serde(default)]
    data: Option<LookupData>,
}

#[derive(Debug, Deserialize)]
struct LookupData {
    #[serde(default)]
    id: Option<u64>,
    #[serde(rename = "latestVersion", default)]
    latest_version: Option<LatestVersion>,
}

#[derive(Debug, Deserialize)]
struct LatestVersion {
    #[serde(rename = "versionNumber", default)]
    version_number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    #[serde(rename = "dataFile")]
    data_file: DataFile,
}

#[derive(Debug, Deserialize)]
struct DataFile {
    id: FileId,
}

pub(crate) fn decode_search(body: &[u8]) -> Result<Vec<DatasetSummary>, serde_json::Error> {
    let envelope: Envelope<SearchData> = serde_json::from_slice(body)?;
    Ok(envelope.data.items)
}

/// Zero ids count as absent.
pub(crate) fn decode_lookup(body: &[u8]) -> Result<Option<DatasetVersion>, serde_json::Error> {
    let envelope: LookupEnvelope = serde_json::from_slice(body)?;
    let Some(data) = envelope.data else {
        return Ok(None);
    };
    let dataset_id = data.id.filter(|id| *id != 0);
    let version_number = data
        .latest_version
        .and_then(|v| v.version_number)
        .filter(|n| *n != 0);

    Ok(match (dataset_id, version_number) {
        (Some(dataset_id), Some(version_number)) => Some(DatasetVersion {
            dataset_id,
            version_number,
        }),
        _ => None,
    })
}

pub(crate) fn decode_files(body: &[u8]) -> Result<Vec<FileId>, serde_json::Error> {
    let envelope: Envelope<Vec<FileEntry>> = serde_json::from_slice(body)?;
    Ok(envelope.data.into_iter().map(|f| f.data_file.id).collect())
}

// ============================================================================
// Client
// ============================================================================

struct RawResponse {
    status: StatusCode,
    body: Vec<u8>,
}

/// HTTP client for one Dataverse installation.
pub struct DataverseClient {
    cfg: DataverseConfig,
    http: reqwest::Client,
    end_points: DataverseEndpoints,
}

impl DataverseClient {
    pub fn new(cfg: DataverseConfig) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, application/xml"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("dataverse-harvester/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let end_points = DataverseEndpoints::new(&cfg.base_url);
        Ok(Self {
            cfg,
            http,
            end_points,
        })
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        with_key_header: bool,
    ) -> Result<RawResponse, reqwest::Error> {
        let mut rb = self.http.get(url).query(query);
        if with_key_header {
            if let Some(token) = &self.cfg.api_token {
                rb = rb.header(API_KEY_HEADER, token);
            }
        }
        debug!(url, "GET");
        let resp = rb.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }

    fn require_success(url: &str, resp: &RawResponse) -> Result<(), HarvestError> {
        if resp.status.is_success() {
            return Ok(());
        }
        Err(HarvestError::UnexpectedStatus {
            url: url.to_string(),
            status: resp.status.as_u16(),
            body: String::from_utf8_lossy(&resp.body).to_string(),
        })
    }

    async fn get_json<T, F>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        with_key_header: bool,
        decode: F,
    ) -> Result<T, HarvestError>
    where
        F: FnOnce(&[u8]) -> Result<T, serde_json::Error>,
        T: Send,
    {
        let resp = self.get(url, query, with_key_header).await?;
        Self::require_success(url, &resp)?;
        Ok(decode(&resp.body)?)
    }
}

#[async_trait]
impl DataverseApi for DataverseClient {
    async fn search_datasets(&self, term: &str) -> Result<Vec<DatasetSummary>, HarvestError> {
        let url = self.end_points.search();
        let q = format!("title:*{term}*");
        self.get_json(&url, &[("q", q.as_str()), ("type", "dataset")], true, decode_search)
            .await
    }

    async fn resolve_version(
        &self,
        global_id: &str,
    ) -> Result<Option<DatasetVersion>, HarvestError> {
        let url = self.end_points.dataset_by_persistent_id();
        // Error statuses still carry a JSON body without `data`; that is a
        // lookup miss, not a fatal error.
        let resp = self
            .get(&url, &[("persistentId", global_id)], false)
            .await?;
        Ok(decode_lookup(&resp.body)?)
    }

    async fn list_files(&self, version: DatasetVersion) -> Result<Vec<FileId>, HarvestError> {
        let url = self.end_points.version_files(version);
        match &self.cfg.api_token {
            Some(token) => {
                self.get_json(&url, &[("key", token.as_str())], false, decode_files)
                    .await
            }
            None => self.get_json(&url, &[], false, decode_files).await,
        }
    }

    async fn fetch_codebook(&self, file_id: FileId) -> Result<Codebook, FetchError> {
        let url = self.end_points.ddi_metadata(file_id);
        let resp = self
            .get(&url, &[], false)
            .await
            .map_err(|source| FetchError::Transport { file_id, source })?;

        let text = String::from_utf8_lossy(&resp.body);
        if !resp.status.is_success() {
            return Err(FetchError::Status {
                file_id,
                status: resp.status.as_u16(),
                body: text.to_string(),
            });
        }
        parse_codebook(&text).map_err(|source| FetchError::Codebook { file_id, source })
    }
}
