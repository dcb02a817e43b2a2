//! Harvest run orchestrator.
//!
//! This module provides the [`Harvester`] that walks the catalog
//! sequentially (search → resolve → list files → fetch codebook → flatten →
//! write) with:
//! - Skip semantics for recoverable failures (missing description, lookup
//!   miss, per-file [`FetchError`])
//! - Structured logging via `tracing`
//! - Run statistics in [`HarvestSummary`]

use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::harvest::flatten::flatten_codebook;
use crate::harvest::output::DatasetWriter;
use crate::model::{DatasetRecord, DatasetSummary, FileSchema};
use crate::traits::{DataverseApi, FetchError, HarvestError};

/// Title search terms used when none are supplied.
pub const DEFAULT_SEARCH_TERMS: &[&str] = &[
    "covid19",
    "weather",
    "medical",
    "health",
    "crime",
    "education",
    "economy",
    "finance",
    "housing",
    "transportation",
    "sports",
    "entertainment",
    "social",
    "demographics",
    "population",
    "environment",
    "agriculture",
    "food",
    "energy",
    "politics",
    "government",
    "military",
];

/// Statistics about a harvest run.
#[derive(Debug, Default, Clone)]
pub struct HarvestSummary {
    /// Search terms queried
    pub terms_searched: usize,

    /// Search results examined across all terms
    pub datasets_seen: usize,

    /// Datasets written to an output directory
    pub datasets_written: usize,

    /// Datasets skipped (no description, lookup miss, or no usable file)
    pub datasets_skipped: usize,

    /// Files whose codebook was fetched and flattened
    pub files_flattened: usize,

    /// Files skipped after a [`FetchError`]
    pub files_skipped: usize,

    /// Output directories in the order they were written
    pub directories: Vec<PathBuf>,

    /// Wall-clock duration of the run (milliseconds)
    pub total_duration_ms: u64,
}

/// Outcome of harvesting one search result.
#[derive(Debug)]
enum DatasetOutcome {
    Harvested {
        record: DatasetRecord,
        files_skipped: usize,
    },
    Skipped {
        reason: &'static str,
        files_skipped: usize,
    },
}

/// Sequential catalog harvester.
///
/// # Example
///
/// ```ignore
/// let client = DataverseClient::new(DataverseConfig::from_env()?)?;
/// let harvester = Harvester::new(client, DatasetWriter::new("data"));
/// let summary = harvester.run(&["weather".to_string()]).await?;
/// println!("wrote {} datasets", summary.datasets_written);
/// ```
pub struct Harvester<A: DataverseApi> {
    api: A,
    writer: DatasetWriter,
}

impl<A: DataverseApi> Harvester<A> {
    pub fn new(api: A, writer: DatasetWriter) -> Self {
        Self { api, writer }
    }

    /// Harvests every dataset matching any of `terms`.
    ///
    /// Output directories are numbered from 0 in the order datasets succeed;
    /// skipped datasets do not consume an index.
    ///
    /// # Errors
    ///
    /// Search, lookup transport, file listing and filesystem errors abort the
    /// run. Per-file codebook failures do not.
    pub async fn run<S: AsRef<str>>(&self, terms: &[S]) -> Result<HarvestSummary, HarvestError> {
        let start = Instant::now();
        let mut summary = HarvestSummary::default();
        let mut directory_count: usize = 0;

        for term in terms {
            let term = term.as_ref();
            summary.terms_searched += 1;

            let items = self.api.search_datasets(term).await?;
            info!(term, results = items.len(), "Search completed");

            for item in &items {
                summary.datasets_seen += 1;

                match self.harvest_dataset(item).await? {
                    DatasetOutcome::Harvested {
                        record,
                        files_skipped,
                    } => {
                        summary.files_skipped += files_skipped;
                        summary.files_flattened += record.files.len();

                        let dir = self.writer.write(directory_count, &record)?;
                        info!(
                            global_id = %item.global_id,
                            name = ?item.name,
                            files = record.files.len(),
                            path = %dir.display(),
                            "Dataset written"
                        );
                        summary.directories.push(dir);
                        summary.datasets_written += 1;
                        directory_count += 1;
                    }
                    DatasetOutcome::Skipped {
                        reason,
                        files_skipped,
                    } => {
                        summary.files_skipped += files_skipped;
                        summary.datasets_skipped += 1;
                        info!(
                            global_id = %item.global_id,
                            name = ?item.name,
                            reason,
                            "Dataset skipped"
                        );
                    }
                }
            }
        }

        summary.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            terms = summary.terms_searched,
            written = summary.datasets_written,
            skipped = summary.datasets_skipped,
            files = summary.files_flattened,
            files_skipped = summary.files_skipped,
            duration_ms = summary.total_duration_ms,
            "Harvest completed"
        );
        Ok(summary)
    }

    #[instrument(skip(self, item), fields(global_id = %item.global_id))]
    async fn harvest_dataset(&self, item: &DatasetSummary) -> Result<DatasetOutcome, HarvestError> {
        let description = match item.description.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => {
                return Ok(DatasetOutcome::Skipped {
                    reason: "no description",
                    files_skipped: 0,
                })
            }
        };

        let Some(version) = self.api.resolve_version(&item.global_id).await? else {
            return Ok(DatasetOutcome::Skipped {
                reason: "dataset id or version not found",
                files_skipped: 0,
            });
        };

        let file_ids = self.api.list_files(version).await?;

        let mut files: Vec<FileSchema> = Vec::with_capacity(file_ids.len());
        let mut files_skipped = 0;
        for file_id in file_ids {
            match self.api.fetch_codebook(file_id).await {
                Ok(codebook) if codebook.variables().is_empty() => {
                    warn!(file_id, "Codebook lists no variables, skipping file");
                    files_skipped += 1;
                }
                Ok(codebook) => files.push(flatten_codebook(&codebook)),
                Err(e) => {
                    log_fetch_failure(&e);
                    files_skipped += 1;
                }
            }
        }

        if files.is_empty() {
            return Ok(DatasetOutcome::Skipped {
                reason: "no file metadata available",
                files_skipped,
            });
        }

        Ok(DatasetOutcome::Harvested {
            record: DatasetRecord {
                description: description.to_string(),
                files,
            },
            files_skipped,
        })
    }
}

fn log_fetch_failure(err: &FetchError) {
    match err {
        FetchError::Status {
            file_id, status, ..
        } => warn!(file_id, status, error = %err, "Skipping file"),
        FetchError::Transport { file_id, .. } | FetchError::Codebook { file_id, .. } => {
            warn!(file_id, error = %err, "Skipping file")
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::codebook::{parse_codebook, Codebook};
    use crate::harvest::output::tests::unique_temp_dir;
    use crate::harvest::output::{DESCRIPTION_FILE, METADATA_FILE};
    use crate::model::{ColumnType, DatasetVersion, FileId};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;

    const ONE_VAR: &str = r#"<codeBook><dataDscr>
        <var name="temp" intrvl="continuous"><sumStat type="max">31.5</sumStat><varFormat type="numeric"/></var>
    </dataDscr></codeBook>"#;

    const TWO_VARS: &str = r#"<codeBook><dataDscr>
        <var name="station"><varFormat type="character"/></var>
        <var name="day"><varFormat type="character" category="date"/></var>
    </dataDscr></codeBook>"#;

    // In-memory catalog for testing
    #[derive(Default)]
    struct MockApi {
        search: HashMap<String, Vec<DatasetSummary>>,
        versions: HashMap<String, DatasetVersion>,
        files: HashMap<u64, Vec<FileId>>,
        codebooks: HashMap<FileId, &'static str>,
    }

    impl MockApi {
        fn dataset(
            mut self,
            term: &str,
            global_id: &str,
            description: Option<&str>,
            dataset_id: u64,
            files: &[(FileId, Option<&'static str>)],
        ) -> Self {
            self.search
                .entry(term.to_string())
                .or_default()
                .push(DatasetSummary {
                    global_id: global_id.to_string(),
                    name: None,
                    description: description.map(str::to_string),
                });
            self.versions.insert(
                global_id.to_string(),
                DatasetVersion {
                    dataset_id,
                    version_number: 1,
                },
            );
            self.files
                .insert(dataset_id, files.iter().map(|(id, _)| *id).collect());
            for (id, xml) in files {
                if let Some(xml) = xml {
                    self.codebooks.insert(*id, *xml);
                }
            }
            self
        }
    }

    #[async_trait]
    impl DataverseApi for MockApi {
        async fn search_datasets(&self, term: &str) -> Result<Vec<DatasetSummary>, HarvestError> {
            if term == "offline" {
                return Err(HarvestError::UnexpectedStatus {
                    url: "mock://search".to_string(),
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(self.search.get(term).cloned().unwrap_or_default())
        }

        async fn resolve_version(
            &self,
            global_id: &str,
        ) -> Result<Option<DatasetVersion>, HarvestError> {
            Ok(self.versions.get(global_id).copied())
        }

        async fn list_files(&self, version: DatasetVersion) -> Result<Vec<FileId>, HarvestError> {
            Ok(self.files.get(&version.dataset_id).cloned().unwrap_or_default())
        }

        async fn fetch_codebook(&self, file_id: FileId) -> Result<Codebook, FetchError> {
            match self.codebooks.get(&file_id) {
                Some(xml) => {
                    parse_codebook(xml).map_err(|source| FetchError::Codebook { file_id, source })
                }
                None => Err(FetchError::Status {
                    file_id,
                    status: 403,
                    body: "User not authorized to access this file.".to_string(),
                }),
            }
        }
    }

    fn read_metadata(dir: &std::path::Path) -> Vec<FileSchema> {
        serde_json::from_str(&fs::read_to_string(dir.join(METADATA_FILE)).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_failed_dataset_does_not_advance_counter() {
        let api = MockApi::default()
            .dataset("weather", "doi:A", Some("first"), 1, &[(10, Some(ONE_VAR))])
            .dataset("weather", "doi:B", Some("second"), 2, &[(20, None), (21, None)])
            .dataset("weather", "doi:C", Some("third"), 3, &[(30, Some(TWO_VARS))]);

        let root = unique_temp_dir("pipeline_counter");
        let harvester = Harvester::new(api, DatasetWriter::new(&root));
        let summary = harvester.run(&["weather"]).await.unwrap();

        assert_eq!(summary.datasets_seen, 3);
        assert_eq!(summary.datasets_written, 2);
        assert_eq!(summary.datasets_skipped, 1);
        assert_eq!(summary.files_skipped, 2);

        let mut entries: Vec<String> = fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        entries.sort();
        assert_eq!(entries, ["0", "1"]);

        assert_eq!(
            fs::read_to_string(root.join("1").join(DESCRIPTION_FILE)).unwrap(),
            "third"
        );
        let files = read_metadata(&root.join("1"));
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].columns[1].column_type, ColumnType::Date);

        fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_failed_file_is_skipped_not_dataset() {
        let api = MockApi::default().dataset(
            "health",
            "doi:H",
            Some("clinic visits"),
            5,
            &[(50, None), (51, Some(ONE_VAR)), (52, Some("not a codebook")), (53, Some(TWO_VARS))],
        );

        let root = unique_temp_dir("pipeline_partial");
        let harvester = Harvester::new(api, DatasetWriter::new(&root));
        let summary = harvester.run(&["health"]).await.unwrap();

        assert_eq!(summary.datasets_written, 1);
        assert_eq!(summary.files_flattened, 2);
        assert_eq!(summary.files_skipped, 2);

        let files = read_metadata(&root.join("0"));
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].columns[0].name, "temp");
        assert_eq!(files[0].columns[0].column_type, ColumnType::Float);
        assert_eq!(files[1].columns.len(), 2);

        fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_missing_description_and_lookup_are_skipped() {
        let mut api = MockApi::default()
            .dataset("crime", "doi:NoDesc", None, 1, &[(1, Some(ONE_VAR))])
            .dataset("crime", "doi:Empty", Some(""), 2, &[(2, Some(ONE_VAR))])
            .dataset("crime", "doi:NoVersion", Some("gone"), 3, &[(3, Some(ONE_VAR))])
            .dataset("crime", "doi:Ok", Some("kept"), 4, &[(4, Some(ONE_VAR))]);
        api.versions.remove("doi:NoVersion");

        let root = unique_temp_dir("pipeline_guards");
        let harvester = Harvester::new(api, DatasetWriter::new(&root));
        let summary = harvester.run(&["crime"]).await.unwrap();

        assert_eq!(summary.datasets_skipped, 3);
        assert_eq!(summary.directories, vec![root.join("0")]);
        assert_eq!(
            fs::read_to_string(root.join("0").join(DESCRIPTION_FILE)).unwrap(),
            "kept"
        );

        fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_counter_spans_search_terms() {
        let api = MockApi::default()
            .dataset("food", "doi:F", Some("food prices"), 1, &[(1, Some(ONE_VAR))])
            .dataset("energy", "doi:E", Some("grid load"), 2, &[(2, Some(ONE_VAR))]);

        let root = unique_temp_dir("pipeline_terms");
        let harvester = Harvester::new(api, DatasetWriter::new(&root));
        let summary = harvester
            .run(&["food".to_string(), "nothing".to_string(), "energy".to_string()])
            .await
            .unwrap();

        assert_eq!(summary.terms_searched, 3);
        assert_eq!(summary.directories, vec![root.join("0"), root.join("1")]);
        assert_eq!(
            fs::read_to_string(root.join("1").join(DESCRIPTION_FILE)).unwrap(),
            "grid load"
        );

        fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_search_failure_aborts_run() {
        let root = unique_temp_dir("pipeline_abort");
        let harvester = Harvester::new(MockApi::default(), DatasetWriter::new(&root));

        let result = harvester.run(&["offline"]).await;
        assert!(matches!(
            result,
            Err(HarvestError::UnexpectedStatus { status: 503, .. })
        ));
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_codebook_without_variables_is_skipped() {
        const EMPTY: &str = r#"<codeBook><dataDscr/></codeBook>"#;
        let api = MockApi::default()
            .dataset("housing", "doi:Empty", Some("no columns"), 1, &[(1, Some(EMPTY))])
            .dataset("housing", "doi:Mixed", Some("rents"), 2, &[(2, Some(EMPTY)), (3, Some(ONE_VAR))]);

        let root = unique_temp_dir("pipeline_empty_codebook");
        let harvester = Harvester::new(api, DatasetWriter::new(&root));
        let summary = harvester.run(&["housing"]).await.unwrap();

        assert_eq!(summary.datasets_skipped, 1);
        assert_eq!(summary.files_skipped, 2);
        assert_eq!(summary.files_flattened, 1);
        assert_eq!(summary.directories, vec![root.join("0")]);
        assert_eq!(
            fs::read_to_string(root.join("0").join(DESCRIPTION_FILE)).unwrap(),
            "rents"
        );
        let files = read_metadata(&root.join("0"));
        assert_eq!(files.len(), 1);
        assert!(!files[0].columns.is_empty());

        fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_dataset_without_files_is_skipped() {
        let api = MockApi::default().dataset("sports", "doi:S", Some("scores"), 9, &[]);

        let root = unique_temp_dir("pipeline_nofiles");
        let harvester = Harvester::new(api, DatasetWriter::new(&root));
        let summary = harvester.run(&["sports"]).await.unwrap();

        assert_eq!(summary.datasets_written, 0);
        assert_eq!(summary.datasets_skipped, 1);
        assert!(!root.exists());
    }

    #[test]
    fn test_default_terms() {
        assert_eq!(DEFAULT_SEARCH_TERMS.len(), 22);
        assert_eq!(DEFAULT_SEARCH_TERMS[0], "covid19");
    }
}
