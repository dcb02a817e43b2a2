use serde::{Deserialize, Serialize};

/// One item of the catalog search response (`data.items[]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub global_id: String, // e.g. "doi:10.7910/DVN/ABC123"
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub dataset_id: u64,
    pub version_number: u64,
}

pub type FileId = u64;

/// Flattened column type written to `metadata.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Float,
    Int,
    Bool,
    Date,
    Time,
    Str,
    Other,
}

/// Summary statistics copied verbatim (as text) from a numeric variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<String>,
    #[serde(
        rename = "stdDev",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub std_dev: Option<String>,
}

impl SummaryStats {
    /// Stores `value` under the DDI statistic tag `kind`.
    ///
    /// Returns `false` (and stores nothing) for tags outside
    /// `max, min, mode, medn, mean, stdDev`.
    pub fn record(&mut self, kind: &str, value: &str) -> bool {
        let slot = match kind {
            "max" => &mut self.max,
            "min" => &mut self.min,
            "mode" => &mut self.mode,
            "medn" => &mut self.medn,
            "mean" => &mut self.mean,
            "stdDev" => &mut self.std_dev,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }

    /// True when max, min, mode and median are all present and each is the
    /// literal `"0.0"` or `"1.0"`. Comparison is on the text, so `"0"` or
    /// `"1"` do not qualify.
    pub fn looks_boolean(&self) -> bool {
        [&self.max, &self.min, &self.mode, &self.medn]
            .iter()
            .all(|stat| matches!(stat.as_deref(), Some("0.0") | Some("1.0")))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(flatten)]
    pub stats: SummaryStats,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Flattened metadata for one data file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSchema {
    pub columns: Vec<ColumnSchema>,
}

/// Unit written to one numbered output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub description: String,
    pub files: Vec<FileSchema>,
}
