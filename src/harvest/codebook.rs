//! Typed view of the DDI codebook returned by the Dataverse access API.
//!
//! Only the parts the flattener reads are modelled; every other element and
//! attribute in the document is ignored during deserialization.

use serde::Deserialize;

/// Root `<codeBook>` element.
#[derive(Debug, Clone, Deserialize)]
pub struct Codebook {
    #[serde(rename = "dataDscr")]
    pub data_dscr: DataDscr,
}

/// `<dataDscr>`: the variable list of a tabular file.
///
/// A single `<var>` child deserializes into a one-element vector, so callers
/// never see the single-mapping special case.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataDscr {
    #[serde(rename = "var", default)]
    pub variables: Vec<Variable>,
}

/// `<var>`: description of one column.
#[derive(Debug, Clone, Deserialize)]
pub struct Variable {
    #[serde(rename = "@name")]
    pub name: String,

    /// `continuous` or `discrete`
    #[serde(rename = "@intrvl", default)]
    pub interval: Option<String>,

    #[serde(rename = "sumStat", default)]
    pub sum_stats: Vec<SumStat>,

    #[serde(rename = "varFormat", default)]
    pub var_format: Option<VarFormat>,
}

/// `<sumStat type="...">value</sumStat>`
#[derive(Debug, Clone, Deserialize)]
pub struct SumStat {
    #[serde(rename = "@type", default)]
    pub kind: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// `<varFormat type="numeric|character" category="date|time|..."/>`
#[derive(Debug, Clone, Deserialize)]
pub struct VarFormat {
    #[serde(rename = "@type", default)]
    pub kind: Option<String>,
    #[serde(rename = "@category", default)]
    pub category: Option<String>,
}

impl Codebook {
    pub fn variables(&self) -> &[Variable] {
        &self.data_dscr.variables
    }
}

/// Parses a DDI XML document.
pub fn parse_codebook(xml: &str) -> Result<Codebook, quick_xml::DeError> {
    quick_xml::de::from_str(xml)
}
