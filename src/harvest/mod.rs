//! Harvest module - Dataverse catalog walk and codebook flattening.
//!
//! - **Codebook**: typed DDI document via [`Codebook`]
//! - **Flatten**: variable → column schema mapping via [`flatten_codebook`]
//! - **Output**: numbered dataset directories via [`DatasetWriter`]
//! - **Pipeline**: sequential run orchestrator via [`pipeline::Harvester`]

pub mod codebook;
pub mod flatten;
pub mod output;
pub mod pipeline;

// Re-export commonly used types
pub use codebook::{parse_codebook, Codebook, DataDscr, SumStat, VarFormat, Variable};
pub use flatten::{flatten_codebook, flatten_variable};
pub use output::{DatasetWriter, DESCRIPTION_FILE, METADATA_FILE};
pub use pipeline::{HarvestSummary, Harvester, DEFAULT_SEARCH_TERMS};
