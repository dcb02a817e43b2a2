//! Codebook flattening: DDI variables → [`ColumnSchema`] list.

use crate::harvest::codebook::{Codebook, Variable};
use crate::model::{ColumnSchema, ColumnType, FileSchema, SummaryStats};

/// Flattens every variable of `codebook`, preserving order.
pub fn flatten_codebook(codebook: &Codebook) -> FileSchema {
    FileSchema {
        columns: codebook.variables().iter().map(flatten_variable).collect(),
    }
}

/// Maps one DDI variable to its column schema.
///
/// Numeric variables keep their recognized summary statistics. A variable
/// whose declared type is not `numeric`/`character`, or a numeric variable
/// without an `intrvl` attribute, is typed [`ColumnType::Other`].
pub fn flatten_variable(variable: &Variable) -> ColumnSchema {
    let mut stats = SummaryStats::default();

    let declared = variable
        .var_format
        .as_ref()
        .and_then(|format| format.kind.as_deref());

    let column_type = match declared {
        Some("numeric") => {
            for stat in &variable.sum_stats {
                if let Some(kind) = stat.kind.as_deref() {
                    stats.record(kind, &stat.value);
                }
            }
            numeric_type(variable, &stats)
        }
        Some("character") => Some(character_type(variable)),
        _ => None,
    };

    ColumnSchema {
        name: variable.name.clone(),
        stats,
        column_type: column_type.unwrap_or(ColumnType::Other),
    }
}

fn numeric_type(variable: &Variable, stats: &SummaryStats) -> Option<ColumnType> {
    let interval = variable.interval.as_deref()?;
    if interval == "continuous" {
        return Some(ColumnType::Float);
    }
    // Any sumStat element counts here, recognized or not.
    if !variable.sum_stats.is_empty() && stats.looks_boolean() {
        Some(ColumnType::Bool)
    } else {
        Some(ColumnType::Int)
    }
}

fn character_type(variable: &Variable) -> ColumnType {
    let category = variable
        .var_format
        .as_ref()
        .and_then(|format| format.category.as_deref());

    match category {
        Some("date") => ColumnType::Date,
        Some("time") => ColumnType::Time,
        _ => ColumnType::Str,
    }
}
