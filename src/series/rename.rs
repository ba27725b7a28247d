//! Prefixing of extracted band columns so station and basin outputs stay disjoint.

use crate::series::catalog::DATE_COL;
use crate::series::error::ExtractError;
use polars::prelude::*;

/// Output column names for `variables` under `prefix`, in the same order.
pub fn renamed_columns(prefix: &str, variables: &[String]) -> Vec<String> {
    variables.iter().map(|v| format!("{prefix}{v}")).collect()
}

/// Renames each of `variables` in `frame` to `prefix + variable`, keeping `date` and
/// dropping every other column.
///
/// A variable missing from the frame becomes an all-null `Float64` column, so every
/// row still carries every output key. Row count is unchanged.
pub fn rename(
    mut frame: LazyFrame,
    prefix: &str,
    variables: &[String],
) -> Result<LazyFrame, ExtractError> {
    let schema = frame.collect_schema()?;
    let mut columns = Vec::with_capacity(variables.len() + 1);
    if schema.get(DATE_COL).is_some() {
        columns.push(col(DATE_COL));
    }
    for (variable, renamed) in variables.iter().zip(renamed_columns(prefix, variables)) {
        let source = if schema.get(variable).is_some() {
            col(variable.as_str())
        } else {
            lit(NULL).cast(DataType::Float64)
        };
        columns.push(source.alias(renamed));
    }
    Ok(frame.select(columns))
}
