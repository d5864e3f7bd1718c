//! Table input and output: SQLite store, CSV and JSON files.

pub mod csv;
pub mod json;
pub mod sql;

use crate::column::Column;

pub use self::csv::{read_csv, write_csv};
pub use self::json::{to_records_json, write_json, JsonOrient};
pub use self::sql::{SqliteStore, TableStore};

fn is_null_token(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("nan")
}

fn present_cell(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().filter(|s| !is_null_token(s)).map(str::trim)
}

/// Build a typed column from text cells.
///
/// Empty cells (and `NULL`/`NaN`) become nulls. A column whose non-null
/// cells all parse as integers is Int64, as floats is Float64; anything
/// else stays String. An all-null column is String.
pub(crate) fn infer_column(cells: Vec<Option<String>>) -> Column {
    let present = || cells.iter().flatten().filter(|s| !is_null_token(s));

    let any_present = present().next().is_some();
    let all_integers = any_present && present().all(|s| s.trim().parse::<i64>().is_ok());
    let all_floats = any_present && present().all(|s| s.trim().parse::<f64>().is_ok());

    if all_integers {
        Column::Int64(
            cells
                .iter()
                .map(|c| present_cell(c).and_then(|s| s.parse().ok()))
                .collect(),
        )
    } else if all_floats {
        Column::Float64(
            cells
                .iter()
                .map(|c| present_cell(c).and_then(|s| s.parse().ok()))
                .collect(),
        )
    } else {
        Column::String(
            cells
                .into_iter()
                .map(|c| c.filter(|s| !s.trim().is_empty()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_infer_column_types() {
        assert_eq!(
            infer_column(cells(&["1", "", "3"])),
            Column::Int64(vec![Some(1), None, Some(3)])
        );
        assert_eq!(
            infer_column(cells(&["1", "2.5", "NULL"])),
            Column::Float64(vec![Some(1.0), Some(2.5), None])
        );
        assert_eq!(
            infer_column(cells(&["Health", "", "7"])),
            Column::String(vec![Some("Health".to_string()), None, Some("7".to_string())])
        );
    }
}
