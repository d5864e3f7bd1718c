use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::Result;

/// JSON layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonOrient {
    /// `[{col1: val1, col2: val2}, ...]`
    Records,
    /// `{col1: [val1, val2, ...], col2: [...]}`
    Columns,
}

fn cell_value(column: &Column, row: usize) -> Value {
    match column {
        Column::Int64(v) => v[row].map_or(Value::Null, |x| Value::Number(x.into())),
        // non-finite floats have no JSON representation
        Column::Float64(v) => v[row]
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        Column::String(v) => v[row].clone().map_or(Value::Null, Value::String),
    }
}

/// Row-oriented JSON value
pub fn to_records_json(df: &DataFrame) -> Result<Value> {
    let columns = df
        .column_names()
        .iter()
        .map(|name| df.column(name).map(|col| (name, col)))
        .collect::<Result<Vec<_>>>()?;

    let records = (0..df.row_count())
        .map(|row| {
            let record: Map<String, Value> = columns
                .iter()
                .map(|(name, col)| (name.to_string(), cell_value(col, row)))
                .collect();
            Value::Object(record)
        })
        .collect();

    Ok(Value::Array(records))
}

/// Column-oriented JSON value
pub fn to_column_json(df: &DataFrame) -> Result<Value> {
    let mut columns = Map::new();
    for name in df.column_names() {
        let col = df.column(name)?;
        let values = (0..df.row_count()).map(|row| cell_value(col, row)).collect();
        columns.insert(name.clone(), Value::Array(values));
    }
    Ok(Value::Object(columns))
}

/// Write a DataFrame as pretty-printed JSON
pub fn write_json<P: AsRef<Path>>(df: &DataFrame, path: P, orient: JsonOrient) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);

    let json_value = match orient {
        JsonOrient::Records => to_records_json(df)?,
        JsonOrient::Columns => to_column_json(df)?,
    };

    serde_json::to_writer_pretty(writer, &json_value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_and_columns_layout() {
        let mut df = DataFrame::new();
        df.add_column("algorithm", Column::from_strings(vec!["K-Means"])).unwrap();
        df.add_column("silhouette", Column::Float64(vec![None])).unwrap();
        df.add_column("clusters", Column::from_i64(vec![4])).unwrap();

        assert_eq!(
            to_records_json(&df).unwrap(),
            json!([{"algorithm": "K-Means", "silhouette": null, "clusters": 4}])
        );
        assert_eq!(
            to_column_json(&df).unwrap(),
            json!({"algorithm": ["K-Means"], "silhouette": [null], "clusters": [4]})
        );
    }
}
