use csv::{ReaderBuilder, Writer};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::io::infer_column;

/// Read a CSV file into a DataFrame, inferring column types
pub fn read_csv<P: AsRef<Path>>(path: P, has_header: bool) -> Result<DataFrame> {
    let file = File::open(path.as_ref())?;
    let df = read_csv_from_reader(file, has_header)?;
    log::info!(
        "read {} rows x {} columns from {}",
        df.row_count(),
        df.column_count(),
        path.as_ref().display()
    );
    Ok(df)
}

/// Read CSV data from any reader
pub fn read_csv_from_reader<R: Read>(reader: R, has_header: bool) -> Result<DataFrame> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        records.push(result?);
    }

    let headers: Vec<String> = if has_header {
        rdr.headers()?.iter().map(|h| h.to_string()).collect()
    } else {
        // without a header row, name columns by position
        let width = records.iter().map(|r| r.len()).max().unwrap_or(0);
        (0..width).map(|i| format!("column_{}", i)).collect()
    };

    let mut df = DataFrame::new();
    for (i, header) in headers.into_iter().enumerate() {
        // short rows are padded with nulls
        let cells: Vec<Option<String>> = records
            .iter()
            .map(|record| record.get(i).map(|s| s.to_string()))
            .collect();
        df.add_column(header, infer_column(cells))?;
    }

    Ok(df)
}

/// Write a DataFrame as CSV. Nulls are written as empty cells.
pub fn write_csv<P: AsRef<Path>>(df: &DataFrame, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv_to_writer(df, file)
}

/// Write CSV data to any writer
pub fn write_csv_to_writer<W: Write>(df: &DataFrame, writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record(df.column_names())?;

    let columns = df
        .column_names()
        .iter()
        .map(|name| df.column(name))
        .collect::<Result<Vec<_>>>()?;

    for i in 0..df.row_count() {
        let row: Vec<String> = columns
            .iter()
            .map(|col| col.get_string(i).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
