use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::column::{Column, ColumnType};
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::io::infer_column;

/// Persistence interface: read a whole table, or replace it wholesale
pub trait TableStore {
    /// Read every row of `name`
    fn read_table(&self, name: &str) -> Result<DataFrame>;

    /// Drop any existing `name` and write `df` in its place
    fn replace_table(&mut self, name: &str, df: &DataFrame) -> Result<()>;

    fn table_exists(&self, name: &str) -> Result<bool>;
}

/// Quote an SQL identifier, doubling embedded quotes
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Int64 => "INTEGER",
        ColumnType::Float64 => "REAL",
        ColumnType::String => "TEXT",
    }
}

/// Typed column from SQLite values.
///
/// All-integer columns are Int64 and integer/real mixes Float64. Columns
/// holding text are inferred from their text form, so numbers stored as
/// TEXT by an external loader still read as numbers.
fn column_from_values(values: Vec<Value>) -> Column {
    let any_present = values.iter().any(|v| !matches!(v, Value::Null));
    let all_integer = values
        .iter()
        .all(|v| matches!(v, Value::Integer(_) | Value::Null));
    let all_numeric = values
        .iter()
        .all(|v| matches!(v, Value::Integer(_) | Value::Real(_) | Value::Null));

    if any_present && all_integer {
        Column::Int64(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(x) => Some(x),
                    _ => None,
                })
                .collect(),
        )
    } else if any_present && all_numeric {
        Column::Float64(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(x) => Some(x as f64),
                    Value::Real(x) => Some(x),
                    _ => None,
                })
                .collect(),
        )
    } else {
        infer_column(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Null => None,
                    Value::Integer(x) => Some(x.to_string()),
                    Value::Real(x) => Some(x.to_string()),
                    Value::Text(s) => Some(s),
                    Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
                })
                .collect(),
        )
    }
}

fn cell_to_sql(column: &Column, row: usize) -> Value {
    match column {
        Column::Int64(v) => v[row].map_or(Value::Null, Value::Integer),
        Column::Float64(v) => v[row]
            .filter(|x| x.is_finite())
            .map_or(Value::Null, Value::Real),
        Column::String(v) => v[row].clone().map_or(Value::Null, Value::Text),
    }
}

/// [`TableStore`] backed by a SQLite database
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(|e| {
            Error::Database(format!("cannot open {}: {}", path.display(), e))
        })?;
        log::debug!("opened database {}", path.display());
        Ok(SqliteStore { conn })
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Ok(SqliteStore {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Names of all user tables, sorted
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl TableStore for SqliteStore {
    fn read_table(&self, name: &str) -> Result<DataFrame> {
        if !self.table_exists(name)? {
            return Err(Error::Database(format!("table {} does not exist", name)));
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_identifier(name)))?;
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut cells: Vec<Vec<Value>> = vec![Vec::new(); column_names.len()];
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, column) in cells.iter_mut().enumerate() {
                column.push(row.get::<_, Value>(idx)?);
            }
        }

        let mut df = DataFrame::new();
        for (column_name, values) in column_names.into_iter().zip(cells) {
            df.add_column(column_name, column_from_values(values))?;
        }

        log::info!("read {} rows from table {}", df.row_count(), name);
        Ok(df)
    }

    fn replace_table(&mut self, name: &str, df: &DataFrame) -> Result<()> {
        let table = quote_identifier(name);
        let column_defs: Vec<String> = df
            .column_names()
            .iter()
            .map(|col| {
                df.column(col)
                    .map(|c| format!("{} {}", quote_identifier(col), sql_type(c.column_type())))
            })
            .collect::<Result<_>>()?;
        if column_defs.is_empty() {
            return Err(Error::InvalidInput(format!(
                "cannot write table {} without columns",
                name
            )));
        }

        let column_list: Vec<String> = df
            .column_names()
            .iter()
            .map(|col| quote_identifier(col))
            .collect();
        let placeholders: Vec<String> = (1..=column_list.len()).map(|i| format!("?{}", i)).collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            column_list.join(", "),
            placeholders.join(", ")
        );

        let columns = df
            .column_names()
            .iter()
            .map(|col| df.column(col))
            .collect::<Result<Vec<_>>>()?;

        // drop, create and fill in one transaction so a failure leaves the old table
        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
        tx.execute(
            &format!("CREATE TABLE {} ({})", table, column_defs.join(", ")),
            [],
        )?;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for row in 0..df.row_count() {
                stmt.execute(params_from_iter(
                    columns.iter().map(|col| cell_to_sql(col, row)),
                ))?;
            }
        }
        tx.commit()?;

        log::info!("wrote {} rows to table {}", df.row_count(), name);
        Ok(())
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_column("cluster", Column::Int64(vec![Some(0), Some(1), None])).unwrap();
        df.add_column("score", Column::Float64(vec![Some(0.5), None, Some(2.0)])).unwrap();
        df.add_column(
            "cluster \"key\"",
            Column::String(vec![Some("GOV - DT".to_string()), None, Some("FRA".to_string())]),
        )
        .unwrap();
        df
    }

    #[test]
    fn test_replace_then_read_round_trips_types() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let df = sample();
        store.replace_table("results", &df).unwrap();
        assert!(store.table_exists("results").unwrap());
        assert_eq!(store.read_table("results").unwrap(), df);
    }

    #[test]
    fn test_replace_discards_previous_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.replace_table("results", &sample()).unwrap();

        let mut smaller = DataFrame::new();
        smaller.add_column("other", Column::from_f64(vec![1.5])).unwrap();
        store.replace_table("results", &smaller).unwrap();

        let back = store.read_table("results").unwrap();
        assert_eq!(back, smaller);
        assert_eq!(store.table_names().unwrap(), vec!["results".to_string()]);
    }

    #[test]
    fn test_numeric_text_reads_as_numbers() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TABLE raw (ID TEXT, value TEXT);
                 INSERT INTO raw VALUES ('1', '2.5'), ('2', NULL);",
            )
            .unwrap();
        let df = store.read_table("raw").unwrap();
        assert_eq!(df.column("ID").unwrap(), &Column::from_i64(vec![1, 2]));
        assert_eq!(df.f64_values("value").unwrap(), vec![Some(2.5), None]);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(store.read_table("nope"), Err(Error::Database(_))));
    }
}
