//! Nullable typed columns backing the [`DataFrame`](crate::dataframe::DataFrame).

use std::fmt;

use crate::error::{Error, Result};

/// Identifies the element type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    String,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int64 => write!(f, "Int64"),
            ColumnType::Float64 => write!(f, "Float64"),
            ColumnType::String => write!(f, "String"),
        }
    }
}

/// A column of nullable values. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
}

impl Column {
    /// Column of non-null floats
    pub fn from_f64(values: Vec<f64>) -> Self {
        Column::Float64(values.into_iter().map(Some).collect())
    }

    /// Column of non-null integers
    pub fn from_i64(values: Vec<i64>) -> Self {
        Column::Int64(values.into_iter().map(Some).collect())
    }

    /// Column of non-null strings
    pub fn from_strings<S: Into<String>>(values: Vec<S>) -> Self {
        Column::String(values.into_iter().map(|s| Some(s.into())).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::String(_) => ColumnType::String,
        }
    }

    /// Numeric value at `index`. String columns yield an error.
    pub fn get_f64(&self, index: usize) -> Result<Option<f64>> {
        let size = self.len();
        if index >= size {
            return Err(Error::InvalidInput(format!(
                "row index {} out of bounds for column of length {}",
                index, size
            )));
        }
        match self {
            Column::Int64(v) => Ok(v[index].map(|x| x as f64)),
            Column::Float64(v) => Ok(v[index]),
            Column::String(_) => Err(Error::InvalidOperation(
                "string column cannot be read as a number".to_string(),
            )),
        }
    }

    /// Text value at `index`; numeric values are rendered to strings
    pub fn get_string(&self, index: usize) -> Option<String> {
        match self {
            Column::Int64(v) => v.get(index).copied().flatten().map(|x| x.to_string()),
            Column::Float64(v) => v.get(index).copied().flatten().map(|x| x.to_string()),
            Column::String(v) => v.get(index).cloned().flatten(),
        }
    }

    /// Keep the rows whose mask entry is `true`
    pub fn filter(&self, mask: &[bool]) -> Column {
        fn keep<T: Clone>(values: &[T], mask: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(mask.iter())
                .filter(|(_, &m)| m)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            Column::Int64(v) => Column::Int64(keep(v, mask)),
            Column::Float64(v) => Column::Float64(keep(v, mask)),
            Column::String(v) => Column::String(keep(v, mask)),
        }
    }

    /// Append the rows of `other`. Int64 and Float64 columns widen to Float64.
    pub fn concat(&self, other: &Column) -> Result<Column> {
        match (self, other) {
            (Column::Int64(a), Column::Int64(b)) => {
                Ok(Column::Int64(a.iter().chain(b.iter()).copied().collect()))
            }
            (Column::Float64(a), Column::Float64(b)) => {
                Ok(Column::Float64(a.iter().chain(b.iter()).copied().collect()))
            }
            (Column::String(a), Column::String(b)) => {
                Ok(Column::String(a.iter().chain(b.iter()).cloned().collect()))
            }
            (Column::Int64(_), Column::Float64(_)) | (Column::Float64(_), Column::Int64(_)) => {
                let mut values = Vec::with_capacity(self.len() + other.len());
                for col in [self, other] {
                    for i in 0..col.len() {
                        values.push(col.get_f64(i)?);
                    }
                }
                Ok(Column::Float64(values))
            }
            _ => Err(Error::InvalidOperation(format!(
                "cannot concatenate {} column with {} column",
                self.column_type(),
                other.column_type()
            ))),
        }
    }

    /// Render one cell for display
    pub(crate) fn format_cell(&self, index: usize) -> String {
        match self {
            Column::Int64(v) => match v.get(index).copied().flatten() {
                Some(x) => x.to_string(),
                None => "NULL".to_string(),
            },
            Column::Float64(v) => match v.get(index).copied().flatten() {
                Some(x) => format!("{:.3}", x),
                None => "NULL".to_string(),
            },
            Column::String(v) => match v.get(index).cloned().flatten() {
                Some(s) => s,
                None => "NULL".to_string(),
            },
        }
    }
}

/// Replace nulls with zero. Null never propagates through the numeric stages.
pub fn coalesce(value: Option<f64>, default: f64) -> f64 {
    value.unwrap_or(default)
}
