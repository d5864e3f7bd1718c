//! Column-oriented table that every pipeline stage consumes and produces.
//!
//! Stages never mutate their input in place: they clone, append derived
//! columns and hand back a new frame.

use std::collections::HashMap;
use std::fmt;

use crate::column::{Column, ColumnType};
use crate::error::{Error, Result};

/// Ordered collection of equally long named columns
#[derive(Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<Column>,
    column_indices: HashMap<String, usize>,
    column_names: Vec<String>,
    row_count: usize,
}

impl DataFrame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Fails on duplicate names or inconsistent lengths.
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();

        if self.column_indices.contains_key(&name) {
            return Err(Error::DuplicateColumnName(name));
        }

        let column_len = column.len();
        if !self.columns.is_empty() && column_len != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: column_len,
            });
        }

        self.column_indices.insert(name.clone(), self.columns.len());
        self.columns.push(column);
        self.column_names.push(name);

        if self.columns.len() == 1 {
            self.row_count = column_len;
        }

        Ok(())
    }

    /// Insert a column, replacing any existing column with the same name in place
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        match self.column_indices.get(&name) {
            Some(&idx) => {
                if column.len() != self.row_count {
                    return Err(Error::InconsistentRowCount {
                        expected: self.row_count,
                        found: column.len(),
                    });
                }
                self.columns[idx] = column;
                Ok(())
            }
            None => self.add_column(name, column),
        }
    }

    /// Borrow a column by name
    pub fn column(&self, name: &str) -> Result<&Column> {
        let idx = self
            .column_indices
            .get(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        Ok(&self.columns[*idx])
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_indices.contains_key(name)
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Fail with every missing name when any of `names` is absent
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !self.contains_column(name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingColumns(missing))
        }
    }

    /// Numeric values of a column, nulls kept as `None`
    pub fn f64_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        match self.column(name)? {
            Column::Float64(values) => Ok(values.clone()),
            Column::Int64(values) => Ok(values.iter().map(|v| v.map(|x| x as f64)).collect()),
            // an all-null column carries no type information
            Column::String(values) if values.iter().all(Option::is_none) => {
                Ok(vec![None; values.len()])
            }
            Column::String(_) => Err(Error::ColumnTypeMismatch {
                name: name.to_string(),
                expected: ColumnType::Float64,
                found: ColumnType::String,
            }),
        }
    }

    /// Text values of a column; numeric cells are rendered to strings
    pub fn string_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.column(name)?;
        Ok((0..self.row_count).map(|i| column.get_string(i)).collect())
    }

    /// Keep the rows whose mask entry is `true`
    pub fn filter_rows(&self, mask: &[bool]) -> Result<DataFrame> {
        if mask.len() != self.row_count {
            return Err(Error::LengthMismatch {
                expected: self.row_count,
                actual: mask.len(),
            });
        }

        let mut result = DataFrame::new();
        for (name, column) in self.column_names.iter().zip(self.columns.iter()) {
            result.add_column(name.clone(), column.filter(mask))?;
        }
        if result.columns.is_empty() {
            result.row_count = mask.iter().filter(|&&m| m).count();
        }
        Ok(result)
    }

    /// Project onto a subset of columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<DataFrame> {
        self.require_columns(names)?;
        let mut result = DataFrame::new();
        for name in names {
            result.add_column(*name, self.column(name)?.clone())?;
        }
        Ok(result)
    }

    /// Stack `other` below `self`. Both frames must share the same column names.
    pub fn vstack(&self, other: &DataFrame) -> Result<DataFrame> {
        if self.columns.is_empty() {
            return Ok(other.clone());
        }
        if other.columns.is_empty() {
            return Ok(self.clone());
        }

        let names: Vec<&str> = self.column_names.iter().map(String::as_str).collect();
        other.require_columns(&names)?;
        if other.column_count() != self.column_count() {
            return Err(Error::InvalidInput(
                "frames with different column sets cannot be stacked".to_string(),
            ));
        }

        let mut result = DataFrame::new();
        for name in names {
            let stacked = self.column(name)?.concat(other.column(name)?)?;
            result.add_column(name, stacked)?;
        }
        Ok(result)
    }

    /// Row-major numeric matrix over `names`. Missing columns are a schema
    /// violation; null cells are read as zero.
    pub fn to_matrix(&self, names: &[&str]) -> Result<Vec<Vec<f64>>> {
        self.require_columns(names)?;

        let mut data = vec![vec![0.0; names.len()]; self.row_count];
        for (col_idx, name) in names.iter().enumerate() {
            let values = self.f64_values(name)?;
            for (row_idx, value) in values.into_iter().enumerate() {
                data[row_idx][col_idx] = value.unwrap_or(0.0);
            }
        }
        Ok(data)
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return write!(f, "DataFrame (0 rows x 0 columns)");
        }

        let widths: Vec<usize> = self
            .column_names
            .iter()
            .zip(self.columns.iter())
            .map(|(name, col)| {
                (0..self.row_count)
                    .map(|i| col.format_cell(i).chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for (name, width) in self.column_names.iter().zip(widths.iter()) {
            write!(f, " {:<width$} |", name, width = width)?;
        }
        writeln!(f)?;
        for width in &widths {
            write!(f, "-{:-<width$}-+", "", width = width)?;
        }
        writeln!(f)?;

        for i in 0..self.row_count {
            for (col, width) in self.columns.iter().zip(widths.iter()) {
                write!(f, " {:<width$} |", col.format_cell(i), width = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "DataFrame ({} rows x {} columns):",
            self.row_count,
            self.columns.len()
        )?;
        fmt::Display::fmt(self, f)
    }
}
