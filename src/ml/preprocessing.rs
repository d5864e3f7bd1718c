//! Preprocessing
//!
//! Column standardization used by the feature stage and by PCA.

use std::collections::HashMap;

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::ml::pipeline::Transformer;

/// Standardizes numeric columns to zero mean and unit variance.
///
/// Each input column `c` produces a new Float64 column `c_norm`; the input
/// column is left untouched. Statistics use the population standard
/// deviation and ignore null cells. A column with zero variance maps every
/// non-null value to `0.0`. Nulls stay null.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    /// Column means
    means: HashMap<String, f64>,
    /// Column standard deviations
    stds: HashMap<String, f64>,
    /// Columns to scale, in output order
    columns: Vec<String>,
    suffix: String,
}

impl StandardScaler {
    pub fn new(columns: Vec<String>) -> Self {
        StandardScaler {
            means: HashMap::new(),
            stds: HashMap::new(),
            columns,
            suffix: "_norm".to_string(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn mean(&self, column: &str) -> Option<f64> {
        self.means.get(column).copied()
    }

    pub fn std(&self, column: &str) -> Option<f64> {
        self.stds.get(column).copied()
    }

    pub fn output_name(&self, column: &str) -> String {
        format!("{}{}", column, self.suffix)
    }

    /// Scale a single value with the fitted statistics of `column`
    pub fn scale(&self, column: &str, value: f64) -> Result<f64> {
        let (mean, std) = match (self.means.get(column), self.stds.get(column)) {
            (Some(m), Some(s)) => (*m, *s),
            _ => {
                return Err(Error::InvalidOperation(format!(
                    "StandardScaler has not been fitted on column {}",
                    column
                )))
            }
        };
        Ok(if std > 0.0 { (value - mean) / std } else { 0.0 })
    }
}

/// Mean and population standard deviation of the non-null values
pub fn column_stats(values: &[Option<f64>]) -> (f64, f64) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return (0.0, 0.0);
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Standardize every column of a row-major matrix in place, returning the
/// per-column (mean, std)
pub fn standardize_matrix(data: &mut [Vec<f64>]) -> Vec<(f64, f64)> {
    let n_features = data.first().map_or(0, |row| row.len());
    let mut stats = Vec::with_capacity(n_features);

    for j in 0..n_features {
        let column: Vec<Option<f64>> = data.iter().map(|row| Some(row[j])).collect();
        let (mean, std) = column_stats(&column);
        for row in data.iter_mut() {
            row[j] = if std > 0.0 { (row[j] - mean) / std } else { 0.0 };
        }
        stats.push((mean, std));
    }

    stats
}

impl Transformer for StandardScaler {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let names: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        df.require_columns(&names)?;

        self.means.clear();
        self.stds.clear();
        for col_name in &self.columns {
            let (mean, std) = column_stats(&df.f64_values(col_name)?);
            log::debug!("{}: mean={:.4}, std={:.4}", col_name, mean, std);
            self.means.insert(col_name.clone(), mean);
            self.stds.insert(col_name.clone(), std);
        }
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let names: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        df.require_columns(&names)?;

        let mut result = df.clone();
        for col_name in &self.columns {
            let values = df.f64_values(col_name)?;
            let scaled = values
                .into_iter()
                .map(|v| v.map(|x| self.scale(col_name, x)).transpose())
                .collect::<Result<Vec<_>>>()?;
            result.set_column(self.output_name(col_name), Column::Float64(scaled))?;
        }
        Ok(result)
    }
}
