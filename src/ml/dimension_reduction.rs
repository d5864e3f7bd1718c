//! Dimensionality reduction
//!
//! Principal component analysis over the standardized feature matrix. Used
//! for inspection and the variance report only; cluster inputs never pass
//! through it.

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::ml::pipeline::Transformer;
use crate::ml::preprocessing::standardize_matrix;

const JACOBI_MAX_SWEEPS: usize = 100;

/// Principal component analysis
#[derive(Debug, Clone)]
pub struct PCA {
    /// Number of components kept
    n_components: usize,
    /// Share of total variance per component
    explained_variance_ratio: Vec<f64>,
    /// Running sum of `explained_variance_ratio`
    cumulative_explained_variance: Vec<f64>,
    /// Eigenvalues of the covariance matrix, descending
    explained_variance: Vec<f64>,
    /// Unit eigenvectors, one per component
    components: Vec<Vec<f64>>,
    /// Per-feature mean used for re-standardization
    mean: Vec<f64>,
    /// Per-feature standard deviation used for re-standardization
    std: Vec<f64>,
    /// Input columns
    feature_names: Vec<String>,
    fitted: bool,
}

impl PCA {
    pub fn new(n_components: usize) -> Self {
        PCA {
            n_components,
            explained_variance_ratio: Vec::new(),
            cumulative_explained_variance: Vec::new(),
            explained_variance: Vec::new(),
            components: Vec::new(),
            mean: Vec::new(),
            std: Vec::new(),
            feature_names: Vec::new(),
            fitted: false,
        }
    }

    /// Columns read when used as a [`Transformer`]
    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.feature_names = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    pub fn cumulative_explained_variance(&self) -> &[f64] {
        &self.cumulative_explained_variance
    }

    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Sample covariance (n - 1 denominator) of already centered data
    fn compute_covariance_matrix(data: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let n_samples = data.len();
        let n_features = data[0].len();
        let denom = (n_samples as f64 - 1.0).max(1.0);

        let mut cov = vec![vec![0.0; n_features]; n_features];
        for i in 0..n_features {
            for j in i..n_features {
                let sum: f64 = data.iter().map(|row| row[i] * row[j]).sum();
                cov[i][j] = sum / denom;
                cov[j][i] = cov[i][j];
            }
        }
        cov
    }

    /// Fit on a row-major matrix
    pub fn fit_matrix(&mut self, data: &[Vec<f64>]) -> Result<()> {
        if data.len() < 2 {
            return Err(Error::InsufficientData(
                "PCA needs at least two samples".to_string(),
            ));
        }
        let n_features = data[0].len();
        if data.iter().any(|row| row.len() != n_features) {
            return Err(Error::InvalidInput("ragged feature matrix".to_string()));
        }
        if self.n_components == 0 || self.n_components > n_features {
            return Err(Error::InvalidInput(format!(
                "n_components must be between 1 and {}, got {}",
                n_features, self.n_components
            )));
        }

        let mut scaled = data.to_vec();
        let stats = standardize_matrix(&mut scaled);
        self.mean = stats.iter().map(|(m, _)| *m).collect();
        self.std = stats.iter().map(|(_, s)| *s).collect();

        let cov = Self::compute_covariance_matrix(&scaled);
        let total_variance: f64 = (0..n_features).map(|i| cov[i][i]).sum();
        let (eigenvalues, eigenvectors) = jacobi_eigen(&cov);

        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

        self.explained_variance.clear();
        self.explained_variance_ratio.clear();
        self.cumulative_explained_variance.clear();
        self.components.clear();

        let mut cumulative = 0.0;
        for &idx in order.iter().take(self.n_components) {
            let eigenvalue = eigenvalues[idx].max(0.0);
            let ratio = if total_variance > 0.0 {
                eigenvalue / total_variance
            } else {
                0.0
            };
            cumulative += ratio;

            let mut component: Vec<f64> = eigenvectors.iter().map(|row| row[idx]).collect();
            normalize_sign(&mut component);

            self.explained_variance.push(eigenvalue);
            self.explained_variance_ratio.push(ratio);
            self.cumulative_explained_variance.push(cumulative);
            self.components.push(component);
        }

        for (i, (ratio, cum)) in self
            .explained_variance_ratio
            .iter()
            .zip(self.cumulative_explained_variance.iter())
            .enumerate()
        {
            log::info!("PC{}: {:.4} (cumulative {:.4})", i + 1, ratio, cum);
        }

        self.fitted = true;
        Ok(())
    }

    /// Project rows onto the fitted components
    pub fn transform_matrix(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        if !self.fitted {
            return Err(Error::InvalidOperation("PCA has not been fitted".to_string()));
        }

        data.iter()
            .map(|row| {
                if row.len() != self.mean.len() {
                    return Err(Error::LengthMismatch {
                        expected: self.mean.len(),
                        actual: row.len(),
                    });
                }
                let scaled: Vec<f64> = row
                    .iter()
                    .enumerate()
                    .map(|(j, &x)| {
                        if self.std[j] > 0.0 {
                            (x - self.mean[j]) / self.std[j]
                        } else {
                            0.0
                        }
                    })
                    .collect();
                Ok(self
                    .components
                    .iter()
                    .map(|c| c.iter().zip(scaled.iter()).map(|(a, b)| a * b).sum())
                    .collect())
            })
            .collect()
    }

    /// `component`, `explained_variance` and `cumulative_variance` per component
    pub fn variance_report(&self) -> Result<DataFrame> {
        if !self.fitted {
            return Err(Error::InvalidOperation("PCA has not been fitted".to_string()));
        }
        let mut df = DataFrame::new();
        df.add_column(
            "component",
            Column::from_strings(
                (1..=self.components.len())
                    .map(|i| format!("PC{}", i))
                    .collect(),
            ),
        )?;
        df.add_column(
            "explained_variance",
            Column::from_f64(self.explained_variance_ratio.clone()),
        )?;
        df.add_column(
            "cumulative_variance",
            Column::from_f64(self.cumulative_explained_variance.clone()),
        )?;
        Ok(df)
    }

    fn column_refs(&self) -> Result<Vec<&str>> {
        if self.feature_names.is_empty() {
            return Err(Error::InvalidInput(
                "PCA has no input columns configured".to_string(),
            ));
        }
        Ok(self.feature_names.iter().map(String::as_str).collect())
    }
}

impl Transformer for PCA {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let names = self.column_refs()?;
        let data = df.to_matrix(&names)?;
        self.fit_matrix(&data)
    }

    /// Appends `PC1..PCn`
    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let names = self.column_refs()?;
        let projected = self.transform_matrix(&df.to_matrix(&names)?)?;

        let mut result = df.clone();
        for k in 0..self.components.len() {
            result.set_column(
                format!("PC{}", k + 1),
                Column::from_f64(projected.iter().map(|row| row[k]).collect()),
            )?;
        }
        Ok(result)
    }
}

/// Flip `v` so its largest-magnitude entry is positive
fn normalize_sign(v: &mut [f64]) {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        v.iter_mut().for_each(|x| *x = -*x);
    }
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns the eigenvalues and a matrix whose columns are the matching unit
/// eigenvectors.
fn jacobi_eigen(matrix: &[Vec<f64>]) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = matrix.len();
    let mut a = matrix.to_vec();
    let mut v = vec![vec![0.0; n]; n];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[p][q] * a[p][q])
            .sum();
        if off <= 1e-24 * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q] == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    ((0..n).map(|i| a[i][i]).collect(), v)
}

/// Pearson correlation matrix of `columns`, as a frame with a leading
/// `feature` column. Pairs involving a constant column are null.
pub fn correlation_matrix(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let data = df.to_matrix(columns)?;
    let n = data.len();
    if n < 2 {
        return Err(Error::InsufficientData(
            "correlation needs at least two rows".to_string(),
        ));
    }

    let mut scaled = data;
    let stats = standardize_matrix(&mut scaled);

    let mut result = DataFrame::new();
    result.add_column("feature", Column::from_strings(columns.to_vec()))?;
    for (j, name) in columns.iter().enumerate() {
        let values: Vec<Option<f64>> = (0..columns.len())
            .map(|i| {
                if stats[i].1 > 0.0 && stats[j].1 > 0.0 {
                    let r = scaled.iter().map(|row| row[i] * row[j]).sum::<f64>() / n as f64;
                    Some(r.clamp(-1.0, 1.0))
                } else {
                    None
                }
            })
            .collect();
        result.add_column(*name, Column::Float64(values))?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlated() -> Vec<Vec<f64>> {
        (0..20)
            .map(|i| {
                let x = i as f64;
                vec![x, 2.0 * x + if i % 2 == 0 { 0.5 } else { -0.5 }, (i % 3) as f64]
            })
            .collect()
    }

    #[test]
    fn test_pca_variance_is_ordered_and_cumulative() {
        let mut pca = PCA::new(3);
        pca.fit_matrix(&correlated()).unwrap();

        let ratios = pca.explained_variance_ratio();
        assert!(ratios.windows(2).all(|w| w[0] >= w[1]));
        let total: f64 = ratios.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((pca.cumulative_explained_variance()[2] - 1.0).abs() < 1e-9);
        assert!(ratios[0] > 0.6);
    }

    #[test]
    fn test_components_are_orthonormal() {
        let mut pca = PCA::new(3);
        pca.fit_matrix(&correlated()).unwrap();
        let c = pca.components();
        for i in 0..3 {
            for j in 0..3 {
                let dot: f64 = c[i].iter().zip(c[j].iter()).map(|(a, b)| a * b).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-9);
            }
            let max = c[i].iter().copied().fold(0.0_f64, |m, x| if x.abs() > m.abs() { x } else { m });
            assert!(max > 0.0);
        }
    }

    #[test]
    fn test_jacobi_diagonalizes() {
        let m = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
        let (mut values, _) = jacobi_eigen(&m);
        values.sort_by(|a, b| a.total_cmp(b));
        assert!((values[0] - 1.0).abs() < 1e-12);
        assert!((values[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_many_components_is_rejected() {
        let mut pca = PCA::new(4);
        assert!(matches!(pca.fit_matrix(&correlated()), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_transformer_appends_components() {
        let mut df = DataFrame::new();
        let data = correlated();
        for (j, name) in ["a", "b", "c"].iter().enumerate() {
            df.add_column(*name, Column::from_f64(data.iter().map(|r| r[j]).collect()))
                .unwrap();
        }
        let mut pca = PCA::new(2).with_columns(&["a", "b", "c"]);
        let out = pca.fit_transform(&df).unwrap();
        assert!(out.contains_column("PC1"));
        assert!(out.contains_column("PC2"));
        assert!(!out.contains_column("PC3"));

        let report = pca.variance_report().unwrap();
        assert_eq!(report.row_count(), 2);
        assert_eq!(report.column("component").unwrap().get_string(1).as_deref(), Some("PC2"));
    }

    #[test]
    fn test_correlation_matrix() {
        let mut df = DataFrame::new();
        df.add_column("x", Column::from_f64(vec![1.0, 2.0, 3.0])).unwrap();
        df.add_column("y", Column::from_f64(vec![3.0, 2.0, 1.0])).unwrap();
        df.add_column("k", Column::from_f64(vec![1.0, 1.0, 1.0])).unwrap();
        let corr = correlation_matrix(&df, &["x", "y", "k"]).unwrap();
        let y = corr.f64_values("y").unwrap();
        assert!((y[0].unwrap() + 1.0).abs() < 1e-12);
        assert!((y[1].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(y[2], None);
    }
}
