//! Clustering
//!
//! k-means with k-means++ restarts and agglomerative (hierarchical)
//! clustering with a full merge history.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::ml::pipeline::Transformer;

/// Name of the label column appended by the clustering transformers
pub const CLUSTER_COLUMN: &str = "cluster";

fn squared_euclidean_distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| (xi - yi).powi(2))
        .sum()
}

/// Number of distinct rows (bitwise, with `-0.0 == 0.0`)
pub fn count_distinct_rows(data: &[Vec<f64>]) -> usize {
    data.iter()
        .map(|row| {
            row.iter()
                .map(|&x| if x == 0.0 { 0u64 } else { x.to_bits() })
                .collect::<Vec<u64>>()
        })
        .collect::<HashSet<_>>()
        .len()
}

fn validate_matrix(data: &[Vec<f64>]) -> Result<usize> {
    let n_features = match data.first() {
        Some(row) => row.len(),
        None => return Err(Error::InsufficientData("no samples to cluster".to_string())),
    };
    if n_features == 0 {
        return Err(Error::InvalidInput("samples have no features".to_string()));
    }
    if data.iter().any(|row| row.len() != n_features) {
        return Err(Error::InvalidInput("ragged feature matrix".to_string()));
    }
    if data.iter().flatten().any(|x| !x.is_finite()) {
        return Err(Error::InvalidInput(
            "feature matrix contains non-finite values".to_string(),
        ));
    }
    Ok(n_features)
}

/// Configuration for k-means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Number of clusters
    pub n_clusters: usize,
    /// Number of k-means++ restarts; the lowest-inertia run wins
    pub n_init: usize,
    /// Maximum Lloyd iterations per run
    pub max_iter: usize,
    /// Convergence tolerance, relative to the mean feature variance
    pub tol: f64,
    /// Random seed for reproducibility (None = OS entropy)
    pub random_seed: Option<u64>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        KMeansConfig {
            n_clusters: 4,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            random_seed: Some(42),
        }
    }
}

/// Builder for KMeansConfig
pub struct KMeansConfigBuilder {
    config: KMeansConfig,
}

impl KMeansConfigBuilder {
    pub fn new() -> Self {
        KMeansConfigBuilder {
            config: KMeansConfig::default(),
        }
    }

    pub fn n_clusters(mut self, k: usize) -> Self {
        self.config.n_clusters = k;
        self
    }

    pub fn n_init(mut self, n_init: usize) -> Self {
        self.config.n_init = n_init;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.config.tol = tol;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    pub fn build(self) -> KMeansConfig {
        self.config
    }
}

impl Default for KMeansConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one Lloyd run
struct KMeansRun {
    centroids: Vec<Vec<f64>>,
    labels: Vec<usize>,
    inertia: f64,
    n_iter: usize,
}

/// k-means clustering
#[derive(Debug, Clone)]
pub struct KMeans {
    config: KMeansConfig,
    /// Cluster centers
    centroids: Vec<Vec<f64>>,
    /// Cluster of each fitted sample
    labels: Vec<usize>,
    /// Input columns
    feature_names: Vec<String>,
    /// Sum of squared distances to the assigned centroid
    inertia: f64,
    /// Iterations used by the winning run
    n_iter: usize,
    fitted: bool,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        KMeans {
            config,
            centroids: Vec::new(),
            labels: Vec::new(),
            feature_names: Vec::new(),
            inertia: 0.0,
            n_iter: 0,
            fitted: false,
        }
    }

    /// Columns read when used as a [`Transformer`]
    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.feature_names = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// k-means++ seeding: each new center is drawn with probability
    /// proportional to its squared distance from the nearest chosen center
    fn kmeans_plus_plus_init(&self, data: &[Vec<f64>], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let n_samples = data.len();
        let first_idx = rng.random_range(0..n_samples);
        let mut centroids = vec![data[first_idx].clone()];

        while centroids.len() < self.config.n_clusters {
            let distances: Vec<f64> = data
                .iter()
                .map(|point| {
                    centroids
                        .iter()
                        .map(|c| squared_euclidean_distance(point, c))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();
            let sum_distances: f64 = distances.iter().sum();

            let chosen = if sum_distances > 0.0 {
                let threshold = rng.random_range(0.0..sum_distances);
                let mut cumsum = 0.0;
                distances.iter().position(|&d| {
                    cumsum += d;
                    cumsum > threshold
                })
            } else {
                None
            };

            // fall back to the farthest point when sampling found nothing
            let idx = match chosen {
                Some(idx) => idx,
                None => distances
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map_or(0, |(i, _)| i),
            };
            centroids.push(data[idx].clone());
        }

        centroids
    }

    /// Nearest centroid of `point` and the squared distance to it.
    /// Ties go to the lowest cluster index.
    fn nearest(centroids: &[Vec<f64>], point: &[f64]) -> (usize, f64) {
        let mut best = (0, f64::INFINITY);
        for (j, centroid) in centroids.iter().enumerate() {
            let dist = squared_euclidean_distance(point, centroid);
            if dist < best.1 {
                best = (j, dist);
            }
        }
        best
    }

    fn assign(centroids: &[Vec<f64>], data: &[Vec<f64>]) -> (Vec<usize>, Vec<f64>) {
        data.iter().map(|point| Self::nearest(centroids, point)).unzip()
    }

    fn run_once(&self, data: &[Vec<f64>], tol: f64, rng: &mut StdRng) -> KMeansRun {
        let k = self.config.n_clusters;
        let n_features = data[0].len();
        let mut centroids = self.kmeans_plus_plus_init(data, rng);
        let mut n_iter = 0;

        for iter in 0..self.config.max_iter {
            let (labels, distances) = Self::assign(&centroids, data);

            let mut new_centroids = vec![vec![0.0; n_features]; k];
            let mut counts = vec![0usize; k];
            for (point, &cluster) in data.iter().zip(labels.iter()) {
                counts[cluster] += 1;
                for (acc, &x) in new_centroids[cluster].iter_mut().zip(point.iter()) {
                    *acc += x;
                }
            }

            // empty clusters take over the points farthest from their centers
            let mut far_points: Vec<usize> = (0..data.len()).collect();
            far_points.sort_by(|&a, &b| distances[b].total_cmp(&distances[a]));
            let mut far_points = far_points.into_iter();

            for (cluster, centroid) in new_centroids.iter_mut().enumerate() {
                if counts[cluster] > 0 {
                    for x in centroid.iter_mut() {
                        *x /= counts[cluster] as f64;
                    }
                } else if let Some(idx) = far_points.next() {
                    log::debug!("relocating empty cluster {} to sample {}", cluster, idx);
                    *centroid = data[idx].clone();
                }
            }

            let centroid_shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(old, new)| squared_euclidean_distance(old, new))
                .sum();

            centroids = new_centroids;
            n_iter = iter + 1;

            if centroid_shift <= tol {
                break;
            }
        }

        let (labels, distances) = Self::assign(&centroids, data);
        KMeansRun {
            centroids,
            labels,
            inertia: distances.iter().sum(),
            n_iter,
        }
    }

    /// Fit on a row-major matrix.
    ///
    /// Fails when `n_clusters` is zero or exceeds the number of distinct rows.
    pub fn fit_matrix(&mut self, data: &[Vec<f64>]) -> Result<()> {
        let n_features = validate_matrix(data)?;
        let k = self.config.n_clusters;
        if k == 0 {
            return Err(Error::InvalidInput("n_clusters must be at least 1".to_string()));
        }
        if self.config.n_init == 0 {
            return Err(Error::InvalidInput("n_init must be at least 1".to_string()));
        }
        let distinct = count_distinct_rows(data);
        if k > distinct {
            return Err(Error::InsufficientData(format!(
                "n_clusters={} exceeds the {} distinct samples",
                k, distinct
            )));
        }

        // absolute tolerance scaled by the mean feature variance
        let n = data.len() as f64;
        let mean_variance = (0..n_features)
            .map(|j| {
                let mean = data.iter().map(|row| row[j]).sum::<f64>() / n;
                data.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n
            })
            .sum::<f64>()
            / n_features as f64;
        let tol = self.config.tol * mean_variance;

        let mut rng = match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut best: Option<KMeansRun> = None;
        for run in 0..self.config.n_init {
            let result = self.run_once(data, tol, &mut rng);
            log::debug!(
                "k-means run {}: inertia {:.6} after {} iterations",
                run,
                result.inertia,
                result.n_iter
            );
            if best.as_ref().map_or(true, |b| result.inertia < b.inertia) {
                best = Some(result);
            }
        }

        let best = best.ok_or_else(|| {
            Error::ComputationError("k-means produced no run".to_string())
        })?;
        self.centroids = best.centroids;
        self.labels = best.labels;
        self.inertia = best.inertia;
        self.n_iter = best.n_iter;
        self.fitted = true;

        log::info!("k-means (k={}): inertia {:.4}", k, self.inertia);
        Ok(())
    }

    /// Nearest fitted centroid of each row
    pub fn predict_matrix(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        if !self.fitted {
            return Err(Error::InvalidOperation("KMeans has not been fitted yet".to_string()));
        }
        let n_features = self.centroids[0].len();
        if let Some(row) = data.iter().find(|row| row.len() != n_features) {
            return Err(Error::LengthMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        Ok(Self::assign(&self.centroids, data).0)
    }

    fn column_refs(&self) -> Result<Vec<&str>> {
        if self.feature_names.is_empty() {
            return Err(Error::InvalidInput(
                "KMeans has no input columns configured".to_string(),
            ));
        }
        Ok(self.feature_names.iter().map(String::as_str).collect())
    }
}

impl Transformer for KMeans {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let names = self.column_refs()?;
        let data = df.to_matrix(&names)?;
        self.fit_matrix(&data)
    }

    /// Appends the `cluster` column
    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let names = self.column_refs()?;
        let labels = self.predict_matrix(&df.to_matrix(&names)?)?;

        let mut result = df.clone();
        result.set_column(
            CLUSTER_COLUMN,
            Column::from_i64(labels.into_iter().map(|l| l as i64).collect()),
        )?;
        Ok(result)
    }
}

/// Inertia of one k in an elbow sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub inertia: f64,
}

/// Fit k-means independently for every `k` in `1..=max_k`.
///
/// Inertia is reported for inspection only; no k is chosen.
pub fn elbow(data: &[Vec<f64>], max_k: usize, config: &KMeansConfig) -> Result<Vec<ElbowPoint>> {
    if max_k == 0 {
        return Err(Error::InvalidInput("max_k must be at least 1".to_string()));
    }

    (1..=max_k)
        .map(|k| {
            let mut model = KMeans::new(KMeansConfig {
                n_clusters: k,
                ..config.clone()
            });
            model.fit_matrix(data)?;
            log::info!("elbow k={}: inertia {:.4}", k, model.inertia());
            Ok(ElbowPoint {
                k,
                inertia: model.inertia(),
            })
        })
        .collect()
}

/// Linkage criteria for agglomerative clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Minimum pairwise distance
    Single,
    /// Maximum pairwise distance
    Complete,
    /// Mean pairwise distance
    Average,
    /// Minimum increase in within-cluster variance
    Ward,
}

impl Default for Linkage {
    fn default() -> Self {
        Linkage::Ward
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Ward => "ward",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Linkage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            "ward" => Ok(Linkage::Ward),
            other => Err(Error::InvalidInput(format!("unknown linkage: {}", other))),
        }
    }
}

/// One merge step. Leaves are `0..n`; the cluster created by step `i` is `n + i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub height: f64,
    /// Number of leaves under the new cluster
    pub size: usize,
}

/// Full merge history of an agglomerative clustering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dendrogram {
    pub n_leaves: usize,
    pub merges: Vec<Merge>,
}

impl Dendrogram {
    /// Build the merge history over `data` with Lance-Williams updates.
    ///
    /// Ward works on squared Euclidean distances and reports heights as
    /// their square roots. Ties go to the lowest pair of active slots.
    pub fn build(data: &[Vec<f64>], linkage: Linkage) -> Result<Dendrogram> {
        validate_matrix(data)?;
        let n = data.len();

        let mut dist = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d2 = squared_euclidean_distance(&data[i], &data[j]);
                let d = if linkage == Linkage::Ward { d2 } else { d2.sqrt() };
                dist[i][j] = d;
                dist[j][i] = d;
            }
        }

        let mut active = vec![true; n];
        let mut sizes = vec![1usize; n];
        let mut ids: Vec<usize> = (0..n).collect();
        let mut merges = Vec::with_capacity(n.saturating_sub(1));

        for step in 0..n.saturating_sub(1) {
            let mut best: Option<(usize, usize, f64)> = None;
            for a in (0..n).filter(|&a| active[a]) {
                for b in ((a + 1)..n).filter(|&b| active[b]) {
                    if best.map_or(true, |(_, _, d)| dist[a][b] < d) {
                        best = Some((a, b, dist[a][b]));
                    }
                }
            }
            let (a, b, d_ab) = best.ok_or_else(|| {
                Error::ComputationError("no active clusters left to merge".to_string())
            })?;

            let (n_a, n_b) = (sizes[a] as f64, sizes[b] as f64);
            for k in (0..n).filter(|&k| active[k] && k != a && k != b) {
                let n_k = sizes[k] as f64;
                let (d_ak, d_bk) = (dist[a][k], dist[b][k]);
                let updated = match linkage {
                    Linkage::Single => d_ak.min(d_bk),
                    Linkage::Complete => d_ak.max(d_bk),
                    Linkage::Average => (n_a * d_ak + n_b * d_bk) / (n_a + n_b),
                    Linkage::Ward => {
                        ((n_a + n_k) * d_ak + (n_b + n_k) * d_bk - n_k * d_ab)
                            / (n_a + n_b + n_k)
                    }
                };
                dist[a][k] = updated;
                dist[k][a] = updated;
            }

            let height = if linkage == Linkage::Ward {
                d_ab.max(0.0).sqrt()
            } else {
                d_ab
            };
            merges.push(Merge {
                left: ids[a].min(ids[b]),
                right: ids[a].max(ids[b]),
                height,
                size: sizes[a] + sizes[b],
            });

            active[b] = false;
            sizes[a] += sizes[b];
            ids[a] = n + step;
        }

        Ok(Dendrogram { n_leaves: n, merges })
    }

    /// Flat labels for `n_clusters` clusters, numbered by first appearance
    /// in sample order
    pub fn cut(&self, n_clusters: usize) -> Result<Vec<usize>> {
        if n_clusters == 0 || n_clusters > self.n_leaves {
            return Err(Error::InvalidInput(format!(
                "cannot cut {} leaves into {} clusters",
                self.n_leaves, n_clusters
            )));
        }

        let n = self.n_leaves;
        let mut root = vec![0usize; n];
        let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        for (step, merge) in self.merges.iter().take(n - n_clusters).enumerate() {
            let mut joined = std::mem::take(&mut members[merge.left]);
            joined.append(&mut members[merge.right]);
            for &leaf in &joined {
                root[leaf] = n + step;
            }
            members.push(joined);
        }
        for (leaf, r) in root.iter_mut().enumerate() {
            if members[leaf].len() == 1 {
                *r = leaf;
            }
        }

        let mut next = 0;
        let mut relabel = std::collections::HashMap::new();
        Ok(root
            .iter()
            .map(|r| {
                *relabel.entry(*r).or_insert_with(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect())
    }

    /// `left`, `right`, `height` and `size` per merge
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut df = DataFrame::new();
        df.add_column(
            "left",
            Column::from_i64(self.merges.iter().map(|m| m.left as i64).collect()),
        )?;
        df.add_column(
            "right",
            Column::from_i64(self.merges.iter().map(|m| m.right as i64).collect()),
        )?;
        df.add_column(
            "height",
            Column::from_f64(self.merges.iter().map(|m| m.height).collect()),
        )?;
        df.add_column(
            "size",
            Column::from_i64(self.merges.iter().map(|m| m.size as i64).collect()),
        )?;
        Ok(df)
    }
}

/// Hierarchical clustering cut to a fixed number of clusters
#[derive(Debug, Clone)]
pub struct AgglomerativeClustering {
    /// Requested number of clusters
    n_clusters: usize,
    linkage: Linkage,
    /// Cluster of each fitted sample
    labels: Vec<usize>,
    dendrogram: Option<Dendrogram>,
    /// Input columns
    feature_names: Vec<String>,
    fitted: bool,
}

impl AgglomerativeClustering {
    pub fn new(n_clusters: usize, linkage: Linkage) -> Self {
        AgglomerativeClustering {
            n_clusters,
            linkage,
            labels: Vec::new(),
            dendrogram: None,
            feature_names: Vec::new(),
            fitted: false,
        }
    }

    /// Columns read when used as a [`Transformer`]
    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.feature_names = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn dendrogram(&self) -> Option<&Dendrogram> {
        self.dendrogram.as_ref()
    }

    /// Clusters actually produced for `n_samples` samples
    pub fn effective_n_clusters(&self, n_samples: usize) -> usize {
        self.n_clusters.min(n_samples)
    }

    /// Fit on a row-major matrix. Requests for more clusters than samples
    /// are clamped to the sample count.
    pub fn fit_matrix(&mut self, data: &[Vec<f64>]) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(Error::InvalidInput("n_clusters must be at least 1".to_string()));
        }
        let dendrogram = Dendrogram::build(data, self.linkage)?;
        let n_clusters = self.effective_n_clusters(data.len());
        if n_clusters < self.n_clusters {
            log::info!(
                "requested {} clusters over {} samples; using {}",
                self.n_clusters,
                data.len(),
                n_clusters
            );
        }

        self.labels = dendrogram.cut(n_clusters)?;
        self.dendrogram = Some(dendrogram);
        self.fitted = true;
        Ok(())
    }

    fn column_refs(&self) -> Result<Vec<&str>> {
        if self.feature_names.is_empty() {
            return Err(Error::InvalidInput(
                "AgglomerativeClustering has no input columns configured".to_string(),
            ));
        }
        Ok(self.feature_names.iter().map(String::as_str).collect())
    }
}

impl Transformer for AgglomerativeClustering {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let names = self.column_refs()?;
        let data = df.to_matrix(&names)?;
        self.fit_matrix(&data)
    }

    /// Appends the `cluster` column. Only valid on the fitted rows.
    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(Error::InvalidOperation(
                "AgglomerativeClustering has not been fitted yet".to_string(),
            ));
        }
        if df.row_count() != self.labels.len() {
            return Err(Error::LengthMismatch {
                expected: self.labels.len(),
                actual: df.row_count(),
            });
        }

        let mut result = df.clone();
        result.set_column(
            CLUSTER_COLUMN,
            Column::from_i64(self.labels.iter().map(|&l| l as i64).collect()),
        )?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        let mut data = Vec::new();
        for i in 0..10 {
            let jitter = i as f64 * 0.01;
            data.push(vec![0.0 + jitter, 0.0 - jitter]);
            data.push(vec![10.0 - jitter, 10.0 + jitter]);
        }
        data
    }

    fn same_partition(a: &[usize], b: &[usize]) -> bool {
        a.len() == b.len()
            && (0..a.len()).all(|i| (0..a.len()).all(|j| (a[i] == a[j]) == (b[i] == b[j])))
    }

    #[test]
    fn test_kmeans_separates_blobs() {
        let data = blobs();
        let mut model = KMeans::new(KMeansConfigBuilder::new().n_clusters(2).build());
        model.fit_matrix(&data).unwrap();

        let expected: Vec<usize> = (0..data.len()).map(|i| i % 2).collect();
        assert!(same_partition(model.labels(), &expected));
        assert!(model.inertia() < 1.0);
    }

    #[test]
    fn test_kmeans_is_deterministic_for_a_seed() {
        let data: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i * 7 % 13) as f64, (i * 3 % 11) as f64])
            .collect();
        let config = KMeansConfigBuilder::new().n_clusters(3).random_seed(7).build();

        let mut a = KMeans::new(config.clone());
        let mut b = KMeans::new(config);
        a.fit_matrix(&data).unwrap();
        b.fit_matrix(&data).unwrap();
        assert_eq!(a.labels(), b.labels());
        assert_eq!(a.inertia(), b.inertia());
    }

    #[test]
    fn test_kmeans_rejects_k_above_distinct_rows() {
        let data = vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![2.0, 2.0]];
        let mut model = KMeans::new(KMeansConfigBuilder::new().n_clusters(3).build());
        assert!(matches!(model.fit_matrix(&data), Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_elbow_inertia_does_not_increase_much() {
        let points = elbow(&blobs(), 4, &KMeansConfig::default()).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].k, 1);
        assert!(points[1].inertia < points[0].inertia);
    }

    #[test]
    fn test_ward_merge_heights() {
        let data = vec![vec![0.0], vec![1.0], vec![5.0]];
        let dendrogram = Dendrogram::build(&data, Linkage::Ward).unwrap();
        assert_eq!(dendrogram.merges.len(), 2);

        let first = dendrogram.merges[0];
        assert_eq!((first.left, first.right, first.size), (0, 1, 2));
        assert!((first.height - 1.0).abs() < 1e-12);

        // sqrt(2 * n1 * n2 / (n1 + n2)) * |c1 - c2| for the ward update
        let second = dendrogram.merges[1];
        assert_eq!((second.left, second.right, second.size), (2, 3, 3));
        let expected = ((2.0 * 2.0 * 1.0 / 3.0) as f64).sqrt() * 4.5;
        assert!((second.height - expected).abs() < 1e-9);
    }

    #[test]
    fn test_single_linkage_heights() {
        let data = vec![vec![0.0], vec![1.0], vec![5.0]];
        let dendrogram = Dendrogram::build(&data, Linkage::Single).unwrap();
        assert!((dendrogram.merges[1].height - 4.0).abs() < 1e-12);
        let complete = Dendrogram::build(&data, Linkage::Complete).unwrap();
        assert!((complete.merges[1].height - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_cut_labels_by_first_appearance() {
        let data = vec![vec![10.0], vec![0.0], vec![10.5], vec![0.2]];
        let dendrogram = Dendrogram::build(&data, Linkage::Ward).unwrap();
        assert_eq!(dendrogram.cut(2).unwrap(), vec![0, 1, 0, 1]);
        assert_eq!(dendrogram.cut(4).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(dendrogram.cut(1).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_agglomerative_clamps_cluster_count() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![5.0, 5.0], vec![9.0, 9.0]];
        let mut model = AgglomerativeClustering::new(10, Linkage::Ward);
        model.fit_matrix(&data).unwrap();
        let distinct: HashSet<usize> = model.labels().iter().copied().collect();
        assert_eq!(distinct.len(), 4);
        assert_eq!(model.effective_n_clusters(data.len()), 4);
    }

    #[test]
    fn test_linkage_from_str() {
        assert_eq!("Ward".parse::<Linkage>().unwrap(), Linkage::Ward);
        assert!("centroid".parse::<Linkage>().is_err());
    }
}
