//! Clustering quality metrics

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn euclidean_distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Check shapes and labels; returns the number of clusters.
///
/// Cluster ids must cover `0..=max(labels)` with no gaps.
fn validate(data: &[Vec<f64>], labels: &[usize]) -> Result<usize> {
    if data.len() != labels.len() {
        return Err(Error::LengthMismatch {
            expected: data.len(),
            actual: labels.len(),
        });
    }
    let n_features = match data.first() {
        Some(row) => row.len(),
        None => return Err(Error::InsufficientData("no samples to evaluate".to_string())),
    };
    if data.iter().any(|row| row.len() != n_features) {
        return Err(Error::InvalidInput("ragged feature matrix".to_string()));
    }

    let n_clusters = labels.iter().max().map_or(0, |&m| m + 1);
    let mut counts = vec![0usize; n_clusters];
    for &label in labels {
        counts[label] += 1;
    }
    if let Some(empty) = counts.iter().position(|&c| c == 0) {
        return Err(Error::EmptyCluster(empty));
    }
    if n_clusters < 2 {
        return Err(Error::InsufficientData(format!(
            "at least 2 clusters are required, found {}",
            n_clusters
        )));
    }
    Ok(n_clusters)
}

fn centroids(data: &[Vec<f64>], labels: &[usize], n_clusters: usize) -> Vec<Vec<f64>> {
    let n_features = data[0].len();
    let mut sums = vec![vec![0.0; n_features]; n_clusters];
    let mut counts = vec![0usize; n_clusters];
    for (row, &label) in data.iter().zip(labels.iter()) {
        counts[label] += 1;
        for (acc, &x) in sums[label].iter_mut().zip(row.iter()) {
            *acc += x;
        }
    }
    for (centroid, &count) in sums.iter_mut().zip(counts.iter()) {
        for x in centroid.iter_mut() {
            *x /= count as f64;
        }
    }
    sums
}

/// Silhouette coefficient of every sample
///
/// # Arguments
/// * `data` - Feature matrix, one row per sample
/// * `labels` - Cluster id of each row
///
/// # Returns
/// * `Result<Vec<f64>>` - `(b - a) / max(a, b)` per sample; members of
///   singleton clusters score 0
pub fn silhouette_samples(data: &[Vec<f64>], labels: &[usize]) -> Result<Vec<f64>> {
    let n_clusters = validate(data, labels)?;
    let n = data.len();
    if n_clusters > n - 1 {
        return Err(Error::InsufficientData(format!(
            "silhouette needs 2 <= n_clusters <= n_samples - 1, got {} clusters for {} samples",
            n_clusters, n
        )));
    }

    let mut cluster_sizes = vec![0usize; n_clusters];
    for &label in labels {
        cluster_sizes[label] += 1;
    }

    let mut scores = Vec::with_capacity(n);
    for i in 0..n {
        let own = labels[i];
        if cluster_sizes[own] == 1 {
            scores.push(0.0);
            continue;
        }

        let mut sums = vec![0.0; n_clusters];
        for j in 0..n {
            if i != j {
                sums[labels[j]] += euclidean_distance(&data[i], &data[j]);
            }
        }

        let a = sums[own] / (cluster_sizes[own] - 1) as f64;
        let b = (0..n_clusters)
            .filter(|&c| c != own)
            .map(|c| sums[c] / cluster_sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        scores.push(if denom > 0.0 { (b - a) / denom } else { 0.0 });
    }

    Ok(scores)
}

/// Mean silhouette coefficient over all samples
///
/// # Arguments
/// * `data` - Feature matrix, one row per sample
/// * `labels` - Cluster id of each row
///
/// # Returns
/// * `Result<f64>` - Score in `[-1, 1]`; higher is better
pub fn silhouette_score(data: &[Vec<f64>], labels: &[usize]) -> Result<f64> {
    let samples = silhouette_samples(data, labels)?;
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Per-cluster Davies-Bouldin breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterSeparation {
    pub cluster: usize,
    /// Mean distance of members to their centroid
    pub dispersion: f64,
    /// Cluster with the highest ratio to this one
    pub closest_cluster: usize,
    /// `(s_i + s_j) / d(c_i, c_j)` against `closest_cluster`
    pub ratio: f64,
}

/// Davies-Bouldin breakdown, one entry per cluster id in ascending order.
///
/// Coincident centroids contribute a ratio of 0.
pub fn davies_bouldin_detail(data: &[Vec<f64>], labels: &[usize]) -> Result<Vec<ClusterSeparation>> {
    let n_clusters = validate(data, labels)?;
    let centers = centroids(data, labels, n_clusters);

    let mut dispersion_sums = vec![0.0; n_clusters];
    let mut counts = vec![0usize; n_clusters];
    for (row, &label) in data.iter().zip(labels.iter()) {
        dispersion_sums[label] += euclidean_distance(row, &centers[label]);
        counts[label] += 1;
    }
    let dispersions: Vec<f64> = dispersion_sums
        .iter()
        .zip(counts.iter())
        .map(|(s, &c)| s / c as f64)
        .collect();

    let detail = (0..n_clusters)
        .map(|i| {
            let mut closest: Option<(usize, f64)> = None;
            for j in (0..n_clusters).filter(|&j| j != i) {
                let distance = euclidean_distance(&centers[i], &centers[j]);
                let ratio = if distance > 0.0 {
                    (dispersions[i] + dispersions[j]) / distance
                } else {
                    0.0
                };
                if closest.map_or(true, |(_, best)| ratio > best) {
                    closest = Some((j, ratio));
                }
            }
            // n_clusters >= 2, so every cluster has a neighbour
            let (closest_cluster, ratio) = closest.unwrap_or((i, 0.0));
            ClusterSeparation {
                cluster: i,
                dispersion: dispersions[i],
                closest_cluster,
                ratio,
            }
        })
        .collect();

    Ok(detail)
}

/// Davies-Bouldin index
///
/// # Arguments
/// * `data` - Feature matrix, one row per sample
/// * `labels` - Cluster id of each row
///
/// # Returns
/// * `Result<f64>` - Mean over clusters of the worst separation ratio; lower is better
pub fn davies_bouldin_score(data: &[Vec<f64>], labels: &[usize]) -> Result<f64> {
    let detail = davies_bouldin_detail(data, labels)?;
    Ok(detail.iter().map(|d| d.ratio).sum::<f64>() / detail.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> (Vec<Vec<f64>>, Vec<usize>) {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 0.0],
            vec![10.0, 1.0],
        ];
        (data, vec![0, 0, 1, 1])
    }

    #[test]
    fn test_silhouette_well_separated() {
        let (data, labels) = two_groups();
        let samples = silhouette_samples(&data, &labels).unwrap();
        // a = 1, b = (10 + sqrt(101)) / 2
        let b = (10.0 + 101f64.sqrt()) / 2.0;
        let expected = (b - 1.0) / b;
        for s in &samples {
            assert!((s - expected).abs() < 1e-12);
        }
        assert!((silhouette_score(&data, &labels).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_singleton_scores_zero() {
        let data = vec![vec![0.0], vec![1.0], vec![10.0]];
        let samples = silhouette_samples(&data, &[0, 0, 1]).unwrap();
        assert_eq!(samples[2], 0.0);
    }

    #[test]
    fn test_davies_bouldin_two_groups() {
        let (data, labels) = two_groups();
        let detail = davies_bouldin_detail(&data, &labels).unwrap();
        assert_eq!(detail.len(), 2);
        assert!((detail[0].dispersion - 0.5).abs() < 1e-12);
        assert_eq!(detail[0].closest_cluster, 1);
        assert!((detail[0].ratio - 0.1).abs() < 1e-12);
        assert!((davies_bouldin_score(&data, &labels).unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_reject_degenerate_labels() {
        let (data, _) = two_groups();
        assert!(matches!(
            silhouette_score(&data, &[0, 0, 0, 0]),
            Err(Error::InsufficientData(_))
        ));
        assert!(matches!(
            davies_bouldin_score(&data, &[0, 0, 2, 2]),
            Err(Error::EmptyCluster(1))
        ));
        assert!(matches!(
            silhouette_score(&data, &[0, 1, 2, 3]),
            Err(Error::InsufficientData(_))
        ));
        assert!(matches!(
            silhouette_score(&data, &[0, 1]),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_metrics_ignore_row_order() {
        let data: Vec<Vec<f64>> = (0..12)
            .map(|i| vec![(i % 3) as f64 * 4.0 + (i as f64) * 0.1, (i % 2) as f64])
            .collect();
        let labels: Vec<usize> = (0..12).map(|i| i % 3).collect();

        let mut order: Vec<usize> = (0..12).collect();
        order.reverse();
        order.swap(0, 5);
        let shuffled: Vec<Vec<f64>> = order.iter().map(|&i| data[i].clone()).collect();
        let shuffled_labels: Vec<usize> = order.iter().map(|&i| labels[i]).collect();

        let s1 = silhouette_score(&data, &labels).unwrap();
        let s2 = silhouette_score(&shuffled, &shuffled_labels).unwrap();
        assert!((s1 - s2).abs() < 1e-12);

        let d1 = davies_bouldin_score(&data, &labels).unwrap();
        let d2 = davies_bouldin_score(&shuffled, &shuffled_labels).unwrap();
        assert!((d1 - d2).abs() < 1e-12);
    }
}
