//! Clustering evaluation
//!
//! Scores stored cluster assignments with silhouette and Davies-Bouldin
//! over a fixed pair of feature columns, and renders the results as tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::labeling::{read_labels, DESCRIPTION_COLUMN};
use crate::ml::clustering::CLUSTER_COLUMN;
use crate::ml::metrics::{davies_bouldin_detail, silhouette_samples, ClusterSeparation};

/// Scores of one clustering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub algorithm: String,
    pub silhouette: f64,
    pub davies_bouldin: f64,
}

/// Full evaluation of one clustering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterEvaluation {
    pub record: EvaluationRecord,
    /// Per-row silhouette of the evaluated rows
    pub silhouette_samples: Vec<f64>,
    pub separation: Vec<ClusterSeparation>,
    /// Display name per cluster id
    pub cluster_names: BTreeMap<usize, String>,
}

impl ClusterEvaluation {
    fn name(&self, cluster: usize) -> String {
        self.cluster_names
            .get(&cluster)
            .cloned()
            .unwrap_or_else(|| format!("Cluster {}", cluster))
    }

    /// Davies-Bouldin breakdown with clusters named by description
    pub fn detail_table(&self) -> Result<DataFrame> {
        let mut df = DataFrame::new();
        df.add_column(
            "cluster",
            Column::from_strings(self.separation.iter().map(|s| self.name(s.cluster)).collect()),
        )?;
        df.add_column(
            "dispersion",
            Column::from_f64(self.separation.iter().map(|s| round3(s.dispersion)).collect()),
        )?;
        df.add_column(
            "closest_cluster",
            Column::from_strings(
                self.separation
                    .iter()
                    .map(|s| self.name(s.closest_cluster))
                    .collect(),
            ),
        )?;
        df.add_column(
            "ratio",
            Column::from_f64(self.separation.iter().map(|s| round3(s.ratio)).collect()),
        )?;
        Ok(df)
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Evaluates the `cluster` column of a table over fixed feature columns
#[derive(Debug, Clone)]
pub struct ClusterEvaluator {
    feature_columns: Vec<String>,
    cluster_column: String,
}

impl ClusterEvaluator {
    pub fn new(feature_columns: &[&str]) -> Self {
        ClusterEvaluator {
            feature_columns: feature_columns.iter().map(|c| c.to_string()).collect(),
            cluster_column: CLUSTER_COLUMN.to_string(),
        }
    }

    pub fn with_cluster_column(mut self, column: &str) -> Self {
        self.cluster_column = column.to_string();
        self
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Score the labeled rows of `df`. Rows without a cluster id are skipped.
    pub fn evaluate(&self, algorithm: &str, df: &DataFrame) -> Result<ClusterEvaluation> {
        let mut required: Vec<&str> = self.feature_columns.iter().map(String::as_str).collect();
        required.push(self.cluster_column.as_str());
        df.require_columns(&required)?;

        let labels = read_labels(df, &self.cluster_column)?;
        let matrix = df.to_matrix(&required[..required.len() - 1])?;
        let descriptions = if df.contains_column(DESCRIPTION_COLUMN) {
            Some(df.string_values(DESCRIPTION_COLUMN)?)
        } else {
            None
        };

        let total = matrix.len();
        let mut data = Vec::with_capacity(total);
        let mut kept = Vec::with_capacity(total);
        let mut cluster_names = BTreeMap::new();
        for (row, (values, label)) in matrix.into_iter().zip(labels).enumerate() {
            let Some(cluster) = label else { continue };
            if let Some(description) = descriptions.as_ref().and_then(|d| d[row].clone()) {
                cluster_names.entry(cluster).or_insert(description);
            }
            data.push(values);
            kept.push(cluster);
        }
        if data.len() < total {
            log::debug!("{}: skipped {} unlabeled rows", algorithm, total - data.len());
        }

        let samples = silhouette_samples(&data, &kept)?;
        let silhouette = samples.iter().sum::<f64>() / samples.len() as f64;
        let separation = davies_bouldin_detail(&data, &kept)?;
        let davies_bouldin =
            separation.iter().map(|s| s.ratio).sum::<f64>() / separation.len() as f64;

        log::info!(
            "{}: silhouette {:.3}, Davies-Bouldin {:.3} over {} rows",
            algorithm,
            silhouette,
            davies_bouldin,
            data.len()
        );

        Ok(ClusterEvaluation {
            record: EvaluationRecord {
                algorithm: algorithm.to_string(),
                silhouette,
                davies_bouldin,
            },
            silhouette_samples: samples,
            separation,
            cluster_names,
        })
    }
}

/// `algorithm`, `silhouette`, `davies_bouldin`, scores rounded to 3 decimals
pub fn evaluation_table(records: &[EvaluationRecord]) -> Result<DataFrame> {
    let mut df = DataFrame::new();
    df.add_column(
        "algorithm",
        Column::from_strings(records.iter().map(|r| r.algorithm.clone()).collect()),
    )?;
    df.add_column(
        "silhouette",
        Column::from_f64(records.iter().map(|r| round3(r.silhouette)).collect()),
    )?;
    df.add_column(
        "davies_bouldin",
        Column::from_f64(records.iter().map(|r| round3(r.davies_bouldin)).collect()),
    )?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn clustered() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_column("x", Column::from_f64(vec![0.0, 0.1, 0.2, 5.0, 5.1, 9.0])).unwrap();
        df.add_column("y", Column::from_f64(vec![0.0, 0.2, 0.1, 5.0, 5.2, 9.0])).unwrap();
        df.add_column(
            CLUSTER_COLUMN,
            Column::Int64(vec![Some(0), Some(0), Some(0), Some(1), Some(1), None]),
        )
        .unwrap();
        df.add_column(
            DESCRIPTION_COLUMN,
            Column::String(vec![
                Some("low".to_string()),
                Some("low".to_string()),
                Some("low".to_string()),
                Some("high".to_string()),
                Some("high".to_string()),
                None,
            ]),
        )
        .unwrap();
        df
    }

    #[test]
    fn test_evaluate_skips_unlabeled_rows() {
        let evaluation = ClusterEvaluator::new(&["x", "y"])
            .evaluate("K-Means", &clustered())
            .unwrap();
        assert_eq!(evaluation.silhouette_samples.len(), 5);
        assert!(evaluation.record.silhouette > 0.9);
        assert!(evaluation.record.davies_bouldin < 0.1);
        assert_eq!(evaluation.cluster_names.get(&1), Some(&"high".to_string()));
    }

    #[test]
    fn test_detail_table_names_clusters() {
        let evaluation = ClusterEvaluator::new(&["x", "y"])
            .evaluate("K-Means", &clustered())
            .unwrap();
        let detail = evaluation.detail_table().unwrap();
        assert_eq!(
            detail.string_values("cluster").unwrap(),
            vec![Some("low".to_string()), Some("high".to_string())]
        );
        assert_eq!(
            detail.string_values("closest_cluster").unwrap(),
            vec![Some("high".to_string()), Some("low".to_string())]
        );
    }

    #[test]
    fn test_single_cluster_is_rejected() {
        let mut df = clustered();
        df.set_column(CLUSTER_COLUMN, Column::from_i64(vec![0; 6])).unwrap();
        let err = ClusterEvaluator::new(&["x", "y"]).evaluate("K-Means", &df).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_evaluation_table_rounds_to_three_decimals() {
        let table = evaluation_table(&[EvaluationRecord {
            algorithm: "Agglomerative".to_string(),
            silhouette: 0.123456,
            davies_bouldin: 1.98765,
        }])
        .unwrap();
        assert_eq!(table.f64_values("silhouette").unwrap(), vec![Some(0.123)]);
        assert_eq!(table.f64_values("davies_bouldin").unwrap(), vec![Some(1.988)]);
    }
}
