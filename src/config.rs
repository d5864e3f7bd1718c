//! Pipeline configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file
//! at all) yields the standard analysis setup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::incident::columns;
use crate::ml::clustering::{KMeansConfig, Linkage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "database/cyber_attacks.db".to_string(),
        }
    }
}

/// Names of the tables read and written by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub incidents: String,
    pub processed: String,
    pub pca_variance: String,
    pub feature_correlation: String,
    pub kmeans_clusters: String,
    pub kmeans_summary: String,
    pub agglomerative: String,
    pub agglomerative_dendrogram: String,
    pub evaluation: String,
    pub kmeans_davies_bouldin: String,
    pub agglomerative_davies_bouldin: String,
}

impl Default for TableNames {
    fn default() -> Self {
        TableNames {
            incidents: "cyber_incidents".to_string(),
            processed: "cyber_incidents_processed".to_string(),
            pca_variance: "pca_variance".to_string(),
            feature_correlation: "feature_correlation".to_string(),
            kmeans_clusters: "kmeans_named_clusters".to_string(),
            kmeans_summary: "kmeans_cluster_summary".to_string(),
            agglomerative: "agglomerative_table".to_string(),
            agglomerative_dendrogram: "agglomerative_dendrogram".to_string(),
            evaluation: "model_evaluation_metrics".to_string(),
            kmeans_davies_bouldin: "kmeans_davies_bouldin_detail".to_string(),
            agglomerative_davies_bouldin: "agglomerative_davies_bouldin_detail".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansSettings {
    pub n_clusters: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub random_seed: u64,
    /// Largest k tried by the elbow sweep
    pub max_k: usize,
}

impl Default for KMeansSettings {
    fn default() -> Self {
        let defaults = KMeansConfig::default();
        KMeansSettings {
            n_clusters: defaults.n_clusters,
            n_init: defaults.n_init,
            max_iter: defaults.max_iter,
            tol: defaults.tol,
            random_seed: 42,
            max_k: 10,
        }
    }
}

impl KMeansSettings {
    pub fn to_kmeans_config(&self) -> KMeansConfig {
        KMeansConfig {
            n_clusters: self.n_clusters,
            n_init: self.n_init,
            max_iter: self.max_iter,
            tol: self.tol,
            random_seed: Some(self.random_seed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaSettings {
    pub n_components: usize,
}

impl Default for PcaSettings {
    fn default() -> Self {
        PcaSettings { n_components: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgglomerativeSettings {
    pub n_clusters: usize,
    pub linkage: Linkage,
}

impl Default for AgglomerativeSettings {
    fn default() -> Self {
        AgglomerativeSettings {
            n_clusters: 4,
            linkage: Linkage::Ward,
        }
    }
}

/// Feature columns consumed by each stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    /// Inputs of PCA and k-means
    pub clustering_columns: Vec<String>,
    /// Group means for agglomerative clustering and the evaluation inputs
    pub evaluation_columns: Vec<String>,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        FeatureSettings {
            clustering_columns: [
                columns::SECTOR_TAG,
                columns::ATTACK_TYPE_TAG,
                columns::ATTACKER_CATEGORY_TAG,
                columns::IMPACT_INDICATOR_TAG,
                columns::TOTAL_ATTACK_SEVERITY,
                columns::CYBER_INTENSITY,
            ]
            .iter()
            .map(|c| columns::norm(c))
            .collect(),
            evaluation_columns: [columns::TOTAL_ATTACK_SEVERITY, columns::CYBER_INTENSITY]
                .iter()
                .map(|c| columns::norm(c))
                .collect(),
        }
    }
}

impl FeatureSettings {
    pub fn clustering_refs(&self) -> Vec<&str> {
        self.clustering_columns.iter().map(String::as_str).collect()
    }

    pub fn evaluation_refs(&self) -> Vec<&str> {
        self.evaluation_columns.iter().map(String::as_str).collect()
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub database: DatabaseConfig,
    pub tables: TableNames,
    pub kmeans: KMeansSettings,
    pub pca: PcaSettings,
    pub agglomerative: AgglomerativeSettings,
    pub features: FeatureSettings,
}

impl PipelineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.kmeans.n_clusters == 0, "kmeans.n_clusters must be at least 1"),
            (self.kmeans.n_init == 0, "kmeans.n_init must be at least 1"),
            (self.kmeans.max_iter == 0, "kmeans.max_iter must be at least 1"),
            (self.kmeans.max_k == 0, "kmeans.max_k must be at least 1"),
            (
                self.kmeans.tol.is_nan() || self.kmeans.tol < 0.0,
                "kmeans.tol must be a non-negative number",
            ),
            (self.pca.n_components == 0, "pca.n_components must be at least 1"),
            (
                self.agglomerative.n_clusters == 0,
                "agglomerative.n_clusters must be at least 1",
            ),
            (
                self.features.clustering_columns.is_empty(),
                "features.clustering_columns must not be empty",
            ),
            (
                self.features.evaluation_columns.is_empty(),
                "features.evaluation_columns must not be empty",
            ),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(Error::Config(message.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.kmeans.n_clusters, 4);
        assert_eq!(config.kmeans.max_k, 10);
        assert_eq!(config.pca.n_components, 6);
        assert_eq!(config.agglomerative.linkage, Linkage::Ward);
        assert_eq!(config.features.clustering_columns.len(), 6);
        assert_eq!(
            config.features.evaluation_columns,
            vec![
                "total_attack_severity_norm".to_string(),
                "cyber_intensity_norm".to_string()
            ]
        );
    }

    #[test]
    fn test_partial_override() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [kmeans]
            n_clusters = 3

            [agglomerative]
            linkage = "average"

            [tables]
            processed = "features"
            "#,
        )
        .unwrap();
        assert_eq!(config.kmeans.n_clusters, 3);
        assert_eq!(config.kmeans.n_init, 10);
        assert_eq!(config.agglomerative.linkage, Linkage::Average);
        assert_eq!(config.tables.processed, "features");
        assert_eq!(config.tables.incidents, "cyber_incidents");
    }

    #[test]
    fn test_validation_rejects_zero_clusters() {
        let err = PipelineConfig::from_toml_str("[kmeans]\nn_clusters = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), config);
    }
}
