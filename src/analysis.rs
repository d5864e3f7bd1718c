//! Analysis stages over a table store
//!
//! Each stage reads the tables it needs by name, runs one step of the
//! analysis and replaces its output tables. Stages are independent: they can
//! be run one at a time (as the CLI subcommands do) or in order with
//! [`AnalysisPipeline::run`], which stops at the first failure.

use std::path::Path;

use crate::column::Column;
use crate::config::PipelineConfig;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::evaluation::{evaluation_table, ClusterEvaluation, ClusterEvaluator};
use crate::incident::grouping::group_features;
use crate::incident::{FeatureEngineer, GroupKind};
use crate::io::{read_csv, TableStore};
use crate::labeling::{summary_table, with_descriptions, ClusterLabeler, ClusterProfile};
use crate::ml::clustering::{
    count_distinct_rows, elbow, AgglomerativeClustering, ElbowPoint, KMeans, CLUSTER_COLUMN,
};
use crate::ml::dimension_reduction::{correlation_matrix, PCA};
use crate::ml::pipeline::Transformer;

pub const KMEANS_ALGORITHM: &str = "K-Means";
pub const AGGLOMERATIVE_ALGORITHM: &str = "Agglomerative";

/// What a full run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub processed_rows: usize,
    pub explained_variance_ratio: Vec<f64>,
    pub elbow: Vec<ElbowPoint>,
    pub kmeans_profiles: Vec<ClusterProfile>,
    pub agglomerative_rows: usize,
    pub evaluations: Vec<ClusterEvaluation>,
}

/// Runs the analysis stages against a [`TableStore`]
pub struct AnalysisPipeline<S: TableStore> {
    store: S,
    config: PipelineConfig,
    labeler: ClusterLabeler,
}

impl<S: TableStore> AnalysisPipeline<S> {
    pub fn new(store: S, config: PipelineConfig) -> Self {
        AnalysisPipeline {
            store,
            config,
            labeler: ClusterLabeler::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn read(&self, table: &str) -> Result<DataFrame> {
        self.store.read_table(table)
    }

    /// Load the raw incidents (optionally from a CSV export first), engineer
    /// features and write the processed table
    pub fn preprocess(&mut self, incidents_csv: Option<&Path>) -> Result<DataFrame> {
        let tables = self.config.tables.clone();
        if let Some(path) = incidents_csv {
            let raw = read_csv(path, true)?;
            self.store.replace_table(&tables.incidents, &raw)?;
        }

        let raw = self.read(&tables.incidents)?;
        log::info!("preprocess: {} raw incidents", raw.row_count());

        let processed = FeatureEngineer::new().process(&raw)?;
        if processed.row_count() == 0 {
            log::warn!("no incident names a reference country");
        }
        self.store.replace_table(&tables.processed, &processed)?;
        Ok(processed)
    }

    /// Fit PCA on the clustering columns; write the variance report and the
    /// correlation matrix of the inputs
    pub fn pca(&mut self) -> Result<PCA> {
        let tables = self.config.tables.clone();
        let processed = self.read(&tables.processed)?;
        let columns = self.config.features.clustering_refs();

        let mut pca = PCA::new(self.config.pca.n_components).with_columns(&columns);
        pca.fit(&processed)?;

        let correlations = correlation_matrix(&processed, &columns)?;
        let report = pca.variance_report()?;
        self.store.replace_table(&tables.pca_variance, &report)?;
        self.store.replace_table(&tables.feature_correlation, &correlations)?;
        Ok(pca)
    }

    /// Inertia for `k = 1..=max_k`. Nothing is written.
    pub fn elbow(&self, max_k: Option<usize>) -> Result<Vec<ElbowPoint>> {
        let processed = self.read(&self.config.tables.processed)?;
        let data = processed.to_matrix(&self.config.features.clustering_refs())?;

        let requested = max_k.unwrap_or(self.config.kmeans.max_k);
        let distinct = count_distinct_rows(&data);
        let max_k = requested.min(distinct);
        if max_k < requested {
            log::warn!(
                "elbow: only {} distinct rows, sweeping k up to {}",
                distinct,
                max_k
            );
        }
        elbow(&data, max_k, &self.config.kmeans.to_kmeans_config())
    }

    /// Fit k-means, label the clusters and write the assignment and summary tables
    pub fn kmeans(&mut self) -> Result<Vec<ClusterProfile>> {
        let tables = self.config.tables.clone();
        let processed = self.read(&tables.processed)?;
        let columns = self.config.features.clustering_refs();

        let mut model = KMeans::new(self.config.kmeans.to_kmeans_config()).with_columns(&columns);
        let clustered = model.fit_transform(&processed)?;
        log::info!(
            "k-means: k={} inertia {:.4} after {} iterations",
            model.config().n_clusters,
            model.inertia(),
            model.n_iter()
        );

        let (named, profiles) = self.labeler.describe_clusters(&clustered)?;
        self.store.replace_table(&tables.kmeans_clusters, &named)?;
        self.store
            .replace_table(&tables.kmeans_summary, &summary_table(&profiles)?)?;
        Ok(profiles)
    }

    /// Ward clustering of the sector/attack and country group means.
    ///
    /// Each grouping is clustered on its own; the group tables are stacked
    /// with their cluster ids and descriptions, the merge histories likewise.
    pub fn agglomerative(&mut self) -> Result<DataFrame> {
        let tables = self.config.tables.clone();
        let processed = self.read(&tables.processed)?;
        let columns = self.config.features.evaluation_refs();

        let mut assignments = DataFrame::new();
        let mut dendrograms = DataFrame::new();
        for kind in [GroupKind::SectorAttack, GroupKind::Country] {
            let grouped = group_features(&processed, kind, &columns)?;
            if grouped.is_empty() {
                log::warn!("{} grouping has no groups; skipped", kind.label());
                continue;
            }

            let mut model = AgglomerativeClustering::new(
                self.config.agglomerative.n_clusters,
                self.config.agglomerative.linkage,
            );
            model.fit_matrix(&grouped.values)?;
            let group_labels = model.labels().to_vec();
            log::info!(
                "{}: {} groups in {} clusters ({} linkage)",
                kind.label(),
                grouped.len(),
                model.effective_n_clusters(grouped.len()),
                model.linkage()
            );

            // profiles come from the member incidents of each group cluster
            let row_labels = grouped.project_labels(&group_labels)?;
            let profiles = self.labeler.profiles(&processed, &row_labels)?;

            let mut frame = grouped.to_frame()?;
            frame.add_column(
                CLUSTER_COLUMN,
                Column::from_i64(group_labels.iter().map(|&l| l as i64).collect()),
            )?;
            let options: Vec<Option<usize>> = group_labels.iter().copied().map(Some).collect();
            let frame = with_descriptions(&frame, &options, &profiles)?;
            assignments = assignments.vstack(&frame)?;

            if let Some(dendrogram) = model.dendrogram() {
                let mut merges = dendrogram.to_frame()?;
                merges.add_column(
                    "data_type",
                    Column::from_strings(vec![kind.label(); dendrogram.merges.len()]),
                )?;
                dendrograms = dendrograms.vstack(&merges)?;
            }
        }

        if assignments.row_count() == 0 {
            return Err(Error::InsufficientData(
                "no incident maps to a sector/attack or country group".to_string(),
            ));
        }

        self.store.replace_table(&tables.agglomerative, &assignments)?;
        if dendrograms.column_count() > 0 {
            self.store
                .replace_table(&tables.agglomerative_dendrogram, &dendrograms)?;
        }
        Ok(assignments)
    }

    /// Score both stored clusterings and write the metric tables
    pub fn evaluate(&mut self) -> Result<Vec<ClusterEvaluation>> {
        let tables = self.config.tables.clone();
        let evaluator = ClusterEvaluator::new(&self.config.features.evaluation_refs());

        let kmeans = evaluator.evaluate(KMEANS_ALGORITHM, &self.read(&tables.kmeans_clusters)?)?;
        let agglomerative = evaluator.evaluate(
            AGGLOMERATIVE_ALGORITHM,
            &self.read(&tables.agglomerative)?,
        )?;

        let records = vec![kmeans.record.clone(), agglomerative.record.clone()];
        self.store
            .replace_table(&tables.evaluation, &evaluation_table(&records)?)?;
        self.store
            .replace_table(&tables.kmeans_davies_bouldin, &kmeans.detail_table()?)?;
        self.store.replace_table(
            &tables.agglomerative_davies_bouldin,
            &agglomerative.detail_table()?,
        )?;
        Ok(vec![kmeans, agglomerative])
    }

    /// Every stage in order
    pub fn run(&mut self, incidents_csv: Option<&Path>) -> Result<RunReport> {
        let processed = self.preprocess(incidents_csv)?;
        let pca = self.pca()?;
        let elbow = self.elbow(None)?;
        let kmeans_profiles = self.kmeans()?;
        let agglomerative = self.agglomerative()?;
        let evaluations = self.evaluate()?;

        Ok(RunReport {
            processed_rows: processed.row_count(),
            explained_variance_ratio: pca.explained_variance_ratio().to_vec(),
            elbow,
            kmeans_profiles,
            agglomerative_rows: agglomerative.row_count(),
            evaluations,
        })
    }
}
