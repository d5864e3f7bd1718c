//! Batch clustering pipeline for cyber-incident data.
//!
//! Raw incidents are filtered to the reference countries, tagged and
//! standardized ([`incident`]), then analysed with PCA, k-means and
//! agglomerative clustering ([`ml`]). Clusters are described by their
//! dominant attributes ([`labeling`]) and scored ([`evaluation`]). Every
//! stage reads and replaces whole tables through [`io::TableStore`].

pub mod analysis;
pub mod column;
pub mod config;
pub mod dataframe;
pub mod error;
pub mod evaluation;
pub mod incident;
pub mod io;
pub mod labeling;
pub mod ml;

// Re-export commonly used types
pub use analysis::{AnalysisPipeline, RunReport};
pub use column::{Column, ColumnType};
pub use config::PipelineConfig;
pub use dataframe::DataFrame;
pub use error::{Error, Result};
pub use evaluation::{ClusterEvaluation, ClusterEvaluator, EvaluationRecord};
pub use incident::{FeatureEngineer, GroupKind};
pub use io::{SqliteStore, TableStore};
pub use labeling::{ClusterLabeler, ClusterProfile, SeverityLevel};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
