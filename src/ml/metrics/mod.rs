//! Evaluation metrics
//!
//! Unsupervised quality scores for labeled partitions.

pub mod clustering;

pub use clustering::{
    davies_bouldin_detail, davies_bouldin_score, silhouette_samples, silhouette_score,
    ClusterSeparation,
};
