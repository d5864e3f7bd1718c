//! Machine learning building blocks
//!
//! Transformers over [`DataFrame`](crate::dataframe::DataFrame): scaling,
//! PCA and clustering, plus the clustering quality metrics.

pub mod clustering;
pub mod dimension_reduction;
pub mod metrics;
pub mod pipeline;
pub mod preprocessing;
