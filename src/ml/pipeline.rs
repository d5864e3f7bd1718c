//! Transformer trait
//!
//! Fit/transform contract shared by the feature stage, PCA and the clustering
//! models.

use crate::dataframe::DataFrame;
use crate::error::Result;

/// A fit-then-apply transformation over a frame
pub trait Transformer {
    /// Apply the learned transformation, returning a new frame
    fn transform(&self, df: &DataFrame) -> Result<DataFrame>;

    /// Learn from `df`, then transform it
    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Learn parameters from `df`
    fn fit(&mut self, df: &DataFrame) -> Result<()>;
}
