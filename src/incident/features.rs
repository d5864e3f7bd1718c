//! Feature engineering: country filter, categorical tagging, composite
//! scores and standardization.

use crate::column::{coalesce, Column};
use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::incident::mappings::{
    attack_type_tag, attacker_category_tag, impact_tag, is_reference_country, primary_token,
    sector_tag,
};
use crate::incident::{columns, IncidentRecord};
use crate::ml::pipeline::Transformer;
use crate::ml::preprocessing::StandardScaler;

/// Numeric features derived from one incident
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub sector_tag: i64,
    pub attack_type_tag: i64,
    pub attacker_category_tag: i64,
    pub impact_indicator_tag: i64,
    pub cyber_intensity: f64,
    pub total_attack_severity: f64,
}

impl FeatureVector {
    pub fn from_record(record: &IncidentRecord) -> Self {
        let impact_indicator_tag = impact_tag(record.impact_indicator.as_deref());
        FeatureVector {
            sector_tag: sector_tag(record.receiver_category.as_deref()),
            attack_type_tag: attack_type_tag(record.incident_type.as_deref()),
            attacker_category_tag: attacker_category_tag(
                record.receiver_category_subcode.as_deref(),
            ),
            impact_indicator_tag,
            cyber_intensity: coalesce(record.unweighted_cyber_intensity, 0.0)
                * coalesce(record.weighted_cyber_intensity, 0.0),
            total_attack_severity: coalesce(record.impact_indicator_value, 0.0)
                * impact_indicator_tag as f64,
        }
    }
}

fn cleaned(value: &Option<String>) -> Option<String> {
    value.as_deref().map(|v| primary_token(v).to_string())
}

/// Turns raw incident rows into the processed feature table.
///
/// Fitting learns the standardization statistics over the whole row set it
/// is given; every run refits from scratch.
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    scaler: StandardScaler,
}

impl FeatureEngineer {
    pub fn new() -> Self {
        FeatureEngineer {
            scaler: StandardScaler::new(
                columns::STANDARDIZED.iter().map(|c| c.to_string()).collect(),
            ),
        }
    }

    /// Keep incidents whose receiver-country field names a reference country
    pub fn filter_reference_countries(&self, df: &DataFrame) -> Result<DataFrame> {
        df.require_columns(&[columns::RECEIVER_COUNTRY])?;
        let mask: Vec<bool> = df
            .string_values(columns::RECEIVER_COUNTRY)?
            .iter()
            .map(|country| is_reference_country(country.as_deref()))
            .collect();

        let filtered = df.filter_rows(&mask)?;
        log::info!(
            "country filter kept {} of {} incidents",
            filtered.row_count(),
            df.row_count()
        );
        Ok(filtered)
    }

    /// Append cleaned categoricals, year, tags and composite scores
    pub fn derive(&self, df: &DataFrame) -> Result<DataFrame> {
        let records = IncidentRecord::from_frame(df)?;
        let features: Vec<FeatureVector> = records.iter().map(FeatureVector::from_record).collect();

        let mut result = df.clone();
        result.set_column(
            columns::YEAR,
            Column::Int64(records.iter().map(|r| r.year().map(i64::from)).collect()),
        )?;
        result.set_column(
            columns::SECTOR,
            Column::String(records.iter().map(|r| cleaned(&r.receiver_category)).collect()),
        )?;
        result.set_column(
            columns::ATTACK_TYPE,
            Column::String(records.iter().map(|r| cleaned(&r.incident_type)).collect()),
        )?;
        result.set_column(
            columns::ATTACKER_CATEGORY,
            Column::String(
                records
                    .iter()
                    .map(|r| cleaned(&r.receiver_category_subcode))
                    .collect(),
            ),
        )?;

        result.set_column(
            columns::SECTOR_TAG,
            Column::from_i64(features.iter().map(|f| f.sector_tag).collect()),
        )?;
        result.set_column(
            columns::ATTACK_TYPE_TAG,
            Column::from_i64(features.iter().map(|f| f.attack_type_tag).collect()),
        )?;
        result.set_column(
            columns::ATTACKER_CATEGORY_TAG,
            Column::from_i64(features.iter().map(|f| f.attacker_category_tag).collect()),
        )?;
        result.set_column(
            columns::IMPACT_INDICATOR_TAG,
            Column::from_i64(features.iter().map(|f| f.impact_indicator_tag).collect()),
        )?;
        result.set_column(
            columns::CYBER_INTENSITY,
            Column::from_f64(features.iter().map(|f| f.cyber_intensity).collect()),
        )?;
        result.set_column(
            columns::TOTAL_ATTACK_SEVERITY,
            Column::from_f64(features.iter().map(|f| f.total_attack_severity).collect()),
        )?;

        Ok(result)
    }

    /// Filter, derive and standardize in one pass
    pub fn process(&mut self, raw: &DataFrame) -> Result<DataFrame> {
        let filtered = self.filter_reference_countries(raw)?;
        let processed = self.fit_transform(&filtered)?;
        log::info!(
            "feature engineering produced {} rows x {} columns",
            processed.row_count(),
            processed.column_count()
        );
        Ok(processed)
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for FeatureEngineer {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let derived = self.derive(df)?;
        self.scaler.fit(&derived)
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let derived = self.derive(df)?;
        self.scaler.transform(&derived)
    }

    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let derived = self.derive(df)?;
        self.scaler.fit(&derived)?;
        self.scaler.transform(&derived)
    }
}
