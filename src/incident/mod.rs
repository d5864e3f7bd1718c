//! Incident records and the feature engineering built on them.

pub mod features;
pub mod grouping;
pub mod mappings;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::dataframe::DataFrame;
use crate::error::Result;

pub use features::{FeatureEngineer, FeatureVector};
pub use grouping::{GroupKind, GroupedFeatures};

/// Raw incident columns read from the store
pub mod columns {
    pub const ID: &str = "ID";
    pub const START_DATE: &str = "start_date";
    pub const INCIDENT_TYPE: &str = "incident_type";
    pub const RECEIVER_COUNTRY: &str = "receiver_country";
    pub const RECEIVER_CATEGORY: &str = "receiver_category";
    pub const RECEIVER_CATEGORY_SUBCODE: &str = "receiver_category_subcode";
    pub const IMPACT_INDICATOR: &str = "impact_indicator";
    pub const IMPACT_INDICATOR_VALUE: &str = "impact_indicator_value";
    pub const UNWEIGHTED_CYBER_INTENSITY: &str = "unweighted_cyber_intensity";
    pub const WEIGHTED_CYBER_INTENSITY: &str = "weighted_cyber_intensity";

    pub const YEAR: &str = "year";
    pub const SECTOR: &str = "sector_cleaned";
    pub const ATTACK_TYPE: &str = "attack_type_cleaned";
    pub const ATTACKER_CATEGORY: &str = "attacker_category_cleaned";

    pub const SECTOR_TAG: &str = "sector_tag";
    pub const ATTACK_TYPE_TAG: &str = "attack_type_tag";
    pub const ATTACKER_CATEGORY_TAG: &str = "attacker_category_tag";
    pub const IMPACT_INDICATOR_TAG: &str = "impact_indicator_tag";
    pub const CYBER_INTENSITY: &str = "cyber_intensity";
    pub const TOTAL_ATTACK_SEVERITY: &str = "total_attack_severity";

    /// Every column an incident table must carry
    pub const REQUIRED: [&str; 10] = [
        ID,
        START_DATE,
        INCIDENT_TYPE,
        RECEIVER_COUNTRY,
        RECEIVER_CATEGORY,
        RECEIVER_CATEGORY_SUBCODE,
        IMPACT_INDICATOR,
        IMPACT_INDICATOR_VALUE,
        UNWEIGHTED_CYBER_INTENSITY,
        WEIGHTED_CYBER_INTENSITY,
    ];

    /// Columns standardized into `<col>_norm`, in output order
    pub const STANDARDIZED: [&str; 9] = [
        IMPACT_INDICATOR_VALUE,
        UNWEIGHTED_CYBER_INTENSITY,
        WEIGHTED_CYBER_INTENSITY,
        SECTOR_TAG,
        ATTACK_TYPE_TAG,
        ATTACKER_CATEGORY_TAG,
        IMPACT_INDICATOR_TAG,
        TOTAL_ATTACK_SEVERITY,
        CYBER_INTENSITY,
    ];

    /// Name of the standardized counterpart of `column`
    pub fn norm(column: &str) -> String {
        format!("{}_norm", column)
    }
}

/// One observed cyber incident
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    pub id: String,
    pub start_date: Option<NaiveDate>,
    pub incident_type: Option<String>,
    pub receiver_country: Option<String>,
    pub receiver_category: Option<String>,
    pub receiver_category_subcode: Option<String>,
    pub impact_indicator: Option<String>,
    pub impact_indicator_value: Option<f64>,
    pub unweighted_cyber_intensity: Option<f64>,
    pub weighted_cyber_intensity: Option<f64>,
}

impl IncidentRecord {
    /// Read every row of an incident table.
    ///
    /// Missing columns fail the whole read. Unparseable dates become `None`.
    pub fn from_frame(df: &DataFrame) -> Result<Vec<IncidentRecord>> {
        df.require_columns(&columns::REQUIRED)?;

        let ids = df.string_values(columns::ID)?;
        let dates = df.string_values(columns::START_DATE)?;
        let incident_types = df.string_values(columns::INCIDENT_TYPE)?;
        let countries = df.string_values(columns::RECEIVER_COUNTRY)?;
        let categories = df.string_values(columns::RECEIVER_CATEGORY)?;
        let subcodes = df.string_values(columns::RECEIVER_CATEGORY_SUBCODE)?;
        let indicators = df.string_values(columns::IMPACT_INDICATOR)?;
        let impact_values = df.f64_values(columns::IMPACT_INDICATOR_VALUE)?;
        let unweighted = df.f64_values(columns::UNWEIGHTED_CYBER_INTENSITY)?;
        let weighted = df.f64_values(columns::WEIGHTED_CYBER_INTENSITY)?;

        let mut unparsed_dates = 0usize;
        let mut records = Vec::with_capacity(df.row_count());
        for i in 0..df.row_count() {
            let start_date = dates[i].as_deref().and_then(parse_date);
            if dates[i].is_some() && start_date.is_none() {
                unparsed_dates += 1;
            }

            records.push(IncidentRecord {
                id: ids[i].clone().unwrap_or_else(|| i.to_string()),
                start_date,
                incident_type: incident_types[i].clone(),
                receiver_country: countries[i].clone(),
                receiver_category: categories[i].clone(),
                receiver_category_subcode: subcodes[i].clone(),
                impact_indicator: indicators[i].clone(),
                impact_indicator_value: impact_values[i],
                unweighted_cyber_intensity: unweighted[i],
                weighted_cyber_intensity: weighted[i],
            });
        }

        if unparsed_dates > 0 {
            log::warn!("{} incident dates could not be parsed", unparsed_dates);
        }

        Ok(records)
    }

    pub fn year(&self) -> Option<i32> {
        self.start_date.map(|d| d.year())
    }
}

/// Parse the date formats seen in incident exports
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d.%m.%Y"];
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}
