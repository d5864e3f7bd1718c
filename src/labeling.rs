//! Cluster labeling
//!
//! Turns numeric cluster ids into descriptions built from each cluster's
//! dominant categorical values and its mean severity.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::incident::columns;
use crate::ml::clustering::CLUSTER_COLUMN;

/// Column holding the generated description
pub const DESCRIPTION_COLUMN: &str = "cluster_description";

/// Placeholder for a category with no values in a cluster
pub const UNKNOWN_VALUE: &str = "Unknown";

/// Bucketed mean severity. Thresholds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
}

impl SeverityLevel {
    pub const HIGH_THRESHOLD: f64 = 7.0;
    pub const MEDIUM_THRESHOLD: f64 = 4.0;

    pub fn from_mean(mean: f64) -> Self {
        if mean >= Self::HIGH_THRESHOLD {
            SeverityLevel::High
        } else if mean >= Self::MEDIUM_THRESHOLD {
            SeverityLevel::Medium
        } else {
            SeverityLevel::Low
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityLevel::Low => write!(f, "Low"),
            SeverityLevel::Medium => write!(f, "Medium"),
            SeverityLevel::High => write!(f, "High"),
        }
    }
}

/// Most frequent value; ties go to the lexicographically smallest
pub fn mode<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    // BTreeMap iterates in key order, so the first maximum wins ties
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value.to_string())
}

fn dominant(values: &[Option<String>], rows: &[usize]) -> String {
    mode(rows.iter().filter_map(|&r| values[r].as_deref()))
        .unwrap_or_else(|| UNKNOWN_VALUE.to_string())
}

/// Read a cluster id column; nulls mark rows outside every cluster
pub fn read_labels(df: &DataFrame, column: &str) -> Result<Vec<Option<usize>>> {
    df.f64_values(column)?
        .into_iter()
        .map(|value| match value {
            None => Ok(None),
            Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as usize)),
            Some(v) => Err(Error::InvalidInput(format!(
                "invalid cluster id {} in column {}",
                v, column
            ))),
        })
        .collect()
}

/// Summary of one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub dominant_sector: String,
    pub dominant_attack_type: String,
    pub dominant_attacker_category: String,
    /// `None` when no member has a severity value
    pub mean_severity: Option<f64>,
    pub severity_level: SeverityLevel,
    pub count: usize,
}

impl ClusterProfile {
    pub fn description(&self) -> String {
        format!(
            "{} + {} | Attacker: {} | Severity: {}",
            self.dominant_sector,
            self.dominant_attack_type,
            self.dominant_attacker_category,
            self.severity_level
        )
    }
}

/// Builds cluster profiles from the categorical and severity columns
#[derive(Debug, Clone)]
pub struct ClusterLabeler {
    pub sector_column: String,
    pub attack_type_column: String,
    pub attacker_category_column: String,
    pub severity_column: String,
}

impl Default for ClusterLabeler {
    fn default() -> Self {
        ClusterLabeler {
            sector_column: columns::SECTOR.to_string(),
            attack_type_column: columns::ATTACK_TYPE.to_string(),
            attacker_category_column: columns::ATTACKER_CATEGORY.to_string(),
            severity_column: columns::IMPACT_INDICATOR_VALUE.to_string(),
        }
    }
}

impl ClusterLabeler {
    pub fn new() -> Self {
        Self::default()
    }

    /// One profile per cluster id present in `labels`, ascending.
    /// Rows labeled `None` are ignored.
    pub fn profiles(&self, df: &DataFrame, labels: &[Option<usize>]) -> Result<Vec<ClusterProfile>> {
        df.require_columns(&[
            self.sector_column.as_str(),
            self.attack_type_column.as_str(),
            self.attacker_category_column.as_str(),
            self.severity_column.as_str(),
        ])?;
        if labels.len() != df.row_count() {
            return Err(Error::LengthMismatch {
                expected: df.row_count(),
                actual: labels.len(),
            });
        }

        let sectors = df.string_values(&self.sector_column)?;
        let attacks = df.string_values(&self.attack_type_column)?;
        let attackers = df.string_values(&self.attacker_category_column)?;
        let severities = df.f64_values(&self.severity_column)?;

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (row, label) in labels.iter().enumerate() {
            if let Some(cluster) = label {
                members.entry(*cluster).or_default().push(row);
            }
        }

        let profiles = members
            .into_iter()
            .map(|(cluster, rows)| {
                let present: Vec<f64> = rows.iter().filter_map(|&r| severities[r]).collect();
                let mean_severity = if present.is_empty() {
                    None
                } else {
                    Some(present.iter().sum::<f64>() / present.len() as f64)
                };
                ClusterProfile {
                    cluster,
                    dominant_sector: dominant(&sectors, &rows),
                    dominant_attack_type: dominant(&attacks, &rows),
                    dominant_attacker_category: dominant(&attackers, &rows),
                    mean_severity,
                    severity_level: mean_severity.map_or(SeverityLevel::Low, SeverityLevel::from_mean),
                    count: rows.len(),
                }
            })
            .collect();

        Ok(profiles)
    }

    /// Append `cluster_description` for the ids in `cluster_column`
    pub fn describe(&self, df: &DataFrame, cluster_column: &str) -> Result<(DataFrame, Vec<ClusterProfile>)> {
        let labels = read_labels(df, cluster_column)?;
        let profiles = self.profiles(df, &labels)?;
        let result = with_descriptions(df, &labels, &profiles)?;
        Ok((result, profiles))
    }

    /// Shorthand for [`describe`](Self::describe) over the `cluster` column
    pub fn describe_clusters(&self, df: &DataFrame) -> Result<(DataFrame, Vec<ClusterProfile>)> {
        self.describe(df, CLUSTER_COLUMN)
    }
}

/// Append `cluster_description` using `labels` and matching `profiles`
pub fn with_descriptions(
    df: &DataFrame,
    labels: &[Option<usize>],
    profiles: &[ClusterProfile],
) -> Result<DataFrame> {
    let names: HashMap<usize, String> = profiles
        .iter()
        .map(|p| (p.cluster, p.description()))
        .collect();

    let mut result = df.clone();
    result.set_column(
        DESCRIPTION_COLUMN,
        Column::String(
            labels
                .iter()
                .map(|l| l.and_then(|c| names.get(&c).cloned()))
                .collect(),
        ),
    )?;
    Ok(result)
}

/// Summary table with one `Group n` row per profile
pub fn summary_table(profiles: &[ClusterProfile]) -> Result<DataFrame> {
    let mut df = DataFrame::new();
    df.add_column(
        "cluster",
        Column::from_strings(
            profiles
                .iter()
                .map(|p| format!("Group {}", p.cluster + 1))
                .collect(),
        ),
    )?;
    df.add_column(
        "dominant_sector",
        Column::from_strings(profiles.iter().map(|p| p.dominant_sector.clone()).collect()),
    )?;
    df.add_column(
        "dominant_attack_type",
        Column::from_strings(profiles.iter().map(|p| p.dominant_attack_type.clone()).collect()),
    )?;
    df.add_column(
        "dominant_attacker_category",
        Column::from_strings(
            profiles
                .iter()
                .map(|p| p.dominant_attacker_category.clone())
                .collect(),
        ),
    )?;
    df.add_column(
        "mean_severity",
        Column::Float64(
            profiles
                .iter()
                .map(|p| p.mean_severity.map(|m| (m * 100.0).round() / 100.0))
                .collect(),
        ),
    )?;
    df.add_column(
        "severity_level",
        Column::from_strings(profiles.iter().map(|p| p.severity_level.to_string()).collect()),
    )?;
    df.add_column(
        "count",
        Column::from_i64(profiles.iter().map(|p| p.count as i64).collect()),
    )?;
    Ok(df)
}
