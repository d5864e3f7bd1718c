//! Aggregated group vectors for hierarchical clustering.
//!
//! Incidents are grouped by (sector, attack type) and, separately, by
//! receiver country. Group keys come from the abbreviation tables; rows
//! whose category has no abbreviation are dropped before aggregation.

use std::collections::BTreeMap;

use crate::column::Column;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::incident::columns;
use crate::incident::mappings::{
    ATTACK_TYPE_ABBREVIATIONS, COUNTRY_ABBREVIATIONS, SECTOR_ABBREVIATIONS,
};

/// Which grouping produced a set of group vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    SectorAttack,
    Country,
}

impl GroupKind {
    /// Value written to the `data_type` column
    pub fn label(&self) -> &'static str {
        match self {
            GroupKind::SectorAttack => "Sector & Attack",
            GroupKind::Country => "Country",
        }
    }

    /// Group key of one incident, `None` when it has no abbreviation
    fn key(&self, df: &DataFrame, row: usize) -> Result<Option<String>> {
        match self {
            GroupKind::SectorAttack => {
                let sector = df.column(columns::SECTOR)?.get_string(row);
                let attack = df.column(columns::ATTACK_TYPE)?.get_string(row);
                let sector_abbr = sector.and_then(|s| SECTOR_ABBREVIATIONS.get(s.as_str()).copied());
                let attack_abbr = attack.and_then(|a| ATTACK_TYPE_ABBREVIATIONS.get(a.as_str()).copied());
                Ok(match (sector_abbr, attack_abbr) {
                    (Some(s), Some(a)) => Some(format!("{} - {}", s, a)),
                    _ => None,
                })
            }
            // the whole field is looked up, so multi-country rows are dropped
            GroupKind::Country => Ok(df
                .column(columns::RECEIVER_COUNTRY)?
                .get_string(row)
                .and_then(|c| COUNTRY_ABBREVIATIONS.get(c.as_str()).map(|abbr| abbr.to_string()))),
        }
    }

    fn required_columns(&self) -> Vec<&'static str> {
        match self {
            GroupKind::SectorAttack => vec![columns::SECTOR, columns::ATTACK_TYPE],
            GroupKind::Country => vec![columns::RECEIVER_COUNTRY],
        }
    }
}

/// Mean feature vector per group, ordered by key
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedFeatures {
    pub kind: GroupKind,
    pub keys: Vec<String>,
    pub feature_names: Vec<String>,
    /// One row per key
    pub values: Vec<Vec<f64>>,
    /// Group index of each input row; `None` for dropped rows
    pub row_groups: Vec<Option<usize>>,
}

impl GroupedFeatures {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Per-incident labels from per-group labels
    pub fn project_labels(&self, group_labels: &[usize]) -> Result<Vec<Option<usize>>> {
        if group_labels.len() != self.keys.len() {
            return Err(Error::LengthMismatch {
                expected: self.keys.len(),
                actual: group_labels.len(),
            });
        }
        Ok(self
            .row_groups
            .iter()
            .map(|g| g.map(|idx| group_labels[idx]))
            .collect())
    }

    /// Feature columns followed by `data_type` and `cluster_key`
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut df = DataFrame::new();
        for (j, name) in self.feature_names.iter().enumerate() {
            df.add_column(
                name.clone(),
                Column::from_f64(self.values.iter().map(|row| row[j]).collect()),
            )?;
        }
        df.add_column(
            "data_type",
            Column::from_strings(vec![self.kind.label(); self.keys.len()]),
        )?;
        df.add_column("cluster_key", Column::from_strings(self.keys.clone()))?;
        Ok(df)
    }
}

/// Group `df` by `kind` and average `feature_columns` within each group.
///
/// Nulls are skipped in the means.
pub fn group_features(
    df: &DataFrame,
    kind: GroupKind,
    feature_columns: &[&str],
) -> Result<GroupedFeatures> {
    let mut required = kind.required_columns();
    required.extend_from_slice(feature_columns);
    df.require_columns(&required)?;

    let features: Vec<Vec<Option<f64>>> = feature_columns
        .iter()
        .map(|name| df.f64_values(name))
        .collect::<Result<_>>()?;

    // key -> (sums, counts, member rows)
    let mut groups: BTreeMap<String, (Vec<f64>, Vec<usize>, Vec<usize>)> = BTreeMap::new();
    for row in 0..df.row_count() {
        let key = match kind.key(df, row)? {
            Some(key) => key,
            None => continue,
        };
        let entry = groups.entry(key).or_insert_with(|| {
            (
                vec![0.0; feature_columns.len()],
                vec![0; feature_columns.len()],
                Vec::new(),
            )
        });
        for (j, column) in features.iter().enumerate() {
            if let Some(v) = column[row] {
                entry.0[j] += v;
                entry.1[j] += 1;
            }
        }
        entry.2.push(row);
    }

    let mut keys = Vec::with_capacity(groups.len());
    let mut values = Vec::with_capacity(groups.len());
    let mut row_groups = vec![None; df.row_count()];
    for (idx, (key, (sums, counts, members))) in groups.into_iter().enumerate() {
        values.push(
            sums.iter()
                .zip(counts.iter())
                .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
                .collect(),
        );
        for row in members {
            row_groups[row] = Some(idx);
        }
        keys.push(key);
    }

    log::info!(
        "{} grouping: {} groups from {} incidents",
        kind.label(),
        keys.len(),
        row_groups.iter().filter(|g| g.is_some()).count()
    );

    Ok(GroupedFeatures {
        kind,
        keys,
        feature_names: feature_columns.iter().map(|c| c.to_string()).collect(),
        values,
        row_groups,
    })
}
