//! Shared fixtures for the integration tests
//!
//! Builds raw incident tables with the same columns as the incident store.

#![allow(dead_code)]

use cyberclust::column::Column;
use cyberclust::dataframe::DataFrame;
use cyberclust::incident::columns;

/// One raw incident row
#[derive(Debug, Clone)]
pub struct RawIncident {
    pub id: i64,
    pub start_date: Option<String>,
    pub incident_type: Option<String>,
    pub receiver_country: Option<String>,
    pub receiver_category: Option<String>,
    pub receiver_category_subcode: Option<String>,
    pub impact_indicator: Option<String>,
    pub impact_indicator_value: Option<f64>,
    pub unweighted_cyber_intensity: Option<f64>,
    pub weighted_cyber_intensity: Option<f64>,
}

impl RawIncident {
    pub fn new(id: i64) -> Self {
        RawIncident {
            id,
            start_date: Some("2021-03-15".to_string()),
            incident_type: Some("Data theft".to_string()),
            receiver_country: Some("France".to_string()),
            receiver_category: Some("Government".to_string()),
            receiver_category_subcode: Some("Hacktivists".to_string()),
            impact_indicator: Some("Low".to_string()),
            impact_indicator_value: Some(3.0),
            unweighted_cyber_intensity: Some(2.0),
            weighted_cyber_intensity: Some(1.5),
        }
    }
}

fn text(values: Vec<Option<String>>) -> Column {
    Column::String(values)
}

/// Raw incident table with every required column
pub fn incident_frame(incidents: &[RawIncident]) -> DataFrame {
    let mut df = DataFrame::new();
    df.add_column(
        columns::ID,
        Column::from_i64(incidents.iter().map(|i| i.id).collect()),
    )
    .unwrap();
    df.add_column(
        columns::START_DATE,
        text(incidents.iter().map(|i| i.start_date.clone()).collect()),
    )
    .unwrap();
    df.add_column(
        columns::INCIDENT_TYPE,
        text(incidents.iter().map(|i| i.incident_type.clone()).collect()),
    )
    .unwrap();
    df.add_column(
        columns::RECEIVER_COUNTRY,
        text(incidents.iter().map(|i| i.receiver_country.clone()).collect()),
    )
    .unwrap();
    df.add_column(
        columns::RECEIVER_CATEGORY,
        text(incidents.iter().map(|i| i.receiver_category.clone()).collect()),
    )
    .unwrap();
    df.add_column(
        columns::RECEIVER_CATEGORY_SUBCODE,
        text(
            incidents
                .iter()
                .map(|i| i.receiver_category_subcode.clone())
                .collect(),
        ),
    )
    .unwrap();
    df.add_column(
        columns::IMPACT_INDICATOR,
        text(incidents.iter().map(|i| i.impact_indicator.clone()).collect()),
    )
    .unwrap();
    df.add_column(
        columns::IMPACT_INDICATOR_VALUE,
        Column::Float64(incidents.iter().map(|i| i.impact_indicator_value).collect()),
    )
    .unwrap();
    df.add_column(
        columns::UNWEIGHTED_CYBER_INTENSITY,
        Column::Float64(incidents.iter().map(|i| i.unweighted_cyber_intensity).collect()),
    )
    .unwrap();
    df.add_column(
        columns::WEIGHTED_CYBER_INTENSITY,
        Column::Float64(incidents.iter().map(|i| i.weighted_cyber_intensity).collect()),
    )
    .unwrap();
    df
}

const COUNTRIES: [&str; 4] = ["France", "Germany", "Spain", "Italy"];

/// 100 reference-country incidents in two well separated halves.
///
/// The first half is Government / Data theft / Hacktivists with a high
/// impact; the second half uses categories absent from every mapping and a
/// low impact. Countries rotate through four member states.
pub fn two_population_incidents() -> Vec<RawIncident> {
    (0..100)
        .map(|i| {
            let mut incident = RawIncident::new(i as i64 + 1);
            incident.receiver_country = Some(COUNTRIES[i % COUNTRIES.len()].to_string());
            let jitter = (i % 3) as f64 * 0.5;
            if i < 50 {
                incident.impact_indicator = Some("Medium".to_string());
                incident.impact_indicator_value = Some(8.0 + jitter);
                incident.unweighted_cyber_intensity = Some(3.0);
                incident.weighted_cyber_intensity = Some(2.0);
            } else {
                incident.receiver_category = Some("Hospitality".to_string());
                incident.incident_type = Some("Spoofing".to_string());
                incident.receiver_category_subcode = Some("Lone actor".to_string());
                incident.impact_indicator = Some("Low".to_string());
                incident.impact_indicator_value = Some(2.0 + jitter);
                incident.unweighted_cyber_intensity = Some(1.0);
                incident.weighted_cyber_intensity = Some(1.0);
            }
            incident
        })
        .collect()
}

/// Labels of the first fixture half must all differ from the second half's
pub fn recovers_halves(labels: &[usize]) -> bool {
    let first = labels[0];
    labels[..50].iter().all(|&l| l == first) && labels[50..].iter().all(|&l| l != first)
}
