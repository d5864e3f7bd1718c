mod common;

use common::{incident_frame, RawIncident};
use cyberclust::error::Error;
use cyberclust::incident::{columns, FeatureEngineer};
use cyberclust::ml::preprocessing::column_stats;

#[test]
fn test_country_filter_keeps_any_reference_member() {
    let mut incidents: Vec<RawIncident> = (1..=4).map(RawIncident::new).collect();
    incidents[0].receiver_country = Some("United States".to_string());
    incidents[1].receiver_country = Some("United States; Belgium".to_string());
    incidents[2].receiver_country = None;

    let processed = FeatureEngineer::new()
        .process(&incident_frame(&incidents))
        .unwrap();
    assert_eq!(processed.row_count(), 2);
    assert_eq!(
        processed.string_values(columns::ID).unwrap(),
        vec![Some("2".to_string()), Some("4".to_string())]
    );
}

#[test]
fn test_standardized_columns_have_unit_scale() {
    let incidents: Vec<RawIncident> = (1..=30)
        .map(|i| {
            let mut incident = RawIncident::new(i);
            incident.impact_indicator_value = Some(i as f64);
            incident.unweighted_cyber_intensity = Some((i % 7) as f64);
            incident.receiver_category =
                Some(["Health", "Finance", "Energy"][(i % 3) as usize].to_string());
            incident
        })
        .collect();

    let processed = FeatureEngineer::new()
        .process(&incident_frame(&incidents))
        .unwrap();

    for column in [
        columns::TOTAL_ATTACK_SEVERITY,
        columns::CYBER_INTENSITY,
        columns::SECTOR_TAG,
    ] {
        let values = processed.f64_values(&columns::norm(column)).unwrap();
        let (mean, std) = column_stats(&values);
        assert!(mean.abs() < 1e-9, "{} mean {}", column, mean);
        assert!((std - 1.0).abs() < 1e-9, "{} std {}", column, std);
    }
}

#[test]
fn test_constant_column_standardizes_to_zero() {
    let incidents: Vec<RawIncident> = (1..=5).map(RawIncident::new).collect();
    let processed = FeatureEngineer::new()
        .process(&incident_frame(&incidents))
        .unwrap();
    let values = processed
        .f64_values(&columns::norm(columns::SECTOR_TAG))
        .unwrap();
    assert!(values.iter().all(|v| *v == Some(0.0)));
}

#[test]
fn test_unmapped_values_tag_to_zero() {
    let mut incident = RawIncident::new(1);
    incident.receiver_category = Some("Hospitality".to_string());
    incident.incident_type = Some("Spoofing; Data theft".to_string());
    incident.impact_indicator = Some("Catastrophic".to_string());
    let mut blank = RawIncident::new(2);
    blank.impact_indicator = Some("   ".to_string());

    let derived = FeatureEngineer::new()
        .derive(&incident_frame(&[incident, blank]))
        .unwrap();
    assert_eq!(
        derived.f64_values(columns::SECTOR_TAG).unwrap(),
        vec![Some(0.0), Some(1.0)]
    );
    assert_eq!(
        derived.f64_values(columns::ATTACK_TYPE_TAG).unwrap(),
        vec![Some(0.0), Some(1.0)]
    );
    // unknown and blank indicators are both unmapped
    assert_eq!(
        derived.f64_values(columns::IMPACT_INDICATOR_TAG).unwrap(),
        vec![Some(0.0), Some(0.0)]
    );
    assert_eq!(
        derived.string_values(columns::ATTACK_TYPE).unwrap()[0],
        Some("Spoofing".to_string())
    );
}

#[test]
fn test_only_named_unavailable_impact_is_negative() {
    let mut missing = RawIncident::new(1);
    missing.impact_indicator = None;
    missing.impact_indicator_value = Some(5.0);
    let mut unavailable = RawIncident::new(2);
    unavailable.impact_indicator = Some("Not available".to_string());
    unavailable.impact_indicator_value = Some(5.0);

    let derived = FeatureEngineer::new()
        .derive(&incident_frame(&[missing, unavailable]))
        .unwrap();
    assert_eq!(
        derived.f64_values(columns::IMPACT_INDICATOR_TAG).unwrap(),
        vec![Some(0.0), Some(-1.0)]
    );
    assert_eq!(
        derived.f64_values(columns::TOTAL_ATTACK_SEVERITY).unwrap(),
        vec![Some(0.0), Some(-5.0)]
    );
}

#[test]
fn test_composites_use_null_as_zero() {
    let mut incident = RawIncident::new(1);
    incident.weighted_cyber_intensity = None;
    incident.impact_indicator_value = None;

    let derived = FeatureEngineer::new()
        .derive(&incident_frame(&[incident, RawIncident::new(2)]))
        .unwrap();
    assert_eq!(
        derived.f64_values(columns::CYBER_INTENSITY).unwrap(),
        vec![Some(0.0), Some(3.0)]
    );
    assert_eq!(
        derived.f64_values(columns::TOTAL_ATTACK_SEVERITY).unwrap(),
        vec![Some(0.0), Some(3.0)]
    );
}

#[test]
fn test_year_from_start_date() {
    let mut bad_date = RawIncident::new(2);
    bad_date.start_date = Some("sometime in spring".to_string());
    let derived = FeatureEngineer::new()
        .derive(&incident_frame(&[RawIncident::new(1), bad_date]))
        .unwrap();
    assert_eq!(
        derived.f64_values(columns::YEAR).unwrap(),
        vec![Some(2021.0), None]
    );
}

#[test]
fn test_missing_column_is_a_schema_violation() {
    let mut df = incident_frame(&[RawIncident::new(1)]);
    df = df
        .select(&[columns::ID, columns::RECEIVER_COUNTRY, columns::START_DATE])
        .unwrap();
    let err = FeatureEngineer::new().process(&df).unwrap_err();
    assert!(matches!(err, Error::MissingColumns(_)));
}
