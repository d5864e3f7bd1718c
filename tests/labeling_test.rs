use cyberclust::column::Column;
use cyberclust::dataframe::DataFrame;
use cyberclust::incident::columns;
use cyberclust::labeling::{
    summary_table, ClusterLabeler, SeverityLevel, DESCRIPTION_COLUMN, UNKNOWN_VALUE,
};

fn labeled_frame() -> DataFrame {
    let mut df = DataFrame::new();
    df.add_column(
        columns::SECTOR,
        Column::String(vec![
            Some("Health".to_string()),
            Some("Health".to_string()),
            Some("Finance".to_string()),
            None,
            None,
        ]),
    )
    .unwrap();
    df.add_column(
        columns::ATTACK_TYPE,
        Column::from_strings(vec!["Ransomware", "Data theft", "Data theft", "DDoS", "DDoS"]),
    )
    .unwrap();
    df.add_column(
        columns::ATTACKER_CATEGORY,
        Column::from_strings(vec![
            "Cybercriminals",
            "Cybercriminals",
            "State-sponsored",
            "Hacktivists",
            "Hacktivists",
        ]),
    )
    .unwrap();
    df.add_column(
        columns::IMPACT_INDICATOR_VALUE,
        Column::Float64(vec![Some(8.0), Some(7.0), Some(6.0), None, Some(1.0)]),
    )
    .unwrap();
    df.add_column(
        "cluster",
        Column::Int64(vec![Some(0), Some(0), Some(0), Some(1), Some(1)]),
    )
    .unwrap();
    df
}

#[test]
fn test_profiles_use_modes_and_mean_severity() {
    let (named, profiles) = ClusterLabeler::new()
        .describe_clusters(&labeled_frame())
        .unwrap();

    assert_eq!(profiles.len(), 2);
    let first = &profiles[0];
    assert_eq!(first.dominant_sector, "Health");
    // "Data theft" twice beats "Ransomware" once
    assert_eq!(first.dominant_attack_type, "Data theft");
    assert_eq!(first.mean_severity, Some(7.0));
    assert_eq!(first.severity_level, SeverityLevel::High);
    assert_eq!(first.count, 3);

    let second = &profiles[1];
    assert_eq!(second.dominant_sector, UNKNOWN_VALUE);
    assert_eq!(second.mean_severity, Some(1.0));
    assert_eq!(
        second.description(),
        "Unknown + DDoS | Attacker: Hacktivists | Severity: Low"
    );

    let descriptions = named.string_values(DESCRIPTION_COLUMN).unwrap();
    assert_eq!(
        descriptions[0],
        Some("Health + Data theft | Attacker: Cybercriminals | Severity: High".to_string())
    );
    assert_eq!(descriptions[3], descriptions[4]);
}

#[test]
fn test_unlabeled_rows_get_no_description() {
    let mut df = labeled_frame();
    df.set_column(
        "cluster",
        Column::Int64(vec![Some(0), None, Some(0), Some(1), Some(1)]),
    )
    .unwrap();
    let (named, profiles) = ClusterLabeler::new().describe_clusters(&df).unwrap();
    assert_eq!(profiles[0].count, 2);
    assert_eq!(named.string_values(DESCRIPTION_COLUMN).unwrap()[1], None);
}

#[test]
fn test_summary_table_layout() {
    let (_, profiles) = ClusterLabeler::new()
        .describe_clusters(&labeled_frame())
        .unwrap();
    let summary = summary_table(&profiles).unwrap();

    assert_eq!(
        summary.column_names(),
        &[
            "cluster",
            "dominant_sector",
            "dominant_attack_type",
            "dominant_attacker_category",
            "mean_severity",
            "severity_level",
            "count"
        ]
    );
    assert_eq!(
        summary.string_values("cluster").unwrap(),
        vec![Some("Group 1".to_string()), Some("Group 2".to_string())]
    );
    assert_eq!(
        summary.string_values("severity_level").unwrap(),
        vec![Some("High".to_string()), Some("Low".to_string())]
    );
}
