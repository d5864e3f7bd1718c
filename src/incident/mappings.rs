//! Fixed lookup tables
//!
//! Built once on first use and read-only afterwards.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

/// Tag assigned to categorical values absent from their mapping
pub const UNMAPPED_TAG: i64 = 0;

/// Impact tag for the "unavailable" family of indicators
pub const IMPACT_UNAVAILABLE_TAG: i64 = -1;

lazy_static! {
    /// Reference countries used by the receiver-country filter (EU member states)
    pub static ref REFERENCE_COUNTRIES: HashSet<&'static str> = [
        "Austria", "Belgium", "Bulgaria", "Croatia", "Cyprus", "Czech Republic", "Denmark",
        "Estonia", "Finland", "France", "Germany", "Greece", "Hungary", "Ireland", "Italy",
        "Latvia", "Lithuania", "Luxembourg", "Malta", "Netherlands", "Poland", "Portugal",
        "Romania", "Slovakia", "Slovenia", "Spain", "Sweden",
    ]
    .into_iter()
    .collect();

    pub static ref SECTOR_TAGS: HashMap<&'static str, i64> = [
        ("Government", 1),
        ("Military", 2),
        ("Health", 3),
        ("Finance", 4),
        ("Energy", 5),
        ("Telecom", 6),
        ("Transport", 7),
        ("Education", 8),
        ("Critical infrastructure", 9),
        ("Other", 10),
    ]
    .into_iter()
    .collect();

    pub static ref ATTACK_TYPE_TAGS: HashMap<&'static str, i64> = [
        ("Data theft", 1),
        ("Disruption", 2),
        ("Hijacking", 3),
        ("Ransomware", 4),
        ("Phishing", 5),
        ("DDoS", 6),
        ("Malware", 7),
        ("Unknown", 8),
    ]
    .into_iter()
    .collect();

    pub static ref ATTACKER_CATEGORY_TAGS: HashMap<&'static str, i64> = [
        ("Hacktivists", 1),
        ("State-sponsored", 2),
        ("Cybercriminals", 3),
        ("Insiders", 4),
        ("Terrorists", 5),
        ("Unknown", 6),
        ("Other", 7),
    ]
    .into_iter()
    .collect();

    pub static ref IMPACT_TAGS: HashMap<&'static str, i64> = [
        ("Not available", IMPACT_UNAVAILABLE_TAG),
        ("none", IMPACT_UNAVAILABLE_TAG),
        ("Blanks", IMPACT_UNAVAILABLE_TAG),
        ("Low", 1),
        ("Minor", 1),
        ("Medium", 2),
    ]
    .into_iter()
    .collect();

    pub static ref SECTOR_ABBREVIATIONS: HashMap<&'static str, &'static str> = [
        ("Government", "GOV"),
        ("Military", "MIL"),
        ("Health", "HLT"),
        ("Finance", "FIN"),
        ("Energy", "ENG"),
        ("Telecom", "TEL"),
        ("Transport", "TRN"),
        ("Education", "EDU"),
        ("Critical infrastructure", "INF"),
        ("Media", "MED"),
        ("Manufacturing", "MRF"),
    ]
    .into_iter()
    .collect();

    pub static ref ATTACK_TYPE_ABBREVIATIONS: HashMap<&'static str, &'static str> = [
        ("Data theft", "DT"),
        ("Disruption", "DIS"),
        ("Hijacking", "HIJ"),
        ("Ransomware", "RAN"),
        ("Phishing", "PHI"),
        ("DDoS", "DDoS"),
        ("Malware", "MAL"),
    ]
    .into_iter()
    .collect();

    pub static ref COUNTRY_ABBREVIATIONS: HashMap<&'static str, &'static str> = [
        ("Austria", "AUT"), ("Belgium", "BEL"), ("Bulgaria", "BGR"), ("Croatia", "HRV"),
        ("Cyprus", "CYP"), ("Czech Republic", "CZE"), ("Denmark", "DNK"), ("Estonia", "EST"),
        ("Finland", "FIN"), ("France", "FRA"), ("Germany", "DEU"), ("Greece", "GRC"),
        ("Hungary", "HUN"), ("Ireland", "IRL"), ("Italy", "ITA"), ("Latvia", "LVA"),
        ("Lithuania", "LTU"), ("Luxembourg", "LUX"), ("Malta", "MLT"), ("Netherlands", "NLD"),
        ("Poland", "POL"), ("Portugal", "PRT"), ("Romania", "ROU"), ("Slovakia", "SVK"),
        ("Slovenia", "SVN"), ("Spain", "ESP"), ("Sweden", "SWE"),
    ]
    .into_iter()
    .collect();
}

/// First `;`-separated token, trimmed. Empty input yields an empty token.
pub fn primary_token(value: &str) -> &str {
    value.split(';').next().unwrap_or("").trim()
}

/// Look a categorical value up in `mapping`, falling back to [`UNMAPPED_TAG`]
pub fn lookup_tag(mapping: &HashMap<&'static str, i64>, value: Option<&str>) -> i64 {
    value
        .map(primary_token)
        .and_then(|token| mapping.get(token).copied())
        .unwrap_or(UNMAPPED_TAG)
}

pub fn sector_tag(sector: Option<&str>) -> i64 {
    lookup_tag(&SECTOR_TAGS, sector)
}

pub fn attack_type_tag(attack_type: Option<&str>) -> i64 {
    lookup_tag(&ATTACK_TYPE_TAGS, attack_type)
}

pub fn attacker_category_tag(attacker_category: Option<&str>) -> i64 {
    lookup_tag(&ATTACKER_CATEGORY_TAGS, attacker_category)
}

/// Ordinal impact tag.
///
/// Named values use [`IMPACT_TAGS`], where only the named "unavailable"
/// variants give `-1`. Null, blank and unknown indicators tag to `0`.
pub fn impact_tag(indicator: Option<&str>) -> i64 {
    indicator
        .map(str::trim)
        .and_then(|value| IMPACT_TAGS.get(value).copied())
        .unwrap_or(UNMAPPED_TAG)
}

/// Whether a (possibly `;`-delimited) receiver-country field names a reference country
pub fn is_reference_country(receiver_country: Option<&str>) -> bool {
    receiver_country.map_or(false, |field| {
        field
            .split(';')
            .any(|country| REFERENCE_COUNTRIES.contains(country.trim()))
    })
}
