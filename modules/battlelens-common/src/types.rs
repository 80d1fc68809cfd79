use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder the upstream pipeline writes for missing model names and cluster labels.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Display truncation limits for the table projection.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 500;
pub const EVIDENCE_PREVIEW_CHARS: usize = 300;

/// One CSV record: a single model/property observation from a battle.
///
/// Columns missing from a snapshot fall back to empty values; unknown
/// columns are ignored. `row_id` is never read from the file, it is assigned
/// by ingestion after invalid rows are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Row {
    #[serde(skip_deserializing)]
    pub row_id: u64,
    pub prompt: String,
    pub differences: String,
    pub parsed_differences: String,
    pub parse_error: String,
    /// The model that exhibited the property.
    pub model: String,
    pub model_1_name: String,
    pub model_2_name: String,
    pub model_1_response: String,
    pub model_2_response: String,
    pub property_description: String,
    #[serde(rename = "property_description_coarse_cluster_label")]
    pub coarse_cluster_label: String,
    #[serde(rename = "property_description_fine_cluster_label")]
    pub fine_cluster_label: String,
    #[serde(
        rename = "property_description_coarse_cluster_id",
        deserialize_with = "lenient_id"
    )]
    pub coarse_cluster_id: Option<i64>,
    #[serde(
        rename = "property_description_fine_cluster_id",
        deserialize_with = "lenient_id"
    )]
    pub fine_cluster_id: Option<i64>,
    pub category: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub impact: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub unexpected_behavior: bool,
    pub evidence: String,
    pub reason: String,
}

impl Row {
    pub fn has_property(&self) -> bool {
        !self.property_description.trim().is_empty()
    }

    pub fn summary(&self) -> RowSummary {
        RowSummary::from(self)
    }
}

/// Cluster granularity used to group conversations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterLevel {
    Coarse,
    #[default]
    Fine,
    /// Group by the raw property description.
    Property,
}

impl ClusterLevel {
    pub fn label<'a>(&self, row: &'a Row) -> &'a str {
        match self {
            ClusterLevel::Coarse => &row.coarse_cluster_label,
            ClusterLevel::Fine => &row.fine_cluster_label,
            ClusterLevel::Property => &row.property_description,
        }
    }
}

impl std::fmt::Display for ClusterLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterLevel::Coarse => write!(f, "coarse"),
            ClusterLevel::Fine => write!(f, "fine"),
            ClusterLevel::Property => write!(f, "property"),
        }
    }
}

/// True for labels and model names that take part in aggregation.
pub fn is_known(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && v != UNKNOWN_LABEL
}

/// Display projection of a [`Row`] used in table listings and search samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSummary {
    pub row_id: u64,
    pub prompt: String,
    pub model: String,
    pub model_1_name: String,
    pub model_2_name: String,
    pub property_description: String,
    pub coarse_cluster_label: String,
    pub fine_cluster_label: String,
    pub category: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub impact: String,
    pub unexpected_behavior: bool,
    pub evidence: String,
}

impl From<&Row> for RowSummary {
    fn from(row: &Row) -> Self {
        Self {
            row_id: row.row_id,
            prompt: row.prompt.clone(),
            model: row.model.clone(),
            model_1_name: row.model_1_name.clone(),
            model_2_name: row.model_2_name.clone(),
            property_description: truncate_chars(
                &row.property_description,
                DESCRIPTION_PREVIEW_CHARS,
            ),
            coarse_cluster_label: row.coarse_cluster_label.clone(),
            fine_cluster_label: row.fine_cluster_label.clone(),
            category: row.category.clone(),
            property_type: row.property_type.clone(),
            impact: row.impact.clone(),
            unexpected_behavior: row.unexpected_behavior,
            evidence: truncate_chars(&row.evidence, EVIDENCE_PREVIEW_CHARS),
        }
    }
}

/// Truncate on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Accepts `3`, `3.0`, empty and `nan` cells. Snapshots written through
/// dataframes turn integer columns with gaps into floats.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_id(&s)))
}

fn parse_id(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|s| parse_flag(&s)).unwrap_or(false))
}

/// Anything that is not a recognizable "true" reads as false.
pub fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "1.0" | "yes" | "y" | "t"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_float_encoded_integers() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("12.0"), Some(12));
        assert_eq!(parse_id(" -1 "), Some(-1));
        assert_eq!(parse_id("12.5"), None);
        assert_eq!(parse_id("nan"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn parse_flag_variants() {
        assert!(parse_flag("True"));
        assert!(parse_flag("yes"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("False"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("maybe"));
    }

    #[test]
    fn unknown_and_blank_are_not_known() {
        assert!(!is_known(""));
        assert!(!is_known("   "));
        assert!(!is_known("Unknown"));
        assert!(is_known("gpt-4o"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn cluster_level_selects_label() {
        let row = Row {
            coarse_cluster_label: "Reasoning".into(),
            fine_cluster_label: "Arithmetic slips".into(),
            property_description: "adds wrong".into(),
            ..Default::default()
        };
        assert_eq!(ClusterLevel::Coarse.label(&row), "Reasoning");
        assert_eq!(ClusterLevel::Fine.label(&row), "Arithmetic slips");
        assert_eq!(ClusterLevel::Property.label(&row), "adds wrong");
    }

    #[test]
    fn summary_truncates_long_fields() {
        let row = Row {
            property_description: "x".repeat(800),
            evidence: "e".repeat(400),
            ..Default::default()
        };
        let summary = row.summary();
        assert_eq!(summary.property_description.len(), DESCRIPTION_PREVIEW_CHARS);
        assert_eq!(summary.evidence.len(), EVIDENCE_PREVIEW_CHARS);
    }

    #[test]
    fn cluster_level_deserializes_lowercase() {
        let level: ClusterLevel = serde_json::from_str("\"coarse\"").unwrap();
        assert_eq!(level, ClusterLevel::Coarse);
        assert!(serde_json::from_str::<ClusterLevel>("\"Coarse\"").is_err());
    }
}
