use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use battlelens_common::{ClusterLevel, Row, RowSummary};

use crate::battles::battle_counts;
use crate::dedup::dedupe_conversations;
use crate::propensity::{cluster_propensities, ClusterQuery, DEFAULT_MIN_ITEMS};

pub const DEFAULT_DISCREPANCY_THRESHOLD: f64 = 10.0;

/// Rows returned in `tableData`; `totalCount` still reports the full match count.
pub const TABLE_ROW_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartFilters {
    pub level: ClusterLevel,
    /// Restricts fine and property drill-downs to one coarse cluster.
    pub coarse_cluster: Option<String>,
    /// Restricts the property drill-down to one fine cluster.
    pub fine_cluster: Option<String>,
    pub selected_models: Vec<String>,
    pub show_unexpected_only: bool,
    /// Keep only battles where both participants are selected.
    pub filter_battle_models: bool,
    pub show_discrepancy_only: bool,
    pub discrepancy_threshold: f64,
    pub min_items: usize,
}

impl Default for ChartFilters {
    fn default() -> Self {
        Self {
            level: ClusterLevel::Coarse,
            coarse_cluster: None,
            fine_cluster: None,
            selected_models: Vec::new(),
            show_unexpected_only: false,
            filter_battle_models: false,
            show_discrepancy_only: false,
            discrepancy_threshold: DEFAULT_DISCREPANCY_THRESHOLD,
            min_items: DEFAULT_MIN_ITEMS,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub cluster: String,
    pub description: String,
    pub total_items: usize,
    pub propensities: BTreeMap<String, f64>,
    pub discrepancy: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartDebug {
    pub rows_loaded: usize,
    pub rows_filtered: usize,
    pub battle_conversations: usize,
    pub conversations: usize,
    pub clusters_retained: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOutput {
    pub chart_data: Vec<ChartPoint>,
    pub table_data: Vec<RowSummary>,
    pub total_count: usize,
    pub unique_models: Vec<String>,
    pub debug: ChartDebug,
}

fn matches_label(filter: &Option<String>, label: &str) -> bool {
    match filter.as_deref().map(str::trim) {
        Some(wanted) if !wanted.is_empty() => label == wanted,
        _ => true,
    }
}

/// Per-cluster propensities for the chart view plus the matching table rows.
///
/// Battle counts come from every battle that passes the participant filter,
/// so a model's propensity stays relative to all of its battles even when
/// the property rows are narrowed further.
pub fn build_chart(rows: &[Row], filters: &ChartFilters) -> ChartOutput {
    let selected: HashSet<&str> = filters
        .selected_models
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();
    let restrict_battles = filters.filter_battle_models && !selected.is_empty();

    let battle_rows: Vec<&Row> = rows
        .iter()
        .filter(|r| {
            !restrict_battles
                || (selected.contains(r.model_1_name.as_str())
                    && selected.contains(r.model_2_name.as_str()))
        })
        .collect();
    let battle_convs = dedupe_conversations(battle_rows.iter().copied());
    let battles = battle_counts(&battle_convs);

    let filtered: Vec<&Row> = battle_rows
        .iter()
        .copied()
        .filter(|r| !filters.show_unexpected_only || r.unexpected_behavior)
        .filter(|r| {
            filters.level == ClusterLevel::Coarse
                || matches_label(&filters.coarse_cluster, &r.coarse_cluster_label)
        })
        .filter(|r| {
            filters.level != ClusterLevel::Property
                || matches_label(&filters.fine_cluster, &r.fine_cluster_label)
        })
        .filter(|r| selected.is_empty() || selected.contains(r.model.as_str()))
        .collect();

    let convs = dedupe_conversations(filtered.iter().copied());
    let query = ClusterQuery {
        level: filters.level,
        min_items: filters.min_items,
    };
    let stats = cluster_propensities(&convs, &battles, &query);

    let chart_data: Vec<ChartPoint> = stats
        .iter()
        .map(|s| ChartPoint {
            cluster: s.label.clone(),
            description: s.description.clone(),
            total_items: s.total_items,
            propensities: s.propensities.clone(),
            discrepancy: s.discrepancy(),
        })
        .filter(|p| {
            !filters.show_discrepancy_only || p.discrepancy >= filters.discrepancy_threshold
        })
        .collect();

    let table_data = filtered
        .iter()
        .take(TABLE_ROW_LIMIT)
        .map(|r| r.summary())
        .collect();

    ChartOutput {
        debug: ChartDebug {
            rows_loaded: rows.len(),
            rows_filtered: filtered.len(),
            battle_conversations: battle_convs.len(),
            conversations: convs.len(),
            clusters_retained: chart_data.len(),
        },
        chart_data,
        table_data,
        total_count: filtered.len(),
        unique_models: battles.keys().cloned().collect(),
    }
}
