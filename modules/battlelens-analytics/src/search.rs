use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use battlelens_common::{ClusterLevel, Row, RowSummary};

use crate::battles::battle_counts;
use crate::dedup::dedupe_conversations;
use crate::propensity::{cluster_propensities, ClusterQuery, DEFAULT_MIN_ITEMS};
use crate::relevance::{rank_by_score, relevance_score, tokenize_query};

pub const MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub query: String,
    pub level: ClusterLevel,
    pub min_items: usize,
    /// Seed for shuffling equal-score results.
    pub seed: u64,
}

impl SearchParams {
    pub fn new(query: impl Into<String>, seed: u64) -> Self {
        Self {
            query: query.into(),
            level: ClusterLevel::Fine,
            min_items: DEFAULT_MIN_ITEMS,
            seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMatch {
    pub cluster_name: String,
    pub cluster_description: String,
    pub total_items: usize,
    /// Model -> propensity percentage.
    pub model_counts: BTreeMap<String, f64>,
    pub matching_items: Vec<RowSummary>,
    pub relevance_score: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchDebug {
    pub rows_loaded: usize,
    pub conversations: usize,
    pub query_tokens: Vec<String>,
    pub clusters_over_threshold: usize,
    pub clusters_scored: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutput {
    pub matches: Vec<ClusterMatch>,
    pub debug: SearchDebug,
}

/// Clusters whose label overlaps the query, best first.
///
/// A cluster must clear the size threshold and score above zero.
pub fn keyword_search(rows: &[Row], params: &SearchParams) -> SearchOutput {
    let tokens = tokenize_query(&params.query);
    let convs = dedupe_conversations(rows);
    let battles = battle_counts(&convs);
    let query = ClusterQuery {
        level: params.level,
        min_items: params.min_items,
    };
    let stats = cluster_propensities(&convs, &battles, &query);

    let scored: Vec<(u32, ClusterMatch)> = stats
        .iter()
        .filter_map(|s| {
            let score = relevance_score(&tokens, &s.label);
            (score > 0).then(|| {
                (
                    score,
                    ClusterMatch {
                        cluster_name: s.label.clone(),
                        cluster_description: s.description.clone(),
                        total_items: s.total_items,
                        model_counts: s.propensities.clone(),
                        matching_items: s.samples.iter().map(|c| c.row.summary()).collect(),
                        relevance_score: score,
                    },
                )
            })
        })
        .collect();
    let clusters_scored = scored.len();

    let mut rng = StdRng::seed_from_u64(params.seed);
    let matches = rank_by_score(scored, MAX_RESULTS, &mut rng)
        .into_iter()
        .map(|(_, m)| m)
        .collect();

    SearchOutput {
        matches,
        debug: SearchDebug {
            rows_loaded: rows.len(),
            conversations: convs.len(),
            query_tokens: tokens,
            clusters_over_threshold: stats.len(),
            clusters_scored,
        },
    }
}
