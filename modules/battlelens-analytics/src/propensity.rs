use std::collections::{BTreeMap, HashSet};

use battlelens_common::{is_known, ClusterLevel};

use crate::battles::BattleCounts;
use crate::dedup::Conversation;

/// Clusters with fewer unique battles than this are dropped by default.
pub const DEFAULT_MIN_ITEMS: usize = 30;

/// Conversations kept per cluster for display.
pub const SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterQuery {
    pub level: ClusterLevel,
    pub min_items: usize,
}

impl Default for ClusterQuery {
    fn default() -> Self {
        Self {
            level: ClusterLevel::default(),
            min_items: DEFAULT_MIN_ITEMS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterStats<'a> {
    pub label: String,
    /// Property description of the first conversation in the cluster.
    pub description: String,
    /// Unique battles touching the cluster.
    pub total_items: usize,
    /// Exhibiting model -> battles in this cluster where it showed the property.
    pub model_items: BTreeMap<String, usize>,
    /// Exhibiting model -> percentage of its battles, 0..=100.
    pub propensities: BTreeMap<String, f64>,
    pub samples: Vec<Conversation<'a>>,
}

impl ClusterStats<'_> {
    /// Spread between the most and least prone model, in percentage points.
    pub fn discrepancy(&self) -> f64 {
        let mut values = self.propensities.values().copied();
        let Some(first) = values.next() else {
            return 0.0;
        };
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        max - min
    }
}

/// `100 * exhibited / battles`, or 0 when the model has no battles.
pub fn propensity(exhibited: usize, battles: u64) -> f64 {
    if battles == 0 {
        return 0.0;
    }
    (100.0 * exhibited as f64 / battles as f64).clamp(0.0, 100.0)
}

#[derive(Default)]
struct ClusterAccumulator<'a> {
    by_model: BTreeMap<&'a str, HashSet<String>>,
    samples: Vec<Conversation<'a>>,
}

/// Group conversations by cluster label and compute per-model propensities.
///
/// Conversations with a blank or "Unknown" label belong to no cluster.
/// Results are ordered by `total_items` descending, then label.
pub fn cluster_propensities<'a>(
    conversations: &[Conversation<'a>],
    battles: &BattleCounts,
    query: &ClusterQuery,
) -> Vec<ClusterStats<'a>> {
    let mut clusters: BTreeMap<&'a str, ClusterAccumulator<'a>> = BTreeMap::new();

    for conv in conversations {
        let row = conv.row;
        let label = query.level.label(row);
        if !is_known(label) {
            continue;
        }
        let acc = clusters.entry(label).or_default();
        acc.by_model
            .entry(row.model.as_str())
            .or_default()
            .insert(conv.key());
        if acc.samples.len() < SAMPLE_LIMIT {
            acc.samples.push(*conv);
        }
    }

    let mut out: Vec<ClusterStats<'a>> = clusters
        .into_iter()
        .filter_map(|(label, acc)| {
            let union: HashSet<&String> = acc.by_model.values().flatten().collect();
            let total_items = union.len();
            if total_items < query.min_items {
                return None;
            }

            let mut model_items = BTreeMap::new();
            let mut propensities = BTreeMap::new();
            for (model, keys) in &acc.by_model {
                if !is_known(model) {
                    continue;
                }
                let battles_for_model = battles.get(*model).copied().unwrap_or(0);
                model_items.insert(model.to_string(), keys.len());
                propensities.insert(model.to_string(), propensity(keys.len(), battles_for_model));
            }

            Some(ClusterStats {
                label: label.to_string(),
                description: acc
                    .samples
                    .first()
                    .map(|c| c.row.property_description.clone())
                    .unwrap_or_default(),
                total_items,
                model_items,
                propensities,
                samples: acc.samples,
            })
        })
        .collect();

    out.sort_by(|a, b| b.total_items.cmp(&a.total_items).then_with(|| a.label.cmp(&b.label)));
    out
}
