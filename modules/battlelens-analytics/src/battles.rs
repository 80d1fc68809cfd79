use std::collections::BTreeMap;

use battlelens_common::is_known;

use crate::dedup::Conversation;

/// Model name -> number of unique battles it took part in.
pub type BattleCounts = BTreeMap<String, u64>;

/// Count battle participation per model over unique conversations.
///
/// Each side is counted on its own, so a model playing itself gets two.
/// Blank and "Unknown" participants are skipped.
pub fn battle_counts(conversations: &[Conversation<'_>]) -> BattleCounts {
    let mut counts = BattleCounts::new();
    for conv in conversations {
        for name in [&conv.row.model_1_name, &conv.row.model_2_name] {
            if is_known(name) {
                *counts.entry(name.clone()).or_insert(0) += 1;
            }
        }
    }
    counts
}
