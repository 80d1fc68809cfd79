pub mod battles;
pub mod cache;
pub mod chart;
pub mod dedup;
pub mod propensity;
pub mod relevance;
pub mod search;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use battles::{battle_counts, BattleCounts};
pub use cache::{cache_key, Clock, SystemClock, TtlCache};
pub use chart::{
    build_chart, ChartDebug, ChartFilters, ChartOutput, ChartPoint, DEFAULT_DISCREPANCY_THRESHOLD,
    TABLE_ROW_LIMIT,
};
pub use dedup::{conversation_key, dedupe_conversations, Conversation};
pub use propensity::{
    cluster_propensities, propensity, ClusterQuery, ClusterStats, DEFAULT_MIN_ITEMS, SAMPLE_LIMIT,
};
pub use relevance::{rank_by_score, relevance_score, tokenize_query};
pub use search::{
    keyword_search, ClusterMatch, SearchDebug, SearchOutput, SearchParams, MAX_RESULTS,
};
