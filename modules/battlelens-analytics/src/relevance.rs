use rand::seq::SliceRandom;
use rand::Rng;

pub const EXACT_MATCH_POINTS: u32 = 10;
pub const PARTIAL_MATCH_POINTS: u32 = 5;

/// Query tokens this short carry no signal ("a", "of", "to").
const MAX_IGNORED_TOKEN_LEN: usize = 2;

/// Lowercased whitespace tokens, dropping anything of two chars or fewer.
pub fn tokenize_query(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() > MAX_IGNORED_TOKEN_LEN)
        .collect()
}

fn label_words(label: &str) -> Vec<String> {
    label
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Word-overlap score of a cluster label against query tokens.
///
/// Every (token, word) pair is scored: equal words earn 10 points,
/// otherwise a substring match in either direction earns 5.
pub fn relevance_score(tokens: &[String], label: &str) -> u32 {
    let words = label_words(label);
    let mut score = 0;
    for token in tokens {
        for word in &words {
            if token == word {
                score += EXACT_MATCH_POINTS;
            } else if word.contains(token.as_str()) || token.contains(word.as_str()) {
                score += PARTIAL_MATCH_POINTS;
            }
        }
    }
    score
}

/// Highest scores first, at most `limit`. Equal scores are shuffled with
/// `rng` so no cluster is always listed first within its tier.
pub fn rank_by_score<T, R: Rng + ?Sized>(
    mut scored: Vec<(u32, T)>,
    limit: usize,
    rng: &mut R,
) -> Vec<(u32, T)> {
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut start = 0;
    while start < scored.len() {
        let score = scored[start].0;
        let run = scored[start..]
            .iter()
            .take_while(|(s, _)| *s == score)
            .count();
        scored[start..start + run].shuffle(rng);
        start += run;
    }

    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tokenizer_drops_short_tokens() {
        assert_eq!(
            tokenize_query("  Is it SAFE to refuse  "),
            vec!["safe".to_string(), "refuse".to_string()]
        );
        assert!(tokenize_query("a of to").is_empty());
    }

    #[test]
    fn exact_word_match_scores_ten() {
        let tokens = tokenize_query("safety");
        assert_eq!(relevance_score(&tokens, "Safety Refusals"), 10);
    }

    #[test]
    fn partial_match_either_direction_scores_five() {
        assert_eq!(relevance_score(&tokenize_query("refus"), "Safety Refusals"), 5);
        assert_eq!(relevance_score(&tokenize_query("refusalsx"), "Refusals"), 5);
    }

    #[test]
    fn scores_accumulate_across_tokens_and_words() {
        let tokens = tokenize_query("safety refusals");
        assert_eq!(relevance_score(&tokens, "Safety Refusals"), 20);
        // "tone" matches "tone" exactly, "tones" contains "tone"
        assert_eq!(relevance_score(&tokenize_query("tone"), "Tone: friendly tones"), 15);
    }

    #[test]
    fn punctuation_around_label_words_is_ignored() {
        assert_eq!(relevance_score(&tokenize_query("math"), "(Math) errors,"), 10);
    }

    #[test]
    fn no_overlap_scores_zero() {
        assert_eq!(relevance_score(&tokenize_query("formatting"), "Safety Refusals"), 0);
        assert_eq!(relevance_score(&[], "Safety Refusals"), 0);
    }

    #[test]
    fn ranking_orders_by_score_and_limits() {
        let scored = vec![(5, "a"), (20, "b"), (10, "c"), (5, "d")];
        let mut rng = StdRng::seed_from_u64(7);
        let ranked = rank_by_score(scored, 3, &mut rng);
        let scores: Vec<u32> = ranked.iter().map(|(s, _)| *s).collect();
        assert_eq!(scores, vec![20, 10, 5]);
        assert_eq!(ranked[0].1, "b");
    }

    #[test]
    fn same_seed_same_tie_order() {
        let scored: Vec<(u32, usize)> = (0..20).map(|i| (10, i)).collect();
        let a = rank_by_score(scored.clone(), 20, &mut StdRng::seed_from_u64(1));
        let b = rank_by_score(scored.clone(), 20, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);

        let mut items: Vec<usize> = a.iter().map(|(_, i)| *i).collect();
        items.sort_unstable();
        assert_eq!(items, (0..20).collect::<Vec<_>>());
    }
}
