//! Best-match ranking of candidate videos against liked videos.
//!
//! Each candidate is scored by its highest cosine similarity to any liked
//! video, filtered by a threshold, sorted descending and truncated.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use vidmatch_core::{defaults, EmbeddedVideo, RankedVideo};

use crate::similarity::cosine_similarity;

/// Score given to a candidate that had nothing to compare against.
const NO_MATCH: f64 = -1.0;

/// Configuration for best-match ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Maximum number of recommendations returned.
    pub max_recommendations: usize,
    /// Minimum best-match similarity a candidate needs to be kept.
    pub min_similarity: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_recommendations: defaults::MAX_RECOMMENDATIONS,
            min_similarity: defaults::MIN_SIMILARITY,
        }
    }
}

impl RankingConfig {
    pub fn with_max_recommendations(mut self, max: usize) -> Self {
        self.max_recommendations = max;
        self
    }

    pub fn with_min_similarity(mut self, min: f64) -> Self {
        self.min_similarity = min;
        self
    }
}

/// Rank `recommended` by best similarity to any of `liked`.
///
/// When either list is empty the first `max_recommendations` candidates are
/// returned unranked, in input order. Ties on the best match go to the first
/// liked video reaching it; ties between candidates keep input order.
pub fn find_best_matches(
    liked: &[EmbeddedVideo],
    recommended: &[EmbeddedVideo],
    config: &RankingConfig,
) -> Vec<RankedVideo> {
    if liked.is_empty() || recommended.is_empty() {
        debug!(
            liked_count = liked.len(),
            candidate_count = recommended.len(),
            "Ranking skipped, returning candidates unranked"
        );
        return recommended
            .iter()
            .take(config.max_recommendations)
            .cloned()
            .map(RankedVideo::unranked)
            .collect();
    }

    let mut ranked: Vec<RankedVideo> = recommended
        .iter()
        .map(|candidate| {
            let (similarity, matched_with) = best_match(candidate, liked);
            trace!(
                video_id = %candidate.video.id,
                similarity,
                matched_with = matched_with.unwrap_or(""),
                "Candidate scored"
            );
            RankedVideo::ranked(
                candidate.clone(),
                similarity,
                matched_with.map(str::to_string),
            )
        })
        .filter(|r| r.similarity.unwrap_or(NO_MATCH) >= config.min_similarity)
        .collect();

    // sort_by is stable: equal scores keep candidate order.
    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let kept = ranked.len();
    ranked.truncate(config.max_recommendations);

    debug!(
        liked_count = liked.len(),
        candidate_count = recommended.len(),
        above_threshold = kept,
        result_count = ranked.len(),
        min_similarity = config.min_similarity,
        "Ranking complete"
    );

    ranked
}

/// Highest similarity of `candidate` to any liked video with an embedding,
/// and the title of the first liked video reaching it.
fn best_match<'a>(candidate: &EmbeddedVideo, liked: &'a [EmbeddedVideo]) -> (f64, Option<&'a str>) {
    let mut best = NO_MATCH;
    let mut matched_with = None;

    if !candidate.has_embedding() {
        return (best, matched_with);
    }

    for liked_video in liked.iter().filter(|l| l.has_embedding()) {
        let similarity = cosine_similarity(&candidate.embedding, &liked_video.embedding);
        if similarity > best {
            best = similarity;
            matched_with = Some(liked_video.video.title.as_str());
        }
    }

    (best, matched_with)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidmatch_core::VideoSummary;

    fn embedded(id: &str, title: &str, embedding: Vec<f64>) -> EmbeddedVideo {
        EmbeddedVideo::new(VideoSummary::new(id, title, "", "", ""), embedding)
    }

    fn ids(ranked: &[RankedVideo]) -> Vec<&str> {
        ranked.iter().map(RankedVideo::id).collect()
    }

    #[test]
    fn test_ranking_config_default() {
        let config = RankingConfig::default();
        assert_eq!(config.max_recommendations, 10);
        assert_eq!(config.min_similarity, 0.5);
    }

    #[test]
    fn test_ranking_config_builder() {
        let config = RankingConfig::default()
            .with_max_recommendations(3)
            .with_min_similarity(0.1);
        assert_eq!(config.max_recommendations, 3);
        assert_eq!(config.min_similarity, 0.1);
    }

    #[test]
    fn test_empty_liked_returns_candidates_unranked() {
        let candidates: Vec<EmbeddedVideo> = (0..15)
            .map(|i| embedded(&format!("c{}", i), "t", vec![1.0, 0.0]))
            .collect();

        let ranked = find_best_matches(&[], &candidates, &RankingConfig::default());

        assert_eq!(ranked.len(), 10);
        for (r, c) in ranked.iter().zip(&candidates) {
            assert_eq!(r.video, *c);
            assert!(r.similarity.is_none());
            assert!(r.matched_with.is_none());
        }
    }

    #[test]
    fn test_empty_candidates_returns_empty() {
        let liked = vec![embedded("l", "Liked", vec![1.0, 0.0])];
        assert!(find_best_matches(&liked, &[], &RankingConfig::default()).is_empty());
    }

    #[test]
    fn test_best_match_selected_per_candidate() {
        let liked = vec![
            embedded("l1", "Cooking", vec![0.0, 1.0]),
            embedded("l2", "Intro to Python", vec![1.0, 0.0]),
        ];
        let candidates = vec![embedded("c1", "Python loops", vec![0.9, 0.1])];

        let ranked = find_best_matches(&liked, &candidates, &RankingConfig::default());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].matched_with.as_deref(), Some("Intro to Python"));
        let expected = cosine_similarity(&[0.9, 0.1], &[1.0, 0.0]);
        assert_eq!(ranked[0].similarity, Some(expected));
    }

    #[test]
    fn test_tie_goes_to_first_liked_video() {
        let liked = vec![
            embedded("l1", "First", vec![1.0, 0.0]),
            embedded("l2", "Second", vec![2.0, 0.0]),
        ];
        let candidates = vec![embedded("c1", "c", vec![1.0, 0.0])];

        let ranked = find_best_matches(&liked, &candidates, &RankingConfig::default());
        assert_eq!(ranked[0].matched_with.as_deref(), Some("First"));
    }

    #[test]
    fn test_below_threshold_filtered() {
        let liked = vec![embedded("l", "Liked", vec![1.0, 0.0])];
        let candidates = vec![
            embedded("keep", "k", vec![1.0, 0.1]),
            embedded("drop", "d", vec![0.0, 1.0]),
        ];

        let ranked = find_best_matches(&liked, &candidates, &RankingConfig::default());
        assert_eq!(ids(&ranked), vec!["keep"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let liked = vec![embedded("l", "Liked", vec![1.0, 0.0])];
        let candidates = vec![embedded("c", "c", vec![1.0, 0.0])];
        let config = RankingConfig::default().with_min_similarity(1.0);

        let ranked = find_best_matches(&liked, &candidates, &config);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_no_comparable_liked_video_is_filtered() {
        let liked = vec![embedded("l", "No embedding", vec![])];
        let candidates = vec![embedded("c", "c", vec![1.0, 0.0])];

        assert!(find_best_matches(&liked, &candidates, &RankingConfig::default()).is_empty());

        // A threshold below the sentinel keeps it, with no match recorded.
        let config = RankingConfig::default().with_min_similarity(-1.0);
        let ranked = find_best_matches(&liked, &candidates, &config);
        assert_eq!(ranked[0].similarity, Some(-1.0));
        assert!(ranked[0].matched_with.is_none());
    }

    #[test]
    fn test_candidate_without_embedding_is_filtered() {
        let liked = vec![embedded("l", "Liked", vec![1.0, 0.0])];
        let candidates = vec![embedded("c", "c", vec![])];

        assert!(find_best_matches(&liked, &candidates, &RankingConfig::default()).is_empty());
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let liked = vec![embedded("l", "Liked", vec![1.0, 0.0])];
        let candidates = vec![
            embedded("mid", "m", vec![1.0, 0.5]),
            embedded("tie_a", "a", vec![1.0, 0.0]),
            embedded("low", "l", vec![1.0, 0.9]),
            embedded("tie_b", "b", vec![2.0, 0.0]),
        ];

        let ranked = find_best_matches(&liked, &candidates, &RankingConfig::default());

        assert_eq!(ids(&ranked), vec!["tie_a", "tie_b", "mid", "low"]);
        for pair in ranked.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_truncated_to_max_and_all_above_threshold() {
        let liked = vec![
            embedded("l1", "A", vec![1.0, 0.0, 0.0]),
            embedded("l2", "B", vec![0.0, 1.0, 0.0]),
        ];
        let candidates: Vec<EmbeddedVideo> = (0..30)
            .map(|i| {
                let x = (i as f64 * 0.37).sin();
                let y = (i as f64 * 0.91).cos();
                let z = (i as f64 * 0.13).sin();
                embedded(&format!("c{}", i), "c", vec![x, y, z])
            })
            .collect();
        let config = RankingConfig::default().with_max_recommendations(4);

        let ranked = find_best_matches(&liked, &candidates, &config);

        assert!(ranked.len() <= 4);
        for r in &ranked {
            assert!(r.similarity.unwrap() >= config.min_similarity);
        }
    }

    #[test]
    fn test_similarity_matches_recomputed_value() {
        let liked = vec![
            embedded("l1", "A", vec![0.2, 0.9]),
            embedded("l2", "B", vec![0.8, 0.3]),
        ];
        let candidates = vec![
            embedded("c1", "c", vec![0.7, 0.4]),
            embedded("c2", "c", vec![0.1, 1.0]),
        ];

        for r in find_best_matches(&liked, &candidates, &RankingConfig::default()) {
            let matched = liked
                .iter()
                .find(|l| Some(l.video.title.as_str()) == r.matched_with.as_deref())
                .unwrap();
            assert_eq!(
                r.similarity,
                Some(cosine_similarity(&r.video.embedding, &matched.embedding))
            );
        }
    }
}
