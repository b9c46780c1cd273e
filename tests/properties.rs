//! 正規化・頻度インデックス・各スコアラーの性質テスト。

use proptest::prelude::*;

use topic_scorer::scoring::{
    FrequencyIndex, Metric, PatternCategory, Phrase, ScoreTag, ScorerKind, SeedPhrase,
};
use topic_scorer::util::text::{jitter, normalize_phrase};
use topic_scorer::{
    AnchorRecord, CandidateRecord, ScoringProfile, ScoringSession, SessionInput, SessionOptions,
    SuggestionSignals,
};

const ANCHORS: [&str; 4] = [
    "content creation tips",
    "content creation for beginners",
    "content creation tools",
    "how to start content creation",
];

fn session() -> ScoringSession {
    let input = SessionInput {
        seed: "content creation".to_string(),
        candidates: ANCHORS
            .iter()
            .map(|text| CandidateRecord::new(*text, "autocomplete"))
            .collect(),
        anchors: ANCHORS
            .iter()
            .zip(1..)
            .map(|(text, position)| AnchorRecord::new(*text, position))
            .collect(),
    };
    ScoringSession::new(input, ScoringProfile::default(), SessionOptions::default())
        .expect("session builds")
}

fn phrase_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        ".{0,40}",
        "(content creation|how to|tips|best|for|tools|[a-z]{1,8})( (content creation|how to|tips|best|for|tools|[a-z]{1,8})){0,8}",
    ]
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in ".{0,64}") {
        let once = normalize_phrase(&raw);
        prop_assert_eq!(normalize_phrase(&once), once);
    }

    #[test]
    fn normalized_text_has_no_edge_or_double_spaces(raw in ".{0,64}") {
        let normalized = normalize_phrase(&raw);
        prop_assert!(!normalized.starts_with(' '));
        prop_assert!(!normalized.ends_with(' '));
        prop_assert!(!normalized.contains("  "));
    }

    #[test]
    fn jitter_stays_within_span(text in ".{0,32}", span in 1u32..16) {
        let offset = jitter(&text, span);
        let half = i32::try_from(span / 2).expect("small span");
        prop_assert!(offset >= -half && offset <= half);
        prop_assert_eq!(offset, jitter(&text, span));
    }

    #[test]
    fn percentiles_are_monotonic_in_count(
        counts in proptest::collection::vec(1usize..6, 1..8)
    ) {
        let seed = SeedPhrase::new("content creation").expect("seed");
        let mut corpus = Vec::new();
        for (word, count) in counts.iter().enumerate() {
            for _ in 0..*count {
                corpus.push(Phrase::new(&format!("content creation w{word}"), "t"));
            }
        }
        let index = FrequencyIndex::build(&corpus, &seed, usize::MAX);
        for (left, left_count) in counts.iter().enumerate() {
            for (right, right_count) in counts.iter().enumerate() {
                let left_pct = index.percentile_of(PatternCategory::SeedPlusOne, &format!("w{left}"));
                let right_pct = index.percentile_of(PatternCategory::SeedPlusOne, &format!("w{right}"));
                if left_count > right_count {
                    prop_assert!(left_pct > right_pct);
                } else if left_count == right_count {
                    prop_assert_eq!(left_pct, right_pct);
                }
            }
        }
    }

    #[test]
    fn scores_are_bounded_and_deterministic(
        text in phrase_strategy(),
        suggestion_count in 0u32..40,
        exact_share in 0u32..=100,
        topic_match_count in 0u32..40,
    ) {
        let session = session();
        let signals = SuggestionSignals {
            suggestion_count,
            exact_match_count: suggestion_count * exact_share / 100,
            topic_match_count,
        };
        let first = session.score_text(&text, Some(signals)).expect("valid signals");
        let second = session.score_text(&text, Some(signals)).expect("valid signals");
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), ScorerKind::ALL.len());

        for result in &first {
            for score in &result.scores {
                match score.metric {
                    Metric::Spread => prop_assert!((-100..=100).contains(&score.value)),
                    Metric::PopularityV2 | Metric::Ltv => {
                        prop_assert!((0..=99).contains(&score.value));
                    }
                    _ => prop_assert!((0..=100).contains(&score.value)),
                }
            }
        }
    }

    #[test]
    fn exact_always_outscores_untagged(text in phrase_strategy()) {
        let session = session();
        let results = session.score_text(&text, None).expect("scores");
        let popularity = results
            .iter()
            .find(|result| result.scorer == ScorerKind::PopularityV2)
            .expect("popularity-v2 result");
        if popularity.tag == ScoreTag::Untagged {
            let value = popularity.score(Metric::PopularityV2).expect("metric");
            for anchor in ANCHORS {
                let exact = session.score_text(anchor, None).expect("scores");
                let exact_value = exact
                    .iter()
                    .find(|result| result.scorer == ScorerKind::PopularityV2)
                    .and_then(|result| result.score(Metric::PopularityV2))
                    .expect("metric");
                prop_assert!(exact_value > value);
            }
        }
    }
}
