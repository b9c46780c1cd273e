//! Demand / Opportunity from suggestion-volume signals and detected intent.
//!
//! Independent of the anchor set: only the candidate text and its signals are used.

use serde::Serialize;

use crate::input::SuggestionSignals;
use crate::profile::DualProfile;
use crate::util::error::ScoringError;

use super::intent::{IntentHit, IntentMatcher};
use super::strategy::{Scorer, ScorerKind, ScoringContext};
use super::types::{Breakdown, Metric, MetricScore, Phrase, ScoreResult, ScoreTag, round_to_i32};

/// Demand / Opportunity の項目ごとの寄与。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualBreakdown {
    pub word_count: usize,
    pub word_count_multiplier: f64,
    pub volume: f64,
    pub topic_ratio: f64,
    pub exact_match: f64,
    pub intent_boost: i32,
    pub intents: Vec<IntentHit>,
    /// 候補数 0 のときは `None`（データなし）。
    pub exact_match_percent: Option<f64>,
    pub low_competition: i32,
    pub long_tail: i32,
    pub evergreen: i32,
    pub demand_validation: i32,
    pub demand: i32,
    pub opportunity: i32,
    pub is_super_topic: bool,
}

#[derive(Debug, Clone)]
pub struct DualScorer {
    profile: DualProfile,
    intents: IntentMatcher,
}

impl DualScorer {
    /// # Errors
    /// 意図辞書の構築に失敗した場合。
    pub fn new(profile: DualProfile) -> Result<Self, ScoringError> {
        let intents = IntentMatcher::new(&profile.intents)?;
        Ok(Self { profile, intents })
    }

    /// シグナルと語数から内訳を計算する。
    #[must_use]
    pub fn evaluate(&self, phrase: &Phrase, signals: &SuggestionSignals) -> DualBreakdown {
        let profile = &self.profile;
        let word_count = phrase.word_count();
        #[allow(clippy::cast_precision_loss)]
        let words = word_count as f64;
        let suggestions = f64::from(signals.suggestion_count);
        let exact = f64::from(signals.exact_match_count);
        let topic = f64::from(signals.topic_match_count);

        let multiplier = profile.word_count_multiplier.lookup(words);
        let (volume, topic_ratio, exact_match_percent) = if signals.suggestion_count == 0 {
            (0.0, 0.0, None)
        } else {
            (
                (suggestions / profile.volume_saturation * profile.volume_cap)
                    .round()
                    .min(profile.volume_cap),
                (topic / suggestions * profile.topic_ratio_cap)
                    .round()
                    .min(profile.topic_ratio_cap),
                Some(exact / suggestions * 100.0),
            )
        };
        let exact_match = (exact * profile.exact_match_weight).min(profile.exact_match_cap);

        let intents = self.intents.detect(phrase.text());
        let intent_boost = intents
            .iter()
            .map(|hit| hit.demand_boost)
            .fold(0, i32::saturating_add)
            .min(profile.intent_demand_cap);

        let demand = round_to_i32(
            multiplier * volume + topic_ratio + exact_match + f64::from(intent_boost),
        )
        .clamp(0, 100);

        let low_competition = exact_match_percent.map_or_else(
            || profile.low_competition.minimum(),
            |percent| profile.low_competition.lookup(percent),
        );
        let long_tail = profile.long_tail.lookup(words);
        let evergreen = intents
            .iter()
            .map(|hit| hit.evergreen_bonus)
            .fold(0, i32::saturating_add)
            .min(profile.evergreen_cap);
        let demand_validation = profile.demand_validation.lookup(suggestions);
        let opportunity = [low_competition, long_tail, evergreen, demand_validation]
            .into_iter()
            .fold(0, i32::saturating_add)
            .clamp(0, 100);

        DualBreakdown {
            word_count,
            word_count_multiplier: multiplier,
            volume,
            topic_ratio,
            exact_match,
            intent_boost,
            intents,
            exact_match_percent,
            low_competition,
            long_tail,
            evergreen,
            demand_validation,
            demand,
            opportunity,
            is_super_topic: demand >= profile.super_topic_demand
                && opportunity >= profile.super_topic_opportunity,
        }
    }
}

impl Scorer for DualScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Dual
    }

    fn score(
        &self,
        phrase: &Phrase,
        ctx: &ScoringContext<'_>,
    ) -> Result<ScoreResult, ScoringError> {
        let signals = ctx.signals.ok_or_else(|| ScoringError::MissingSignals {
            text: phrase.text().to_string(),
        })?;
        let breakdown = self.evaluate(phrase, signals);
        let tag = if breakdown.is_super_topic {
            ScoreTag::SuperTopic
        } else {
            ScoreTag::Standard
        };

        Ok(ScoreResult {
            scorer: ScorerKind::Dual,
            tag,
            scores: vec![
                MetricScore {
                    metric: Metric::Demand,
                    value: breakdown.demand,
                },
                MetricScore {
                    metric: Metric::Opportunity,
                    value: breakdown.opportunity,
                },
            ],
            breakdown: Breakdown::Dual(breakdown),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scorer() -> DualScorer {
        DualScorer::new(DualProfile::default()).expect("default profile")
    }

    fn signals(suggestion_count: u32, exact_match_count: u32, topic_match_count: u32) -> SuggestionSignals {
        SuggestionSignals {
            suggestion_count,
            exact_match_count,
            topic_match_count,
        }
    }

    #[test]
    fn learning_fixture_scores_high_demand_and_opportunity() {
        let phrase = Phrase::new("how to grow a youtube channel fast", "autocomplete");
        let breakdown = scorer().evaluate(&phrase, &signals(12, 1, 10));

        assert_eq!(breakdown.word_count, 7);
        // 1.05 * 43 + 13 + 2 + 5 = 65.15
        assert_eq!(breakdown.demand, 65);
        // 40 + 20 + 12 + 15
        assert_eq!(breakdown.opportunity, 87);
        assert!(!breakdown.is_super_topic);
        assert_eq!(breakdown.intents.len(), 1);
        assert_eq!(breakdown.intents[0].category, "learning");
    }

    #[test]
    fn zero_suggestions_use_minimum_contributions() {
        let phrase = Phrase::new("content creation", "seed");
        let breakdown = scorer().evaluate(&phrase, &signals(0, 0, 0));
        assert!(breakdown.volume.abs() < f64::EPSILON);
        assert!(breakdown.topic_ratio.abs() < f64::EPSILON);
        assert_eq!(breakdown.exact_match_percent, None);
        assert_eq!(breakdown.low_competition, 8);
        assert_eq!(breakdown.demand_validation, 0);
        assert_eq!(breakdown.demand, 0);
        assert_eq!(breakdown.opportunity, 8 + 4);
    }

    #[rstest]
    #[case(1, 0.7)]
    #[case(2, 0.85)]
    #[case(3, 0.95)]
    #[case(4, 1.0)]
    #[case(5, 1.1)]
    #[case(6, 1.1)]
    #[case(7, 1.05)]
    #[case(8, 1.0)]
    #[case(12, 0.9)]
    fn word_count_multiplier_curve(#[case] words: usize, #[case] expected: f64) {
        let text = vec!["word"; words].join(" ");
        let breakdown = scorer().evaluate(&Phrase::new(&text, "t"), &signals(1, 0, 0));
        assert!((breakdown.word_count_multiplier - expected).abs() < 1e-9);
    }

    #[test]
    fn super_topic_requires_both_thresholds() {
        // 低い完全一致率・長い語数・複数意図・十分な候補数
        let phrase = Phrase::new("how to fix and set up best budget streaming tips", "t");
        let breakdown = scorer().evaluate(&phrase, &signals(14, 1, 14));
        assert!(breakdown.demand >= 50, "demand {}", breakdown.demand);
        assert!(breakdown.opportunity >= 90, "opportunity {}", breakdown.opportunity);
        assert!(breakdown.is_super_topic);
        assert_eq!(breakdown.evergreen, 25);
    }

    #[test]
    fn scores_stay_within_bounds_for_extreme_signals() {
        let phrase = Phrase::new("x", "t");
        let breakdown = scorer().evaluate(&phrase, &signals(u32::MAX, u32::MAX, u32::MAX));
        assert!((0..=100).contains(&breakdown.demand));
        assert!((0..=100).contains(&breakdown.opportunity));
    }

    #[test]
    fn missing_signals_is_an_error() {
        use crate::scoring::anchors::{AnchorSet, FillerWords};
        use crate::scoring::frequency::FrequencyIndex;
        use crate::scoring::seed::SeedPhrase;

        let seed = SeedPhrase::new("content creation").expect("seed");
        let filler = FillerWords::default();
        let index = FrequencyIndex::build(&[], &seed, usize::MAX);
        let anchors = AnchorSet::new(Vec::new(), &seed, &filler);
        let ctx = ScoringContext {
            seed: &seed,
            index: &index,
            anchors: &anchors,
            filler: &filler,
            signals: None,
        };
        let error = scorer()
            .score(&Phrase::new("content creation tips", "t"), &ctx)
            .expect_err("signals are required");
        assert!(matches!(error, ScoringError::MissingSignals { .. }));
    }
}
