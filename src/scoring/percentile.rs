//! Popularity / Competition from seed-relative component percentiles.

use serde::Serialize;

use crate::profile::{ComponentWeights, PercentileProfile};
use crate::util::error::ScoringError;

use super::frequency::PatternCategory;
use super::strategy::{Scorer, ScorerKind, ScoringContext};
use super::types::{Breakdown, Metric, MetricScore, Phrase, ScoreResult, ScoreTag, round_to_i32};

/// 4成分のパーセンタイルと重み付け前の値。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileBreakdown {
    pub seed_found: bool,
    pub prefix: u8,
    pub seed_plus_one: u8,
    pub seed_plus_two: u8,
    pub suffix: u8,
    pub popularity_raw: f64,
    pub competition_raw: f64,
}

#[derive(Debug, Clone)]
pub struct PercentileScorer {
    profile: PercentileProfile,
}

impl PercentileScorer {
    #[must_use]
    pub fn new(profile: PercentileProfile) -> Self {
        Self { profile }
    }
}

fn weighted(weights: &ComponentWeights, components: [u8; 4]) -> f64 {
    let [prefix, plus_one, plus_two, suffix] = components.map(f64::from);
    weights.prefix * prefix
        + weights.seed_plus_one * plus_one
        + weights.seed_plus_two * plus_two
        + weights.suffix * suffix
}

impl Scorer for PercentileScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Percentile
    }

    fn score(
        &self,
        phrase: &Phrase,
        ctx: &ScoringContext<'_>,
    ) -> Result<ScoreResult, ScoringError> {
        let split = ctx.seed.split(phrase.text());
        let index = ctx.index;
        let components = [
            index.percentile_or_neutral(PatternCategory::Prefix, split.prefix),
            index.percentile_or_neutral(PatternCategory::SeedPlusOne, split.seed_plus_one),
            index.percentile_or_neutral(PatternCategory::SeedPlusTwo, split.seed_plus_two),
            index.percentile_or_neutral(PatternCategory::Suffix, split.suffix),
        ];

        let popularity_raw = weighted(&self.profile.popularity, components);
        let competition_raw = weighted(&self.profile.competition, components);
        let popularity = round_to_i32(popularity_raw).clamp(0, 100);
        let competition = round_to_i32(competition_raw).clamp(0, 100);

        let tag = if split.found {
            ScoreTag::SeedAnchored
        } else {
            ScoreTag::SeedAbsent
        };

        Ok(ScoreResult {
            scorer: ScorerKind::Percentile,
            tag,
            scores: vec![
                MetricScore {
                    metric: Metric::Popularity,
                    value: popularity,
                },
                MetricScore {
                    metric: Metric::Competition,
                    value: competition,
                },
                MetricScore {
                    metric: Metric::Spread,
                    value: popularity - competition,
                },
            ],
            breakdown: Breakdown::Percentile(PercentileBreakdown {
                seed_found: split.found,
                prefix: components[0],
                seed_plus_one: components[1],
                seed_plus_two: components[2],
                suffix: components[3],
                popularity_raw,
                competition_raw,
            }),
        })
    }
}
