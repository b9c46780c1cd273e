//! Popularity-v2: tiered base scores from the tag classifier plus bounded boosts.
//!
//! Tier bands:
//! - `EXACT`: per-position base + anchor support bonus, floored above the untagged ceiling.
//! - `CHILD`: 70 + position boost + shared boosts, capped just below the matched anchor's base.
//! - `RELATED`: 55 + position boost + shared boosts, capped two below the matched anchor's base.
//! - `NONE`: 55 + shared boosts, capped at the untagged ceiling.

use serde::Serialize;

use crate::profile::PopularityV2Profile;
use crate::util::error::ScoringError;
use crate::util::text::{jitter, tokenize};

use super::classifier::classify;
use super::frequency::PatternCategory;
use super::heuristics::HeuristicLexicon;
use super::strategy::{Scorer, ScorerKind, ScoringContext};
use super::types::{Breakdown, Metric, MetricScore, Phrase, ScoreResult, Tag, round_to_i32};

const MAX_SCORE: i32 = 99;

/// Popularity-v2 の加点内訳。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularityV2Breakdown {
    pub tag: Tag,
    pub anchor_index: Option<usize>,
    pub anchor_position: Option<u32>,
    pub base: i32,
    pub position_boost: i32,
    pub exact_support_bonus: i32,
    pub starter_share: f64,
    pub starter_boost: i32,
    pub anchor_word_boost: i32,
    pub length_adjustment: i32,
    pub heuristic_adjustment: i32,
    pub heuristic_rules: Vec<String>,
    pub jitter: i32,
    pub floor: i32,
    pub ceiling: i32,
}

impl PopularityV2Breakdown {
    fn raw_total(&self) -> i32 {
        [
            self.base,
            self.position_boost,
            self.exact_support_bonus,
            self.starter_boost,
            self.anchor_word_boost,
            self.length_adjustment,
            self.heuristic_adjustment,
            self.jitter,
        ]
        .into_iter()
        .fold(0, i32::saturating_add)
    }
}

#[derive(Debug, Clone)]
pub struct PopularityV2Scorer {
    profile: PopularityV2Profile,
    heuristics: HeuristicLexicon,
}

impl PopularityV2Scorer {
    /// # Errors
    /// ヒューリスティック辞書のコンパイルに失敗した場合。
    pub fn new(profile: PopularityV2Profile) -> Result<Self, ScoringError> {
        let heuristics = HeuristicLexicon::compile(&profile.heuristics)?;
        Ok(Self {
            profile,
            heuristics,
        })
    }

    /// 先頭語のスターター比率（%）。シードで始まる候補は 0。
    fn starter_share(tokens: &[&str], ctx: &ScoringContext<'_>, starts_with_seed: bool) -> f64 {
        match tokens.first() {
            Some(first) if !starts_with_seed => {
                ctx.index.share_percent(PatternCategory::Starter, first)
            }
            _ => 0.0,
        }
    }

    /// 非シード・非フィラー語のコーパス出現数から最大の加点を選ぶ。
    fn anchor_word_boost(&self, tokens: &[&str], ctx: &ScoringContext<'_>) -> i32 {
        tokens
            .iter()
            .filter(|token| !ctx.seed.has_token(token) && !ctx.filler.contains(token))
            .map(|token| {
                let count = ctx.index.count(PatternCategory::Word, token);
                self.profile.anchor_word_frequency.lookup(f64::from(count))
            })
            .max()
            .unwrap_or(0)
    }
}

impl Scorer for PopularityV2Scorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::PopularityV2
    }

    fn score(
        &self,
        phrase: &Phrase,
        ctx: &ScoringContext<'_>,
    ) -> Result<ScoreResult, ScoringError> {
        let text = phrase.text();
        let tokens = tokenize(text);
        let matched = classify(text, ctx.anchors.anchors());
        let profile = &self.profile;

        let mut breakdown = PopularityV2Breakdown {
            tag: matched.tag,
            anchor_index: matched.anchor_index,
            anchor_position: matched.anchor_position,
            base: 0,
            position_boost: 0,
            exact_support_bonus: 0,
            starter_share: 0.0,
            starter_boost: 0,
            anchor_word_boost: 0,
            length_adjustment: 0,
            heuristic_adjustment: 0,
            heuristic_rules: Vec::new(),
            jitter: jitter(text, profile.jitter_span),
            floor: 0,
            ceiling: profile.untagged_ceiling,
        };

        match (matched.tag, matched.anchor_index) {
            (Tag::Exact, Some(anchor)) => {
                let support = tokens
                    .iter()
                    .map(|token| ctx.anchors.word_support(token))
                    .max()
                    .unwrap_or(0);
                breakdown.base = profile.exact_base_for(anchor);
                breakdown.exact_support_bonus =
                    profile.exact_support_bonus.lookup(f64::from(support));
                breakdown.floor = profile.exact_floor_for(anchor);
                breakdown.ceiling = profile.exact_ceiling;
            }
            (tag, anchor) => {
                let starts_with_seed = ctx.seed.split(text).starts_with_seed;
                breakdown.starter_share = Self::starter_share(&tokens, ctx, starts_with_seed);
                breakdown.starter_boost = profile.starter_share.lookup(breakdown.starter_share);
                breakdown.anchor_word_boost = self.anchor_word_boost(&tokens, ctx);
                #[allow(clippy::cast_precision_loss)]
                let words = tokens.len() as f64;
                breakdown.length_adjustment = profile.length.lookup(words);
                let heuristic = self.heuristics.evaluate(text);
                breakdown.heuristic_adjustment = heuristic.adjustment;
                breakdown.heuristic_rules = heuristic.fired;

                match (tag, anchor) {
                    (Tag::Child, Some(anchor)) => {
                        breakdown.base = profile.child_base;
                        breakdown.position_boost = profile.position_boost_for(anchor);
                        breakdown.ceiling =
                            profile.exact_base_for(anchor).saturating_sub(profile.child_margin);
                    }
                    (Tag::Related, Some(anchor)) => {
                        breakdown.base = profile.related_base;
                        breakdown.position_boost = profile.position_boost_for(anchor);
                        breakdown.ceiling = profile
                            .exact_base_for(anchor)
                            .saturating_sub(profile.related_margin);
                    }
                    _ => {
                        breakdown.base = profile.untagged_base;
                        breakdown.ceiling = profile.untagged_ceiling;
                    }
                }
            }
        }

        let ceiling = breakdown.ceiling.clamp(0, MAX_SCORE);
        let floor = breakdown.floor.clamp(0, ceiling);
        let value = round_to_i32(f64::from(breakdown.raw_total())).clamp(floor, ceiling);

        Ok(ScoreResult {
            scorer: ScorerKind::PopularityV2,
            tag: matched.tag.into(),
            scores: vec![MetricScore {
                metric: Metric::PopularityV2,
                value,
            }],
            breakdown: Breakdown::PopularityV2(breakdown),
        })
    }
}
