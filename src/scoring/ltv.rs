//! Long-term value: strictly ordered containment tiers over the anchor set.

use serde::Serialize;

use crate::profile::{LtvBand, LtvProfile};
use crate::util::error::ScoringError;
use crate::util::text::{jitter, tokenize};

use super::strategy::{Scorer, ScorerKind, ScoringContext};
use super::types::{Breakdown, Metric, MetricScore, Phrase, ScoreResult, ScoreTag};

/// LTV の内訳。一致しなかった場合は `matched` が `None` で値は 0。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LtvBreakdown {
    pub tier: ScoreTag,
    pub matched: Option<String>,
    pub anchor_index: Option<usize>,
    pub support: u32,
    pub token_offset: Option<usize>,
    pub base: i32,
    pub bonus: i32,
    pub jitter: i32,
    pub floor: i32,
    pub ceiling: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TierMatch {
    pattern: String,
    anchor_index: Option<usize>,
    support: u32,
    token_offset: usize,
    bonus: i32,
}

#[derive(Debug, Clone)]
pub struct LtvScorer {
    profile: LtvProfile,
}

impl LtvScorer {
    #[must_use]
    pub fn new(profile: LtvProfile) -> Self {
        Self { profile }
    }

    fn full_match(&self, text: &str, ctx: &ScoringContext<'_>) -> Option<TierMatch> {
        let band = &self.profile.full_match;
        best(ctx.anchors.anchors().iter().filter_map(|anchor| {
            let offset = token_offset(text, anchor.text())?;
            Some(TierMatch {
                pattern: anchor.text().to_string(),
                anchor_index: Some(anchor.index()),
                support: 1,
                token_offset: offset,
                bonus: band_bonus(band, Some(anchor.index()), 1, offset),
            })
        }))
    }

    fn full_anchor(&self, text: &str, ctx: &ScoringContext<'_>) -> Option<TierMatch> {
        let band = &self.profile.full_anchor;
        best(ctx.anchors.full_anchors().iter().filter_map(|full| {
            let offset = token_offset(text, &full.text)?;
            Some(TierMatch {
                pattern: full.text.clone(),
                anchor_index: Some(full.origin),
                support: full.support,
                token_offset: offset,
                bonus: band_bonus(band, Some(full.origin), full.support, offset),
            })
        }))
    }

    fn bigram(&self, tokens: &[&str], ctx: &ScoringContext<'_>) -> Option<TierMatch> {
        let band = &self.profile.bigram;
        best(tokens.windows(2).enumerate().filter_map(|(offset, pair)| {
            let pattern = pair.join(" ");
            let support = ctx.anchors.bigram_support(&pattern);
            (support > 0).then(|| TierMatch {
                bonus: band_bonus(band, None, support, offset),
                pattern,
                anchor_index: None,
                support,
                token_offset: offset,
            })
        }))
    }

    fn single_word(&self, tokens: &[&str], ctx: &ScoringContext<'_>) -> Option<TierMatch> {
        let band = &self.profile.single_word;
        best(tokens.iter().enumerate().filter_map(|(offset, token)| {
            let support = ctx.anchors.word_support(token);
            (support > 0).then(|| TierMatch {
                pattern: (*token).to_string(),
                anchor_index: None,
                support,
                token_offset: offset,
                bonus: band_bonus(band, None, support, offset),
            })
        }))
    }
}

/// 最大の加点を持つ一致を選ぶ。同点なら先に現れたもの。
fn best(matches: impl Iterator<Item = TierMatch>) -> Option<TierMatch> {
    matches.fold(None, |current, candidate| match current {
        Some(current) if current.bonus >= candidate.bonus => Some(current),
        _ => Some(candidate),
    })
}

/// `pattern` が最初に現れる位置を、その位置を含むトークンの番号で返す。
fn token_offset(text: &str, pattern: &str) -> Option<usize> {
    if pattern.is_empty() {
        return None;
    }
    let byte = text.find(pattern)?;
    let before = &text[..byte];
    let complete = before.split_whitespace().count();
    // 語の途中から一致した場合、その語は一致位置の語として数える
    if before.is_empty() || before.ends_with(' ') {
        Some(complete)
    } else {
        Some(complete.saturating_sub(1))
    }
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn band_bonus(band: &LtvBand, anchor_index: Option<usize>, support: u32, offset: usize) -> i32 {
    let rank = anchor_index.map_or(0, |index| {
        band.rank_weight
            .saturating_mul(band.rank_window.saturating_sub(to_i32(index)).max(0))
    });
    let capped_support = i32::try_from(support.min(band.support_cap)).unwrap_or(i32::MAX);
    let position = band.offset_window.saturating_sub(to_i32(offset)).max(0);
    let lead = if offset == 0 { band.lead_bonus } else { 0 };
    [
        rank,
        band.support_weight.saturating_mul(capped_support),
        position,
        lead,
    ]
    .into_iter()
    .fold(0, i32::saturating_add)
}

impl Scorer for LtvScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Ltv
    }

    fn score(
        &self,
        phrase: &Phrase,
        ctx: &ScoringContext<'_>,
    ) -> Result<ScoreResult, ScoringError> {
        let text = phrase.text();
        let tokens = tokenize(text);
        let profile = &self.profile;

        let tiers = [
            (ScoreTag::FullTop10, &profile.full_match),
            (ScoreTag::FullAnchor, &profile.full_anchor),
            (ScoreTag::Bigram, &profile.bigram),
            (ScoreTag::SingleWord, &profile.single_word),
        ];
        let found = tiers.into_iter().find_map(|(tier, band)| {
            let matched = match tier {
                ScoreTag::FullTop10 => self.full_match(text, ctx),
                ScoreTag::FullAnchor => self.full_anchor(text, ctx),
                ScoreTag::Bigram => self.bigram(&tokens, ctx),
                _ => self.single_word(&tokens, ctx),
            };
            matched.map(|matched| (tier, band, matched))
        });

        let breakdown = match found {
            Some((tier, band, matched)) => LtvBreakdown {
                tier,
                matched: Some(matched.pattern),
                anchor_index: matched.anchor_index,
                support: matched.support,
                token_offset: Some(matched.token_offset),
                base: band.base,
                bonus: matched.bonus,
                jitter: jitter(text, profile.jitter_span),
                floor: band.floor,
                ceiling: band.ceiling,
            },
            None => LtvBreakdown {
                tier: ScoreTag::NoMatch,
                matched: None,
                anchor_index: None,
                support: 0,
                token_offset: None,
                base: 0,
                bonus: 0,
                jitter: 0,
                floor: 0,
                ceiling: 0,
            },
        };
        let value = breakdown
            .base
            .saturating_add(breakdown.bonus)
            .saturating_add(breakdown.jitter)
            .max(breakdown.floor)
            .min(breakdown.ceiling);

        Ok(ScoreResult {
            scorer: ScorerKind::Ltv,
            tag: breakdown.tier,
            scores: vec![MetricScore {
                metric: Metric::Ltv,
                value,
            }],
            breakdown: Breakdown::Ltv(breakdown),
        })
    }
}
