//! Core value types shared by every scorer.

use serde::Serialize;

use crate::util::text::normalize_phrase;

use super::anchor_tier::PopularityV2Breakdown;
use super::dual::DualBreakdown;
use super::ltv::LtvBreakdown;
use super::percentile::PercentileBreakdown;
use super::strategy::ScorerKind;

/// 正規化済みフレーズと生成元タグ。生成後は不変。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Phrase {
    text: String,
    origin: String,
}

impl Phrase {
    #[must_use]
    pub fn new(raw: &str, origin: impl Into<String>) -> Self {
        Self {
            text: normalize_phrase(raw),
            origin: origin.into(),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// 参照集合に属するフレーズ。`position` は入力上の順位、
/// `index` は順位で安定ソートした後の0始まりの位置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorPhrase {
    phrase: Phrase,
    position: u32,
    index: usize,
}

impl AnchorPhrase {
    #[must_use]
    pub(crate) fn new(phrase: Phrase, position: u32, index: usize) -> Self {
        Self {
            phrase,
            position,
            index,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.phrase.text()
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// タグ分類の結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tag {
    Exact,
    Child,
    Related,
    #[serde(rename = "NONE")]
    Untagged,
}

/// 分類されたタグと一致したアンカー。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TagMatch {
    pub tag: Tag,
    pub anchor_index: Option<usize>,
    pub anchor_position: Option<u32>,
}

impl TagMatch {
    #[must_use]
    pub fn untagged() -> Self {
        Self {
            tag: Tag::Untagged,
            anchor_index: None,
            anchor_position: None,
        }
    }

    #[must_use]
    pub(crate) fn matched(tag: Tag, anchor: &AnchorPhrase) -> Self {
        Self {
            tag,
            anchor_index: Some(anchor.index()),
            anchor_position: Some(anchor.position()),
        }
    }
}

/// スコア結果に付与される説明タグ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreTag {
    Exact,
    Child,
    Related,
    #[serde(rename = "NONE")]
    Untagged,
    FullTop10,
    FullAnchor,
    Bigram,
    SingleWord,
    NoMatch,
    SeedAnchored,
    SeedAbsent,
    SuperTopic,
    Standard,
}

impl From<Tag> for ScoreTag {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Exact => Self::Exact,
            Tag::Child => Self::Child,
            Tag::Related => Self::Related,
            Tag::Untagged => Self::Untagged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Popularity,
    Competition,
    Spread,
    PopularityV2,
    Ltv,
    Demand,
    Opportunity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricScore {
    pub metric: Metric,
    pub value: i32,
}

/// 加点内訳。監査とテストのために保持する。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Breakdown {
    Percentile(PercentileBreakdown),
    PopularityV2(PopularityV2Breakdown),
    Ltv(LtvBreakdown),
    Dual(DualBreakdown),
}

/// (フレーズ, スコアラー) ごとに1件生成される結果。生成後は変更しない。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub scorer: ScorerKind,
    pub tag: ScoreTag,
    pub scores: Vec<MetricScore>,
    pub breakdown: Breakdown,
}

impl ScoreResult {
    #[must_use]
    pub fn score(&self, metric: Metric) -> Option<i32> {
        self.scores
            .iter()
            .find(|entry| entry.metric == metric)
            .map(|entry| entry.value)
    }
}

/// Round half away from zero and convert to `i32`.
pub(crate) fn round_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let rounded = value.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
    rounded
}
