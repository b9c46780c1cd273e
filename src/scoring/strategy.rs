//! Scorer strategy trait and registry.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::input::SuggestionSignals;
use crate::profile::ScoringProfile;
use crate::util::error::ScoringError;

use super::anchor_tier::PopularityV2Scorer;
use super::anchors::{AnchorSet, FillerWords};
use super::dual::DualScorer;
use super::frequency::FrequencyIndex;
use super::ltv::LtvScorer;
use super::percentile::PercentileScorer;
use super::seed::SeedPhrase;
use super::types::{Phrase, ScoreResult};

/// スコアラーが参照するセッション共有の読み取り専用データ。
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub seed: &'a SeedPhrase,
    pub index: &'a FrequencyIndex,
    pub anchors: &'a AnchorSet,
    pub filler: &'a FillerWords,
    pub signals: Option<&'a SuggestionSignals>,
}

/// 1つのスコア算出式。`score` は純粋関数で、同じ入力には常に同じ結果を返す。
pub trait Scorer: Send + Sync + fmt::Debug {
    fn kind(&self) -> ScorerKind;

    /// # Errors
    /// 必要な入力（例: 候補数シグナル）が欠けている場合。
    fn score(&self, phrase: &Phrase, ctx: &ScoringContext<'_>)
    -> Result<ScoreResult, ScoringError>;
}

/// 利用可能なスコアラー。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    Percentile,
    PopularityV2,
    Ltv,
    Dual,
}

impl ScorerKind {
    pub const ALL: [Self; 4] = [Self::Percentile, Self::PopularityV2, Self::Ltv, Self::Dual];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percentile => "percentile",
            Self::PopularityV2 => "popularity_v2",
            Self::Ltv => "ltv",
            Self::Dual => "dual",
        }
    }

    /// 候補ごとの候補数シグナルが必要か。
    #[must_use]
    pub fn requires_signals(self) -> bool {
        matches!(self, Self::Dual)
    }

    /// プロファイルからスコアラーを組み立てる。
    ///
    /// # Errors
    /// プロファイル中の辞書（正規表現・意図トリガー）が不正な場合。
    pub fn build(self, profile: &ScoringProfile) -> Result<Box<dyn Scorer>, ScoringError> {
        Ok(match self {
            Self::Percentile => Box::new(PercentileScorer::new(profile.percentile.clone())),
            Self::PopularityV2 => Box::new(PopularityV2Scorer::new(profile.popularity_v2.clone())?),
            Self::Ltv => Box::new(LtvScorer::new(profile.ltv.clone())),
            Self::Dual => Box::new(DualScorer::new(profile.dual.clone())?),
        })
    }

    /// カンマ区切りのスコアラー名を順序を保ったまま重複なしで読む。
    ///
    /// # Errors
    /// 未知の名前を含む場合、または1つも指定がない場合。
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, UnknownScorer> {
        let mut kinds = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            let kind: Self = name.parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            return Err(UnknownScorer(raw.to_string()));
        }
        Ok(kinds)
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scorer {0:?} (expected percentile, popularity_v2, ltv or dual)")]
pub struct UnknownScorer(pub String);

impl FromStr for ScorerKind {
    type Err = UnknownScorer;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "percentile" => Ok(Self::Percentile),
            "popularity_v2" | "popularity" => Ok(Self::PopularityV2),
            "ltv" => Ok(Self::Ltv),
            "dual" => Ok(Self::Dual),
            _ => Err(UnknownScorer(raw.to_string())),
        }
    }
}
