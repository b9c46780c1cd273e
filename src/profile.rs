//! Scoring profile: every table, weight, and threshold used by the scorers.
//!
//! A profile is an immutable, versioned value injected into a session at construction.
//! `ScoringProfile::default()` is the production profile; a YAML overlay can replace any
//! subset of fields.

use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::util::error::ScoringError;

/// Environment variable naming an optional YAML overlay.
pub const PROFILE_ENV: &str = "TOPIC_SCORER_PROFILE";

/// 点数・重みとして受け付ける絶対値の上限。
const MAX_WEIGHT: i32 = 1_000;

/// しきい値テーブルの1段。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step<V> {
    pub bound: f64,
    pub value: V,
}

/// 下限しきい値テーブル。`x >= bound` を満たす最初の段を採用する（bound は降順）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtLeast<V> {
    pub steps: Vec<Step<V>>,
    pub otherwise: V,
}

impl<V: Copy> AtLeast<V> {
    #[must_use]
    pub fn lookup(&self, x: f64) -> V {
        self.steps
            .iter()
            .find(|step| x >= step.bound)
            .map_or(self.otherwise, |step| step.value)
    }

    fn is_descending(&self) -> bool {
        self.steps.windows(2).all(|pair| pair[0].bound > pair[1].bound)
    }

    fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.steps
            .iter()
            .map(|step| step.value)
            .chain(std::iter::once(self.otherwise))
    }
}

/// 上限しきい値テーブル。`x <= bound` を満たす最初の段を採用する（bound は昇順）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtMost<V> {
    pub steps: Vec<Step<V>>,
    pub otherwise: V,
}

impl<V: Copy> AtMost<V> {
    #[must_use]
    pub fn lookup(&self, x: f64) -> V {
        self.steps
            .iter()
            .find(|step| x <= step.bound)
            .map_or(self.otherwise, |step| step.value)
    }

    fn is_ascending(&self) -> bool {
        self.steps.windows(2).all(|pair| pair[0].bound < pair[1].bound)
    }

    fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.steps
            .iter()
            .map(|step| step.value)
            .chain(std::iter::once(self.otherwise))
    }
}

impl AtMost<i32> {
    /// テーブル中の最小値。データが無い場合の既定寄与に使う。
    #[must_use]
    pub fn minimum(&self) -> i32 {
        self.steps
            .iter()
            .map(|step| step.value)
            .fold(self.otherwise, i32::min)
    }
}

fn at_least<V>(steps: &[(f64, V)], otherwise: V) -> AtLeast<V>
where
    V: Copy,
{
    AtLeast {
        steps: steps
            .iter()
            .map(|&(bound, value)| Step { bound, value })
            .collect(),
        otherwise,
    }
}

fn at_most<V>(steps: &[(f64, V)], otherwise: V) -> AtMost<V>
where
    V: Copy,
{
    AtMost {
        steps: steps
            .iter()
            .map(|&(bound, value)| Step { bound, value })
            .collect(),
        otherwise,
    }
}

/// 4成分（prefix / seed+1 / seed+2 / suffix）の重み。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub prefix: f64,
    pub seed_plus_one: f64,
    pub seed_plus_two: f64,
    pub suffix: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PercentileProfile {
    pub popularity: ComponentWeights,
    pub competition: ComponentWeights,
}

impl Default for PercentileProfile {
    fn default() -> Self {
        Self {
            popularity: ComponentWeights {
                prefix: 0.20,
                seed_plus_one: 0.30,
                seed_plus_two: 0.30,
                suffix: 0.20,
            },
            competition: ComponentWeights {
                prefix: 0.25,
                seed_plus_one: 0.25,
                seed_plus_two: 0.25,
                suffix: 0.25,
            },
        }
    }
}

/// ドメインヒューリスティックの1ルール（正規表現が一致したら `delta` を加算）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicRule {
    pub name: String,
    pub pattern: String,
    pub delta: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicProfile {
    pub rules: Vec<HeuristicRule>,
    pub min: i32,
    pub max: i32,
}

impl Default for HeuristicProfile {
    fn default() -> Self {
        let rule = |name: &str, pattern: &str, delta: i32| HeuristicRule {
            name: name.to_string(),
            pattern: pattern.to_string(),
            delta,
        };
        Self {
            rules: vec![
                rule(
                    "region_language",
                    r"\b(?:in|for) (?:hindi|urdu|tamil|telugu|bengali|marathi|arabic|spanish|india|pakistan|nigeria|bangladesh|indonesia)\b|\b(?:hindi|urdu|tamil|telugu|bangla)\b",
                    -12,
                ),
                rule(
                    "low_value_reference",
                    r"\b(?:meaning|definition|wikipedia|pdf|ppt|quotes|images|png|clipart|synonyms?)\b",
                    -8,
                ),
                rule(
                    "low_value_navigation",
                    r"\b(?:login|sign in|near me|reddit|quora|free download|apk)\b",
                    -5,
                ),
                rule(
                    "freshness",
                    r"\b(?:20[2-3][0-9]|latest|new|trends?|updated?)\b",
                    5,
                ),
                rule(
                    "how_to",
                    r"\b(?:how to|step by step|tutorial|guide|tips)\b",
                    5,
                ),
            ],
            min: -12,
            max: 10,
        }
    }
}

/// Popularity-v2（タグ階層スコア）の設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopularityV2Profile {
    /// アンカー順位ごとの EXACT 基礎点。範囲外の順位は末尾の値を使う。
    pub exact_base: Vec<i32>,
    pub exact_ceiling: i32,
    /// 候補トークンのアンカー出現数に応じた EXACT 加点。
    pub exact_support_bonus: AtLeast<i32>,
    /// アンカー順位ごとの CHILD / RELATED 加点。範囲外は末尾の値。
    pub position_boost: Vec<i32>,
    pub child_base: i32,
    pub child_margin: i32,
    pub related_base: i32,
    pub related_margin: i32,
    pub untagged_base: i32,
    pub untagged_ceiling: i32,
    /// 先頭語のスターター比率（%）に応じた加点。
    pub starter_share: AtLeast<i32>,
    /// 非シード・非フィラー語のコーパス出現数に応じた加点（最大値を採用）。
    pub anchor_word_frequency: AtLeast<i32>,
    /// 語数に応じた加減点。
    pub length: AtMost<i32>,
    pub heuristics: HeuristicProfile,
    pub jitter_span: u32,
}

impl Default for PopularityV2Profile {
    fn default() -> Self {
        Self {
            exact_base: vec![87, 86, 85, 84, 83, 82, 81, 80, 79],
            exact_ceiling: 92,
            exact_support_bonus: at_least(&[(6.0, 5), (3.0, 3)], 0),
            position_boost: vec![12, 11, 10, 9, 8, 7, 6, 5, 4],
            child_base: 70,
            child_margin: 1,
            related_base: 55,
            related_margin: 2,
            untagged_base: 55,
            untagged_ceiling: 79,
            starter_share: at_least(
                &[(15.0, 12), (10.0, 10), (7.0, 8), (4.0, 5), (2.0, 3)],
                0,
            ),
            anchor_word_frequency: at_least(
                &[(20.0, 12), (15.0, 10), (10.0, 7), (6.0, 4), (3.0, 2)],
                0,
            ),
            length: at_most(
                &[(1.0, -15), (2.0, -4), (6.0, 4), (8.0, 1), (9.0, -3)],
                -8,
            ),
            heuristics: HeuristicProfile::default(),
            jitter_span: 7,
        }
    }
}

impl PopularityV2Profile {
    #[must_use]
    pub fn exact_base_for(&self, anchor_index: usize) -> i32 {
        tail_lookup(&self.exact_base, anchor_index)
    }

    #[must_use]
    pub fn position_boost_for(&self, anchor_index: usize) -> i32 {
        tail_lookup(&self.position_boost, anchor_index)
    }

    /// EXACT スコアの下限。未タグ上限より必ず上になる。
    #[must_use]
    pub fn exact_floor_for(&self, anchor_index: usize) -> i32 {
        self.exact_base_for(anchor_index)
            .max(self.untagged_ceiling.saturating_add(1))
    }
}

fn tail_lookup(table: &[i32], index: usize) -> i32 {
    table
        .get(index)
        .or_else(|| table.last())
        .copied()
        .unwrap_or(0)
}

/// LTV の1階層（帯域と加点の形）。
///
/// bonus = `rank_weight * max(0, rank_window - anchor_index)`
///       + `support_weight * min(support, support_cap)`
///       + `max(0, offset_window - token_offset)`
///       + `lead_bonus`（候補の先頭で一致した場合）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LtvBand {
    pub base: i32,
    pub floor: i32,
    pub ceiling: i32,
    pub rank_weight: i32,
    pub rank_window: i32,
    pub support_weight: i32,
    pub support_cap: u32,
    pub offset_window: i32,
    pub lead_bonus: i32,
}

impl LtvBand {
    fn weights(&self) -> Vec<i32> {
        vec![
            self.base,
            self.floor,
            self.ceiling,
            self.rank_weight,
            self.rank_window,
            self.support_weight,
            i32::try_from(self.support_cap).unwrap_or(i32::MAX),
            self.offset_window,
            self.lead_bonus,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LtvProfile {
    pub full_match: LtvBand,
    pub full_anchor: LtvBand,
    pub bigram: LtvBand,
    pub single_word: LtvBand,
    pub jitter_span: u32,
}

impl Default for LtvProfile {
    fn default() -> Self {
        Self {
            full_match: LtvBand {
                base: 70,
                floor: 70,
                ceiling: 95,
                rank_weight: 2,
                rank_window: 9,
                support_weight: 0,
                support_cap: 0,
                offset_window: 0,
                lead_bonus: 4,
            },
            full_anchor: LtvBand {
                base: 55,
                floor: 55,
                ceiling: 69,
                rank_weight: 0,
                rank_window: 0,
                support_weight: 2,
                support_cap: 4,
                offset_window: 4,
                lead_bonus: 0,
            },
            bigram: LtvBand {
                base: 40,
                floor: 40,
                ceiling: 54,
                rank_weight: 0,
                rank_window: 0,
                support_weight: 2,
                support_cap: 4,
                offset_window: 4,
                lead_bonus: 0,
            },
            single_word: LtvBand {
                base: 20,
                floor: 20,
                ceiling: 39,
                rank_weight: 0,
                rank_window: 0,
                support_weight: 2,
                support_cap: 5,
                offset_window: 5,
                lead_bonus: 0,
            },
            jitter_span: 5,
        }
    }
}

/// 検索意図カテゴリ。`triggers` は優先順。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentCategory {
    pub name: String,
    pub triggers: Vec<String>,
    pub demand_boost: i32,
    pub evergreen_bonus: i32,
}

/// Demand / Opportunity の設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualProfile {
    pub word_count_multiplier: AtMost<f64>,
    pub volume_saturation: f64,
    pub volume_cap: f64,
    pub topic_ratio_cap: f64,
    pub exact_match_weight: f64,
    pub exact_match_cap: f64,
    pub intent_demand_cap: i32,
    /// 完全一致率（%）に応じた低競合シグナル。
    pub low_competition: AtMost<i32>,
    pub long_tail: AtLeast<i32>,
    pub evergreen_cap: i32,
    pub demand_validation: AtLeast<i32>,
    pub intents: Vec<IntentCategory>,
    pub super_topic_demand: i32,
    pub super_topic_opportunity: i32,
}

impl Default for DualProfile {
    fn default() -> Self {
        Self {
            word_count_multiplier: at_most(
                &[
                    (1.0, 0.7),
                    (2.0, 0.85),
                    (3.0, 0.95),
                    (4.0, 1.0),
                    (6.0, 1.1),
                    (7.0, 1.05),
                    (8.0, 1.0),
                ],
                0.9,
            ),
            volume_saturation: 14.0,
            volume_cap: 50.0,
            topic_ratio_cap: 15.0,
            exact_match_weight: 2.0,
            exact_match_cap: 15.0,
            intent_demand_cap: 10,
            low_competition: at_most(&[(10.0, 40), (20.0, 32), (35.0, 24), (50.0, 15)], 8),
            long_tail: at_least(&[(7.0, 20), (5.0, 16), (4.0, 12), (3.0, 8), (2.0, 4)], 0),
            evergreen_cap: 25,
            demand_validation: at_least(&[(12.0, 15), (8.0, 12), (4.0, 8), (1.0, 4)], 0),
            intents: default_intents(),
            super_topic_demand: 50,
            super_topic_opportunity: 90,
        }
    }
}

/// 既定の検索意図カテゴリ（優先順）。
fn default_intents() -> Vec<IntentCategory> {
    let intent = |name: &str, triggers: &[&str], demand_boost: i32, evergreen_bonus: i32| {
        IntentCategory {
            name: name.to_string(),
            triggers: triggers.iter().map(ToString::to_string).collect(),
            demand_boost,
            evergreen_bonus,
        }
    };
    vec![
        intent(
            "learning",
            &[
                "how to",
                "tutorial",
                "beginner",
                "guide",
                "learn",
                "course",
                "explained",
                "step by step",
                "tips",
            ],
            5,
            12,
        ),
        intent(
            "problem",
            &[
                "not working",
                "fix",
                "error",
                "problem",
                "issue",
                "troubleshoot",
                "why is",
                "why does",
            ],
            5,
            12,
        ),
        intent(
            "action",
            &["set up", "setup", "install", "create", "build", "make", "start"],
            4,
            10,
        ),
        intent(
            "buyer",
            &[
                "best",
                "review",
                "vs",
                "price",
                "cheap",
                "buy",
                "worth it",
                "alternative",
            ],
            3,
            6,
        ),
        intent(
            "discovery",
            &[
                "ideas",
                "examples",
                "inspiration",
                "trends",
                "what is",
                "types of",
            ],
            3,
            5,
        ),
    ]
}

/// スコアリングプロファイル全体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringProfile {
    pub version: String,
    pub filler_words: Vec<String>,
    pub percentile: PercentileProfile,
    pub popularity_v2: PopularityV2Profile,
    pub ltv: LtvProfile,
    pub dual: DualProfile,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            version: "2024.3-production".to_string(),
            filler_words: [
                "how", "to", "the", "a", "an", "and", "or", "for", "of", "in", "on", "with", "is",
                "are", "what", "why", "when", "where", "do", "does", "your", "you", "my", "i",
                "it", "that", "this", "at", "by", "from", "be", "can", "vs",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            percentile: PercentileProfile::default(),
            popularity_v2: PopularityV2Profile::default(),
            ltv: LtvProfile::default(),
            dual: DualProfile::default(),
        }
    }
}

impl ScoringProfile {
    /// `TOPIC_SCORER_PROFILE` が指す YAML を読み込む。未設定なら既定プロファイル。
    ///
    /// # Errors
    /// ファイルの読み込みまたはデシリアライズに失敗した場合は [`ProfileError`] を返す。
    pub fn load_from_env() -> Result<Self, ProfileError> {
        let path = match env::var(PROFILE_ENV) {
            Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw),
            _ => return Ok(Self::default()),
        };
        Self::load_from_path(&path)
    }

    /// YAML ファイルを読み込み、記述のないフィールドは既定値で補う。
    ///
    /// # Errors
    /// ファイルの読み込みまたはデシリアライズに失敗した場合は [`ProfileError`] を返す。
    pub fn load_from_path(path: &Path) -> Result<Self, ProfileError> {
        let contents = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ProfileError::Deserialize {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 構造的に壊れたプロファイルを拒否する。
    ///
    /// # Errors
    /// 不正なフィールドを [`ScoringError::InvalidProfile`] で報告する。
    pub fn validate(&self) -> Result<(), ScoringError> {
        let pop = &self.popularity_v2;
        if pop.exact_base.is_empty() {
            return Err(ScoringError::profile(
                "popularity_v2.exact_base",
                "table must not be empty",
            ));
        }
        if pop.position_boost.is_empty() {
            return Err(ScoringError::profile(
                "popularity_v2.position_boost",
                "table must not be empty",
            ));
        }
        if pop.exact_ceiling > 99 || pop.exact_ceiling <= pop.untagged_ceiling {
            return Err(ScoringError::profile(
                "popularity_v2.exact_ceiling",
                "must be above untagged_ceiling and at most 99",
            ));
        }
        if pop.heuristics.min > pop.heuristics.max {
            return Err(ScoringError::profile(
                "popularity_v2.heuristics",
                "min must not exceed max",
            ));
        }
        for (field, ok) in [
            (
                "popularity_v2.exact_support_bonus",
                pop.exact_support_bonus.is_descending(),
            ),
            ("popularity_v2.starter_share", pop.starter_share.is_descending()),
            (
                "popularity_v2.anchor_word_frequency",
                pop.anchor_word_frequency.is_descending(),
            ),
            ("popularity_v2.length", pop.length.is_ascending()),
            (
                "dual.word_count_multiplier",
                self.dual.word_count_multiplier.is_ascending(),
            ),
            ("dual.low_competition", self.dual.low_competition.is_ascending()),
            ("dual.long_tail", self.dual.long_tail.is_descending()),
            (
                "dual.demand_validation",
                self.dual.demand_validation.is_descending(),
            ),
        ] {
            if !ok {
                return Err(ScoringError::profile(field, "thresholds are out of order"));
            }
        }
        if pop.jitter_span == 0 || self.ltv.jitter_span == 0 {
            return Err(ScoringError::profile("jitter_span", "must be at least 1"));
        }
        self.validate_ltv()?;
        self.validate_magnitudes()?;
        if self.dual.volume_saturation <= 0.0 {
            return Err(ScoringError::profile(
                "dual.volume_saturation",
                "must be positive",
            ));
        }
        for category in &self.dual.intents {
            if category.name.trim().is_empty() || category.triggers.is_empty() {
                return Err(ScoringError::profile(
                    "dual.intents",
                    format!("category {:?} needs a name and triggers", category.name),
                ));
            }
            if category.triggers.iter().any(|trigger| trigger.is_empty()) {
                return Err(ScoringError::profile(
                    "dual.intents",
                    format!("category {:?} has an empty trigger", category.name),
                ));
            }
        }
        Ok(())
    }

    /// 整数の点数・重みがすべて `[-MAX_WEIGHT, MAX_WEIGHT]` に収まることを確かめる。
    fn validate_magnitudes(&self) -> Result<(), ScoringError> {
        let pop = &self.popularity_v2;
        let ltv = &self.ltv;
        let dual = &self.dual;
        let groups: Vec<(&'static str, Vec<i32>)> = vec![
            ("popularity_v2.exact_base", pop.exact_base.clone()),
            ("popularity_v2.position_boost", pop.position_boost.clone()),
            (
                "popularity_v2",
                vec![
                    pop.exact_ceiling,
                    pop.child_base,
                    pop.child_margin,
                    pop.related_base,
                    pop.related_margin,
                    pop.untagged_base,
                    pop.untagged_ceiling,
                ],
            ),
            (
                "popularity_v2.exact_support_bonus",
                pop.exact_support_bonus.values().collect(),
            ),
            (
                "popularity_v2.starter_share",
                pop.starter_share.values().collect(),
            ),
            (
                "popularity_v2.anchor_word_frequency",
                pop.anchor_word_frequency.values().collect(),
            ),
            ("popularity_v2.length", pop.length.values().collect()),
            (
                "popularity_v2.heuristics",
                pop.heuristics
                    .rules
                    .iter()
                    .map(|rule| rule.delta)
                    .chain([pop.heuristics.min, pop.heuristics.max])
                    .collect(),
            ),
            ("ltv.full_match", ltv.full_match.weights()),
            ("ltv.full_anchor", ltv.full_anchor.weights()),
            ("ltv.bigram", ltv.bigram.weights()),
            ("ltv.single_word", ltv.single_word.weights()),
            ("dual.low_competition", dual.low_competition.values().collect()),
            ("dual.long_tail", dual.long_tail.values().collect()),
            (
                "dual.demand_validation",
                dual.demand_validation.values().collect(),
            ),
            (
                "dual.intents",
                dual.intents
                    .iter()
                    .flat_map(|category| [category.demand_boost, category.evergreen_bonus])
                    .collect(),
            ),
            (
                "dual",
                vec![
                    dual.intent_demand_cap,
                    dual.evergreen_cap,
                    dual.super_topic_demand,
                    dual.super_topic_opportunity,
                ],
            ),
        ];
        let allowed = -MAX_WEIGHT..=MAX_WEIGHT;
        for (field, values) in groups {
            if values.iter().any(|value| !allowed.contains(value)) {
                return Err(ScoringError::profile(
                    field,
                    format!("values must lie within [-{MAX_WEIGHT}, {MAX_WEIGHT}]"),
                ));
            }
        }
        Ok(())
    }

    fn validate_ltv(&self) -> Result<(), ScoringError> {
        let ltv = &self.ltv;
        // 下位階層から順に並べる
        let ordered = [ltv.single_word, ltv.bigram, ltv.full_anchor, ltv.full_match];
        if ordered.iter().any(|band| band.floor > band.ceiling) {
            return Err(ScoringError::profile(
                "ltv",
                "band floor must not exceed its ceiling",
            ));
        }
        if ltv.single_word.floor <= 0 || ltv.full_match.ceiling > 99 {
            return Err(ScoringError::profile(
                "ltv",
                "bands must lie within [1, 99]",
            ));
        }
        if ordered.windows(2).any(|pair| pair[0].ceiling >= pair[1].floor) {
            return Err(ScoringError::profile("ltv", "bands overlap"));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to read scoring profile at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scoring profile at {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_profile_is_valid() {
        ScoringProfile::default()
            .validate()
            .expect("production profile validates");
    }

    #[rstest]
    #[case(16.0, 12)]
    #[case(15.0, 12)]
    #[case(12.0, 10)]
    #[case(7.0, 8)]
    #[case(4.5, 5)]
    #[case(2.0, 3)]
    #[case(1.9, 0)]
    fn starter_share_tiers(#[case] share: f64, #[case] expected: i32) {
        let profile = PopularityV2Profile::default();
        assert_eq!(profile.starter_share.lookup(share), expected);
    }

    #[rstest]
    #[case(0.0, -15)]
    #[case(1.0, -15)]
    #[case(2.0, -4)]
    #[case(3.0, 4)]
    #[case(6.0, 4)]
    #[case(7.0, 1)]
    #[case(8.0, 1)]
    #[case(9.0, -3)]
    #[case(10.0, -8)]
    #[case(14.0, -8)]
    fn length_adjustment_buckets(#[case] words: f64, #[case] expected: i32) {
        let profile = PopularityV2Profile::default();
        assert_eq!(profile.length.lookup(words), expected);
    }

    #[test]
    fn tables_fall_back_to_last_entry() {
        let profile = PopularityV2Profile::default();
        assert_eq!(profile.exact_base_for(0), 87);
        assert_eq!(profile.exact_base_for(8), 79);
        assert_eq!(profile.exact_base_for(20), 79);
        assert_eq!(profile.position_boost_for(0), 12);
        assert_eq!(profile.position_boost_for(42), 4);
    }

    #[test]
    fn exact_floor_sits_above_untagged_ceiling() {
        let profile = PopularityV2Profile::default();
        assert_eq!(profile.exact_floor_for(0), 87);
        assert_eq!(profile.exact_floor_for(8), 80);
    }

    #[test]
    fn low_competition_minimum_is_smallest_value() {
        assert_eq!(DualProfile::default().low_competition.minimum(), 8);
    }

    #[test]
    fn validate_rejects_overlapping_ltv_bands() {
        let mut profile = ScoringProfile::default();
        profile.ltv.bigram.ceiling = 60;
        let error = profile.validate().expect_err("overlap must fail");
        assert!(matches!(
            error,
            ScoringError::InvalidProfile { field: "ltv", .. }
        ));
    }

    #[test]
    fn validate_rejects_unordered_thresholds() {
        let mut profile = ScoringProfile::default();
        profile.popularity_v2.starter_share.steps.reverse();
        let error = profile.validate().expect_err("ascending lower bounds must fail");
        assert!(matches!(
            error,
            ScoringError::InvalidProfile {
                field: "popularity_v2.starter_share",
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_oversized_ltv_weight() {
        let mut profile = ScoringProfile::default();
        profile.ltv.full_match.rank_weight = i32::MAX;
        let error = profile.validate().expect_err("huge weight must fail");
        assert!(matches!(
            error,
            ScoringError::InvalidProfile {
                field: "ltv.full_match",
                ..
            }
        ));
    }

    #[rstest]
    #[case("popularity_v2:\n  heuristics:\n    min: -2147483648\n", "popularity_v2.heuristics")]
    #[case("popularity_v2:\n  exact_base: [87, 2000000000]\n", "popularity_v2.exact_base")]
    #[case("dual:\n  evergreen_cap: -5000\n", "dual")]
    fn validate_rejects_oversized_overlay_values(#[case] yaml: &str, #[case] field: &str) {
        let profile: ScoringProfile = serde_yaml::from_str(yaml).expect("overlay parses");
        match profile.validate() {
            Err(ScoringError::InvalidProfile { field: rejected, .. }) => {
                assert_eq!(rejected, field);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_empty_exact_table() {
        let mut profile = ScoringProfile::default();
        profile.popularity_v2.exact_base.clear();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "version: test-overlay\npopularity_v2:\n  untagged_ceiling: 75\n";
        let profile: ScoringProfile = serde_yaml::from_str(yaml).expect("overlay parses");
        assert_eq!(profile.version, "test-overlay");
        assert_eq!(profile.popularity_v2.untagged_ceiling, 75);
        assert_eq!(profile.popularity_v2.exact_ceiling, 92);
        assert_eq!(profile.ltv, LtvProfile::default());
    }

    #[test]
    fn load_from_path_errors_for_missing_file() {
        let missing = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/does-not-exist.yaml");
        match ScoringProfile::load_from_path(&missing) {
            Err(ProfileError::Io { path, .. }) => {
                assert!(path.ends_with("does-not-exist.yaml"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
