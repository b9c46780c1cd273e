//! Frequency index over the full candidate corpus.
//!
//! Construction is two-phase: counts are accumulated (optionally in parallel, one partial
//! `FrequencyCounts` per rayon job, merged by addition) and only after the merge are the
//! per-category percentile ranks computed.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::util::text::tokenize;

use super::seed::SeedPhrase;
use super::types::{Phrase, round_to_i32};

/// 未出現パターンのパーセンタイル（中立値）。
pub const NEUTRAL_PERCENTILE: u8 = 50;

const CATEGORY_COUNT: usize = 9;

/// パターンの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Word,
    Bigram,
    Trigram,
    Prefix,
    Suffix,
    SeedPlusOne,
    SeedPlusTwo,
    Starter,
    TwoWordStarter,
}

impl PatternCategory {
    pub const ALL: [Self; CATEGORY_COUNT] = [
        Self::Word,
        Self::Bigram,
        Self::Trigram,
        Self::Prefix,
        Self::Suffix,
        Self::SeedPlusOne,
        Self::SeedPlusTwo,
        Self::Starter,
        Self::TwoWordStarter,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// 集計フェーズの部分カウンタ。加算は結合的・可換なので分割して集計できる。
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounts {
    counts: [FxHashMap<String, u32>; CATEGORY_COUNT],
}

impl FrequencyCounts {
    /// 正規化済み候補1件を集計する。
    pub fn observe(&mut self, normalized: &str, seed: &SeedPhrase) {
        let tokens = tokenize(normalized);

        for token in &tokens {
            self.bump(PatternCategory::Word, token);
        }
        for pair in tokens.windows(2) {
            self.bump(PatternCategory::Bigram, &pair.join(" "));
        }
        for triple in tokens.windows(3) {
            self.bump(PatternCategory::Trigram, &triple.join(" "));
        }

        let split = seed.split(normalized);
        if split.found {
            if let Some(prefix) = split.prefix {
                self.bump(PatternCategory::Prefix, prefix);
            }
            if let Some(suffix) = split.suffix {
                self.bump(PatternCategory::Suffix, suffix);
            }
            if let Some(first) = split.seed_plus_one {
                self.bump(PatternCategory::SeedPlusOne, first);
            }
            if let Some(second) = split.seed_plus_two {
                self.bump(PatternCategory::SeedPlusTwo, second);
            }
        }

        // シードをそのまま先頭に置く候補はスターター統計から除外する
        if !split.starts_with_seed
            && let Some(first) = tokens.first()
        {
            self.bump(PatternCategory::Starter, first);
            if let Some(second) = tokens.get(1) {
                self.bump(PatternCategory::TwoWordStarter, &format!("{first} {second}"));
            }
        }
    }

    /// 2つの部分カウンタを加算して1つにする。
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            for (pattern, count) in theirs {
                let entry = mine.entry(pattern).or_insert(0);
                *entry = entry.saturating_add(count);
            }
        }
        self
    }

    #[must_use]
    pub fn count(&self, category: PatternCategory, pattern: &str) -> u32 {
        self.counts[category.slot()]
            .get(pattern)
            .copied()
            .unwrap_or(0)
    }

    fn bump(&mut self, category: PatternCategory, pattern: &str) {
        let slot = &mut self.counts[category.slot()];
        if let Some(count) = slot.get_mut(pattern) {
            *count = count.saturating_add(1);
        } else {
            slot.insert(pattern.to_string(), 1);
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CategoryStats {
    counts: FxHashMap<String, u32>,
    percentiles: FxHashMap<String, u8>,
    total: u64,
}

impl CategoryStats {
    fn rank(counts: FxHashMap<String, u32>) -> Self {
        let total = counts.values().map(|&count| u64::from(count)).sum();
        let percentiles = rank_percentiles(&counts);
        Self {
            counts,
            percentiles,
            total,
        }
    }
}

/// セッション単位の頻度インデックス。構築後は読み取り専用。
#[derive(Debug, Clone)]
pub struct FrequencyIndex {
    categories: [CategoryStats; CATEGORY_COUNT],
    corpus_size: usize,
}

impl FrequencyIndex {
    /// コーパス全体からインデックスを構築する。
    ///
    /// `parallel_threshold` 件以上のコーパスは rayon で分割集計してからマージする。
    #[must_use]
    pub fn build(corpus: &[Phrase], seed: &SeedPhrase, parallel_threshold: usize) -> Self {
        let counts = if corpus.len() >= parallel_threshold.max(1) {
            corpus
                .par_iter()
                .fold(FrequencyCounts::default, |mut acc, phrase| {
                    acc.observe(phrase.text(), seed);
                    acc
                })
                .reduce(FrequencyCounts::default, FrequencyCounts::merge)
        } else {
            corpus
                .iter()
                .fold(FrequencyCounts::default(), |mut acc, phrase| {
                    acc.observe(phrase.text(), seed);
                    acc
                })
        };
        Self::from_counts(counts, corpus.len())
    }

    /// マージ済みカウンタからパーセンタイルを計算する（同期点の後段）。
    #[must_use]
    pub fn from_counts(counts: FrequencyCounts, corpus_size: usize) -> Self {
        let categories = counts.counts.map(CategoryStats::rank);
        Self {
            categories,
            corpus_size,
        }
    }

    #[must_use]
    pub fn corpus_size(&self) -> usize {
        self.corpus_size
    }

    #[must_use]
    pub fn count(&self, category: PatternCategory, pattern: &str) -> u32 {
        self.stats(category)
            .counts
            .get(pattern)
            .copied()
            .unwrap_or(0)
    }

    /// パターンのパーセンタイル。未出現なら中立値 50。
    #[must_use]
    pub fn percentile_of(&self, category: PatternCategory, pattern: &str) -> u8 {
        self.stats(category)
            .percentiles
            .get(pattern)
            .copied()
            .unwrap_or(NEUTRAL_PERCENTILE)
    }

    /// 成分が存在しない場合も中立値として扱う参照。
    #[must_use]
    pub fn percentile_or_neutral(&self, category: PatternCategory, pattern: Option<&str>) -> u8 {
        pattern.map_or(NEUTRAL_PERCENTILE, |value| {
            self.percentile_of(category, value)
        })
    }

    /// カテゴリ内の総出現数に対するパターンの比率（%）。総数0なら0。
    #[must_use]
    pub fn share_percent(&self, category: PatternCategory, pattern: &str) -> f64 {
        let stats = self.stats(category);
        if stats.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let total = stats.total as f64;
        f64::from(self.count(category, pattern)) * 100.0 / total
    }

    #[must_use]
    pub fn distinct(&self, category: PatternCategory) -> usize {
        self.stats(category).counts.len()
    }

    #[must_use]
    pub fn total(&self, category: PatternCategory) -> u64 {
        self.stats(category).total
    }

    /// カテゴリ内の (パターン, 件数, パーセンタイル) を件数昇順・パターン昇順で返す。
    #[must_use]
    pub fn ranked(&self, category: PatternCategory) -> Vec<(&str, u32, u8)> {
        let stats = self.stats(category);
        let mut rows: Vec<(&str, u32, u8)> = stats
            .counts
            .iter()
            .map(|(pattern, &count)| {
                let percentile = stats
                    .percentiles
                    .get(pattern)
                    .copied()
                    .unwrap_or(NEUTRAL_PERCENTILE);
                (pattern.as_str(), count, percentile)
            })
            .collect();
        rows.sort_unstable_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    fn stats(&self, category: PatternCategory) -> &CategoryStats {
        &self.categories[category.slot()]
    }
}

/// 件数昇順に並べ、`round(index / (N-1) * 100)` を割り当てる。
///
/// 同数のパターンはグループの中央順位を共有する。要素1つなら 50、空なら空。
fn rank_percentiles(counts: &FxHashMap<String, u32>) -> FxHashMap<String, u8> {
    let mut ranked: Vec<(&str, u32)> = counts
        .iter()
        .map(|(pattern, &count)| (pattern.as_str(), count))
        .collect();

    let mut percentiles =
        FxHashMap::with_capacity_and_hasher(ranked.len(), std::hash::BuildHasherDefault::default());
    match ranked.len() {
        0 => return percentiles,
        1 => {
            percentiles.insert(ranked[0].0.to_string(), NEUTRAL_PERCENTILE);
            return percentiles;
        }
        _ => {}
    }

    ranked.sort_unstable_by_key(|&(_, count)| count);
    #[allow(clippy::cast_precision_loss)]
    let last = (ranked.len() - 1) as f64;

    let mut start = 0;
    while start < ranked.len() {
        let count = ranked[start].1;
        let end = ranked[start..]
            .iter()
            .position(|&(_, other)| other != count)
            .map_or(ranked.len(), |offset| start + offset)
            - 1;
        #[allow(clippy::cast_precision_loss)]
        let mid_rank = (start + end) as f64 / 2.0;
        let percentile = to_percentile(mid_rank / last * 100.0);
        for &(pattern, _) in &ranked[start..=end] {
            percentiles.insert(pattern.to_string(), percentile);
        }
        start = end + 1;
    }

    percentiles
}

fn to_percentile(value: f64) -> u8 {
    u8::try_from(round_to_i32(value).clamp(0, 100)).unwrap_or(NEUTRAL_PERCENTILE)
}
