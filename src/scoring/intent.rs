//! Lexicon-based search-intent detector.
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use serde::Serialize;

use crate::profile::IntentCategory;
use crate::util::error::ScoringError;
use crate::util::text::normalize_phrase;

/// カテゴリごとに1件だけ数える意図一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentHit {
    pub category: String,
    pub trigger: String,
    pub demand_boost: i32,
    pub evergreen_bonus: i32,
}

/// 全カテゴリのトリガーを1つのオートマトンにまとめた照合器。
#[derive(Debug, Clone)]
pub struct IntentMatcher {
    ac: AhoCorasick,
    /// パターン番号 → (カテゴリ番号, カテゴリ内のトリガー順位)
    owners: Vec<(usize, usize)>,
    triggers: Vec<String>,
    categories: Vec<IntentCategory>,
}

impl IntentMatcher {
    /// # Errors
    /// トリガーが正規化後に空になる場合、またはオートマトンの構築に失敗した場合。
    pub fn new(categories: &[IntentCategory]) -> Result<Self, ScoringError> {
        let mut owners = Vec::new();
        let mut triggers = Vec::new();
        for (category_index, category) in categories.iter().enumerate() {
            for (rank, trigger) in category.triggers.iter().enumerate() {
                let normalized = normalize_phrase(trigger);
                if normalized.is_empty() {
                    return Err(ScoringError::profile(
                        "dual.intents",
                        format!("trigger {trigger:?} in {:?} is empty", category.name),
                    ));
                }
                owners.push((category_index, rank));
                triggers.push(normalized);
            }
        }

        let ac = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&triggers)
            .map_err(|error| ScoringError::profile("dual.intents", error.to_string()))?;

        Ok(Self {
            ac,
            owners,
            triggers,
            categories: categories.to_vec(),
        })
    }

    /// 正規化済みテキストに含まれる意図をカテゴリ順に返す。
    ///
    /// 各カテゴリでは一覧順で最初のトリガーを採用し、1カテゴリにつき最大1件。
    #[must_use]
    pub fn detect(&self, normalized: &str) -> Vec<IntentHit> {
        let mut first: Vec<Option<usize>> = vec![None; self.categories.len()];
        for found in self.ac.find_overlapping_iter(normalized) {
            let pattern = found.pattern().as_usize();
            let (category, rank) = self.owners[pattern];
            if first[category].is_none_or(|current| rank < self.owners[current].1) {
                first[category] = Some(pattern);
            }
        }

        first
            .into_iter()
            .enumerate()
            .filter_map(|(category, pattern)| {
                let pattern = pattern?;
                let definition = &self.categories[category];
                Some(IntentHit {
                    category: definition.name.clone(),
                    trigger: self.triggers[pattern].clone(),
                    demand_boost: definition.demand_boost,
                    evergreen_bonus: definition.evergreen_bonus,
                })
            })
            .collect()
    }
}
