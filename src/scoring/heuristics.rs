//! Domain heuristic lexicon (regex rules with signed deltas).

use regex::Regex;
use serde::Serialize;

use crate::profile::HeuristicProfile;
use crate::util::error::ScoringError;

#[derive(Debug, Clone)]
struct CompiledRule {
    name: String,
    regex: Regex,
    delta: i32,
}

/// コンパイル済みのヒューリスティック辞書。各ルールは最大1回だけ発火する。
#[derive(Debug, Clone)]
pub struct HeuristicLexicon {
    rules: Vec<CompiledRule>,
    min: i32,
    max: i32,
}

/// 発火したルールと合計値。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HeuristicOutcome {
    pub fired: Vec<String>,
    pub raw: i32,
    pub adjustment: i32,
}

impl HeuristicLexicon {
    /// # Errors
    /// 正規表現のコンパイルに失敗した場合は [`ScoringError::InvalidProfile`] を返す。
    pub fn compile(profile: &HeuristicProfile) -> Result<Self, ScoringError> {
        if profile.min > profile.max {
            return Err(ScoringError::profile(
                "popularity_v2.heuristics",
                "min must not exceed max",
            ));
        }
        let rules = profile
            .rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|regex| CompiledRule {
                        name: rule.name.clone(),
                        regex,
                        delta: rule.delta,
                    })
                    .map_err(|error| {
                        ScoringError::profile(
                            "popularity_v2.heuristics",
                            format!("rule {:?}: {error}", rule.name),
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            min: profile.min,
            max: profile.max,
        })
    }

    #[must_use]
    pub fn evaluate(&self, normalized: &str) -> HeuristicOutcome {
        let mut outcome = HeuristicOutcome::default();
        for rule in &self.rules {
            if rule.regex.is_match(normalized) {
                outcome.raw = outcome.raw.saturating_add(rule.delta);
                outcome.fired.push(rule.name.clone());
            }
        }
        outcome.adjustment = outcome.raw.clamp(self.min, self.max);
        outcome
    }
}
