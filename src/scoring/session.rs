//! Scoring session: builds the frozen indices once, then scores every candidate.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::input::{SessionInput, SuggestionSignals};
use crate::profile::ScoringProfile;
use crate::util::error::ScoringError;

use super::anchors::{AnchorSet, FillerWords};
use super::frequency::{FrequencyIndex, PatternCategory};
use super::seed::SeedPhrase;
use super::strategy::{Scorer, ScorerKind, ScoringContext};
use super::types::{Metric, Phrase, ScoreResult, ScoreTag};

/// 既定の並列化しきい値（候補数）。
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// この件数以上のコーパスは rayon で集計・採点する。
    pub parallel_threshold: usize,
    pub scorers: Vec<ScorerKind>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            scorers: ScorerKind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    phrase: Phrase,
    signals: Option<SuggestionSignals>,
}

/// 1候補ぶんの結果。`index` は入力上の位置。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseScores {
    pub index: usize,
    pub text: String,
    pub origin: String,
    pub results: Vec<ScoreResult>,
}

impl PhraseScores {
    #[must_use]
    pub fn result(&self, scorer: ScorerKind) -> Option<&ScoreResult> {
        self.results.iter().find(|result| result.scorer == scorer)
    }
}

/// 1シードぶんのスコアリングセッション。構築後は読み取り専用で、並列に採点できる。
#[derive(Debug)]
pub struct ScoringSession {
    profile: ScoringProfile,
    seed: SeedPhrase,
    filler: FillerWords,
    index: FrequencyIndex,
    anchors: AnchorSet,
    candidates: Vec<Candidate>,
    scorers: Vec<Box<dyn Scorer>>,
    parallel_threshold: usize,
}

impl ScoringSession {
    /// 入力を検証し、頻度インデックスとアンカー集合を1度だけ構築する。
    ///
    /// # Errors
    /// 入力レコードまたはプロファイルが不正な場合。
    #[instrument(
        skip_all,
        fields(
            seed = %input.seed,
            candidates = input.candidates.len(),
            anchors = input.anchors.len(),
            profile = %profile.version,
        )
    )]
    pub fn new(
        input: SessionInput,
        profile: ScoringProfile,
        options: SessionOptions,
    ) -> Result<Self, ScoringError> {
        profile.validate()?;
        input.validate()?;

        let seed = SeedPhrase::new(&input.seed)?;
        let filler = FillerWords::new(&profile.filler_words);

        let candidates: Vec<Candidate> = input
            .candidates
            .into_iter()
            .map(|record| Candidate {
                phrase: Phrase::new(&record.text, record.origin_tag),
                signals: record.signals,
            })
            .collect();
        let corpus: Vec<Phrase> = candidates
            .iter()
            .map(|candidate| candidate.phrase.clone())
            .collect();
        let index = FrequencyIndex::build(&corpus, &seed, options.parallel_threshold);

        let anchor_entries = input
            .anchors
            .into_iter()
            .map(|record| (Phrase::new(&record.text, "anchor"), record.position))
            .collect();
        let anchors = AnchorSet::new(anchor_entries, &seed, &filler);

        if anchors.is_empty() {
            warn!("no anchors supplied; anchor tiers will fall back to untagged scores");
        }
        if !corpus.is_empty()
            && !corpus
                .iter()
                .any(|phrase| phrase.text().contains(seed.text()))
        {
            warn!(seed = %seed.text(), "seed phrase appears in no candidate");
        }
        debug!(corpus = index.corpus_size(), "frequency index built");
        for category in PatternCategory::ALL {
            let ranked = index.ranked(category);
            debug!(
                ?category,
                distinct = ranked.len(),
                total = index.total(category),
                top = ranked.last().map(|(pattern, _, _)| *pattern),
                "frequency category built"
            );
        }

        let mut kinds: Vec<ScorerKind> = Vec::with_capacity(options.scorers.len());
        for kind in options.scorers {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        let scorers = kinds
            .into_iter()
            .map(|kind| kind.build(&profile))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            profile,
            seed,
            filler,
            index,
            anchors,
            candidates,
            scorers,
            parallel_threshold: options.parallel_threshold.max(1),
        })
    }

    #[must_use]
    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    #[must_use]
    pub fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }

    /// 全候補を採点する。結果は入力順。
    ///
    /// # Errors
    /// スコアラーが失敗した場合（通常は発生しない）。
    #[instrument(skip_all, fields(candidates = self.candidates.len(), scorers = self.scorers.len()))]
    pub fn score_all(&self) -> Result<Vec<PhraseScores>, ScoringError> {
        let score = |(position, candidate): (usize, &Candidate)| {
            self.score_phrase(&candidate.phrase, candidate.signals.as_ref())
                .map(|results| PhraseScores {
                    index: position,
                    text: candidate.phrase.text().to_string(),
                    origin: candidate.phrase.origin().to_string(),
                    results,
                })
        };

        let scored: Vec<PhraseScores> = if self.candidates.len() >= self.parallel_threshold {
            self.candidates
                .par_iter()
                .enumerate()
                .map(score)
                .collect::<Result<_, _>>()?
        } else {
            self.candidates
                .iter()
                .enumerate()
                .map(score)
                .collect::<Result<_, _>>()?
        };

        Ok(scored)
    }

    /// 全候補を採点し、集計を1度だけ計算して結果と一緒に返す。
    ///
    /// # Errors
    /// [`ScoringSession::score_all`] と同じ。
    pub fn score_with_summary(&self) -> Result<ScoredSession, ScoringError> {
        let results = self.score_all()?;
        let summary = SessionSummary::from_results(&results);
        info!(
            candidates = summary.candidates,
            super_topics = summary.super_topics,
            tags = ?summary.tags,
            profile = %self.profile.version,
            "session scored"
        );
        Ok(ScoredSession { summary, results })
    }

    /// 凍結済みインデックスに対して任意のフレーズを採点する。
    ///
    /// # Errors
    /// シグナルが矛盾している場合は [`ScoringError::InvalidSignals`]。
    pub fn score_text(
        &self,
        text: &str,
        signals: Option<SuggestionSignals>,
    ) -> Result<Vec<ScoreResult>, ScoringError> {
        if let Some(signals) = &signals {
            signals.validate(0)?;
        }
        self.score_phrase(&Phrase::new(text, "adhoc"), signals.as_ref())
    }

    fn score_phrase(
        &self,
        phrase: &Phrase,
        signals: Option<&SuggestionSignals>,
    ) -> Result<Vec<ScoreResult>, ScoringError> {
        let ctx = ScoringContext {
            seed: &self.seed,
            index: &self.index,
            anchors: &self.anchors,
            filler: &self.filler,
            signals,
        };
        self.scorers
            .iter()
            .filter(|scorer| signals.is_some() || !scorer.kind().requires_signals())
            .map(|scorer| scorer.score(phrase, &ctx))
            .collect()
    }
}

/// 採点結果とその集計。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSession {
    pub summary: SessionSummary,
    pub results: Vec<PhraseScores>,
}

/// 指標ごとの集計。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: usize,
    pub mean: f64,
    pub min: i32,
    pub max: i32,
}

/// セッション全体の集計。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionSummary {
    pub candidates: usize,
    pub tags: BTreeMap<ScorerKind, BTreeMap<ScoreTag, usize>>,
    pub super_topics: usize,
    pub metrics: BTreeMap<Metric, MetricStats>,
}

impl SessionSummary {
    #[must_use]
    pub fn from_results(results: &[PhraseScores]) -> Self {
        let mut summary = Self {
            candidates: results.len(),
            ..Self::default()
        };
        let mut sums: BTreeMap<Metric, (i64, usize, i32, i32)> = BTreeMap::new();

        for result in results.iter().flat_map(|phrase| &phrase.results) {
            *summary
                .tags
                .entry(result.scorer)
                .or_default()
                .entry(result.tag)
                .or_insert(0) += 1;
            if result.tag == ScoreTag::SuperTopic {
                summary.super_topics += 1;
            }
            for score in &result.scores {
                let entry = sums
                    .entry(score.metric)
                    .or_insert((0, 0, score.value, score.value));
                entry.0 += i64::from(score.value);
                entry.1 += 1;
                entry.2 = entry.2.min(score.value);
                entry.3 = entry.3.max(score.value);
            }
        }

        summary.metrics = sums
            .into_iter()
            .map(|(metric, (sum, count, min, max))| {
                #[allow(clippy::cast_precision_loss)]
                let mean = sum as f64 / count as f64;
                (
                    metric,
                    MetricStats {
                        count,
                        mean,
                        min,
                        max,
                    },
                )
            })
            .collect();
        summary
    }
}
