//! Session input records and record-level validation.
//!
//! JSON shape (`camelCase` on the wire):
//! ```json
//! {
//!   "seed": "content creation",
//!   "candidates": [
//!     { "text": "content creation tips", "originTag": "autocomplete",
//!       "signals": { "suggestionCount": 12, "exactMatchCount": 1, "topicMatchCount": 10 } }
//!   ],
//!   "anchors": [ { "text": "content creation tips", "position": 1 } ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::{error::ScoringError, text::normalize_phrase};

/// 候補ごとの候補数シグナル。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSignals {
    pub suggestion_count: u32,
    pub exact_match_count: u32,
    pub topic_match_count: u32,
}

impl SuggestionSignals {
    /// # Errors
    /// 完全一致数が候補数を超える場合は [`ScoringError::InvalidSignals`]。
    pub fn validate(&self, index: usize) -> Result<(), ScoringError> {
        if self.exact_match_count > self.suggestion_count {
            return Err(ScoringError::signals(
                index,
                format!(
                    "exactMatchCount ({}) exceeds suggestionCount ({})",
                    self.exact_match_count, self.suggestion_count
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub text: String,
    #[serde(default)]
    pub origin_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<SuggestionSignals>,
}

impl CandidateRecord {
    #[must_use]
    pub fn new(text: impl Into<String>, origin_tag: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin_tag: origin_tag.into(),
            signals: None,
        }
    }

    #[must_use]
    pub fn with_signals(mut self, signals: SuggestionSignals) -> Self {
        self.signals = Some(signals);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    pub text: String,
    pub position: u32,
}

impl AnchorRecord {
    #[must_use]
    pub fn new(text: impl Into<String>, position: u32) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

/// 1セッション分の入力。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionInput {
    pub seed: String,
    #[serde(default)]
    pub candidates: Vec<CandidateRecord>,
    #[serde(default)]
    pub anchors: Vec<AnchorRecord>,
}

impl SessionInput {
    /// 形の不正を最初に見つかったレコードの位置付きで報告する。不正なレコードを読み飛ばすことはしない。
    ///
    /// # Errors
    /// シードが空、アンカーが正規化後に空、シグナルが矛盾している場合。
    pub fn validate(&self) -> Result<(), ScoringError> {
        if normalize_phrase(&self.seed).is_empty() {
            return Err(ScoringError::EmptySeed);
        }
        for (index, anchor) in self.anchors.iter().enumerate() {
            if normalize_phrase(&anchor.text).is_empty() {
                return Err(ScoringError::anchor(index, "text is empty after normalization"));
            }
        }
        for (index, candidate) in self.candidates.iter().enumerate() {
            if let Some(signals) = &candidate.signals {
                signals.validate(index)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawSession {
    seed: String,
    #[serde(default)]
    candidates: Vec<Value>,
    #[serde(default)]
    anchors: Vec<Value>,
}

/// セッション JSON をレコード単位で読み込み、検証する。
///
/// # Errors
/// JSON 自体が壊れている場合は [`ScoringError::Malformed`]、個々のレコードの形が
/// 不正な場合はそのインデックス付きのエラーを返す。
pub fn parse_session(raw: &str) -> Result<SessionInput, ScoringError> {
    let session: RawSession =
        serde_json::from_str(raw).map_err(|source| ScoringError::Malformed { source })?;

    let candidates = session
        .candidates
        .into_iter()
        .enumerate()
        .map(|(index, value)| parse_candidate(index, value))
        .collect::<Result<Vec<_>, _>>()?;

    let anchors = session
        .anchors
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<AnchorRecord>(value)
                .map_err(|error| ScoringError::anchor(index, error.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let input = SessionInput {
        seed: session.seed,
        candidates,
        anchors,
    };
    input.validate()?;
    Ok(input)
}

fn parse_candidate(index: usize, mut value: Value) -> Result<CandidateRecord, ScoringError> {
    // シグナルの形の誤りは候補ではなくシグナルのエラーとして報告する
    let signals = match value.as_object_mut().and_then(|object| object.remove("signals")) {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<SuggestionSignals>(raw)
                .map_err(|error| ScoringError::signals(index, error.to_string()))?,
        ),
    };
    let mut record: CandidateRecord = serde_json::from_value(value)
        .map_err(|error| ScoringError::candidate(index, error.to_string()))?;
    record.signals = signals;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_session() {
        let raw = r#"{
            "seed": "Content Creation",
            "candidates": [
                { "text": "content creation tips", "originTag": "autocomplete",
                  "signals": { "suggestionCount": 12, "exactMatchCount": 1, "topicMatchCount": 10 } },
                { "text": "best content creation tools" }
            ],
            "anchors": [ { "text": "content creation tips", "position": 1 } ]
        }"#;
        let input = parse_session(raw).expect("valid session");
        assert_eq!(input.seed, "Content Creation");
        assert_eq!(input.candidates.len(), 2);
        assert_eq!(input.candidates[0].origin_tag, "autocomplete");
        assert_eq!(
            input.candidates[0].signals,
            Some(SuggestionSignals {
                suggestion_count: 12,
                exact_match_count: 1,
                topic_match_count: 10,
            })
        );
        assert_eq!(input.candidates[1].signals, None);
        assert_eq!(input.anchors[0].position, 1);
    }

    #[test]
    fn non_string_candidate_text_names_the_record() {
        let raw = r#"{ "seed": "x", "candidates": [ {"text": "a"}, {"text": "b"}, {"text": "c"}, {"text": 4} ] }"#;
        let error = parse_session(raw).expect_err("text must be a string");
        assert!(matches!(error, ScoringError::InvalidCandidate { index: 3, .. }));
    }

    #[test]
    fn negative_position_is_an_anchor_error() {
        let raw = r#"{ "seed": "x", "anchors": [ {"text": "x y", "position": -1} ] }"#;
        let error = parse_session(raw).expect_err("negative position");
        assert!(matches!(error, ScoringError::InvalidAnchor { index: 0, .. }));
    }

    #[test]
    fn negative_counts_are_signal_errors() {
        let raw = r#"{ "seed": "x", "candidates": [
            {"text": "a", "signals": {"suggestionCount": -2, "exactMatchCount": 0, "topicMatchCount": 0}}
        ] }"#;
        let error = parse_session(raw).expect_err("negative count");
        assert!(matches!(error, ScoringError::InvalidSignals { index: 0, .. }));
    }

    #[test]
    fn exact_matches_above_suggestions_are_rejected() {
        let raw = r#"{ "seed": "x", "candidates": [
            {"text": "a"},
            {"text": "b", "signals": {"suggestionCount": 2, "exactMatchCount": 3, "topicMatchCount": 0}}
        ] }"#;
        let error = parse_session(raw).expect_err("exact > suggestions");
        assert!(matches!(error, ScoringError::InvalidSignals { index: 1, .. }));
    }

    #[test]
    fn blank_seed_and_blank_anchor_are_rejected() {
        assert!(matches!(
            parse_session(r#"{ "seed": " ?! " }"#),
            Err(ScoringError::EmptySeed)
        ));
        assert!(matches!(
            parse_session(r#"{ "seed": 7 }"#),
            Err(ScoringError::Malformed { .. })
        ));
        let error = parse_session(r#"{ "seed": "x", "anchors": [ {"text": "ok", "position": 1}, {"text": "--", "position": 2} ] }"#)
            .expect_err("empty anchor");
        assert!(matches!(error, ScoringError::InvalidAnchor { index: 1, .. }));
    }

    #[test]
    fn broken_json_is_malformed() {
        assert!(matches!(
            parse_session("{ not json"),
            Err(ScoringError::Malformed { .. })
        ));
    }
}
