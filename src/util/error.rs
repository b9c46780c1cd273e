/// スコアリングエンジンのエラー型。
///
/// スコア計算そのものは失敗しない（全ての参照に既定値がある）。
/// 失敗するのは入力の形が不正な場合とプロファイルの検証に失敗した場合のみで、
/// どのレコードが不正かを必ず特定できるようにする。
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("seed phrase is empty after normalization")]
    EmptySeed,
    #[error("invalid candidate at index {index}: {reason}")]
    InvalidCandidate { index: usize, reason: String },
    #[error("invalid anchor at index {index}: {reason}")]
    InvalidAnchor { index: usize, reason: String },
    #[error("invalid suggestion signals for candidate {index}: {reason}")]
    InvalidSignals { index: usize, reason: String },
    #[error("suggestion signals are required to score {text:?}")]
    MissingSignals { text: String },
    #[error("invalid scoring profile field {field}: {reason}")]
    InvalidProfile { field: &'static str, reason: String },
    #[error("malformed session payload: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
    },
}

impl ScoringError {
    pub(crate) fn candidate(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidCandidate {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn anchor(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidAnchor {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn signals(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSignals {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn profile(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidProfile {
            field,
            reason: reason.into(),
        }
    }
}
