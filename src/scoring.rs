//! Topic scoring pipeline.
//!
//! raw corpus → normalizer → {frequency index, anchor set} → {percentile, popularity-v2, LTV, dual}
//! → per-phrase [`ScoreResult`] records. Indices are built once per session and never mutated.

pub mod anchor_tier;
pub mod anchors;
pub mod classifier;
pub mod dual;
pub mod frequency;
pub mod heuristics;
pub mod intent;
pub mod ltv;
pub mod percentile;
pub mod seed;
pub mod session;
pub mod strategy;
pub mod types;

pub use anchor_tier::PopularityV2Scorer;
pub use anchors::{AnchorSet, FillerWords, FullAnchor};
pub use classifier::classify;
pub use dual::DualScorer;
pub use frequency::{FrequencyIndex, PatternCategory};
pub use ltv::LtvScorer;
pub use percentile::PercentileScorer;
pub use seed::SeedPhrase;
pub use session::{PhraseScores, ScoredSession, ScoringSession, SessionOptions, SessionSummary};
pub use strategy::{Scorer, ScorerKind, ScoringContext};
pub use types::{AnchorPhrase, Metric, Phrase, ScoreResult, ScoreTag, Tag, TagMatch};
