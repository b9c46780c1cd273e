#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod input;
pub mod observability;
pub mod profile;
pub mod scoring;
pub mod util;

pub use input::{AnchorRecord, CandidateRecord, SessionInput, SuggestionSignals, parse_session};
pub use profile::ScoringProfile;
pub use scoring::{ScoringSession, SessionOptions};
pub use util::error::ScoringError;
