//! Seed-relative decomposition of candidate phrases.

use serde::Serialize;

use crate::util::{error::ScoringError, text::normalize_phrase};

/// セッションの起点となるシードフレーズ（正規化済み）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedPhrase {
    text: String,
    tokens: Vec<String>,
}

impl SeedPhrase {
    /// シードを正規化して保持する。
    ///
    /// # Errors
    /// 正規化後に空になる場合は [`ScoringError::EmptySeed`] を返す。
    pub fn new(raw: &str) -> Result<Self, ScoringError> {
        let text = normalize_phrase(raw);
        if text.is_empty() {
            return Err(ScoringError::EmptySeed);
        }
        let tokens = text.split_whitespace().map(ToString::to_string).collect();
        Ok(Self { text, tokens })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|seed_token| seed_token == token)
    }

    /// 正規化済み候補をシードの前後に分解する。
    #[must_use]
    pub fn split<'a>(&self, candidate: &'a str) -> SeedSplit<'a> {
        let Some(start) = candidate.find(self.text.as_str()) else {
            return SeedSplit {
                found: false,
                starts_with_seed: false,
                prefix: None,
                suffix: None,
                seed_plus_one: None,
                seed_plus_two: None,
            };
        };

        let prefix = non_empty(candidate[..start].trim());
        let suffix = non_empty(candidate[start + self.text.len()..].trim());
        let mut after = suffix.map(str::split_whitespace).into_iter().flatten();
        let seed_plus_one = after.next();
        let seed_plus_two = after.next();

        SeedSplit {
            found: true,
            starts_with_seed: start == 0,
            prefix,
            suffix,
            seed_plus_one,
            seed_plus_two,
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

/// シード基準の分解結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSplit<'a> {
    pub found: bool,
    pub starts_with_seed: bool,
    pub prefix: Option<&'a str>,
    pub suffix: Option<&'a str>,
    pub seed_plus_one: Option<&'a str>,
    pub seed_plus_two: Option<&'a str>,
}
