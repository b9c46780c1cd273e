//! Anchor pattern extraction over the small reference set.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::util::text::{find_token_run, tokenize};

use super::seed::SeedPhrase;
use super::types::{AnchorPhrase, Phrase};

/// 単語アンカー候補の最小文字数。
const MIN_ANCHOR_WORD_CHARS: usize = 3;

/// フィラー（ストップワード）集合。
#[derive(Debug, Clone, Default)]
pub struct FillerWords {
    words: FxHashSet<String>,
}

impl FillerWords {
    #[must_use]
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|word| word.as_ref().trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }
}

/// シード以降の語から作る「フルアンカー」。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullAnchor {
    pub text: String,
    /// 生成元アンカーのインデックス。
    pub origin: usize,
    /// このフルアンカーを含むアンカーフレーズ数。
    pub support: u32,
}

/// 参照集合から抽出したパターン群。構築後は読み取り専用。
#[derive(Debug, Clone, Default)]
pub struct AnchorSet {
    anchors: Vec<AnchorPhrase>,
    words: FxHashMap<String, u32>,
    bigrams: FxHashMap<String, u32>,
    full_anchors: Vec<FullAnchor>,
}

impl AnchorSet {
    /// `(フレーズ, 順位)` の組から構築する。順位で安定ソートし、インデックスを振り直す。
    #[must_use]
    pub fn new(entries: Vec<(Phrase, u32)>, seed: &SeedPhrase, filler: &FillerWords) -> Self {
        let mut entries = entries;
        entries.sort_by_key(|(_, position)| *position);
        let anchors: Vec<AnchorPhrase> = entries
            .into_iter()
            .enumerate()
            .map(|(index, (phrase, position))| AnchorPhrase::new(phrase, position, index))
            .collect();

        let mut words: FxHashMap<String, u32> = FxHashMap::default();
        let mut bigrams: FxHashMap<String, u32> = FxHashMap::default();
        let mut full_anchors: Vec<FullAnchor> = Vec::new();
        let seed_tokens: Vec<&str> = seed.tokens().iter().map(String::as_str).collect();
        let is_noise = |token: &str| seed.has_token(token) || filler.contains(token);

        for anchor in &anchors {
            let tokens = tokenize(anchor.text());

            // 出現回数ではなくアンカー単位で数える
            let unique_words: FxHashSet<&str> = tokens
                .iter()
                .copied()
                .filter(|token| !is_noise(*token))
                .filter(|token| token.chars().count() >= MIN_ANCHOR_WORD_CHARS)
                .collect();
            for word in unique_words {
                *words.entry(word.to_string()).or_insert(0) += 1;
            }

            let unique_bigrams: FxHashSet<String> = tokens
                .windows(2)
                .filter(|pair| !(is_noise(pair[0]) && is_noise(pair[1])))
                .map(|pair| pair.join(" "))
                .collect();
            for bigram in unique_bigrams {
                *bigrams.entry(bigram).or_insert(0) += 1;
            }

            if let Some(text) = full_anchor_text(&tokens, &seed_tokens, filler)
                && !full_anchors.iter().any(|existing| existing.text == text)
            {
                full_anchors.push(FullAnchor {
                    text,
                    origin: anchor.index(),
                    support: 0,
                });
            }
        }

        for full in &mut full_anchors {
            let needle = tokenize(&full.text);
            let support = anchors
                .iter()
                .filter(|anchor| find_token_run(&tokenize(anchor.text()), &needle).is_some())
                .count();
            full.support = u32::try_from(support).unwrap_or(u32::MAX);
        }

        let set = Self {
            anchors,
            words,
            bigrams,
            full_anchors,
        };
        tracing::debug!(
            anchors = set.anchors.len(),
            words = set.word_count(),
            bigrams = set.bigram_count(),
            full_anchors = set.full_anchors.len(),
            "anchor set extracted"
        );
        set
    }

    #[must_use]
    pub fn anchors(&self) -> &[AnchorPhrase] {
        &self.anchors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    #[must_use]
    pub fn word_support(&self, word: &str) -> u32 {
        self.words.get(word).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn bigram_support(&self, bigram: &str) -> u32 {
        self.bigrams.get(bigram).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn full_anchors(&self) -> &[FullAnchor] {
        &self.full_anchors
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn bigram_count(&self) -> usize {
        self.bigrams.len()
    }
}

/// シードが連続して現れる位置以降の語を取り出す。先頭がフィラーなら1語読み飛ばす。
fn full_anchor_text(tokens: &[&str], seed_tokens: &[&str], filler: &FillerWords) -> Option<String> {
    let start = find_token_run(tokens, seed_tokens)?;
    let mut rest = &tokens[start + seed_tokens.len()..];
    if let Some(first) = rest.first()
        && filler.contains(first)
    {
        rest = &rest[1..];
    }
    if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ScoringProfile;

    fn filler() -> FillerWords {
        FillerWords::new(&ScoringProfile::default().filler_words)
    }

    fn seed() -> SeedPhrase {
        SeedPhrase::new("content creation").expect("seed")
    }

    fn build(texts: &[&str]) -> AnchorSet {
        let entries = texts
            .iter()
            .enumerate()
            .map(|(i, text)| (Phrase::new(text, "anchor"), u32::try_from(i).unwrap()))
            .collect();
        AnchorSet::new(entries, &seed(), &filler())
    }

    #[test]
    fn words_are_counted_once_per_anchor() {
        let set = build(&[
            "content creation tips tips",
            "content creation tips for beginners",
            "content creation for beginners",
        ]);
        assert_eq!(set.word_support("tips"), 2);
        assert_eq!(set.word_support("beginners"), 2);
        assert_eq!(set.word_support("content"), 0, "seed tokens are excluded");
        assert_eq!(set.word_support("for"), 0, "filler words are excluded");
    }

    #[test]
    fn short_words_are_not_single_word_anchors() {
        let set = build(&["content creation ai tools"]);
        assert_eq!(set.word_support("ai"), 0);
        assert_eq!(set.word_support("tools"), 1);
    }

    #[test]
    fn bigrams_skip_pure_seed_or_filler_pairs() {
        let set = build(&["content creation for beginners"]);
        assert_eq!(set.bigram_support("content creation"), 0);
        assert_eq!(set.bigram_support("creation for"), 0);
        assert_eq!(set.bigram_support("for beginners"), 1);
    }

    #[test]
    fn full_anchor_skips_one_leading_filler() {
        let set = build(&[
            "content creation tips",
            "content creation for beginners",
            "how to start content creation",
        ]);
        let texts: Vec<&str> = set.full_anchors().iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["tips", "beginners"]);
        assert_eq!(set.full_anchors()[1].origin, 1);
    }

    #[test]
    fn duplicate_full_anchors_keep_first_origin() {
        let set = build(&["content creation tips", "best content creation tips"]);
        assert_eq!(set.full_anchors().len(), 1);
        let full = &set.full_anchors()[0];
        assert_eq!(full.origin, 0);
        assert_eq!(full.support, 2);
    }

    #[test]
    fn anchors_are_ordered_by_position() {
        let entries = vec![
            (Phrase::new("content creation jobs", "a"), 5),
            (Phrase::new("content creation tips", "a"), 1),
        ];
        let set = AnchorSet::new(entries, &seed(), &filler());
        assert_eq!(set.anchors()[0].text(), "content creation tips");
        assert_eq!(set.anchors()[0].index(), 0);
        assert_eq!(set.anchors()[0].position(), 1);
        assert_eq!(set.anchors()[1].index(), 1);
    }
}
