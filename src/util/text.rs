/// テキスト処理ユーティリティ。
///
/// フレーズ正規化、トークン化、ハッシング、決定的ジッターを提供します。
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use xxhash_rust::xxh3::xxh3_64;

/// フレーズを比較可能な正規形に変換する。
///
/// 小文字化の後、英数字と結合文字以外を空白に置き換えて連続する空白を1つにまとめ、
/// 最後にNFC正規化する。アポストロフィは除去して語を連結する（`don't` → `dont`）。
/// 冪等であり、空白のみの入力は空文字列になる。
#[must_use]
pub fn normalize_phrase(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut filtered = String::with_capacity(lowered.len());
    let mut pending_space = false;

    for ch in lowered.chars() {
        if ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_alphanumeric() || is_combining_mark(ch) {
            if pending_space && !filtered.is_empty() {
                filtered.push(' ');
            }
            pending_space = false;
            filtered.push(ch);
        } else {
            pending_space = true;
        }
    }

    // 除去した記号の両側で分かれていた基底文字と結合文字をここで合成する
    filtered.nfc().collect()
}

/// 正規化済みテキストを空白区切りでトークン化する。
#[must_use]
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

/// `needle` のトークン列が `haystack` 内に連続して現れる最初の位置を返す。
///
/// 空の `needle` は一致しない。
#[must_use]
pub fn find_token_run(haystack: &[&str], needle: &[&str]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// テキストをXXH3でハッシュする。
#[must_use]
pub fn hash_text(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// 正規化済みテキストから決定的なジッター値を求める。
///
/// `span` 個の整数値を0中心に並べた範囲（span=7 なら `[-3, +3]`）に写像する。
/// 乱数生成器は使わないため、同じテキストは常に同じ値になる。
#[must_use]
pub fn jitter(normalized: &str, span: u32) -> i32 {
    if span <= 1 {
        return 0;
    }
    let bucket = hash_text(normalized) % u64::from(span);
    // bucket < span <= u32::MAX
    let bucket = i64::try_from(bucket).unwrap_or(0);
    let center = i64::from(span / 2);
    i32::try_from(bucket - center).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Content  Creation", "content creation")]
    #[case("  how-to: edit videos!! ", "how to edit videos")]
    #[case("Don't Quit", "dont quit")]
    #[case("Café TIPS", "café tips")]
    #[case("   ", "")]
    #[case("", "")]
    #[case("a\tb\nc", "a b c")]
    fn normalize_phrase_canonicalizes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_phrase(raw), expected);
    }

    #[test]
    fn normalize_phrase_is_idempotent_on_samples() {
        for raw in ["Hello, World", "  x  ", "C++ for beginners", "2024 Trends!!"] {
            let once = normalize_phrase(raw);
            assert_eq!(normalize_phrase(&once), once);
        }
    }

    #[test]
    fn tokenize_splits_on_whitespace_runs() {
        assert_eq!(tokenize("a b  c"), vec!["a", "b", "c"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn find_token_run_locates_contiguous_tokens() {
        let hay = ["how", "to", "start", "content", "creation"];
        assert_eq!(find_token_run(&hay, &["content", "creation"]), Some(3));
        assert_eq!(find_token_run(&hay, &["creation", "content"]), None);
        assert_eq!(find_token_run(&hay, &[]), None);
    }

    #[test]
    fn hash_text_is_deterministic() {
        assert_eq!(hash_text("content creation"), hash_text("content creation"));
        assert_ne!(hash_text("content creation"), hash_text("content creator"));
    }

    #[rstest]
    #[case(7, -3, 3)]
    #[case(5, -2, 2)]
    fn jitter_stays_in_centered_range(#[case] span: u32, #[case] min: i32, #[case] max: i32) {
        for text in ["", "a", "content creation tips", "how to edit videos fast"] {
            let value = jitter(text, span);
            assert!((min..=max).contains(&value), "{text} -> {value}");
            assert_eq!(value, jitter(text, span));
        }
    }

    #[test]
    fn jitter_degenerate_span_is_zero() {
        assert_eq!(jitter("anything", 0), 0);
        assert_eq!(jitter("anything", 1), 0);
    }
}
