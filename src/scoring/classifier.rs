//! Priority tag classifier (EXACT > CHILD > RELATED > NONE).

use super::types::{AnchorPhrase, Tag, TagMatch};

/// 候補をアンカーに対して分類する。
///
/// 全アンカーについて EXACT を試した後に CHILD、その後に RELATED を試す。
/// `starts_with` と `contains` は重なるため、この順序を崩すと完全一致が隠れてしまう。
/// 一致は正規化済みテキスト上の単純な前方一致・部分一致で、語境界は見ない。
#[must_use]
pub fn classify(candidate: &str, anchors: &[AnchorPhrase]) -> TagMatch {
    if candidate.is_empty() {
        return TagMatch::untagged();
    }

    if let Some(anchor) = anchors.iter().find(|anchor| anchor.text() == candidate) {
        return TagMatch::matched(Tag::Exact, anchor);
    }

    if let Some(anchor) = anchors
        .iter()
        .find(|anchor| is_child_of(candidate, anchor.text()))
    {
        return TagMatch::matched(Tag::Child, anchor);
    }

    if let Some(anchor) = anchors
        .iter()
        .find(|anchor| !anchor.text().is_empty() && candidate.contains(anchor.text()))
    {
        return TagMatch::matched(Tag::Related, anchor);
    }

    TagMatch::untagged()
}

fn is_child_of(candidate: &str, anchor: &str) -> bool {
    !anchor.is_empty() && candidate.len() > anchor.len() && candidate.starts_with(anchor)
}
