//! YAML プロファイル上書きの読み込みテスト。

use std::{io::Write, path::PathBuf};

use tempfile::NamedTempFile;
use topic_scorer::profile::{PROFILE_ENV, ProfileError};
use topic_scorer::scoring::{Metric, ScorerKind};
use topic_scorer::{
    AnchorRecord, CandidateRecord, ScoringError, ScoringProfile, ScoringSession, SessionInput,
    SessionOptions,
};

fn overlay(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(yaml.as_bytes()).expect("write overlay");
    file.flush().expect("flush overlay");
    file
}

fn local_profile_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/profile.local.yaml")
}

fn small_input() -> SessionInput {
    SessionInput {
        seed: "home workout".to_string(),
        candidates: vec![
            CandidateRecord::new("home workout for beginners", "autocomplete"),
            CandidateRecord::new("home workout plan", "autocomplete"),
            CandidateRecord::new("home workout in hindi", "autocomplete"),
        ],
        anchors: vec![
            AnchorRecord::new("home workout for beginners", 1),
            AnchorRecord::new("home workout plan", 2),
        ],
    }
}

#[test]
fn overlay_file_replaces_only_listed_fields() {
    let file = overlay(
        "version: overlay-test\npopularity_v2:\n  exact_ceiling: 95\nltv:\n  jitter_span: 3\n",
    );
    let profile = ScoringProfile::load_from_path(file.path()).expect("overlay loads");
    let defaults = ScoringProfile::default();

    assert_eq!(profile.version, "overlay-test");
    assert_eq!(profile.popularity_v2.exact_ceiling, 95);
    assert_eq!(profile.ltv.jitter_span, 3);
    assert_eq!(profile.ltv.full_match, defaults.ltv.full_match);
    assert_eq!(profile.dual, defaults.dual);
    assert_eq!(profile.filler_words, defaults.filler_words);
    profile.validate().expect("overlay validates");
}

#[test]
fn malformed_overlay_reports_deserialize_error() {
    let file = overlay("popularity_v2:\n  exact_base: not-a-list\n");
    match ScoringProfile::load_from_path(file.path()) {
        Err(ProfileError::Deserialize { path, .. }) => assert_eq!(path, file.path()),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn env_variable_selects_overlay() {
    let file = overlay("version: from-env\n");
    let path = file.path().to_string_lossy().into_owned();
    temp_env::with_var(PROFILE_ENV, Some(path.as_str()), || {
        let profile = ScoringProfile::load_from_env().expect("overlay loads");
        assert_eq!(profile.version, "from-env");
    });
}

#[test]
fn missing_env_variable_keeps_production_profile() {
    temp_env::with_var_unset(PROFILE_ENV, || {
        let profile = ScoringProfile::load_from_env().expect("defaults load");
        assert_eq!(profile, ScoringProfile::default());
    });
}

#[test]
fn bundled_local_profile_loads_and_validates() {
    let profile = ScoringProfile::load_from_path(&local_profile_path()).expect("local profile");
    assert_eq!(profile.version, "2024.3-local");
    assert_eq!(profile.popularity_v2.untagged_ceiling, 78);
    assert_eq!(profile.popularity_v2.jitter_span, 5);
    assert_eq!(profile.popularity_v2.heuristics.rules.len(), 2);
    assert_eq!(profile.dual.super_topic_opportunity, 85);
    profile.validate().expect("local profile validates");
}

#[test]
fn session_accepts_local_profile() {
    let profile = ScoringProfile::load_from_path(&local_profile_path()).expect("local profile");
    let session = ScoringSession::new(small_input(), profile, SessionOptions::default())
        .expect("session builds");
    assert_eq!(session.profile().version, "2024.3-local");

    for phrase in session.score_all().expect("scores") {
        let value = phrase
            .result(ScorerKind::PopularityV2)
            .and_then(|result| result.score(Metric::PopularityV2))
            .expect("popularity-v2 value");
        assert!((0..=99).contains(&value), "{} = {value}", phrase.text);
    }
}

#[test]
fn session_rejects_invalid_overlay() {
    let file = overlay("popularity_v2:\n  exact_ceiling: 70\n");
    let profile = ScoringProfile::load_from_path(file.path()).expect("overlay parses");
    let error = ScoringSession::new(small_input(), profile, SessionOptions::default())
        .expect_err("ceiling below untagged ceiling");
    assert!(matches!(
        error,
        ScoringError::InvalidProfile {
            field: "popularity_v2.exact_ceiling",
            ..
        }
    ));
}
