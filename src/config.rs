use std::{env, path::PathBuf};

use thiserror::Error;

use crate::observability::tracing::LogFormat;
use crate::profile::PROFILE_ENV;
use crate::scoring::ScorerKind;
use crate::scoring::session::{DEFAULT_PARALLEL_THRESHOLD, SessionOptions};

pub const PARALLEL_THRESHOLD_ENV: &str = "TOPIC_SCORER_PARALLEL_THRESHOLD";
pub const LOG_FORMAT_ENV: &str = "TOPIC_SCORER_LOG_FORMAT";
pub const SCORERS_ENV: &str = "TOPIC_SCORER_SCORERS";

const DEFAULT_SCORERS: &str = "percentile,popularity_v2,ltv,dual";

/// 実行時設定。スコアリングの重みは [`crate::profile::ScoringProfile`] 側で持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    parallel_threshold: usize,
    log_format: LogFormat,
    profile_path: Option<PathBuf>,
    scorers: Vec<ScorerKind>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から設定値を読み込み、検証する。
    ///
    /// # Errors
    /// 数値・ログ形式・スコアラー名のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let parallel_threshold =
            parse_positive_usize(PARALLEL_THRESHOLD_ENV, DEFAULT_PARALLEL_THRESHOLD)?;
        let log_format = parse_log_format(LOG_FORMAT_ENV, LogFormat::Json)?;
        let profile_path = optional_path(PROFILE_ENV);
        let scorers = parse_scorers(SCORERS_ENV, DEFAULT_SCORERS)?;

        Ok(Self {
            parallel_threshold,
            log_format,
            profile_path,
            scorers,
        })
    }

    #[must_use]
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    #[must_use]
    pub fn profile_path(&self) -> Option<&PathBuf> {
        self.profile_path.as_ref()
    }

    #[must_use]
    pub fn scorers(&self) -> &[ScorerKind] {
        &self.scorers
    }

    /// CLI 引数でプロファイルのパスを上書きする。
    #[must_use]
    pub fn with_profile_path(mut self, path: PathBuf) -> Self {
        self.profile_path = Some(path);
        self
    }

    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            parallel_threshold: self.parallel_threshold(),
            scorers: self.scorers().to_vec(),
        }
    }
}

fn optional_path(name: &'static str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn parse_positive_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.trim().parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if parsed == 0 {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("must be greater than zero"),
        });
    }
    Ok(parsed)
}

fn parse_log_format(name: &'static str, default: LogFormat) -> Result<LogFormat, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_scorers(name: &'static str, default: &str) -> Result<Vec<ScorerKind>, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    ScorerKind::parse_list(&raw).map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}
