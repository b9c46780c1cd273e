use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use topic_scorer::{
    config::Config,
    observability, parse_session,
    profile::ScoringProfile,
    scoring::{PhraseScores, ScoredSession, ScoringSession, SessionSummary},
};

struct CliArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    profile: Option<PathBuf>,
    pretty: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    profile_version: &'a str,
    summary: SessionSummary,
    results: Vec<PhraseScores>,
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(path) = args.profile.clone() {
        config = config.with_profile_path(path);
    }
    observability::init(config.log_format()).context("failed to initialize tracing")?;

    let profile = match config.profile_path() {
        Some(path) => ScoringProfile::load_from_path(path)
            .with_context(|| format!("failed to load scoring profile {}", path.display()))?,
        None => ScoringProfile::default(),
    };

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read session input {}", args.input.display()))?;
    let input = parse_session(&raw).context("invalid session input")?;

    let session = ScoringSession::new(input, profile, config.session_options())
        .context("failed to build scoring session")?;
    let ScoredSession { summary, results } = session
        .score_with_summary()
        .context("failed to score session")?;

    let report = Report {
        profile_version: &session.profile().version,
        summary,
        results,
    };
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to serialize report")?;

    match &args.output {
        Some(path) => fs::write(path, rendered + "\n")
            .with_context(|| format!("failed to write report {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn parse_args() -> Result<CliArgs> {
    let mut input = None;
    let mut output = None;
    let mut profile = None;
    let mut pretty = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" => {
                let value = args.next().context("--input requires a path argument")?;
                input = Some(PathBuf::from(value));
            }
            "--output" => {
                let value = args.next().context("--output requires a path argument")?;
                output = Some(PathBuf::from(value));
            }
            "--profile" => {
                let value = args
                    .next()
                    .context("--profile requires a YAML path argument")?;
                profile = Some(PathBuf::from(value));
            }
            "--pretty" => {
                pretty = true;
            }
            "--help" => {
                print_usage();
                process::exit(0);
            }
            _ => {
                bail!("unknown argument: {}", arg);
            }
        }
    }

    let input = input.ok_or_else(|| anyhow!("--input is required"))?;

    Ok(CliArgs {
        input,
        output,
        profile,
        pretty,
    })
}

fn print_usage() {
    eprintln!(
        "Usage: score-session --input <session.json> [--output <report.json>] [--profile <profile.yaml>] [--pretty]"
    );
}
