//! hanki · Lesson transcript → Anki card builder
//!
//! - Reads a pasted lesson transcript (file or stdin)
//! - Filters noise, classifies lines, builds vocab + cloze cards
//! - Writes CSVs, optional audio tags, and a run manifest
//!
//! Important env variables:
//!   OPENAI_API_KEY     : enables the remote classifier (with --use-remote-classifier)
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_MODEL       : default "gpt-4o-mini"
//!   HANKI_CONFIG_PATH  : path to TOML config (classifier prompts)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

use std::io::Read;

use clap::Parser;
use tracing::{info, warn};

use hanki::audio::{AudioProvider, HashNamedAudioProvider, NullAudioProvider};
use hanki::builder::build_from_text;
use hanki::classify::Classifier;
use hanki::config::{load_config_from_env, BuildConfig, Cli, RunMode};
use hanki::domain::LineFate;
use hanki::known_terms::KnownTermSet;
use hanki::remote::RemoteClassifier;
use hanki::telemetry;
use hanki::writer::{create_run_context, publish_latest_artifacts, write_latest_run_manifest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cli = Cli::parse();
  let config = BuildConfig::from_cli(&cli);
  let prompts = load_config_from_env().map(|c| c.prompts).unwrap_or_default();

  let text = if cli.input == "-" {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    buf
  } else {
    std::fs::read_to_string(&cli.input)?
  };

  let classifier = if config.use_remote_classifier {
    match RemoteClassifier::from_env(prompts) {
      Some(remote) => Classifier::Remote(remote),
      None => {
        warn!(target: "hanki", "OPENAI_API_KEY not set; using the rule engine");
        Classifier::Rules
      }
    }
  } else {
    Classifier::Rules
  };

  let known = KnownTermSet::load_or_empty(config.known_terms_path.as_deref());
  let context = create_run_context(&cli.out_dir, cli.run_mode);

  let audio: &dyn AudioProvider = if config.include_audio {
    &HashNamedAudioProvider
  } else {
    &NullAudioProvider
  };
  let result = build_from_text(
    &text,
    &classifier,
    &known,
    &config,
    audio,
    &context.build_dir,
  )
  .await?;

  if cli.run_mode == RunMode::Both {
    publish_latest_artifacts(&context.build_dir, &context.output_root, config.include_audio)?;
  }
  let published = cli.run_mode != RunMode::Archive;
  write_latest_run_manifest(
    &context,
    result.vocab_count,
    result.cloze_count,
    config.include_audio,
    published,
  )?;

  let dropped = result
    .line_fates
    .iter()
    .filter(|f| matches!(f, LineFate::Dropped { .. }))
    .count();
  for d in &result.diagnostics {
    info!(target: "cards", line_no = ?d.line_no, stage = d.stage, "{}", d.message);
  }
  info!(
    target: "hanki",
    run_id = %context.run_id,
    vocab = result.vocab_count,
    cloze = result.cloze_count,
    dropped_lines = dropped,
    out_dir = %context.build_dir.display(),
    "Run complete"
  );
  Ok(())
}
