//! CLI surface and run configuration, plus the optional TOML overlay
//! (classifier prompts) loaded from HANKI_CONFIG_PATH.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// hanki · build Anki CSVs from pasted lesson transcripts.
#[derive(Debug, Parser)]
#[command(name = "hanki", version, about)]
pub struct Cli {
  /// Input UTF-8 transcript file, or "-" for stdin.
  pub input: String,

  /// Output directory for CSVs, audio and the run manifest.
  #[arg(long, default_value = "output")]
  pub out_dir: PathBuf,

  /// Seed for deterministic randomness (numeral draws). Omit for entropy.
  #[arg(long)]
  pub seed: Option<u64>,

  /// Soft limit per cloze chunk, in characters.
  #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u16).range(1..))]
  pub max_cloze_len: u16,

  /// Skip audio tag generation entirely.
  #[arg(long)]
  pub no_audio: bool,

  /// Classify via the remote delegate (requires OPENAI_API_KEY);
  /// the deterministic rule engine remains the fallback.
  #[arg(long)]
  pub use_remote_classifier: bool,

  /// Known-terms file (one term per line, `#` comments). Vocab cards
  /// matching an entry are suppressed.
  #[arg(long)]
  pub known_terms: Option<PathBuf>,

  /// Where build artifacts land: the output root, an archived run
  /// directory, or both.
  #[arg(long, value_enum, default_value_t = RunMode::Latest)]
  pub run_mode: RunMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
  /// Write artifacts directly under the output root.
  Latest,
  /// Write artifacts under `<out>/runs/<run-id>` only.
  Archive,
  /// Archive, then copy artifacts up to the output root.
  Both,
}

/// Settings consumed by the pipeline itself (everything except paths
/// and run layout).
#[derive(Clone, Debug)]
pub struct BuildConfig {
  pub max_cloze_len: usize,
  pub seed: Option<u64>,
  pub use_remote_classifier: bool,
  pub known_terms_path: Option<PathBuf>,
  pub include_audio: bool,
}

impl BuildConfig {
  pub fn from_cli(cli: &Cli) -> Self {
    Self {
      max_cloze_len: cli.max_cloze_len as usize,
      seed: cli.seed,
      use_remote_classifier: cli.use_remote_classifier,
      known_terms_path: cli.known_terms.clone(),
      include_audio: !cli.no_audio,
    }
  }
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      max_cloze_len: 8,
      seed: None,
      use_remote_classifier: false,
      known_terms_path: None,
      include_audio: false,
    }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct HankiConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts used by the remote classifier. Defaults are tuned for
/// Chinese-lesson transcripts; override in TOML to adjust tone/structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub classify_system: String,
  pub classify_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      classify_system: "You classify lines from a Chinese lesson transcript into flashcard material. Respond ONLY with strict JSON: {\"items\": [...]} with one item per input line, in order. Each item: {\"item_type\": \"vocabulary\"|\"grammar\"|\"sentence\", \"simplified\", \"traditional\", \"pinyin\", \"english\", \"gloss\"?, \"measure_word\"?, \"measure_word_pinyin\"?}. Pinyin uses tone diacritics, space-separated.".into(),
      classify_user_template: "Classify each numbered line. Return exactly {count} items.\n\n{lines}".into(),
    }
  }
}

/// Attempt to load `HankiConfig` from HANKI_CONFIG_PATH. On any
/// parsing/IO error, returns None and the defaults apply.
pub fn load_config_from_env() -> Option<HankiConfig> {
  let path = std::env::var("HANKI_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<HankiConfig>(&s) {
      Ok(cfg) => {
        info!(target: "hanki", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "hanki", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "hanki", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
