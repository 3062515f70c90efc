//! Output boundary: CSV serialization and run-directory bookkeeping.
//!
//! Vocab and cloze collections land in two CSVs with fixed header rows
//! (the Anki add-on strips the header before import). A run manifest
//! (`latest_run.json`) records what was built and where, which is the
//! add-on's only window into this tool.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::RunMode;
use crate::domain::{ClozeCard, VocabCard};

pub const VOCAB_FILENAME: &str = "vocab_cards.csv";
pub const CLOZE_FILENAME: &str = "cloze_cards.csv";
pub const AUDIO_DIRNAME: &str = "audio";
pub const MANIFEST_FILENAME: &str = "latest_run.json";
pub const RUNS_DIRNAME: &str = "runs";

/// RFC-4180 quoting: wrap when the field contains a comma, quote or
/// newline; embedded quotes double. Cloze notes carry embedded newlines
/// inside one field, so this is load-bearing, not cosmetic.
fn csv_field(value: &str) -> String {
  if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}

fn csv_row(fields: &[&str]) -> String {
  let mut row = fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
  row.push_str("\r\n");
  row
}

pub fn write_vocab_csv(cards: &[VocabCard], path: &Path) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let mut out = fs::File::create(path)?;
  out.write_all(csv_row(&["English", "Pinyin", "Simplified", "Traditional", "Audio"]).as_bytes())?;
  for card in cards {
    out.write_all(
      csv_row(&[&card.english, &card.pinyin, &card.simplified, &card.traditional, &card.audio])
        .as_bytes(),
    )?;
  }
  Ok(())
}

pub fn write_cloze_csv(cards: &[ClozeCard], path: &Path) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let mut out = fs::File::create(path)?;
  out.write_all(csv_row(&["Text"]).as_bytes())?;
  for card in cards {
    out.write_all(csv_row(&[&card.text]).as_bytes())?;
  }
  Ok(())
}

/// Where one build writes its artifacts.
#[derive(Clone, Debug)]
pub struct RunContext {
  pub run_id: String,
  pub run_mode: RunMode,
  pub output_root: PathBuf,
  pub build_dir: PathBuf,
}

/// Millisecond precision keeps run IDs human-readable while avoiding
/// collisions between back-to-back runs.
pub fn generate_run_id(now: DateTime<Utc>) -> String {
  now.format("%Y%m%d-%H%M%S-%3f").to_string()
}

pub fn create_run_context(output_root: &Path, run_mode: RunMode) -> RunContext {
  let run_id = generate_run_id(Utc::now());
  let build_dir = match run_mode {
    RunMode::Latest => output_root.to_path_buf(),
    RunMode::Archive | RunMode::Both => output_root.join(RUNS_DIRNAME).join(&run_id),
  };
  RunContext {
    run_id,
    run_mode,
    output_root: output_root.to_path_buf(),
    build_dir,
  }
}

/// Copy an archived run's artifacts up to the output root so "latest"
/// always points at the newest build. Stale root artifacts are removed
/// when the new run produced none.
#[instrument(level = "info", skip_all, fields(run_dir = %run_dir.display()))]
pub fn publish_latest_artifacts(
  run_dir: &Path,
  output_root: &Path,
  include_audio: bool,
) -> std::io::Result<()> {
  fs::create_dir_all(output_root)?;
  for filename in [VOCAB_FILENAME, CLOZE_FILENAME] {
    let source = run_dir.join(filename);
    let target = output_root.join(filename);
    if source.exists() {
      fs::copy(&source, &target)?;
    } else if target.exists() {
      fs::remove_file(&target)?;
    }
  }

  if include_audio {
    let source_audio = run_dir.join(AUDIO_DIRNAME);
    let target_audio = output_root.join(AUDIO_DIRNAME);
    if target_audio.exists() {
      fs::remove_dir_all(&target_audio)?;
    }
    if source_audio.exists() {
      copy_dir(&source_audio, &target_audio)?;
    }
  }
  Ok(())
}

fn copy_dir(source: &Path, target: &Path) -> std::io::Result<()> {
  fs::create_dir_all(target)?;
  for entry in fs::read_dir(source)? {
    let entry = entry?;
    let dest = target.join(entry.file_name());
    if entry.file_type()?.is_dir() {
      copy_dir(&entry.path(), &dest)?;
    } else {
      fs::copy(entry.path(), &dest)?;
    }
  }
  Ok(())
}

#[derive(Serialize)]
struct Manifest {
  run_id: String,
  run_mode: RunMode,
  generated_at_utc: String,
  output_root: String,
  build_dir: String,
  published_latest: bool,
  include_audio: bool,
  vocab_count: usize,
  cloze_count: usize,
  artifacts: ManifestArtifacts,
}

#[derive(Serialize)]
struct ManifestArtifacts {
  build_vocab_csv: Option<String>,
  build_cloze_csv: Option<String>,
  build_audio_dir: Option<String>,
  latest_vocab_csv: Option<String>,
  latest_cloze_csv: Option<String>,
  latest_audio_dir: Option<String>,
}

fn existing(path: PathBuf) -> Option<String> {
  path.exists().then(|| path.to_string_lossy().into_owned())
}

/// Write `latest_run.json` describing this run for the Anki add-on.
pub fn write_latest_run_manifest(
  context: &RunContext,
  vocab_count: usize,
  cloze_count: usize,
  include_audio: bool,
  published_latest: bool,
) -> std::io::Result<PathBuf> {
  fs::create_dir_all(&context.output_root)?;
  let manifest = Manifest {
    run_id: context.run_id.clone(),
    run_mode: context.run_mode,
    generated_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    output_root: context.output_root.to_string_lossy().into_owned(),
    build_dir: context.build_dir.to_string_lossy().into_owned(),
    published_latest,
    include_audio,
    vocab_count,
    cloze_count,
    artifacts: ManifestArtifacts {
      build_vocab_csv: existing(context.build_dir.join(VOCAB_FILENAME)),
      build_cloze_csv: existing(context.build_dir.join(CLOZE_FILENAME)),
      build_audio_dir: existing(context.build_dir.join(AUDIO_DIRNAME)),
      latest_vocab_csv: existing(context.output_root.join(VOCAB_FILENAME)),
      latest_cloze_csv: existing(context.output_root.join(CLOZE_FILENAME)),
      latest_audio_dir: existing(context.output_root.join(AUDIO_DIRNAME)),
    },
  };

  let manifest_path = context.output_root.join(MANIFEST_FILENAME);
  let mut payload = serde_json::to_string_pretty(&manifest)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
  payload.push('\n');
  fs::write(&manifest_path, payload)?;
  info!(target: "hanki", path = %manifest_path.display(), vocab_count, cloze_count, "Wrote run manifest");
  Ok(manifest_path)
}
