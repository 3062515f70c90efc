//! End-to-end build: raw transcript text in, CSV artifacts out.
//!
//! Single-threaded and synchronous apart from the optional remote
//! classifier call, which is time-bounded and falls back locally.
//! Emission is all-or-nothing per run: CSVs are written only after every
//! surviving candidate has been assembled, so an abort mid-run never
//! leaves partial card files behind.

use std::path::Path;

use tracing::{info, instrument};

use crate::assemble::assemble;
use crate::audio::AudioProvider;
use crate::classify::Classifier;
use crate::config::BuildConfig;
use crate::domain::{Diagnostic, LineFate};
use crate::error::HankiError;
use crate::filter::filter_lines;
use crate::known_terms::KnownTermSet;
use crate::writer::{write_cloze_csv, write_vocab_csv, CLOZE_FILENAME, VOCAB_FILENAME};

#[derive(Debug)]
pub struct BuildResult {
  pub vocab_count: usize,
  pub cloze_count: usize,
  /// Per-line accounting from the noise filter.
  pub line_fates: Vec<LineFate>,
  /// Recovered errors and drop decisions, in occurrence order.
  pub diagnostics: Vec<Diagnostic>,
}

/// Run the full pipeline and write both CSVs under `build_dir`.
///
/// Fails only on `EmptyInput` (nothing learnable survived filtering) or
/// on I/O errors while writing artifacts; every per-card problem is
/// recovered and recorded in `diagnostics` instead.
#[instrument(level = "info", skip_all, fields(input_len = text.len()))]
pub async fn build_from_text(
  text: &str,
  classifier: &Classifier,
  known: &KnownTermSet,
  config: &BuildConfig,
  audio: &dyn AudioProvider,
  build_dir: &Path,
) -> Result<BuildResult, HankiError> {
  let (units, line_fates) = filter_lines(text);
  info!(target: "hanki", lines = line_fates.len(), units = units.len(), "Parsed input text");
  if units.is_empty() {
    return Err(HankiError::EmptyInput);
  }

  let (candidates, mut diagnostics) = classifier.classify_all(&units).await;
  info!(target: "hanki", candidates = candidates.len(), "Classified candidate lines");

  let assembled = assemble(&candidates, known, config, audio);
  diagnostics.extend(assembled.diagnostics);

  write_vocab_csv(&assembled.vocab, &build_dir.join(VOCAB_FILENAME))?;
  write_cloze_csv(&assembled.cloze, &build_dir.join(CLOZE_FILENAME))?;
  info!(
    target: "hanki",
    vocab = assembled.vocab.len(),
    cloze = assembled.cloze.len(),
    diagnostics = diagnostics.len(),
    "Finished build"
  );

  Ok(BuildResult {
    vocab_count: assembled.vocab.len(),
    cloze_count: assembled.cloze.len(),
    line_fates,
    diagnostics,
  })
}
