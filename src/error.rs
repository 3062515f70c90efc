//! Error kinds for the card-building pipeline.
//!
//! Only `EmptyInput` aborts a run. Everything else is recovered at the
//! unit that caused it and recorded as a diagnostic, so already-built
//! cards are never disturbed.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HankiError {
  /// No learnable content survived noise filtering.
  #[error("no learnable content after filtering")]
  EmptyInput,

  /// A sentence produced zero chunks; we never emit an empty cloze card.
  #[error("line {line_no}: sentence produced no cloze chunks")]
  EmptyCloze { line_no: usize },

  /// Pinyin could not be aligned one syllable per hanzi for one candidate.
  /// The affected card is dropped rather than emitted with misleading pinyin.
  #[error("line {line_no}: pinyin alignment failed (expected {expected} syllables, got {got})")]
  ChunkAlignment { expected: usize, got: usize, line_no: usize },

  /// External classifier unreachable, malformed, or returned a
  /// batch of the wrong length. Non-fatal: the rule engine takes over.
  #[error("external classifier failed: {0}")]
  ClassifierDelegate(String),

  /// Known-terms file missing or unreadable. Non-fatal: treated as empty.
  #[error("known-terms file {path:?} unreadable: {source}")]
  KnownTermsFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}
