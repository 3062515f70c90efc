//! Data model for the pipeline: raw transcript lines, filtered units,
//! classified card candidates, and the final vocab/cloze records handed
//! to the CSV writer.

use serde::{Deserialize, Serialize};

/// What kind of card does a classified unit become?
///
/// Wire names ("vocabulary"/"grammar"/"sentence") match what the external
/// classifier returns; "sentence" items are rendered as cloze notes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
  #[serde(rename = "vocabulary")]
  Vocab,
  Grammar,
  #[serde(rename = "sentence")]
  Cloze,
}

/// Why a line was removed by the noise filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
  Blank,
  Timestamp,
  Url,
  Greeting,
  SignOff,
  SymbolsOnly,
  /// Latin-only line consumed as the gloss of a nearby Chinese line.
  AttachedAsGloss { to_line: usize },
  /// Nothing Chinese left to learn from after gloss attachment.
  NoChinese,
}

/// Per-line accounting: the filter is total, so every input line ends up
/// in exactly one of these states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineFate {
  Kept,
  /// Folded into a preceding kept line as one utterance.
  Merged { into_line: usize },
  Dropped { reason: DropReason },
}

/// A line (or merged group of lines) that survived noise filtering.
#[derive(Clone, Debug)]
pub struct FilteredUnit {
  pub text: String,
  /// Line number of the first line of the utterance.
  pub line_no: usize,
  pub gloss: Option<String>,
  /// True when adjacent kept lines were joined into this unit.
  pub merged: bool,
}

/// Intermediate result of classification, mutated downstream by the
/// known-terms gate (vocab) or the cloze builder (grammar/sentence).
///
/// Serde attributes mirror the external classifier's response objects.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardCandidate {
  #[serde(rename = "item_type")]
  pub kind: CardKind,
  pub simplified: String,
  #[serde(default)]
  pub traditional: String,
  #[serde(default)]
  pub pinyin: String,
  #[serde(default)]
  pub english: String,
  #[serde(default)]
  pub gloss: Option<String>,
  #[serde(default)]
  pub measure_word: Option<String>,
  #[serde(default)]
  pub measure_word_pinyin: Option<String>,
  #[serde(skip)]
  pub line_no: usize,
}

/// Final vocab record: one CSV row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VocabCard {
  pub english: String,
  pub pinyin: String,
  pub simplified: String,
  pub traditional: String,
  /// `[sound:…]` tag, or empty when audio is disabled.
  pub audio: String,
}

/// Chunked sentence ready for cloze rendering. Chunk vectors are always
/// the same length and positionally aligned; `blanked[i]` says whether
/// chunk `i` is a hidden answer (content) or visible stem (punctuation).
#[derive(Clone, Debug)]
pub struct ClozeLines {
  pub english: String,
  pub simplified_chunks: Vec<String>,
  pub traditional_chunks: Vec<String>,
  pub pinyin_chunks: Vec<String>,
  pub blanked: Vec<bool>,
}

/// Final cloze record: one CSV row holding the rendered `{{cN::…}}` lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClozeCard {
  pub text: String,
}

/// One recovered error or drop decision, kept so a user can audit why a
/// card was altered or dropped. Ordered by occurrence.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
  /// Source line the event refers to, when known.
  pub line_no: Option<usize>,
  /// Pipeline stage that recorded the event.
  pub stage: &'static str,
  pub message: String,
}

impl Diagnostic {
  pub fn new(line_no: Option<usize>, stage: &'static str, message: impl Into<String>) -> Self {
    Self { line_no, stage, message: message.into() }
  }
}
