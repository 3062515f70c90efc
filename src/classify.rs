//! Classification: filtered utterances → typed card candidates.
//!
//! Two engines sit behind one capability enum, selected by configuration:
//! the deterministic rule engine below, and the remote delegate in
//! `remote`. Any delegate failure (timeout, malformed response, batch
//! length mismatch) falls back to the rule engine for that batch and is
//! recorded as a diagnostic; the pipeline never crashes because of it.

use tracing::{debug, instrument, warn};

use crate::domain::{CardCandidate, CardKind, Diagnostic, FilteredUnit};
use crate::pinyin_text::to_pinyin_diacritics;
use crate::remote::RemoteClassifier;
use crate::util::{count_cjk, has_cjk};

/// Hanzi count at or below which an unpunctuated unit reads as a
/// standalone term.
const VOCAB_MAX_HANZI: usize = 6;

/// Max units per remote request; a longer transcript goes out in
/// several bounded batches.
pub const MAX_BATCH: usize = 16;

pub enum Classifier {
  Rules,
  Remote(RemoteClassifier),
}

impl Classifier {
  /// Classify every unit, in order. Infallible overall: remote failures
  /// degrade to the rule engine per batch.
  #[instrument(level = "info", skip_all, fields(units = units.len()))]
  pub async fn classify_all(
    &self,
    units: &[FilteredUnit],
  ) -> (Vec<CardCandidate>, Vec<Diagnostic>) {
    let mut out = Vec::with_capacity(units.len());
    let mut diagnostics = Vec::new();
    match self {
      Classifier::Rules => {
        for unit in units {
          out.push(classify_unit(unit));
        }
      }
      Classifier::Remote(remote) => {
        for batch in units.chunks(MAX_BATCH) {
          match remote.classify_batch(batch).await {
            Ok(candidates) => out.extend(candidates),
            Err(e) => {
              warn!(target: "cards", error = %e, batch = batch.len(), "Remote classifier failed; rule engine takes this batch");
              diagnostics.push(Diagnostic::new(
                batch.first().map(|u| u.line_no),
                "classify",
                format!("remote classifier failed, used rule engine: {e}"),
              ));
              out.extend(batch.iter().map(classify_unit));
            }
          }
        }
      }
    }
    let deduped = dedupe(out, &mut diagnostics);
    (deduped, diagnostics)
  }
}

/// Deterministic rule engine. Ordered rules, first match wins:
/// "X means Y" vocab extraction, "X怎么说" vocab extraction, grammar
/// pattern markers, short standalone term, sentence otherwise. A unit
/// both short and terminally punctuated ties toward sentence, which
/// preserves its context instead of discarding it.
pub fn classify_unit(unit: &FilteredUnit) -> CardCandidate {
  let text = unit.text.trim();

  if let Some((head, english)) = extract_means_gloss(text) {
    return vocab_candidate(unit, head, english);
  }
  if let Some(head) = extract_how_to_say(text) {
    let english = unit.gloss.clone().unwrap_or_default();
    return vocab_candidate(unit, head, english);
  }

  let kind = if has_grammar_marker(text) {
    CardKind::Grammar
  } else if is_standalone_term(text) {
    CardKind::Vocab
  } else {
    CardKind::Cloze
  };
  debug!(target: "cards", line_no = unit.line_no, ?kind, "rule classification");

  let english = unit.gloss.clone().unwrap_or_default();
  CardCandidate {
    kind,
    simplified: text.to_string(),
    traditional: text.to_string(),
    pinyin: to_pinyin_diacritics(text),
    english,
    gloss: unit.gloss.clone(),
    measure_word: None,
    measure_word_pinyin: None,
    line_no: unit.line_no,
  }
}

fn vocab_candidate(unit: &FilteredUnit, head: String, english: String) -> CardCandidate {
  CardCandidate {
    kind: CardKind::Vocab,
    pinyin: to_pinyin_diacritics(&head),
    traditional: head.clone(),
    simplified: head,
    english,
    gloss: unit.gloss.clone(),
    measure_word: None,
    measure_word_pinyin: None,
    line_no: unit.line_no,
  }
}

/// "大学 means university. 谢谢！" → ("大学", "university").
/// The English side is cut at the first sentence terminator so trailing
/// chatter on the same line does not leak into the card.
fn extract_means_gloss(text: &str) -> Option<(String, String)> {
  let pos = text.find(" means ").or_else(|| text.find(" Means "))?;
  let head: String = text[..pos].trim().to_string();
  if head.is_empty() || !has_cjk(&head) || count_cjk(&head) > VOCAB_MAX_HANZI {
    return None;
  }
  let tail = &text[pos + " means ".len()..];
  let english: String = tail
    .chars()
    .take_while(|c| !matches!(c, '.' | '。' | '!' | '！' | '?' | '？' | ';' | '；'))
    .collect();
  let english = english.trim().to_string();
  if english.is_empty() {
    return None;
  }
  Some((head, english))
}

/// "大学怎么说？" → "大学": the question is meta, the headword is the
/// learnable item.
fn extract_how_to_say(text: &str) -> Option<String> {
  let stripped = text.trim_end_matches(['？', '?']);
  let head = stripped.strip_suffix("怎么说")?.trim();
  let head = head
    .strip_suffix("用中文")
    .or_else(|| head.strip_suffix("用英文"))
    .unwrap_or(head)
    .trim();
  if head.is_empty() || !has_cjk(head) || count_cjk(head) > VOCAB_MAX_HANZI {
    return None;
  }
  Some(head.to_string())
}

/// Pattern-template material: ellipses marking slots ("越……越……"),
/// A/B placeholders, or a parenthetical grammar note.
fn has_grammar_marker(text: &str) -> bool {
  if text.contains('…') || text.contains("...") {
    return true;
  }
  if (text.contains('（') && text.contains('）')) || (text.contains('(') && text.contains(')')) {
    // Parentheticals only count when the line still reads as a pattern,
    // i.e. hanzi both inside and before the note.
    let open = text.find(|c| c == '（' || c == '(').unwrap_or(0);
    return has_cjk(&text[..open]) && has_cjk(&text[open..]);
  }
  false
}

fn has_terminal_punct(text: &str) -> bool {
  text
    .chars()
    .last()
    .map(|c| matches!(c, '。' | '！' | '？' | '.' | '!' | '?' | '…'))
    .unwrap_or(false)
}

/// Short, unpunctuated, single-word unit. Anything carrying terminal
/// punctuation stays a sentence even when short (tie-break toward cloze).
fn is_standalone_term(text: &str) -> bool {
  if has_terminal_punct(text) || text.contains(['，', ',', '、']) {
    return false;
  }
  if text.split_whitespace().count() > 1 {
    return false;
  }
  let hanzi = count_cjk(text);
  hanzi >= 1 && hanzi <= VOCAB_MAX_HANZI
}

/// First occurrence wins; repeated mentions of the same headword in one
/// lesson collapse into one candidate.
fn dedupe(candidates: Vec<CardCandidate>, diagnostics: &mut Vec<Diagnostic>) -> Vec<CardCandidate> {
  let mut seen = std::collections::HashSet::new();
  let mut out = Vec::with_capacity(candidates.len());
  for c in candidates {
    let key = c.simplified.trim().to_string();
    if !seen.insert(key) {
      diagnostics.push(Diagnostic::new(
        Some(c.line_no),
        "classify",
        format!("duplicate of earlier item dropped: {}", c.simplified.trim()),
      ));
      continue;
    }
    out.push(c);
  }
  out
}
