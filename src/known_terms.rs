//! Known-terms gate: a user-maintained list of vocabulary the learner
//! already has cards for. Loaded once per run and immutable afterwards;
//! vocab candidates matching an entry are suppressed. Grammar and cloze
//! candidates are never gated, sentence context is worth keeping even
//! when the headword is known.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{CardCandidate, CardKind};
use crate::error::HankiError;

#[derive(Clone, Debug, Default)]
pub struct KnownTermSet {
  terms: HashSet<String>,
}

/// Fold a term to its comparable form: lowercase, hanzi and ASCII
/// alphanumerics only. "  没关系！ " and "没关系" compare equal, as do
/// "Ni Hao!" and "nihao".
pub fn normalize_term(text: &str) -> String {
  text
    .to_lowercase()
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || crate::util::is_cjk(*c))
    .collect()
}

impl KnownTermSet {
  /// Load from a file: one term per line, `#`-prefixed comments, blank
  /// lines ignored. A missing or unreadable file yields an empty set;
  /// the caller logs the error once and continues.
  pub fn load(path: &Path) -> Result<Self, HankiError> {
    let contents = std::fs::read_to_string(path).map_err(|source| HankiError::KnownTermsFile {
      path: path.to_path_buf(),
      source,
    })?;
    let mut terms = HashSet::new();
    for line in contents.lines() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }
      let normalized = normalize_term(line);
      if !normalized.is_empty() {
        terms.insert(normalized);
      }
    }
    info!(target: "hanki", path = %path.display(), count = terms.len(), "Loaded known terms");
    Ok(Self { terms })
  }

  /// Load, degrading to an empty set when the file is absent or broken.
  pub fn load_or_empty(path: Option<&Path>) -> Self {
    match path {
      Some(p) => match Self::load(p) {
        Ok(set) => set,
        Err(e) => {
          warn!(target: "hanki", error = %e, "Known-terms file unusable; treating as empty");
          Self::default()
        }
      },
      None => Self::default(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.terms.is_empty()
  }

  pub fn len(&self) -> usize {
    self.terms.len()
  }

  pub fn contains(&self, term: &str) -> bool {
    let normalized = normalize_term(term);
    !normalized.is_empty() && self.terms.contains(&normalized)
  }

  /// Gate for vocab candidates: false means suppress the card. Matching
  /// tries the simplified, traditional, English and gloss forms, so a
  /// term known under any rendering stays suppressed.
  pub fn admit(&self, candidate: &CardCandidate) -> bool {
    if candidate.kind != CardKind::Vocab || self.terms.is_empty() {
      return true;
    }
    let forms = [
      candidate.simplified.as_str(),
      candidate.traditional.as_str(),
      candidate.english.as_str(),
      candidate.gloss.as_deref().unwrap_or(""),
    ];
    !forms.iter().any(|f| self.contains(f))
  }

  #[cfg(test)]
  pub fn from_terms<I: IntoIterator<Item = S>, S: AsRef<str>>(terms: I) -> Self {
    Self {
      terms: terms.into_iter().map(|t| normalize_term(t.as_ref())).collect(),
    }
  }
}
