//! Card assembler: classified candidates → final vocab and cloze records.
//!
//! Vocab path: known-terms gate → degree-prefix stripping → measure-word
//! example generation (seeded numeral, never `个`) → audio tag.
//! Cloze path: grammar and sentence candidates through the cloze builder;
//! an alignment failure drops that one card with a diagnostic and the run
//! continues. Relative input order is preserved within each collection so
//! re-runs diff predictably.

use tracing::{debug, instrument, warn};

use crate::audio::{sound_tag, AudioProvider};
use crate::cloze::{build_cloze_lines, render_cloze};
use crate::config::BuildConfig;
use crate::domain::{CardCandidate, CardKind, ClozeCard, Diagnostic, VocabCard};
use crate::known_terms::KnownTermSet;
use crate::numerals::NumeralRng;

/// Degree adverbs a teacher prepends in chat ("太咸 tài xián") that do
/// not belong on the card headword.
const DEGREE_PREFIXES: &[(&str, &str)] = &[("太", "tài")];

pub struct AssembledCards {
  pub vocab: Vec<VocabCard>,
  pub cloze: Vec<ClozeCard>,
  pub diagnostics: Vec<Diagnostic>,
}

/// Assemble final cards. The numeral source is the single sequential
/// consumer of the seeded RNG; draw order is candidate order, so a fixed
/// seed reproduces every example sentence byte for byte.
#[instrument(level = "info", skip_all, fields(candidates = candidates.len(), known = known.len()))]
pub fn assemble(
  candidates: &[CardCandidate],
  known: &KnownTermSet,
  config: &BuildConfig,
  audio: &dyn AudioProvider,
) -> AssembledCards {
  let mut rng = NumeralRng::new(config.seed);
  let mut vocab = Vec::new();
  let mut cloze = Vec::new();
  let mut diagnostics = Vec::new();

  for candidate in candidates {
    match candidate.kind {
      CardKind::Vocab => {
        if !known.admit(candidate) {
          debug!(target: "cards", line_no = candidate.line_no, head = %candidate.simplified, "known term suppressed");
          diagnostics.push(Diagnostic::new(
            Some(candidate.line_no),
            "known_terms",
            format!("known vocab suppressed: {}", candidate.simplified),
          ));
          continue;
        }
        match build_vocab_card(candidate, config, &mut rng, audio) {
          Ok(card) => vocab.push(card),
          Err(e) => {
            warn!(target: "cards", line_no = candidate.line_no, error = %e, "vocab card dropped");
            diagnostics.push(Diagnostic::new(
              Some(candidate.line_no),
              "assemble",
              format!("vocab card dropped: {e}"),
            ));
          }
        }
      }
      CardKind::Grammar | CardKind::Cloze => {
        match build_cloze_lines(
          &candidate.english,
          &candidate.simplified,
          &candidate.traditional,
          &candidate.pinyin,
          config.max_cloze_len,
          candidate.line_no,
        ) {
          Ok(lines) => cloze.push(ClozeCard { text: render_cloze(&lines) }),
          Err(e) => {
            warn!(target: "cards", line_no = candidate.line_no, error = %e, "cloze card dropped");
            diagnostics.push(Diagnostic::new(
              Some(candidate.line_no),
              "cloze",
              format!("cloze card dropped: {e}"),
            ));
          }
        }
      }
    }
  }

  AssembledCards { vocab, cloze, diagnostics }
}

fn build_vocab_card(
  candidate: &CardCandidate,
  config: &BuildConfig,
  rng: &mut NumeralRng,
  audio: &dyn AudioProvider,
) -> std::io::Result<VocabCard> {
  let (mut simplified, mut traditional, mut pinyin) = strip_degree_prefix(
    &candidate.simplified,
    &candidate.traditional,
    &candidate.pinyin,
  );
  let mut english = candidate.english.clone();

  if let Some(mw) = candidate.measure_word.as_deref() {
    // Bare 个 is the default classifier; an example adds nothing there.
    if mw != "个" {
      let draw = rng.draw();
      let mw_pinyin = candidate.measure_word_pinyin.as_deref().unwrap_or(mw);
      simplified = format!("{}{}{}", draw.glyph, mw, simplified);
      traditional = format!("{}{}{}", draw.glyph, mw, traditional);
      pinyin = format!("{} {} {}", draw.pinyin, mw_pinyin, pinyin);
      english = numbered_english(&english, draw.english, draw.value);
    }
  }

  let audio_tag = if config.include_audio {
    sound_tag(&audio.create_audio(&simplified)?)
  } else {
    String::new()
  };

  Ok(VocabCard { english, pinyin, simplified, traditional, audio: audio_tag })
}

/// "太咸 / tài xián" → "咸 / xián": the degree adverb is chat phrasing,
/// not part of the headword.
fn strip_degree_prefix(simplified: &str, traditional: &str, pinyin: &str) -> (String, String, String) {
  for (hanzi, syllable) in DEGREE_PREFIXES {
    if let Some(s) = simplified.strip_prefix(hanzi) {
      let t = traditional.strip_prefix(hanzi).unwrap_or(traditional);
      let p = pinyin
        .strip_prefix(syllable)
        .map(str::trim_start)
        .unwrap_or(pinyin);
      return (s.to_string(), t.to_string(), p.to_string());
    }
  }
  (simplified.to_string(), traditional.to_string(), pinyin.to_string())
}

/// "carrot" + Two → "Two carrots". Naive pluralization on purpose; the
/// English side is a prompt, not prose.
fn numbered_english(english: &str, number_word: &str, value: u8) -> String {
  if english.is_empty() {
    return String::new();
  }
  let mut out = format!("{} {}", number_word, english);
  if value >= 2 && !english.ends_with('s') {
    out.push('s');
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::audio::NullAudioProvider;

  fn vocab(simplified: &str, traditional: &str, pinyin: &str, english: &str) -> CardCandidate {
    CardCandidate {
      kind: CardKind::Vocab,
      simplified: simplified.into(),
      traditional: traditional.into(),
      pinyin: pinyin.into(),
      english: english.into(),
      gloss: None,
      measure_word: None,
      measure_word_pinyin: None,
      line_no: 1,
    }
  }

  fn sentence(simplified: &str, pinyin: &str) -> CardCandidate {
    CardCandidate {
      kind: CardKind::Cloze,
      simplified: simplified.into(),
      traditional: simplified.into(),
      pinyin: pinyin.into(),
      english: String::new(),
      gloss: None,
      measure_word: None,
      measure_word_pinyin: None,
      line_no: 2,
    }
  }

  fn run(candidates: Vec<CardCandidate>, known: &KnownTermSet, config: &BuildConfig) -> AssembledCards {
    assemble(&candidates, known, config, &NullAudioProvider)
  }

  #[test]
  fn degree_word_stripping() {
    let cards = run(
      vec![vocab("太咸", "太鹹", "tài xián", "too salty")],
      &KnownTermSet::default(),
      &BuildConfig::default(),
    );
    assert_eq!(cards.vocab[0].simplified, "咸");
    assert_eq!(cards.vocab[0].traditional, "鹹");
    assert_eq!(cards.vocab[0].pinyin, "xián");
  }

  #[test]
  fn measure_word_exception_for_ge() {
    let mut c = vocab("水瓶", "水瓶", "shuǐ píng", "water bottle");
    c.measure_word = Some("个".into());
    c.measure_word_pinyin = Some("gè".into());
    let cards = run(vec![c], &KnownTermSet::default(), &BuildConfig { seed: Some(3), ..BuildConfig::default() });
    assert_eq!(cards.vocab[0].simplified, "水瓶");
    assert_eq!(cards.vocab[0].english, "water bottle");
  }

  #[test]
  fn deterministic_measure_word_prefix() {
    let make = || {
      let mut c = vocab("胡萝卜", "胡蘿蔔", "hú luóbo", "carrot");
      c.measure_word = Some("根".into());
      c.measure_word_pinyin = Some("gēn".into());
      run(
        vec![c],
        &KnownTermSet::default(),
        &BuildConfig { seed: Some(42), ..BuildConfig::default() },
      )
    };
    let a = make();
    let b = make();
    assert_eq!(a.vocab[0], b.vocab[0]);
    assert!(!a.vocab[0].simplified.chars().any(|c| c.is_ascii_digit()));
    let first = a.vocab[0].simplified.chars().next().unwrap();
    assert!("一二三四五六七八九十".contains(first));
    // English side mirrors the drawn numeral as a word, pluralized.
    let word = a.vocab[0].english.split(' ').next().unwrap();
    assert!(["One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten"]
      .contains(&word));
    if word != "One" {
      assert!(a.vocab[0].english.ends_with("carrots"));
    }
  }

  #[test]
  fn enabled_audio_yields_content_hashed_tags() {
    use crate::audio::{deterministic_audio_filename, HashNamedAudioProvider};
    let cfg = BuildConfig { include_audio: true, ..BuildConfig::default() };
    let cards = assemble(
      &[vocab("水瓶", "水瓶", "shuǐ píng", "water bottle")],
      &KnownTermSet::default(),
      &cfg,
      &HashNamedAudioProvider,
    );
    let expected = format!("[sound:{}]", deterministic_audio_filename("水瓶"));
    assert_eq!(cards.vocab[0].audio, expected);
  }

  #[test]
  fn known_terms_suppress_vocab_with_diagnostic() {
    let known = KnownTermSet::from_terms(["大学"]);
    let cards = run(
      vec![vocab("大学", "大學", "dà xué", "university")],
      &known,
      &BuildConfig::default(),
    );
    assert!(cards.vocab.is_empty());
    assert_eq!(cards.diagnostics.len(), 1);
    assert_eq!(cards.diagnostics[0].stage, "known_terms");
  }

  #[test]
  fn cloze_candidates_become_rendered_notes() {
    let cards = run(
      vec![sentence("这个房间里有五本书。", "zhè ge fáng jiān lǐ yǒu wǔ běn shū")],
      &KnownTermSet::default(),
      &BuildConfig::default(),
    );
    assert_eq!(cards.cloze.len(), 1);
    assert!(cards.cloze[0].text.contains("{{c1::"));
    assert!(cards.cloze[0].text.contains('\n'));
  }

  #[test]
  fn empty_sentence_dropped_with_diagnostic_not_emitted() {
    let cards = run(
      vec![sentence("", "")],
      &KnownTermSet::default(),
      &BuildConfig::default(),
    );
    assert!(cards.cloze.is_empty());
    assert_eq!(cards.diagnostics.len(), 1);
    assert_eq!(cards.diagnostics[0].stage, "cloze");
  }

  #[test]
  fn output_order_follows_input_order() {
    let cards = run(
      vec![
        vocab("书房", "書房", "shū fáng", "study"),
        sentence("你好吗？", "nǐ hǎo ma"),
        vocab("座位", "座位", "zuò wèi", "seat"),
      ],
      &KnownTermSet::default(),
      &BuildConfig::default(),
    );
    assert_eq!(cards.vocab.len(), 2);
    assert_eq!(cards.vocab[0].simplified, "书房");
    assert_eq!(cards.vocab[1].simplified, "座位");
    assert_eq!(cards.cloze.len(), 1);
  }
}
