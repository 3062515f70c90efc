//! Chunker / cloze builder.
//!
//! A sentence is segmented into chunks at sentence punctuation and a soft
//! length cap (`max_len`, default 8): a chunk flushes early at punctuation
//! so blanks never straddle clause boundaries, and never exceeds the cap.
//! The identical boundary set is applied to the traditional rendering and
//! to the pinyin annotation, so chunk *i* of text, traditional and pinyin
//! always correspond. Pinyin that cannot cover the hanzi one syllable
//! each (too few syllables, too many, or a content chunk left without
//! any) is a `ChunkAlignmentError` and the card is dropped rather than
//! emitted with misleading pronunciation.
//!
//! Rendering follows Anki's cloze syntax: each content chunk becomes a
//! `{{cN::…}}` deletion; punctuation-only chunks stay visible stem.

use crate::domain::ClozeLines;
use crate::error::HankiError;
use crate::util::count_cjk;

/// Sentence and clause punctuation that closes a chunk.
const CHUNK_PUNCT: &[char] = &['，', '。', '？', '！', '；', '、', ',', '.', '?', '!'];

/// Split text into chunks: flush at punctuation or when the buffer
/// reaches `max_len` characters. No chunk is empty; concatenating the
/// chunks reproduces the input exactly.
pub fn segment_text(text: &str, max_len: usize) -> Vec<String> {
  debug_assert!(max_len > 0);
  let mut chunks: Vec<String> = Vec::new();
  let mut buffer = String::new();
  let mut buffer_chars = 0usize;

  for ch in text.chars() {
    buffer.push(ch);
    buffer_chars += 1;
    if CHUNK_PUNCT.contains(&ch) || buffer_chars >= max_len {
      chunks.push(std::mem::take(&mut buffer));
      buffer_chars = 0;
    }
  }
  if !buffer.is_empty() {
    chunks.push(buffer);
  }
  chunks
}

/// Slice `text` under an existing chunk-size sequence (sizes in chars).
/// Any leftover folds into the last chunk, so a traditional rendering a
/// character longer than the simplified one still aligns positionally.
fn align_chunks(text: &str, sizes: &[usize]) -> Vec<String> {
  let chars: Vec<char> = text.chars().collect();
  let mut chunks: Vec<String> = Vec::new();
  let mut start = 0usize;
  for &size in sizes {
    let end = (start + size).min(chars.len());
    chunks.push(chars[start..end].iter().collect());
    start = end;
  }
  if start < chars.len() {
    if let Some(last) = chunks.last_mut() {
      last.extend(chars[start..].iter());
    } else {
      chunks.push(chars[start..].iter().collect());
    }
  }
  chunks
}

/// Number of pinyin syllables in a string, counted as maximal runs of
/// alphabetic characters. Robust against punctuation glued to a syllable
/// ("shū。") and against slot markers between syllables ("yuè……yuè……"),
/// which whitespace splitting both miscounts.
fn count_syllables(pinyin: &str) -> usize {
  let mut count = 0usize;
  let mut in_run = false;
  for ch in pinyin.chars() {
    if ch.is_alphabetic() && !crate::util::is_cjk(ch) {
      if !in_run {
        count += 1;
        in_run = true;
      }
    } else {
      in_run = false;
    }
  }
  count
}

/// Group space-separated pinyin syllables by per-chunk syllable counts.
/// Leftover syllables fold into the last chunk. Produces exactly
/// `sizes.len()` entries (possibly empty for punctuation-only chunks).
fn align_pinyin_chunks(pinyin: &str, sizes: &[usize]) -> Vec<String> {
  let syllables: Vec<&str> = pinyin.split_whitespace().collect();
  let mut result: Vec<String> = Vec::new();
  let mut index = 0usize;
  for &size in sizes {
    let take = size.min(syllables.len().saturating_sub(index));
    result.push(syllables[index..index + take].join(" "));
    index += take;
  }
  if index < syllables.len() {
    let leftover = syllables[index..].join(" ");
    match result.last_mut() {
      Some(last) if !last.is_empty() => {
        last.push(' ');
        last.push_str(&leftover);
      }
      Some(last) => *last = leftover,
      None => result.push(leftover),
    }
  }
  result
}

/// Build aligned cloze lines for one sentence candidate.
///
/// Pinyin chunk sizes are counted in hanzi per chunk (a pinyin syllable
/// maps to one hanzi); for hanzi-free text the raw character sizes apply.
/// Fails with `EmptyCloze` for empty input and `ChunkAlignment` when the
/// pinyin syllable count diverges from the hanzi count.
pub fn build_cloze_lines(
  english: &str,
  simplified: &str,
  traditional: &str,
  pinyin: &str,
  max_len: usize,
  line_no: usize,
) -> Result<ClozeLines, HankiError> {
  let simplified_chunks = segment_text(simplified, max_len);
  if simplified_chunks.is_empty() {
    return Err(HankiError::EmptyCloze { line_no });
  }

  let sizes: Vec<usize> = simplified_chunks.iter().map(|c| c.chars().count()).collect();
  let mut pinyin_sizes: Vec<usize> = simplified_chunks.iter().map(|c| count_cjk(c)).collect();
  if pinyin_sizes.iter().sum::<usize>() == 0 {
    pinyin_sizes = sizes.clone();
  }

  // One syllable per hanzi, or the pronunciation line cannot be trusted:
  // a shortfall would blank chunks silently, an excess would fold stray
  // syllables into the wrong chunk.
  let expected: usize = pinyin_sizes.iter().sum();
  let syllables = count_syllables(pinyin);
  if syllables > 0 && syllables != expected {
    return Err(HankiError::ChunkAlignment { expected, got: syllables, line_no });
  }

  let traditional_chunks = align_chunks(traditional, &sizes);
  let pinyin_chunks = align_pinyin_chunks(pinyin, &pinyin_sizes);

  if syllables > 0 {
    for (chunk, &size) in pinyin_chunks.iter().zip(&pinyin_sizes) {
      if size > 0 && chunk.trim().is_empty() {
        return Err(HankiError::ChunkAlignment { expected, got: syllables, line_no });
      }
    }
  }

  // Blank content chunks only; punctuation-only chunks remain visible so
  // the sentence terminator is never the hidden answer.
  let blanked: Vec<bool> = simplified_chunks
    .iter()
    .map(|c| c.chars().any(|ch| ch.is_alphanumeric() || crate::util::is_cjk(ch)))
    .collect();
  if !blanked.iter().any(|b| *b) {
    return Err(HankiError::EmptyCloze { line_no });
  }

  Ok(ClozeLines {
    english: english.to_string(),
    simplified_chunks,
    traditional_chunks,
    pinyin_chunks,
    blanked,
  })
}

/// Render one chunk sequence as an Anki cloze line. Blank indices are
/// shared across the simplified/traditional/pinyin lines so `c3` always
/// hides the same chunk in all three.
fn render_cloze_line(chunks: &[String], blanked: &[bool]) -> String {
  let mut out = String::new();
  let mut n = 0usize;
  for (chunk, &blank) in chunks.iter().zip(blanked) {
    if blank {
      n += 1;
      out.push_str(&format!("{{{{c{}::{}}}}}", n, chunk));
    } else {
      out.push_str(chunk);
    }
  }
  out
}

/// Full note text: English prompt, then simplified, traditional and
/// (when present) pinyin cloze lines, newline-joined.
pub fn render_cloze_lines(lines: &ClozeLines) -> Vec<String> {
  let mut output = vec![
    lines.english.clone(),
    render_cloze_line(&lines.simplified_chunks, &lines.blanked),
    render_cloze_line(&lines.traditional_chunks, &lines.blanked),
  ];
  if lines.pinyin_chunks.iter().any(|c| !c.trim().is_empty()) {
    output.push(render_cloze_line(&lines.pinyin_chunks, &lines.blanked));
  }
  output
}

pub fn render_cloze(lines: &ClozeLines) -> String {
  render_cloze_lines(lines).join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn segmentation_partitions_without_gaps() {
    let text = "这个房间里有五本书。";
    let chunks = segment_text(text, 8);
    assert_eq!(chunks.concat(), text);
    assert!(chunks.iter().all(|c| !c.is_empty()));
    assert!(chunks.iter().all(|c| c.chars().count() <= 8));
  }

  #[test]
  fn punctuation_closes_a_chunk_early() {
    let chunks = segment_text("你好吗？我很好。", 8);
    assert_eq!(chunks, vec!["你好吗？", "我很好。"]);
  }

  #[test]
  fn variable_length_cloze_segmentation() {
    let lines = build_cloze_lines(
      "Can you keep this seat for me?",
      "你可以帮我保留这个座位吗？",
      "你可以幫我保留這個座位嗎？",
      "nǐ kě yǐ bāng wǒ bǎo liú zhè ge zuò wèi ma",
      4,
      1,
    )
    .unwrap();
    assert!(lines.simplified_chunks.len() >= 3);
    assert!(lines.simplified_chunks[..lines.simplified_chunks.len() - 1]
      .iter()
      .all(|c| c.chars().count() <= 4));
    assert_eq!(lines.simplified_chunks.len(), lines.traditional_chunks.len());
    assert_eq!(lines.simplified_chunks.len(), lines.pinyin_chunks.len());
  }

  #[test]
  fn hanzi_and_pinyin_chunk_counts_match() {
    let lines = build_cloze_lines(
      "There are five books in this room.",
      "这个房间里有五本书。",
      "這個房間裡有五本書。",
      "zhè ge fáng jiān lǐ yǒu wǔ běn shū",
      8,
      1,
    )
    .unwrap();
    assert_eq!(lines.simplified_chunks.len(), lines.pinyin_chunks.len());
    // Blank indices land on content chunks, never the terminator.
    for (chunk, blank) in lines.simplified_chunks.iter().zip(&lines.blanked) {
      if chunk == "。" {
        assert!(!blank);
      }
    }
    assert!(lines.blanked.iter().any(|b| *b));
  }

  #[test]
  fn pinyin_shortfall_is_rejected() {
    // Two syllables for four hanzi: later chunks would go silent.
    let err =
      build_cloze_lines("x", "大学很好。", "大學很好。", "dà xué", 2, 1).unwrap_err();
    assert!(matches!(
      err,
      HankiError::ChunkAlignment { expected: 4, got: 2, line_no: 1 }
    ));
  }

  #[test]
  fn pinyin_excess_is_rejected() {
    // Seven syllables for two hanzi: the surplus would fold into one chunk.
    let err =
      build_cloze_lines("x", "大学", "大學", "dà xué hěn hǎo ma ne ba", 2, 1).unwrap_err();
    assert!(matches!(err, HankiError::ChunkAlignment { expected: 2, got: 7, .. }));
  }

  #[test]
  fn slot_markers_do_not_break_syllable_counting() {
    // Ellipsis slots glue onto the syllables; counting must still see two.
    let lines = build_cloze_lines(
      "the more ... the more ...",
      "越……越……",
      "越……越……",
      "yuè……yuè……",
      8,
      1,
    )
    .unwrap();
    assert_eq!(lines.simplified_chunks.len(), 1);
  }

  #[test]
  fn empty_sentence_is_an_error() {
    let err = build_cloze_lines("", "", "", "", 8, 3).unwrap_err();
    assert!(matches!(err, HankiError::EmptyCloze { line_no: 3 }));
  }

  #[test]
  fn rendering_numbers_only_content_chunks() {
    let lines = build_cloze_lines(
      "How are you?",
      "你好吗？",
      "你好嗎？",
      "nǐ hǎo ma",
      8,
      1,
    )
    .unwrap();
    let rendered = render_cloze(&lines);
    assert!(rendered.contains("{{c1::你好吗"));
    assert!(!rendered.contains("{{c2::？}}"));
    assert!(rendered.lines().count() >= 3);
  }

  #[test]
  fn traditional_leftover_folds_into_last_chunk() {
    let chunks = align_chunks("一二三四五", &[2, 2]);
    assert_eq!(chunks, vec!["一二", "三四五"]);
  }

  #[test]
  fn pinyin_leftover_folds_into_last_chunk() {
    let chunks = align_pinyin_chunks("a b c d e", &[2, 2]);
    assert_eq!(chunks, vec!["a b", "c d e"]);
  }
}
