//! Noise filter: turns pasted transcript text into filtered utterances.
//!
//! The filter is total: every input line is accounted for as kept, merged
//! into a neighbour, or dropped with a reason (see `LineFate`). Predicates
//! run in a fixed order and the first match wins:
//!   blank → timestamp → URL → greeting/sign-off → symbols-only → kept.
//!
//! Speaker labels ("老师:", "Student:") are stripped before the social
//! predicates so "老师: 你好！" still registers as a greeting. A kept line
//! is merged into its predecessor only when the predecessor looks like an
//! unfinished sentence (no terminal punctuation, and either comma-ended or
//! longer than a standalone term) and the line opens no new turn. Latin-only
//! lines become glosses attached to the nearest Chinese line. Pure function,
//! no side effects, deterministic across re-runs.

use tracing::debug;

use crate::domain::{DropReason, FilteredUnit, LineFate};
use crate::util::{count_cjk, has_cjk};

const TERMINAL_PUNCT: &[char] = &['。', '！', '？', '…', '.', '!', '?'];
const CLAUSE_PUNCT: &[char] = &['，', '、', '；', ',', ';'];

/// Hanzi count above which an unpunctuated line reads as a wrapped
/// sentence rather than a standalone term. Mirrors the classifier's
/// vocab-length threshold.
const SENTENCE_MIN_HANZI: usize = 7;

const GREETINGS: &[&str] = &[
  "hi", "hello", "hey", "你好", "您好", "你们好", "大家好", "老师好", "早上好", "晚上好",
];

const SIGN_OFFS: &[&str] = &[
  "谢谢", "谢谢老师", "再见", "下次见", "拜拜", "晚安", "bye", "goodbye", "thanks",
  "thank you", "see you", "see you next time",
];

struct PendingLine {
  text: String,
  line_no: usize,
  had_label: bool,
}

/// Split transcript text into filtered utterances plus a per-line fate
/// record (same length and order as the input lines).
pub fn filter_lines(text: &str) -> (Vec<FilteredUnit>, Vec<LineFate>) {
  let mut fates: Vec<LineFate> = Vec::new();
  let mut pending: Vec<PendingLine> = Vec::new();

  for (idx, raw) in text.lines().enumerate() {
    let line_no = idx + 1;
    let trimmed = raw.trim();

    if trimmed.is_empty() {
      fates.push(LineFate::Dropped { reason: DropReason::Blank });
      continue;
    }
    if is_timestamp(trimmed) {
      fates.push(LineFate::Dropped { reason: DropReason::Timestamp });
      continue;
    }
    if trimmed.contains("http://") || trimmed.contains("https://") {
      fates.push(LineFate::Dropped { reason: DropReason::Url });
      continue;
    }

    let (body, had_label) = strip_speaker_label(trimmed);
    if body.is_empty() {
      // A bare label ("老师:") carries nothing learnable.
      fates.push(LineFate::Dropped { reason: DropReason::Blank });
      continue;
    }

    match social_kind(body) {
      Some(DropReason::Greeting) => {
        fates.push(LineFate::Dropped { reason: DropReason::Greeting });
        continue;
      }
      Some(DropReason::SignOff) => {
        fates.push(LineFate::Dropped { reason: DropReason::SignOff });
        continue;
      }
      _ => {}
    }

    if is_symbols_only(body) {
      fates.push(LineFate::Dropped { reason: DropReason::SymbolsOnly });
      continue;
    }

    fates.push(LineFate::Kept);
    pending.push(PendingLine { text: body.to_string(), line_no, had_label });
  }

  let units = merge_continuations(pending, &mut fates);
  let units = attach_glosses(units, &mut fates);

  debug!(
    target: "hanki",
    total = fates.len(),
    kept = units.len(),
    "noise filter complete"
  );
  (units, fates)
}

/// "9:41", "09:41:07" alone on a line.
fn is_timestamp(s: &str) -> bool {
  let parts: Vec<&str> = s.split(':').collect();
  if parts.len() < 2 || parts.len() > 3 {
    return false;
  }
  if parts[0].is_empty() || parts[0].len() > 2 || !parts[0].chars().all(|c| c.is_ascii_digit()) {
    return false;
  }
  parts[1..]
    .iter()
    .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit()))
}

/// Strip a leading "name:" / "name：" turn marker. The label must be a
/// short run of letters/hanzi; anything else (ratios, URLs) is left alone.
pub fn strip_speaker_label(line: &str) -> (&str, bool) {
  let colon = line.char_indices().find(|(_, c)| *c == ':' || *c == '：');
  if let Some((pos, c)) = colon {
    let label = &line[..pos];
    let label_len = label.chars().count();
    let label_ok = label_len >= 1 && label_len <= 12 && label.chars().all(char::is_alphabetic);
    if label_ok {
      let rest = &line[pos + c.len_utf8()..];
      return (rest.trim(), true);
    }
  }
  (line, false)
}

/// Greeting vs sign-off detection: strip punctuation, split on clause
/// separators, and require every segment to match. "谢谢，再见！" drops as
/// a sign-off; "你好，我叫王明。" stays because the second clause is content.
fn social_kind(body: &str) -> Option<DropReason> {
  let cleaned: String = body
    .chars()
    .filter(|c| !matches!(c, '！' | '!' | '。' | '.' | '？' | '?' | '~' | '～'))
    .collect();
  let segments: Vec<String> = cleaned
    .split(|c: char| matches!(c, '，' | ',' | '、' | '；' | ';') || c.is_whitespace())
    .map(|s| s.trim().to_lowercase())
    .filter(|s| !s.is_empty())
    .collect();
  if segments.is_empty() {
    return None;
  }
  // Multi-word English pleasantries ("thank you") arrive as one segment
  // once whitespace splitting is undone, so check the joined form too.
  let joined = segments.join(" ");
  if SIGN_OFFS.contains(&joined.as_str()) {
    return Some(DropReason::SignOff);
  }
  if GREETINGS.contains(&joined.as_str()) {
    return Some(DropReason::Greeting);
  }
  let all_social = segments
    .iter()
    .all(|s| GREETINGS.contains(&s.as_str()) || SIGN_OFFS.contains(&s.as_str()));
  if !all_social {
    return None;
  }
  if segments.iter().any(|s| SIGN_OFFS.contains(&s.as_str())) {
    Some(DropReason::SignOff)
  } else {
    Some(DropReason::Greeting)
  }
}

fn is_symbols_only(body: &str) -> bool {
  !body.chars().any(|c| c.is_alphanumeric()) && !has_cjk(body)
}

fn ends_with_any(s: &str, set: &[char]) -> bool {
  s.chars().last().map(|c| set.contains(&c)).unwrap_or(false)
}

fn is_latin_only(s: &str) -> bool {
  !s.is_empty()
    && s.chars().all(|c| {
      c.is_ascii_alphanumeric() || matches!(c, ' ' | '\'' | '-' | '.' | ',' | '!' | '?')
    })
}

/// Merge criterion: the previous unit reads as an unfinished sentence and
/// the current line opens no new turn. Short unpunctuated lines (vocab
/// lists) never absorb or get absorbed.
fn merge_continuations(pending: Vec<PendingLine>, fates: &mut [LineFate]) -> Vec<FilteredUnit> {
  let mut units: Vec<FilteredUnit> = Vec::new();
  for p in pending {
    let mergeable_prev = units.last().map(|u| unfinished_sentence(&u.text)).unwrap_or(false);
    if mergeable_prev && !p.had_label && !is_latin_only(&p.text) {
      let prev = units.last_mut().unwrap();
      fates[p.line_no - 1] = LineFate::Merged { into_line: prev.line_no };
      join_utterance(&mut prev.text, &p.text);
      prev.merged = true;
      continue;
    }
    units.push(FilteredUnit {
      text: p.text,
      line_no: p.line_no,
      gloss: None,
      merged: false,
    });
  }
  units
}

fn unfinished_sentence(text: &str) -> bool {
  if ends_with_any(text, TERMINAL_PUNCT) {
    return false;
  }
  ends_with_any(text, CLAUSE_PUNCT) || count_cjk(text) >= SENTENCE_MIN_HANZI
}

/// No separator between CJK boundaries, a single space otherwise.
fn join_utterance(prev: &mut String, next: &str) {
  let prev_cjk = prev.chars().last().map(|c| !c.is_ascii()).unwrap_or(false);
  let next_cjk = next.chars().next().map(|c| !c.is_ascii()).unwrap_or(false);
  if !(prev_cjk && next_cjk) {
    prev.push(' ');
  }
  prev.push_str(next);
}

/// Latin-only lines are glosses: attach each to the nearest Chinese unit
/// (backward first, then forward), then drop everything without hanzi.
fn attach_glosses(units: Vec<FilteredUnit>, fates: &mut [LineFate]) -> Vec<FilteredUnit> {
  let mut units = units;
  let latin_idx: Vec<usize> = units
    .iter()
    .enumerate()
    .filter(|(_, u)| is_latin_only(&u.text) && !has_cjk(&u.text))
    .map(|(i, _)| i)
    .collect();

  for &i in &latin_idx {
    let target = nearest_chinese(&units, i);
    match target {
      Some(t) => {
        let gloss = units[i].text.clone();
        let to_line = units[t].line_no;
        units[t].gloss = Some(gloss);
        fates[units[i].line_no - 1] =
          LineFate::Dropped { reason: DropReason::AttachedAsGloss { to_line } };
      }
      None => {
        fates[units[i].line_no - 1] = LineFate::Dropped { reason: DropReason::NoChinese };
      }
    }
  }

  units.retain(|u| {
    if has_cjk(&u.text) {
      true
    } else {
      // Latin glosses were re-fated above; anything else without hanzi
      // carries nothing learnable.
      if matches!(fates[u.line_no - 1], LineFate::Kept) {
        fates[u.line_no - 1] = LineFate::Dropped { reason: DropReason::NoChinese };
      }
      false
    }
  });
  units
}

fn nearest_chinese(units: &[FilteredUnit], idx: usize) -> Option<usize> {
  (0..idx).rev().find(|&i| has_cjk(&units[i].text))
    .or_else(|| (idx + 1..units.len()).find(|&i| has_cjk(&units[i].text)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kept_texts(text: &str) -> Vec<String> {
    filter_lines(text).0.into_iter().map(|u| u.text).collect()
  }

  #[test]
  fn filter_is_total() {
    let input = "9:41\nhttps://example.com/x\n你好！\n这个房间里有五本书。\n";
    let (_, fates) = filter_lines(input);
    assert_eq!(fates.len(), 4);
    assert_eq!(fates[0], LineFate::Dropped { reason: DropReason::Timestamp });
    assert_eq!(fates[1], LineFate::Dropped { reason: DropReason::Url });
    assert_eq!(fates[2], LineFate::Dropped { reason: DropReason::Greeting });
    assert_eq!(fates[3], LineFate::Kept);
  }

  #[test]
  fn greeting_and_signoff_dropped_even_with_labels() {
    let units = kept_texts("老师: 你好！\n学生: 大学怎么说？\n老师: 大学 means university. 谢谢，再见！");
    // The trailing sign-off rides on a content line, so that line stays.
    assert_eq!(units.len(), 2);
    assert_eq!(units[0], "大学怎么说？");
  }

  #[test]
  fn combined_signoff_line_dropped() {
    let (units, fates) = filter_lines("谢谢，再见！");
    assert!(units.is_empty());
    assert_eq!(fates[0], LineFate::Dropped { reason: DropReason::SignOff });
  }

  #[test]
  fn greeting_with_content_survives() {
    let units = kept_texts("你好，我叫王明。");
    assert_eq!(units.len(), 1);
  }

  #[test]
  fn latin_gloss_attached_to_previous_chinese() {
    let (units, fates) = filter_lines("书房\nstudy\n微积分");
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].text, "书房");
    assert_eq!(units[0].gloss.as_deref(), Some("study"));
    assert_eq!(units[1].text, "微积分");
    assert_eq!(units[1].gloss, None);
    assert_eq!(
      fates[1],
      LineFate::Dropped { reason: DropReason::AttachedAsGloss { to_line: 1 } }
    );
  }

  #[test]
  fn gloss_attaches_forward_when_nothing_precedes() {
    let (units, _) = filter_lines("calculus\n微积分");
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].gloss.as_deref(), Some("calculus"));
  }

  #[test]
  fn wrapped_sentence_merges_into_one_utterance() {
    let (units, fates) = filter_lines("我昨天去了一家新开的饭馆，\n菜做得很好吃。");
    assert_eq!(units.len(), 1);
    assert!(units[0].merged);
    assert_eq!(units[0].text, "我昨天去了一家新开的饭馆，菜做得很好吃。");
    assert_eq!(fates[1], LineFate::Merged { into_line: 1 });
  }

  #[test]
  fn vocab_lines_do_not_merge() {
    let units = kept_texts("书房\n微积分\n座位");
    assert_eq!(units.len(), 3);
  }

  #[test]
  fn new_turn_marker_blocks_merge() {
    let units = kept_texts("我昨天去了一家新开的饭馆，\n老师: 菜做得很好吃。");
    assert_eq!(units.len(), 2);
  }

  #[test]
  fn timestamps_and_symbols_dropped() {
    let (units, fates) = filter_lines("09:41:07\n👍👍\n！！！");
    assert!(units.is_empty());
    assert!(fates.iter().all(|f| matches!(f, LineFate::Dropped { .. })));
  }
}
