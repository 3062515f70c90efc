//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// True if unicode char belongs to CJK ranges.
/// Used to decide whether a line carries any learnable Chinese at all.
pub fn is_cjk(ch: char) -> bool {
  (ch >= '\u{4E00}' && ch <= '\u{9FFF}')
    || (ch >= '\u{3400}' && ch <= '\u{4DBF}')
    || (ch >= '\u{20000}' && ch <= '\u{2A6DF}')
    || (ch >= '\u{2A700}' && ch <= '\u{2B73F}')
    || (ch >= '\u{2B740}' && ch <= '\u{2B81F}')
    || (ch >= '\u{2B820}' && ch <= '\u{2CEAF}')
    || (ch >= '\u{F900}' && ch <= '\u{FAFF}')
}

/// True if the text contains at least one Han character.
pub fn has_cjk(text: &str) -> bool {
  text.chars().any(is_cjk)
}

/// Count Han characters in a string.
pub fn count_cjk(text: &str) -> usize {
  text.chars().filter(|c| is_cjk(*c)).count()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_fills_all_keys() {
    let out = fill_template("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x and y and x");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    // 大 is three bytes; a cut inside it backs up to the boundary.
    let out = trunc_for_log("大学大学", 4);
    assert!(out.starts_with("大"));
    assert!(out.contains("12 bytes total"));
  }

  #[test]
  fn cjk_detection() {
    assert!(is_cjk('学'));
    assert!(!is_cjk('a'));
    assert!(has_cjk("大学 means university"));
    assert_eq!(count_cjk("大学abc！"), 2);
  }
}
