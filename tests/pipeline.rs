//! End-to-end pipeline scenarios: transcript text in, CSV files out.

use std::fs;
use std::io::Write;

use hanki::audio::NullAudioProvider;
use hanki::builder::build_from_text;
use hanki::classify::Classifier;
use hanki::config::BuildConfig;
use hanki::domain::LineFate;
use hanki::error::HankiError;
use hanki::known_terms::KnownTermSet;

fn config(seed: Option<u64>) -> BuildConfig {
  BuildConfig { seed, ..BuildConfig::default() }
}

#[tokio::test]
async fn known_term_lesson_produces_no_cards() {
  let dir = tempfile::tempdir().unwrap();
  let mut terms = tempfile::NamedTempFile::new().unwrap();
  write!(terms, "# already learned\n大学\n").unwrap();
  let known = KnownTermSet::load_or_empty(Some(terms.path()));

  let text = "老师: 你好！\n学生: 大学怎么说？\n老师: 大学 means university. 谢谢，再见！";
  let result = build_from_text(
    text,
    &Classifier::Rules,
    &known,
    &config(None),
    &NullAudioProvider,
    dir.path(),
  )
  .await
  .unwrap();

  assert_eq!(result.vocab_count, 0);
  assert_eq!(result.cloze_count, 0);
  // The greeting was dropped, the content lines were kept, and the
  // suppression shows up in the audit trail.
  assert_eq!(result.line_fates.len(), 3);
  assert!(matches!(result.line_fates[0], LineFate::Dropped { .. }));
  assert!(result.diagnostics.iter().any(|d| d.stage == "known_terms"));

  let vocab_csv = fs::read_to_string(dir.path().join("vocab_cards.csv")).unwrap();
  assert_eq!(vocab_csv.lines().count(), 1); // header only
}

#[tokio::test]
async fn sentence_becomes_one_aligned_cloze_card() {
  let dir = tempfile::tempdir().unwrap();
  let result = build_from_text(
    "这个房间里有五本书。",
    &Classifier::Rules,
    &KnownTermSet::default(),
    &config(None),
    &NullAudioProvider,
    dir.path(),
  )
  .await
  .unwrap();

  assert_eq!(result.vocab_count, 0);
  assert_eq!(result.cloze_count, 1);

  let cloze_csv = fs::read_to_string(dir.path().join("cloze_cards.csv")).unwrap();
  assert!(cloze_csv.starts_with("Text\r\n"));
  // The note embeds simplified, traditional, and pinyin cloze lines with
  // the same number of blanks on each.
  let note = cloze_csv.trim_start_matches("Text\r\n");
  let simplified_blanks = note.lines().nth(1).unwrap().matches("{{c").count();
  let pinyin_blanks = note.lines().nth(3).unwrap().matches("{{c").count();
  assert!(simplified_blanks >= 1);
  assert_eq!(simplified_blanks, pinyin_blanks);
}

#[tokio::test]
async fn all_noise_input_is_a_fatal_empty_input() {
  let dir = tempfile::tempdir().unwrap();
  let err = build_from_text(
    "你好！\n9:41\n谢谢，再见！",
    &Classifier::Rules,
    &KnownTermSet::default(),
    &config(None),
    &NullAudioProvider,
    dir.path(),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, HankiError::EmptyInput));
  // All-or-nothing emission: nothing was written.
  assert!(!dir.path().join("vocab_cards.csv").exists());
}

#[tokio::test]
async fn identical_inputs_produce_byte_identical_artifacts() {
  let text = "书房\nstudy\n微积分\n这个房间里有五本书。\n太咸";
  let run = |dir: std::path::PathBuf| async move {
    build_from_text(
      text,
      &Classifier::Rules,
      &KnownTermSet::default(),
      &config(Some(42)),
      &NullAudioProvider,
      &dir,
    )
    .await
    .unwrap();
    (
      fs::read(dir.join("vocab_cards.csv")).unwrap(),
      fs::read(dir.join("cloze_cards.csv")).unwrap(),
    )
  };

  let dir_a = tempfile::tempdir().unwrap();
  let dir_b = tempfile::tempdir().unwrap();
  let (vocab_a, cloze_a) = run(dir_a.path().to_path_buf()).await;
  let (vocab_b, cloze_b) = run(dir_b.path().to_path_buf()).await;
  assert_eq!(vocab_a, vocab_b);
  assert_eq!(cloze_a, cloze_b);
}

#[tokio::test]
async fn glossed_vocab_lands_in_vocab_csv_with_english_side() {
  let dir = tempfile::tempdir().unwrap();
  let result = build_from_text(
    "书房\nstudy",
    &Classifier::Rules,
    &KnownTermSet::default(),
    &config(None),
    &NullAudioProvider,
    dir.path(),
  )
  .await
  .unwrap();

  assert_eq!(result.vocab_count, 1);
  let vocab_csv = fs::read_to_string(dir.path().join("vocab_cards.csv")).unwrap();
  let row = vocab_csv.lines().nth(1).unwrap();
  assert!(row.starts_with("study,"));
  assert!(row.contains("书房"));
}

#[tokio::test]
async fn every_line_is_accounted_for() {
  let text = "9:41\n你好！\n书房\nstudy\n我昨天去了一家新开的饭馆，\n菜做得很好吃。\n";
  let dir = tempfile::tempdir().unwrap();
  let result = build_from_text(
    text,
    &Classifier::Rules,
    &KnownTermSet::default(),
    &config(None),
    &NullAudioProvider,
    dir.path(),
  )
  .await
  .unwrap();

  assert_eq!(result.line_fates.len(), 6);
  let kept = result.line_fates.iter().filter(|f| matches!(f, LineFate::Kept)).count();
  let merged = result.line_fates.iter().filter(|f| matches!(f, LineFate::Merged { .. })).count();
  let dropped = result
    .line_fates
    .iter()
    .filter(|f| matches!(f, LineFate::Dropped { .. }))
    .count();
  assert_eq!(kept + merged + dropped, 6);
  assert_eq!(merged, 1);
}
