//! Seeded numeral draws for measure-word examples.
//!
//! Cards never show Arabic digits: a draw yields the Chinese glyph
//! (一..十) plus its pinyin and English word. For a fixed seed and a
//! fixed sequence of draw calls the output is bit-for-bit reproducible,
//! which keeps re-imports from churning unrelated example sentences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One numeral substitution event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumeralDraw {
  pub value: u8,
  pub glyph: &'static str,
  pub pinyin: &'static str,
  pub english: &'static str,
}

const NUMERALS: [NumeralDraw; 10] = [
  NumeralDraw { value: 1, glyph: "一", pinyin: "yī", english: "One" },
  NumeralDraw { value: 2, glyph: "二", pinyin: "èr", english: "Two" },
  NumeralDraw { value: 3, glyph: "三", pinyin: "sān", english: "Three" },
  NumeralDraw { value: 4, glyph: "四", pinyin: "sì", english: "Four" },
  NumeralDraw { value: 5, glyph: "五", pinyin: "wǔ", english: "Five" },
  NumeralDraw { value: 6, glyph: "六", pinyin: "liù", english: "Six" },
  NumeralDraw { value: 7, glyph: "七", pinyin: "qī", english: "Seven" },
  NumeralDraw { value: 8, glyph: "八", pinyin: "bā", english: "Eight" },
  NumeralDraw { value: 9, glyph: "九", pinyin: "jiǔ", english: "Nine" },
  NumeralDraw { value: 10, glyph: "十", pinyin: "shí", english: "Ten" },
];

/// Single sequential consumer; never shared across threads.
pub struct NumeralRng {
  rng: StdRng,
}

impl NumeralRng {
  /// Seeded for reproducible runs; entropy-seeded otherwise (draws are
  /// then unpredictable but still never Arabic digits).
  pub fn new(seed: Option<u64>) -> Self {
    let rng = match seed {
      Some(s) => StdRng::seed_from_u64(s),
      None => StdRng::from_entropy(),
    };
    Self { rng }
  }

  pub fn draw(&mut self) -> NumeralDraw {
    let n: usize = self.rng.gen_range(1..=10);
    NUMERALS[n - 1]
  }
}
