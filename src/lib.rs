//! hanki · lesson transcript → Anki card builder.
//!
//! Deterministic pipeline: noise filtering, rule (or remote)
//! classification, known-terms gating, pinyin-aligned cloze chunking,
//! seeded numeral examples, CSV + manifest output.

pub mod assemble;
pub mod audio;
pub mod builder;
pub mod classify;
pub mod cloze;
pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
pub mod known_terms;
pub mod numerals;
pub mod pinyin_text;
pub mod remote;
pub mod telemetry;
pub mod util;
pub mod writer;
