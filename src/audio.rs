//! Audio boundary: deterministic filenames and the `[sound:…]` tag.
//!
//! Speech synthesis itself is an external collaborator; this crate only
//! fixes the naming contract (content-hashed, so re-runs reuse files).
//! `HashNamedAudioProvider` applies that contract for audio-enabled
//! builds, `NullAudioProvider` serves audio-less ones, and a real
//! synthesizer implements `AudioProvider` to write the files it names.

use sha2::{Digest, Sha256};

pub trait AudioProvider {
  /// Produce (or locate) audio for `text` and return its filename,
  /// or an empty string when no audio is attached.
  fn create_audio(&self, text: &str) -> std::io::Result<String>;
}

/// No-op provider: cards carry no audio tag.
pub struct NullAudioProvider;

impl AudioProvider for NullAudioProvider {
  fn create_audio(&self, _text: &str) -> std::io::Result<String> {
    Ok(String::new())
  }
}

/// Names audio files by content hash without synthesizing them; the
/// external synthesizer fills in the named files afterwards, and cards
/// reference them immediately.
pub struct HashNamedAudioProvider;

impl AudioProvider for HashNamedAudioProvider {
  fn create_audio(&self, text: &str) -> std::io::Result<String> {
    Ok(deterministic_audio_filename(text))
  }
}

/// Stable, content-derived filename: identical text always maps to the
/// same file, so repeated imports never duplicate audio.
pub fn deterministic_audio_filename(text: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(text.trim().as_bytes());
  let digest = hasher.finalize();
  let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
  format!("audio_{}.mp3", hex)
}

/// Render the Anki sound tag for a filename, empty in = empty out.
pub fn sound_tag(filename: &str) -> String {
  if filename.is_empty() {
    String::new()
  } else {
    format!("[sound:{}]", filename)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn filenames_are_deterministic_and_trim_insensitive() {
    let a = deterministic_audio_filename("水瓶");
    let b = deterministic_audio_filename("  水瓶  ");
    assert_eq!(a, b);
    assert!(a.starts_with("audio_"));
    assert!(a.ends_with(".mp3"));
    assert_eq!(a.len(), "audio_".len() + 12 + ".mp3".len());
  }

  #[test]
  fn null_provider_yields_no_tag() {
    let name = NullAudioProvider.create_audio("水瓶").unwrap();
    assert_eq!(sound_tag(&name), "");
    assert_eq!(sound_tag("audio_ab.mp3"), "[sound:audio_ab.mp3]");
  }

  #[test]
  fn hash_named_provider_names_by_content() {
    let name = HashNamedAudioProvider.create_audio("水瓶").unwrap();
    assert_eq!(name, deterministic_audio_filename("水瓶"));
    assert_eq!(sound_tag(&name), format!("[sound:{}]", name));
  }
}
