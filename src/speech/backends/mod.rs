//! Concrete speech engines

// Platform TTS through the tts crate
#[cfg(feature = "native-speech")]
pub mod native;

// Subprocess engine (espeak-ng or compatible)
pub mod external;
