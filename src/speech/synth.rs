//! Speech provider abstraction
//!
//! Every text-to-speech engine the tutor can talk through implements
//! `SpeechProvider`. Starting an utterance never blocks; the returned
//! `Completion` resolves exactly once when the engine reports that the
//! audio has finished (or failed).

use crate::speech::voices::{Voice, VoicesChanged};
use crate::{BuddyError, Result};
use log::info;
use std::sync::mpsc::{self, Receiver, Sender};

/// Lowest accepted speaking rate (the range is `(0, 2]`)
pub const MIN_RATE: f32 = 0.1;
pub const MAX_RATE: f32 = 2.0;
pub const MAX_PITCH: f32 = 2.0;

/// One request to vocalize a string
///
/// Parameters outside their ranges are clamped, never rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Speaking rate, 1.0 is the engine's normal speed
    pub rate: f32,
    /// Pitch, 1.0 is the voice's normal pitch
    pub pitch: f32,
    /// Volume in [0, 1]
    pub volume: f32,
    /// Voice name to use; `None` leaves the engine default
    pub voice: Option<String>,
}

impl Utterance {
    pub const DEFAULT_RATE: f32 = 0.85;
    pub const DEFAULT_PITCH: f32 = 1.2;
    pub const DEFAULT_VOLUME: f32 = 1.0;

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: Self::DEFAULT_RATE,
            pitch: Self::DEFAULT_PITCH,
            volume: Self::DEFAULT_VOLUME,
            voice: None,
        }
    }

    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = clamp_or(rate, MIN_RATE, MAX_RATE, Self::DEFAULT_RATE);
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = clamp_or(pitch, 0.0, MAX_PITCH, Self::DEFAULT_PITCH);
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = clamp_or(volume, 0.0, 1.0, Self::DEFAULT_VOLUME);
        self
    }

    pub fn voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

type Outcome = std::result::Result<(), String>;

/// Pending result of a started utterance
pub struct Completion {
    rx: Receiver<Outcome>,
}

/// Provider side of a `Completion`; consumed when the outcome is reported
pub struct CompletionSender {
    tx: Sender<Outcome>,
}

impl Completion {
    /// Create a connected sender/completion pair
    pub fn channel() -> (CompletionSender, Completion) {
        let (tx, rx) = mpsc::channel();
        (CompletionSender { tx }, Completion { rx })
    }

    /// A completion that has already finished successfully
    pub fn finished() -> Self {
        let (tx, completion) = Self::channel();
        tx.finish();
        completion
    }

    /// Block until the provider reports the outcome
    pub fn wait(self) -> Result<()> {
        match self.rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(msg)) => Err(BuddyError::Provider(msg)),
            Err(_) => Err(BuddyError::Provider(
                "speech engine dropped the utterance without finishing".to_string(),
            )),
        }
    }
}

impl CompletionSender {
    /// The utterance was spoken to the end
    pub fn finish(self) {
        // The waiter may have given up; nothing to do then
        let _ = self.tx.send(Ok(()));
    }

    /// The utterance failed or was interrupted
    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.tx.send(Err(reason.into()));
    }
}

/// Text-to-speech engine
pub trait SpeechProvider: Send {
    /// Short engine name for logs
    fn name(&self) -> &str;

    /// Can this engine take requests right now?
    fn is_available(&self) -> bool {
        true
    }

    /// Voices currently offered by the engine (may be empty while loading)
    fn voices(&self) -> Result<Vec<Voice>> {
        Ok(Vec::new())
    }

    /// Register a signal the engine raises when its voice list changes
    fn subscribe_voices_changed(&mut self, _signal: VoicesChanged) {}

    /// Is an utterance currently being spoken?
    fn is_speaking(&self) -> Result<bool>;

    /// Silence the current utterance
    fn cancel(&mut self) -> Result<()>;

    /// Start speaking and return immediately
    fn speak(&mut self, utterance: &Utterance) -> Result<Completion>;
}

/// Create the platform's built-in speech engine, if one is compiled in
/// and initializes on this machine
///
/// Returns `None` when no engine is available; the tutor then stays silent
/// rather than failing.
pub fn create_platform_provider() -> Option<Box<dyn SpeechProvider>> {
    #[cfg(feature = "native-speech")]
    {
        use super::backends::native::NativeProvider;

        info!("Trying native TTS backend...");
        match NativeProvider::new() {
            Ok(provider) => {
                info!("✓ Successfully initialized native TTS backend");
                return Some(Box::new(provider));
            }
            Err(e) => {
                info!("✗ Native TTS backend unavailable: {}", e);
            }
        }
    }

    info!(
        "No platform speech engine for {}; platform speech disabled",
        std::env::consts::OS
    );
    None
}
