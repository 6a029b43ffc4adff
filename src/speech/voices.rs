//! Voice catalog
//!
//! Ranks the voices a speech engine offers and picks the one that sounds
//! most like a warm, natural human voice for a child. The ranking is a
//! simple additive score over the voice name and language tag.

use crate::clock::Clock;
use crate::speech::synth::SpeechProvider;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A synthetic voice offered by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 language tag, e.g. "en-US"
    pub language: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// Name fragments of high quality engines (neural, cloud or enhanced voices)
const PREMIUM_MARKERS: &[&str] = &[
    "google",
    "microsoft",
    "amazon",
    "neural",
    "premium",
    "enhanced",
    "wave",
    "wavenet",
];

/// Curated voice names that tend to sound friendly to children
const FRIENDLY_NAMES: &[&str] = &[
    "samantha", "susan", "karen", "anna", "sarah", "victoria", "fiona", "kate", "serena",
    "tessa", "veena", "hazel", "heather", "linda", "aria", "jenny", "zira",
];

const WARM_MARKERS: &[&str] = &["female", "woman", "girl"];

const ROBOTIC_MARKERS: &[&str] = &["robotic", "system", "default"];

const PREMIUM_BONUS: i32 = 100;
const FRIENDLY_BONUS: i32 = 60;
const WARM_BONUS: i32 = 40;
const REGION_BONUS: i32 = 30;
const LANGUAGE_BONUS: i32 = 15;
const ROBOTIC_PENALTY: i32 = 100;

/// Target locale for voice selection, e.g. "en-US"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: String,
}

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Full tag, e.g. "en-US"
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Bare language code, e.g. "en"
    pub fn language(&self) -> &str {
        self.tag.split(['-', '_']).next().unwrap_or(&self.tag)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en-US")
    }
}

/// Score a voice; higher is better
pub fn score_voice(voice: &Voice, locale: &Locale) -> i32 {
    let name = voice.name.to_lowercase();
    let contains_any = |markers: &[&str]| markers.iter().any(|m| name.contains(m));

    let mut score = 0;

    if contains_any(PREMIUM_MARKERS) {
        score += PREMIUM_BONUS;
    }
    // Counted once even if several names match
    if contains_any(FRIENDLY_NAMES) {
        score += FRIENDLY_BONUS;
    }
    if contains_any(WARM_MARKERS) {
        score += WARM_BONUS;
    }

    if voice.language.starts_with(locale.tag()) {
        score += REGION_BONUS;
    } else if voice.language.starts_with(locale.language()) {
        score += LANGUAGE_BONUS;
    }

    if contains_any(ROBOTIC_MARKERS) {
        score -= ROBOTIC_PENALTY;
    }

    score
}

/// Pick the best voice for `locale`
///
/// Only voices in the locale's language are considered, unless there are
/// none, in which case every voice is. Ties go to the voice discovered first.
pub fn select_best<'a>(voices: &'a [Voice], locale: &Locale) -> Option<&'a Voice> {
    let in_language: Vec<&Voice> = voices
        .iter()
        .filter(|v| v.language.starts_with(locale.language()))
        .collect();

    let candidates = if in_language.is_empty() {
        voices.iter().collect()
    } else {
        in_language
    };

    let mut best: Option<(&Voice, i32)> = None;
    for voice in candidates {
        let score = score_voice(voice, locale);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((voice, score)),
        }
    }

    best.map(|(voice, _)| voice)
}

/// Signal raised when an engine's voice list changes
///
/// Cloned into the engine at subscription; the catalog drops its cache the
/// next time it is consulted after the signal was raised.
#[derive(Debug, Clone, Default)]
pub struct VoicesChanged(Arc<AtomicBool>);

impl VoicesChanged {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Read and clear the flag
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Engine-side change detection for voice lists
///
/// For engines without a native voices-changed event: every list the engine
/// reads is compared with the previous one and the subscribed signal is
/// raised when they differ.
#[derive(Default)]
pub struct VoiceWatch {
    signal: Option<VoicesChanged>,
    last: Mutex<Option<Vec<Voice>>>,
}

impl VoiceWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, signal: VoicesChanged) {
        self.signal = Some(signal);
    }

    /// Record a freshly read list; returns whether it changed
    pub fn observe(&self, voices: &[Voice]) -> bool {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let changed = matches!(last.as_deref(), Some(previous) if previous != voices);
        if changed {
            debug!("Engine voice list changed ({} voices)", voices.len());
            if let Some(signal) = &self.signal {
                signal.raise();
            }
        }
        *last = Some(voices.to_vec());
        changed
    }
}

/// Cached view of an engine's voices and the best one among them
pub struct VoiceCatalog {
    locale: Locale,
    voices: Vec<Voice>,
    best: Option<Voice>,
    /// Whether `best` reflects the current `voices`
    ranked: bool,
    /// Polling already ran out once for this list
    exhausted: bool,
    changed: VoicesChanged,
}

impl VoiceCatalog {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            voices: Vec::new(),
            best: None,
            ranked: false,
            exhausted: false,
            changed: VoicesChanged::new(),
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Handle to give to an engine so it can announce voice list changes
    pub fn voices_changed_signal(&self) -> VoicesChanged {
        self.changed.clone()
    }

    /// Drop the cached list and best voice
    pub fn invalidate(&mut self) {
        debug!("Voice list changed, dropping cached voice");
        self.voices.clear();
        self.best = None;
        self.ranked = false;
        self.exhausted = false;
    }

    /// Current voice list, re-polling the engine when the cache is empty or stale
    pub fn list_voices(&mut self, provider: &dyn SpeechProvider) -> &[Voice] {
        if self.changed.take() {
            self.invalidate();
        }
        if self.voices.is_empty() {
            match provider.voices() {
                Ok(voices) => {
                    if !voices.is_empty() {
                        debug!("{} offers {} voices", provider.name(), voices.len());
                    }
                    self.voices = voices;
                    self.ranked = false;
                }
                Err(e) => warn!("Failed to list voices from {}: {}", provider.name(), e),
            }
        }
        &self.voices
    }

    /// Best voice for the catalog's locale, cached until the list changes
    pub fn select_best_voice(&mut self, provider: &dyn SpeechProvider) -> Option<Voice> {
        self.list_voices(provider);
        if !self.ranked && !self.voices.is_empty() {
            self.best = select_best(&self.voices, &self.locale).cloned();
            self.ranked = true;
            if let Some(voice) = &self.best {
                info!(
                    "Selected voice {} ({}), score {}",
                    voice.name,
                    voice.language,
                    score_voice(voice, &self.locale)
                );
            }
        }
        self.best.clone()
    }

    /// Poll until the engine reports at least one voice
    ///
    /// Some engines populate their list asynchronously after startup.
    /// Returns `false` if the list is still empty after `attempts` polls;
    /// later calls then check once without waiting until the list changes.
    pub fn wait_for_voices(
        &mut self,
        provider: &dyn SpeechProvider,
        clock: &dyn Clock,
        attempts: u32,
        interval: Duration,
    ) -> bool {
        if self.exhausted {
            return !self.list_voices(provider).is_empty();
        }
        for attempt in 0..attempts {
            if !self.list_voices(provider).is_empty() {
                return true;
            }
            if attempt + 1 < attempts {
                clock.sleep(interval);
            }
        }
        debug!(
            "No voices from {} after {} polls, using engine default",
            provider.name(),
            attempts
        );
        self.exhausted = true;
        false
    }
}
