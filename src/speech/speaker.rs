//! Speech orchestrator
//!
//! `Speaker` owns the speech engines and turns tutor events (a new letter,
//! a tapped word, a correct answer) into spoken sequences. Each operation
//! returns only once the audio has finished, and the whole operation holds
//! the speaker's queue, so two sequences never talk over each other.

use crate::clock::Clock;
use crate::speech::loader::PremiumSlot;
use crate::speech::synth::{SpeechProvider, Utterance};
use crate::speech::text::{greeting, normalize};
use crate::speech::voices::{Locale, VoiceCatalog};
use crate::Result;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Praise phrases, one picked at random per celebration
pub const CELEBRATIONS: [&str; 16] = [
    "Yay",
    "Wow",
    "Good job",
    "You did it",
    "So good",
    "Nice work",
    "Well done",
    "That's right",
    "You're awesome",
    "Keep going",
    "You're learning",
    "You're smart",
    "That's great",
    "I'm proud of you",
    "You're amazing",
    "Good for you",
];

/// Gap before each spelled letter after the first
pub const LETTER_GAP: Duration = Duration::from_millis(600);
/// Gap between the spelling and the first full word
pub const SPELLING_GAP: Duration = Duration::from_millis(800);
/// Gap between the two full-word repeats
pub const REPEAT_GAP: Duration = Duration::from_millis(500);

/// Tuning for the orchestrator
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub locale: Locale,
    /// Voice name handed to the preferred engine
    pub premium_voice: String,
    /// Multiplier applied to every rate, for children who need it slower
    pub rate_scale: f32,
    /// Wait after canceling a busy platform engine
    pub settle_delay: Duration,
    /// Wait before canceling a busy platform engine
    pub cancel_lead: Duration,
    /// Pause after the preferred engine finishes
    pub premium_tail: Duration,
    /// Pause after the platform engine finishes
    pub platform_tail: Duration,
    pub voice_poll_attempts: u32,
    pub voice_poll_interval: Duration,
    /// Engines tried per request, including fallbacks
    pub max_attempts: u32,
    /// How long a request waits for the preferred engine to finish loading
    /// when there is no platform engine to speak instead
    pub premium_load_wait: Duration,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            premium_voice: "en-us+f3".to_string(),
            rate_scale: 1.0,
            settle_delay: Duration::from_millis(150),
            cancel_lead: Duration::from_millis(50),
            premium_tail: Duration::from_millis(100),
            platform_tail: Duration::from_millis(50),
            voice_poll_attempts: 20,
            voice_poll_interval: Duration::from_millis(100),
            max_attempts: 2,
            premium_load_wait: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Route {
    Premium,
    Platform,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Premium => write!(f, "preferred engine"),
            Route::Platform => write!(f, "platform engine"),
        }
    }
}

/// Everything guarded by the speech queue
struct Engines {
    premium: PremiumSlot,
    platform: Option<Box<dyn SpeechProvider>>,
    catalog: VoiceCatalog,
    rng: StdRng,
}

/// Speech orchestrator
pub struct Speaker {
    queue: Mutex<Engines>,
    clock: Arc<dyn Clock>,
    settings: SpeechSettings,
}

impl Speaker {
    /// Create a speaker with no engines; it stays silent until some are added
    pub fn new(settings: SpeechSettings, clock: Arc<dyn Clock>) -> Self {
        let catalog = VoiceCatalog::new(settings.locale.clone());
        Self {
            queue: Mutex::new(Engines {
                premium: PremiumSlot::Disabled,
                platform: None,
                catalog,
                rng: StdRng::from_entropy(),
            }),
            clock,
            settings,
        }
    }

    /// Use `provider` as the platform engine; voice selection applies to it
    pub fn with_platform(mut self, mut provider: Box<dyn SpeechProvider>) -> Self {
        let engines = self.queue.get_mut().unwrap_or_else(|e| e.into_inner());
        provider.subscribe_voices_changed(engines.catalog.voices_changed_signal());
        info!("Platform speech engine: {}", provider.name());
        engines.platform = Some(provider);
        self
    }

    /// Use `premium` as the preferred engine, tried before the platform one
    pub fn with_premium(mut self, premium: PremiumSlot) -> Self {
        self.queue
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .premium = premium;
        self
    }

    /// Seed the celebration picker
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.queue.get_mut().unwrap_or_else(|e| e.into_inner()).rng = StdRng::seed_from_u64(seed);
        self
    }

    fn engines(&self) -> MutexGuard<'_, Engines> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            self.clock.sleep(duration);
        }
    }

    /// Speak one utterance and wait for it to finish
    pub fn speak(&self, utterance: Utterance) -> Result<()> {
        let mut engines = self.engines();
        self.speak_queued(&mut engines, utterance)
    }

    /// "[name,] this is the letter L!, L!"
    pub fn announce_letter(&self, letter: &str, child_name: Option<&str>) -> Result<()> {
        let text = format!(
            "{}this is the letter {}!, {}!",
            greeting(child_name),
            letter,
            letter
        );
        let mut engines = self.engines();
        self.speak_queued(&mut engines, Utterance::new(text).rate(0.82).pitch(1.25))
    }

    /// Introduce a word, spell it out letter by letter, then say it twice
    pub fn announce_word(&self, word: &str, letter: &str, child_name: Option<&str>) -> Result<()> {
        let mut engines = self.engines();
        let say = |text: String| Utterance::new(text).rate(0.75).pitch(1.3);

        let intro = format!(
            "{}{} starts with the letter {}! Let's spell it:",
            greeting(child_name),
            word,
            letter
        );
        self.speak_queued(&mut engines, say(intro))?;

        for (i, ch) in word.to_uppercase().chars().enumerate() {
            if i > 0 {
                self.pause(LETTER_GAP);
            }
            self.speak_queued(&mut engines, Utterance::new(ch.to_string()).rate(0.6).pitch(1.3))?;
        }

        self.pause(SPELLING_GAP);
        self.speak_queued(&mut engines, say(format!("{}!", word)))?;
        self.pause(REPEAT_GAP);
        self.speak_queued(&mut engines, say(format!("{}!", word)))
    }

    /// "[name,] <praise>! You're doing amazing!"
    pub fn announce_celebration(&self, child_name: Option<&str>) -> Result<()> {
        let mut engines = self.engines();
        let phrase = CELEBRATIONS[engines.rng.gen_range(0..CELEBRATIONS.len())];
        let text = format!("{}{}! You're doing amazing!", greeting(child_name), phrase);
        self.speak_queued(&mut engines, Utterance::new(text).rate(0.9).pitch(1.35))
    }

    /// Greet the child by name
    pub fn announce_welcome(&self, child_name: &str) -> Result<()> {
        let text = format!(
            "Hi {}! Welcome to alphabet learning! Let's learn letters together!",
            child_name.trim()
        );
        let mut engines = self.engines();
        self.speak_queued(&mut engines, Utterance::new(text).rate(0.85).pitch(1.25))
    }

    /// Try each engine in order until one speaks the utterance
    fn speak_queued(&self, engines: &mut Engines, utterance: Utterance) -> Result<()> {
        let text = normalize(&utterance.text);
        if text.is_empty() {
            return Ok(());
        }
        let rate = utterance.rate * self.settings.rate_scale;
        let utterance = Utterance { text, ..utterance }.rate(rate);

        let platform_ready = engines
            .platform
            .as_ref()
            .map_or(false, |provider| provider.is_available());
        if !platform_ready && engines.premium.is_loading() {
            debug!("No platform engine, waiting for the preferred one to load");
            engines.premium.wait_loaded(self.settings.premium_load_wait);
        }

        let mut attempts = 0;
        let mut last_error = None;

        for route in [Route::Premium, Route::Platform] {
            if attempts >= self.settings.max_attempts {
                break;
            }

            let outcome = match route {
                Route::Premium => match engines.premium.get() {
                    Some(provider) if provider.is_available() => {
                        self.speak_premium(provider.as_mut(), &utterance)
                    }
                    _ => continue,
                },
                Route::Platform => match engines.platform.as_mut() {
                    Some(provider) if provider.is_available() => {
                        self.speak_platform(provider.as_mut(), &mut engines.catalog, &utterance)
                    }
                    _ => continue,
                },
            };
            attempts += 1;

            match outcome {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!("Speech failed on {}: {}", route, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => {
                debug!("No speech engine available, skipping: {}", utterance.text);
                Ok(())
            }
        }
    }

    fn speak_premium(&self, provider: &mut dyn SpeechProvider, utterance: &Utterance) -> Result<()> {
        if provider.is_speaking()? {
            provider.cancel()?;
        }

        let request = utterance
            .clone()
            .voice(Some(self.settings.premium_voice.clone()));
        debug!("Speaking via {}: {}", provider.name(), request.text);
        provider.speak(&request)?.wait()?;

        self.pause(self.settings.premium_tail);
        Ok(())
    }

    fn speak_platform(
        &self,
        provider: &mut dyn SpeechProvider,
        catalog: &mut VoiceCatalog,
        utterance: &Utterance,
    ) -> Result<()> {
        catalog.wait_for_voices(
            provider,
            self.clock.as_ref(),
            self.settings.voice_poll_attempts,
            self.settings.voice_poll_interval,
        );

        if provider.is_speaking()? {
            debug!("{} is busy, canceling current utterance", provider.name());
            self.pause(self.settings.cancel_lead);
            provider.cancel()?;
            self.pause(self.settings.settle_delay);
        }

        let voice = catalog.select_best_voice(provider).map(|v| v.name);
        let request = utterance.clone().voice(voice);
        debug!("Speaking via {}: {}", provider.name(), request.text);
        provider.speak(&request)?.wait()?;

        self.pause(self.settings.platform_tail);
        Ok(())
    }
}
