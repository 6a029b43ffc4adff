//! Application state
//!
//! `State` is the composition root: it owns the configuration, the speech
//! orchestrator and the background music player, and runs lesson steps
//! against them. Nothing here is global; tests build their own instances.

pub mod config;
pub mod letters;
pub mod profile;

use crate::clock::SystemClock;
use crate::music::{default_graph_factory, MelodyPlayer, MelodySynth};
use crate::platform;
use crate::speech::backends::external::ExternalProvider;
use crate::speech::{create_platform_provider, PremiumSlot, Speaker, SpeechProvider};
use crate::Result;
use config::Config;
use letters::Letter;
use log::{info, warn};
use std::sync::Arc;

/// Main application state for the tutor
pub struct State {
    /// Configuration loaded from ~/.alphabuddy.cfg
    pub config: Config,

    /// Everything the tutor says goes through here
    pub speaker: Speaker,

    /// Background music, if enabled
    pub music: Option<MelodyPlayer>,

    /// Child's name, used to personalise speech
    pub child_name: Option<String>,
}

impl State {
    /// Wire up real speech engines and audio output from `config`
    pub fn new(config: Config) -> Self {
        info!("Initializing state from {:?}", config.path());

        let speaker = Self::build_speaker(&config);
        let music = if config.music_enabled() {
            let synth = MelodySynth::new(default_graph_factory()).with_volume(config.music_volume());
            Some(MelodyPlayer::new(synth, config.music_tick()))
        } else {
            info!("Background music disabled");
            None
        };

        Self::from_parts(config, speaker, music)
    }

    /// Assemble state from already-built parts
    pub fn from_parts(config: Config, speaker: Speaker, music: Option<MelodyPlayer>) -> Self {
        let child_name = profile::load(&config);
        Self {
            config,
            speaker,
            music,
            child_name,
        }
    }

    fn build_speaker(config: &Config) -> Speaker {
        // Environment changes must happen here, before engines start threads
        let premium_enabled = config.premium_enabled()
            && match platform::ensure_pulse_server() {
                Ok(()) => true,
                Err(e) => {
                    warn!("{}; preferred speech engine disabled", e);
                    false
                }
            };

        let settings = config.speech_settings();
        let premium_voice = settings.premium_voice.clone();
        let mut speaker = Speaker::new(settings, Arc::new(SystemClock::new()));

        if let Some(engine) = create_platform_provider() {
            speaker = speaker.with_platform(engine);
        }

        if premium_enabled {
            let command = config.premium_command();
            speaker = speaker.with_premium(PremiumSlot::spawn(move || {
                ExternalProvider::load(&command, &premium_voice)
                    .map(|p| Box::new(p) as Box<dyn SpeechProvider>)
            }));
        }

        speaker
    }

    /// Remember the child's name across sessions
    pub fn set_child_name(&mut self, name: &str) -> Result<()> {
        profile::save(&mut self.config, name)?;
        self.child_name = profile::load(&self.config);
        Ok(())
    }

    /// Forget the stored name
    pub fn forget_child_name(&mut self) -> Result<()> {
        profile::clear(&mut self.config)?;
        self.child_name = None;
        Ok(())
    }

    fn name(&self) -> Option<&str> {
        self.child_name.as_deref()
    }

    /// Greet the child, if we know their name
    pub fn welcome(&self) {
        if let Some(name) = self.name() {
            if let Err(e) = self.speaker.announce_welcome(name) {
                warn!("Speech error: {}", e);
            }
        }
    }

    /// Announce a letter, spell its first word and celebrate
    ///
    /// Speech failures are logged and the lesson carries on.
    pub fn teach_letter(&self, letter: &Letter) {
        let upper = letter.uppercase().to_string();

        if let Err(e) = self.speaker.announce_letter(&upper, self.name()) {
            warn!("Speech error: {}", e);
        }

        let word = letter.words[0];
        let spoken = self
            .speaker
            .announce_word(word, &upper, self.name())
            .and_then(|_| self.speaker.announce_celebration(self.name()));
        if let Err(e) = spoken {
            warn!("Speech error: {}", e);
        }
    }

    pub fn start_music(&mut self) {
        if let Some(music) = self.music.as_mut() {
            music.start();
        }
    }

    pub fn stop_music(&mut self) {
        if let Some(music) = self.music.as_mut() {
            music.stop();
        }
    }
}
