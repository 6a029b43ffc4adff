//! Configuration management

use crate::music::player::DEFAULT_TICK;
use crate::music::synth::DEFAULT_VOLUME;
use crate::speech::{Locale, SpeechSettings};
use crate::{BuddyError, Result};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration for the tutor
///
/// Holds speech tuning, music settings and the remembered child's name.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.alphabuddy.cfg by default)
    path: PathBuf,
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from `path`, creating it with defaults if missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| BuddyError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| BuddyError::Config(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| BuddyError::Config(format!("Failed to save config: {}", e)))
    }

    /// Default config file path (~/.alphabuddy.cfg)
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!(".{}.cfg", crate::APP_NAME))
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("locale", "en-US")
            .set("rate_scale", "1.0")
            .set("premium_enabled", "true")
            .set("premium_command", "espeak-ng")
            .set("premium_voice", "en-us+f3")
            .set("settle_delay_ms", "150")
            .set("voice_poll_attempts", "20")
            .set("voice_poll_interval_ms", "100")
            .set("max_attempts", "2")
            .set("premium_load_wait_ms", "2000");

        ini.with_section(Some("music"))
            .set("enabled", "true")
            .set("volume", "0.12")
            .set("tick_ms", "16");

        ini.with_section(Some("child"));

        ini
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Get a float value from config
    pub fn get_float(&self, section: &str, key: &str, default: f32) -> f32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Remove a value from config
    pub fn remove(&mut self, section: &str, key: &str) {
        if let Some(props) = self.ini.section_mut(Some(section)) {
            props.remove(key);
        }
    }

    fn millis(&self, key: &str, default: u64, max: u64) -> Duration {
        let ms = self.get_int("speech", key, default as i64).clamp(0, max as i64);
        Duration::from_millis(ms as u64)
    }

    /// Locale voices are chosen for
    pub fn locale(&self) -> Locale {
        Locale::new(self.get_string("speech", "locale", "en-US"))
    }

    /// Should the external speech engine be tried before the platform one?
    pub fn premium_enabled(&self) -> bool {
        self.get_bool("speech", "premium_enabled", true)
    }

    /// External speech engine command
    pub fn premium_command(&self) -> String {
        self.get_string("speech", "premium_command", "espeak-ng")
    }

    /// Speech tuning for the orchestrator
    pub fn speech_settings(&self) -> SpeechSettings {
        let defaults = SpeechSettings::default();
        SpeechSettings {
            locale: self.locale(),
            premium_voice: self.get_string("speech", "premium_voice", &defaults.premium_voice),
            rate_scale: self.get_float("speech", "rate_scale", 1.0).clamp(0.25, 2.0),
            settle_delay: self.millis("settle_delay_ms", 150, 5_000),
            voice_poll_attempts: self
                .get_int("speech", "voice_poll_attempts", 20)
                .clamp(1, 200) as u32,
            voice_poll_interval: self.millis("voice_poll_interval_ms", 100, 5_000),
            max_attempts: self.get_int("speech", "max_attempts", 2).clamp(1, 10) as u32,
            premium_load_wait: self.millis("premium_load_wait_ms", 2_000, 30_000),
            ..defaults
        }
    }

    /// Play background music?
    pub fn music_enabled(&self) -> bool {
        self.get_bool("music", "enabled", true)
    }

    /// Background music volume (0-1)
    pub fn music_volume(&self) -> f32 {
        self.get_float("music", "volume", DEFAULT_VOLUME).clamp(0.0, 1.0)
    }

    /// Melody scheduling interval
    pub fn music_tick(&self) -> Duration {
        let ms = self
            .get_int("music", "tick_ms", DEFAULT_TICK.as_millis() as i64)
            .clamp(1, 100);
        Duration::from_millis(ms as u64)
    }
}
