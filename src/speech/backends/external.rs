//! External speech engine driven as a subprocess
//!
//! Used as the preferred ("premium") engine: a separately installed
//! synthesizer such as espeak-ng, launched once per utterance with a fixed
//! named voice. Under WSL the caller must run
//! `platform::ensure_pulse_server` first, on the main thread, so the
//! engine can reach the Windows audio stack.
//!
//! Dependencies:
//! - espeak-ng or a compatible command (install with: sudo apt install espeak-ng)

use crate::speech::synth::{Completion, CompletionSender, SpeechProvider, Utterance};
use crate::{BuddyError, Result};
use log::{debug, error, info};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// espeak-ng's normal speed in words per minute
const NORMAL_SPEED: f32 = 175.0;

/// Subprocess speech engine
pub struct ExternalProvider {
    /// Executable to run
    command: String,

    /// Voice used when the utterance doesn't name one
    voice: String,

    /// Process speaking the current utterance
    current: Arc<Mutex<Option<Child>>>,

    /// Bumped on every cancel so watchers of older utterances report interruption
    generation: Arc<AtomicU64>,
}

impl ExternalProvider {
    /// Check that the engine runs
    ///
    /// Only runs the command once with --version, so it is safe to call
    /// from a loader thread. Fails with `LoadFailure` when the command cannot be run.
    pub fn load(command: &str, voice: &str) -> Result<Self> {
        debug!("Loading external speech engine {}", command);

        Self::check_command(command)?;

        info!("External speech engine {} ready (voice {})", command, voice);

        Ok(Self {
            command: command.to_string(),
            voice: voice.to_string(),
            current: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    fn check_command(command: &str) -> Result<()> {
        match Command::new(command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(BuddyError::LoadFailure(format!(
                "{} --version exited with {}",
                command, status
            ))),
            Err(e) => Err(BuddyError::LoadFailure(format!(
                "{} not found ({}). Install with: sudo apt install espeak-ng",
                command, e
            ))),
        }
    }

    /// Relative rate (1.0 = normal) to words per minute, 80-450
    fn rate_to_speed(rate: f32) -> u16 {
        (NORMAL_SPEED * rate).round().clamp(80.0, 450.0) as u16
    }

    /// Relative pitch (1.0 = normal) to espeak pitch, 0-99
    fn pitch_to_espeak(pitch: f32) -> u8 {
        (50.0 * pitch).round().clamp(0.0, 99.0) as u8
    }

    /// Volume (0-1) to espeak amplitude, where 100 is the engine default
    fn volume_to_amplitude(volume: f32) -> u8 {
        (100.0 * volume).round().clamp(0.0, 200.0) as u8
    }

    fn kill_current(&self) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut child) = current.take() {
            debug!("Killing {} process", self.command);
            match child.kill() {
                Ok(_) => {
                    let _ = child.wait(); // Clean up zombie
                }
                Err(e) => debug!("Failed to kill {} process: {}", self.command, e),
            }
        }
    }

    /// Wait for the utterance's process to exit
    fn watch(
        current: Arc<Mutex<Option<Child>>>,
        generation: Arc<AtomicU64>,
        mine: u64,
        done: CompletionSender,
    ) {
        loop {
            {
                let mut slot = current.lock().unwrap_or_else(|e| e.into_inner());
                if generation.load(Ordering::SeqCst) != mine {
                    done.fail("interrupted");
                    return;
                }
                let Some(child) = slot.as_mut() else {
                    done.fail("interrupted");
                    return;
                };
                match child.try_wait() {
                    Ok(Some(status)) => {
                        slot.take();
                        if status.success() {
                            done.finish();
                        } else {
                            done.fail(format!("speech engine exited with {}", status));
                        }
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        slot.take();
                        done.fail(format!("failed to wait for speech engine: {}", e));
                        return;
                    }
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl SpeechProvider for ExternalProvider {
    fn name(&self) -> &str {
        &self.command
    }

    fn is_speaking(&self) -> Result<bool> {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        Ok(match current.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        })
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.kill_current();
        Ok(())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<Completion> {
        if utterance.text.is_empty() {
            return Ok(Completion::finished());
        }

        self.cancel()?;

        let voice = utterance.voice.as_deref().unwrap_or(&self.voice);
        let mut cmd = Command::new(&self.command);
        cmd.arg("-v").arg(voice);
        cmd.arg("-s").arg(Self::rate_to_speed(utterance.rate).to_string());
        cmd.arg("-p").arg(Self::pitch_to_espeak(utterance.pitch).to_string());
        cmd.arg("-a")
            .arg(Self::volume_to_amplitude(utterance.volume).to_string());
        cmd.arg(&utterance.text);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        debug!("Speaking with {} ({}): {}", self.command, voice, utterance.text);
        let child = cmd.spawn().map_err(|e| {
            error!("Failed to spawn {}: {}", self.command, e);
            BuddyError::Provider(format!("Failed to start {}: {}", self.command, e))
        })?;

        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(child);

        let (done, completion) = Completion::channel();
        let current = Arc::clone(&self.current);
        let generation = Arc::clone(&self.generation);
        let mine = generation.load(Ordering::SeqCst);
        thread::spawn(move || Self::watch(current, generation, mine, done));

        Ok(completion)
    }
}

impl Drop for ExternalProvider {
    fn drop(&mut self) {
        debug!("Shutting down external speech engine");
        self.kill_current();
    }
}
