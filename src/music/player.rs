//! Drives a `MelodySynth` from a background thread
//!
//! The scheduling loop ticks the synth at a fixed interval, independent of
//! any rendering cadence. There is at most one loop at a time, and `stop`
//! waits for it to exit, so an idle player never has a pending note trigger.

use crate::music::synth::MelodySynth;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default scheduling interval, about one display refresh
pub const DEFAULT_TICK: Duration = Duration::from_millis(16);

struct SchedulingLoop {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct MelodyPlayer {
    synth: Arc<Mutex<MelodySynth>>,
    tick: Duration,
    scheduler: Option<SchedulingLoop>,
}

impl MelodyPlayer {
    pub fn new(synth: MelodySynth, tick: Duration) -> Self {
        Self {
            synth: Arc::new(Mutex::new(synth)),
            tick,
            scheduler: None,
        }
    }

    fn synth(&self) -> MutexGuard<'_, MelodySynth> {
        lock(&self.synth)
    }

    /// Start the music (or resume a suspended device if already playing)
    pub fn start(&mut self) {
        let playing = {
            let mut synth = self.synth();
            synth.start();
            synth.is_playing()
        };
        if !playing {
            return;
        }

        if let Some(scheduler) = &self.scheduler {
            if !scheduler.handle.is_finished() {
                return;
            }
        }
        self.join_scheduler();

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let synth = Arc::clone(&self.synth);
        let tick = self.tick;

        let spawned = thread::Builder::new()
            .name("alphabuddy-melody".to_string())
            .spawn(move || {
                debug!("Melody scheduling loop started");
                while flag.load(Ordering::SeqCst) {
                    {
                        let mut synth = lock(&synth);
                        if !synth.is_playing() {
                            break;
                        }
                        synth.tick();
                    }
                    thread::sleep(tick);
                }
                debug!("Melody scheduling loop exited");
            });

        match spawned {
            Ok(handle) => self.scheduler = Some(SchedulingLoop { running, handle }),
            Err(e) => {
                warn!("Failed to start melody scheduling loop: {}", e);
                self.synth().stop();
            }
        }
    }

    /// Stop the music and wait for the scheduling loop to exit
    pub fn stop(&mut self) {
        self.synth().stop();
        self.join_scheduler();
    }

    fn join_scheduler(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.running.store(false, Ordering::SeqCst);
            if scheduler.handle.join().is_err() {
                warn!("Melody scheduling loop panicked");
            }
        }
    }

    pub fn set_volume(&self, volume: f32) {
        self.synth().set_volume(volume);
    }

    pub fn is_playing(&self) -> bool {
        self.synth().is_playing()
    }

    /// Is a scheduling loop running?
    pub fn is_scheduling(&self) -> bool {
        self.scheduler
            .as_ref()
            .map(|s| !s.handle.is_finished())
            .unwrap_or(false)
    }

    /// Inspect the synth, e.g. its pattern position
    pub fn with_synth<R>(&self, f: impl FnOnce(&MelodySynth) -> R) -> R {
        let synth = self.synth();
        f(&*synth)
    }
}

impl Drop for MelodyPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(synth: &Mutex<MelodySynth>) -> MutexGuard<'_, MelodySynth> {
    synth.lock().unwrap_or_else(|e| e.into_inner())
}
