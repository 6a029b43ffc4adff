//! Background melody synthesizer
//!
//! `MelodySynth` is the Idle/Playing state machine. It doesn't own a timer:
//! whoever drives it (see `MelodyPlayer`) calls `tick()` regularly, and each
//! tick checks whether the next note of the pattern is due on the audio
//! graph's clock.

use crate::music::graph::{AudioGraph, GraphFactory, Tone, ToneId, Waveform};
use crate::music::melody::{next_note_index, note_for_step, NOTE_DURATION, PATTERN, TRIGGER_WINDOW};
use log::{debug, info, warn};

/// Default master volume, quiet enough to sit under speech
pub const DEFAULT_VOLUME: f32 = 0.12;

/// Attack and release of every note, seconds
const NOTE_FADE: f64 = 0.05;

/// Fade-out of the master gain on stop, seconds
const STOP_FADE: f64 = 0.3;

/// How long after its stop time a tone is forgotten
const CLEANUP_MARGIN: f64 = 0.1;

/// Layers of one note: waveform, frequency ratio, peak amplitude
const LAYERS: [(Waveform, f32, f32); 3] = [
    // melody
    (Waveform::Sine, 1.0, 0.3),
    // perfect fifth
    (Waveform::Triangle, 1.5, 0.2),
    // octave below
    (Waveform::Sine, 0.5, 0.15),
];

/// A sounding tone and the graph time it can be forgotten
struct ActiveTone {
    id: ToneId,
    release_at: f64,
}

pub struct MelodySynth {
    factory: GraphFactory,
    graph: Option<Box<dyn AudioGraph>>,
    volume: f32,
    note_duration: f64,
    playing: bool,
    pattern_index: usize,
    /// Graph time pattern step 0 is due
    anchor: f64,
    active: Vec<ActiveTone>,
}

impl MelodySynth {
    /// The graph is opened through `factory` the first time music starts
    pub fn new(factory: GraphFactory) -> Self {
        Self {
            factory,
            graph: None,
            volume: DEFAULT_VOLUME,
            note_duration: NOTE_DURATION,
            playing: false,
            pattern_index: 0,
            anchor: 0.0,
            active: Vec::new(),
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.set_volume(volume);
        self
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Tones started and not yet cleaned up
    pub fn active_tones(&self) -> usize {
        self.active.len()
    }

    fn ensure_graph(&mut self) -> Option<&mut Box<dyn AudioGraph>> {
        if self.graph.is_none() {
            match (self.factory)() {
                Ok(graph) => {
                    info!("Audio graph opened");
                    self.graph = Some(graph);
                }
                Err(e) => {
                    warn!("Background music unavailable: {}", e);
                    return None;
                }
            }
        }
        self.graph.as_mut()
    }

    /// Start playing from the first note
    ///
    /// Already playing: only resumes a suspended device. Without an audio
    /// device this does nothing and the synth stays idle.
    pub fn start(&mut self) {
        let already_playing = self.playing;
        let volume = self.volume;

        let Some(graph) = self.ensure_graph() else {
            return;
        };

        if graph.is_suspended() {
            if let Err(e) = graph.resume() {
                warn!("Failed to resume audio device: {}", e);
            }
        }

        if already_playing {
            return;
        }

        // Undo the fade-out left by a previous stop
        graph.set_master_gain(volume);
        let now = graph.current_time();

        self.playing = true;
        self.pattern_index = 0;
        self.anchor = now;
        info!("Background music started");
    }

    /// Silence everything and return to idle
    pub fn stop(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;

        if let Some(graph) = self.graph.as_mut() {
            for tone in self.active.drain(..) {
                graph.stop_tone(tone.id);
            }
            let now = graph.current_time();
            graph.ramp_master_gain(0.0, now + STOP_FADE);
        }
        self.active.clear();
        info!("Background music stopped");
    }

    /// Clamp to [0, 1] and apply immediately
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(graph) = self.graph.as_mut() {
            graph.set_master_gain(self.volume);
        }
    }

    /// Scheduling check: forget finished tones and play the next note if due
    pub fn tick(&mut self) {
        if !self.playing {
            return;
        }
        let Some(graph) = self.graph.as_ref() else {
            return;
        };

        let now = graph.current_time();
        self.active.retain(|tone| tone.release_at > now);

        let elapsed = now - self.anchor;
        let due_at = self.pattern_index as f64 * self.note_duration;
        let due =
            next_note_index(elapsed, PATTERN.len(), self.note_duration) == Some(self.pattern_index);

        if !due {
            if elapsed < due_at + TRIGGER_WINDOW {
                return;
            }
            // Missed the window (stalled driver); pick up from this note
            debug!("Melody tick late by {:.3}s, re-anchoring", elapsed - due_at);
            self.anchor = now - due_at;
        }

        let note = note_for_step(self.pattern_index, self.note_duration);
        self.play_note(note.frequency, note.duration);

        self.pattern_index += 1;
        if self.pattern_index >= PATTERN.len() {
            self.pattern_index = 0;
            self.anchor += PATTERN.len() as f64 * self.note_duration;
        }
    }

    /// Play one note as three layered tones
    ///
    /// If the graph refuses a layer the whole note is dropped.
    pub fn play_note(&mut self, frequency: f32, duration: f64) {
        let Some(graph) = self.graph.as_mut() else {
            return;
        };

        let now = graph.current_time();
        let mut started = Vec::with_capacity(LAYERS.len());

        for (waveform, ratio, peak) in LAYERS {
            let tone = Tone {
                waveform,
                frequency: frequency * ratio,
                peak,
                start: now,
                duration,
                fade: NOTE_FADE,
            };
            match graph.start_tone(tone) {
                Ok(id) => started.push(id),
                Err(e) => {
                    warn!("Dropped note {:.2} Hz: {}", frequency, e);
                    for id in started {
                        graph.stop_tone(id);
                    }
                    return;
                }
            }
        }

        debug!("Note {:.2} Hz for {:.2}s", frequency, duration);
        let release_at = now + duration + CLEANUP_MARGIN;
        self.active
            .extend(started.into_iter().map(|id| ActiveTone { id, release_at }));
    }
}
