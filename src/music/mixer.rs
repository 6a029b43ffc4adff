//! Software mixer
//!
//! Renders scheduled tones into a mono sample buffer. The mixer's clock is
//! the number of frames rendered, so it only advances while audio is being
//! produced, like a real output device. `SharedMixer` wraps it for use as an
//! `AudioGraph` from the control side while the audio side renders.

use crate::music::graph::{AudioGraph, Tone, ToneId};
use crate::Result;
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};

/// A tone being rendered
struct Oscillator {
    id: ToneId,
    tone: Tone,
    /// Position in the waveform cycle, [0, 1)
    phase: f32,
}

/// Linear master gain automation
#[derive(Debug, Clone, Copy)]
struct Ramp {
    from: f32,
    to: f32,
    start: f64,
    end: f64,
}

impl Ramp {
    fn value_at(&self, t: f64) -> f32 {
        if t >= self.end || self.end <= self.start {
            return self.to;
        }
        if t <= self.start {
            return self.from;
        }
        let progress = ((t - self.start) / (self.end - self.start)) as f32;
        self.from + (self.to - self.from) * progress
    }
}

pub struct Mixer {
    sample_rate: f32,
    /// Frames rendered so far
    frames: u64,
    suspended: bool,
    master: f32,
    ramp: Option<Ramp>,
    oscillators: Vec<Oscillator>,
    next_id: u64,
}

impl Mixer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frames: 0,
            suspended: false,
            master: 1.0,
            ramp: None,
            oscillators: Vec::new(),
            next_id: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    pub fn master_gain_at(&self, t: f64) -> f32 {
        match &self.ramp {
            Some(ramp) => ramp.value_at(t),
            None => self.master,
        }
    }

    pub fn set_master_gain(&mut self, value: f32) {
        self.master = value;
        self.ramp = None;
    }

    pub fn ramp_master_gain(&mut self, target: f32, end_time: f64) {
        let now = self.current_time();
        let from = self.master_gain_at(now);
        self.master = target;
        self.ramp = Some(Ramp {
            from,
            to: target,
            start: now,
            end: end_time,
        });
    }

    pub fn start_tone(&mut self, tone: Tone) -> ToneId {
        let id = ToneId(self.next_id);
        self.next_id += 1;
        self.oscillators.push(Oscillator {
            id,
            tone,
            phase: 0.0,
        });
        id
    }

    pub fn stop_tone(&mut self, id: ToneId) {
        self.oscillators.retain(|osc| osc.id != id);
    }

    /// Tones not yet finished
    pub fn active_tones(&self) -> usize {
        self.oscillators.len()
    }

    /// Fill `out` with the next `out.len()` mono frames
    ///
    /// While suspended the output is silent and the clock does not move.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.suspended {
            out.fill(0.0);
            return;
        }

        let step = 1.0 / self.sample_rate;
        for sample in out.iter_mut() {
            let t = self.current_time();
            let mut mix = 0.0;
            for osc in self.oscillators.iter_mut() {
                if t < osc.tone.start {
                    continue;
                }
                mix += osc.tone.waveform.sample(osc.phase) * osc.tone.gain_at(t);
                osc.phase = (osc.phase + osc.tone.frequency * step).fract();
            }
            *sample = mix * self.master_gain_at(t);
            self.frames += 1;
        }

        let now = self.current_time();
        let before = self.oscillators.len();
        self.oscillators.retain(|osc| osc.tone.end() > now);
        if self.oscillators.len() != before {
            debug!("{} tones finished", before - self.oscillators.len());
        }
        if matches!(self.ramp, Some(ramp) if now >= ramp.end) {
            self.ramp = None;
        }
    }
}

/// Mixer shared between the control thread and the audio callback
#[derive(Clone)]
pub struct SharedMixer {
    inner: Arc<Mutex<Mixer>>,
}

impl SharedMixer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Mixer::new(sample_rate))),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Mixer> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn render(&self, out: &mut [f32]) {
        self.lock().render(out);
    }

    /// Render and discard `seconds` of audio
    pub fn advance(&self, seconds: f64) {
        let mut mixer = self.lock();
        let frames = (seconds * mixer.sample_rate() as f64).round() as usize;
        let mut scratch = vec![0.0; frames];
        mixer.render(&mut scratch);
    }

    pub fn active_tones(&self) -> usize {
        self.lock().active_tones()
    }
}

impl AudioGraph for SharedMixer {
    fn current_time(&self) -> f64 {
        self.lock().current_time()
    }

    fn is_suspended(&self) -> bool {
        self.lock().is_suspended()
    }

    fn resume(&mut self) -> Result<()> {
        self.lock().set_suspended(false);
        Ok(())
    }

    fn master_gain(&self) -> f32 {
        let mixer = self.lock();
        mixer.master_gain_at(mixer.current_time())
    }

    fn set_master_gain(&mut self, value: f32) {
        self.lock().set_master_gain(value);
    }

    fn ramp_master_gain(&mut self, target: f32, end_time: f64) {
        self.lock().ramp_master_gain(target, end_time);
    }

    fn start_tone(&mut self, tone: Tone) -> Result<ToneId> {
        Ok(self.lock().start_tone(tone))
    }

    fn stop_tone(&mut self, id: ToneId) {
        self.lock().stop_tone(id);
    }
}
