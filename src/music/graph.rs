//! Tone generation interface
//!
//! An `AudioGraph` is the output side of the synthesizer: a clock, a master
//! gain feeding the device, and a set of scheduled tones mixed into it.

use crate::Result;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    /// Pure and soft
    Sine,
    /// Weak odd harmonics, warmer than a sine
    Triangle,
}

impl Waveform {
    /// Sample at `phase` in [0, 1)
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * std::f32::consts::TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// A tone scheduled on the graph clock
///
/// The envelope rises linearly from 0 to `peak` over `fade` seconds, holds,
/// then falls back to 0 at `start + duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub frequency: f32,
    pub peak: f32,
    /// Graph time the tone starts, seconds
    pub start: f64,
    pub duration: f64,
    pub fade: f64,
}

impl Tone {
    /// Graph time the tone stops
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Envelope gain at graph time `t`
    pub fn gain_at(&self, t: f64) -> f32 {
        let local = t - self.start;
        if local < 0.0 || local >= self.duration {
            return 0.0;
        }
        if self.fade <= 0.0 {
            return self.peak;
        }
        let rise = local / self.fade;
        let fall = (self.duration - local) / self.fade;
        self.peak * rise.min(fall).min(1.0) as f32
    }
}

/// Handle to a started tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToneId(pub u64);

/// Audio output graph
pub trait AudioGraph: Send {
    /// Device time in seconds; frozen while suspended
    fn current_time(&self) -> f64;

    /// Output devices start suspended until the user interacts
    fn is_suspended(&self) -> bool;

    /// Resume a suspended device
    fn resume(&mut self) -> Result<()>;

    /// Master gain right now
    fn master_gain(&self) -> f32;

    /// Set the master gain immediately, canceling any ramp
    fn set_master_gain(&mut self, value: f32);

    /// Ramp the master gain linearly from its current value to `target`,
    /// arriving at graph time `end_time`
    fn ramp_master_gain(&mut self, target: f32, end_time: f64);

    /// Schedule a tone mixed into the master gain
    fn start_tone(&mut self, tone: Tone) -> Result<ToneId>;

    /// Stop a tone now; stopping an unknown or finished tone does nothing
    fn stop_tone(&mut self, id: ToneId);
}

/// Lazily opens the audio graph the first time music starts
pub type GraphFactory = Box<dyn FnMut() -> Result<Box<dyn AudioGraph>> + Send>;
