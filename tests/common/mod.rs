//! Test doubles shared by the integration tests
//!
//! `FakeProvider` stands in for a speech engine and `FakeGraph` for an audio
//! device. Both hand out a cloneable handle so a test can script and inspect
//! them after they've been moved into the code under test.

#![allow(dead_code)]

use alphabuddy::clock::{Clock, ManualClock};
use alphabuddy::music::{AudioGraph, GraphFactory, Tone, ToneId};
use alphabuddy::speech::{Completion, SpeechProvider, Utterance, Voice, VoicesChanged};
use alphabuddy::{BuddyError, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One utterance as an engine received it
#[derive(Debug, Clone)]
pub struct Spoken {
    pub engine: String,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub voice: Option<String>,
    /// Clock time when `speak` was called
    pub at: Duration,
}

#[derive(Default)]
pub struct EngineState {
    pub spoken: Vec<Spoken>,
    pub cancels: usize,
    pub speaking: bool,
    /// Fail this many upcoming utterances after they were accepted
    pub fail_next: usize,
    /// Refuse this many upcoming utterances outright
    pub refuse_next: usize,
    pub available: bool,
    pub voices: Vec<Voice>,
    /// `voices()` calls that still report an empty list
    pub empty_polls: usize,
    pub voice_polls: usize,
    pub signal: Option<VoicesChanged>,
}

#[derive(Clone)]
pub struct EngineHandle(Arc<Mutex<EngineState>>);

impl EngineHandle {
    pub fn state(&self) -> MutexGuard<'_, EngineState> {
        self.0.lock().unwrap()
    }

    pub fn spoken(&self) -> Vec<Spoken> {
        self.state().spoken.clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.state().spoken.iter().map(|s| s.text.clone()).collect()
    }

    pub fn cancels(&self) -> usize {
        self.state().cancels
    }

    pub fn set_speaking(&self, speaking: bool) {
        self.state().speaking = speaking;
    }

    pub fn fail_next(&self, count: usize) {
        self.state().fail_next = count;
    }

    pub fn refuse_next(&self, count: usize) {
        self.state().refuse_next = count;
    }

    pub fn set_available(&self, available: bool) {
        self.state().available = available;
    }

    /// Replace the voice list, optionally announcing the change
    pub fn set_voices(&self, voices: Vec<Voice>, announce: bool) {
        let mut state = self.state();
        state.voices = voices;
        if announce {
            if let Some(signal) = &state.signal {
                signal.raise();
            }
        }
    }

    pub fn voices_appear_after(&self, polls: usize) {
        self.state().empty_polls = polls;
    }

    pub fn voice_polls(&self) -> usize {
        self.state().voice_polls
    }
}

pub struct FakeProvider {
    name: String,
    clock: Arc<ManualClock>,
    state: Arc<Mutex<EngineState>>,
}

impl FakeProvider {
    pub fn new(name: &str, clock: Arc<ManualClock>) -> (Self, EngineHandle) {
        let state = Arc::new(Mutex::new(EngineState {
            available: true,
            ..Default::default()
        }));
        let provider = Self {
            name: name.to_string(),
            clock,
            state: Arc::clone(&state),
        };
        (provider, EngineHandle(state))
    }

    pub fn boxed(name: &str, clock: Arc<ManualClock>) -> (Box<dyn SpeechProvider>, EngineHandle) {
        let (provider, handle) = Self::new(name, clock);
        (Box::new(provider), handle)
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap()
    }
}

impl SpeechProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.state().available
    }

    fn voices(&self) -> Result<Vec<Voice>> {
        let mut state = self.state();
        state.voice_polls += 1;
        if state.empty_polls > 0 {
            state.empty_polls -= 1;
            return Ok(Vec::new());
        }
        Ok(state.voices.clone())
    }

    fn subscribe_voices_changed(&mut self, signal: VoicesChanged) {
        self.state().signal = Some(signal);
    }

    fn is_speaking(&self) -> Result<bool> {
        Ok(self.state().speaking)
    }

    fn cancel(&mut self) -> Result<()> {
        let mut state = self.state();
        state.cancels += 1;
        state.speaking = false;
        Ok(())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<Completion> {
        let at = self.clock.now();
        let mut state = self.state();

        if state.refuse_next > 0 {
            state.refuse_next -= 1;
            return Err(BuddyError::Speech(format!("{} refused", self.name)));
        }

        state.spoken.push(Spoken {
            engine: self.name.clone(),
            text: utterance.text.clone(),
            rate: utterance.rate,
            pitch: utterance.pitch,
            voice: utterance.voice.clone(),
            at,
        });

        let (sender, completion) = Completion::channel();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            sender.fail("synthesis-failed");
        } else {
            sender.finish();
        }
        Ok(completion)
    }
}

/// A tone as the graph received it
#[derive(Debug, Clone, Copy)]
pub struct StartedTone {
    pub id: ToneId,
    pub tone: Tone,
}

#[derive(Default)]
pub struct GraphState {
    pub time: f64,
    pub suspended: bool,
    pub resumes: usize,
    pub master: f32,
    /// (target, end time) of every master ramp
    pub ramps: Vec<(f32, f64)>,
    pub started: Vec<StartedTone>,
    pub stopped: Vec<ToneId>,
    /// Reject every tone while set
    pub reject_tones: bool,
    next_id: u64,
}

#[derive(Clone)]
pub struct GraphHandle(Arc<Mutex<GraphState>>);

impl GraphHandle {
    pub fn state(&self) -> MutexGuard<'_, GraphState> {
        self.0.lock().unwrap()
    }

    pub fn set_time(&self, time: f64) {
        self.state().time = time;
    }

    pub fn started(&self) -> Vec<StartedTone> {
        self.state().started.clone()
    }

    /// Primary (first layer) frequency of every note, in order
    pub fn melody(&self) -> Vec<f32> {
        self.started()
            .chunks(3)
            .map(|layers| layers[0].tone.frequency)
            .collect()
    }
}

pub struct FakeGraph {
    state: Arc<Mutex<GraphState>>,
}

impl FakeGraph {
    fn state(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap()
    }
}

impl AudioGraph for FakeGraph {
    fn current_time(&self) -> f64 {
        self.state().time
    }

    fn is_suspended(&self) -> bool {
        self.state().suspended
    }

    fn resume(&mut self) -> Result<()> {
        let mut state = self.state();
        state.suspended = false;
        state.resumes += 1;
        Ok(())
    }

    fn master_gain(&self) -> f32 {
        self.state().master
    }

    fn set_master_gain(&mut self, value: f32) {
        self.state().master = value;
    }

    fn ramp_master_gain(&mut self, target: f32, end_time: f64) {
        let mut state = self.state();
        state.ramps.push((target, end_time));
        state.master = target;
    }

    fn start_tone(&mut self, tone: Tone) -> Result<ToneId> {
        let mut state = self.state();
        if state.reject_tones {
            return Err(BuddyError::Audio("oscillator refused".to_string()));
        }
        state.next_id += 1;
        let id = ToneId(state.next_id);
        state.started.push(StartedTone { id, tone });
        Ok(id)
    }

    fn stop_tone(&mut self, id: ToneId) {
        self.state().stopped.push(id);
    }
}

/// Factory handing out one shared fake graph, plus its handle
///
/// Counts how many times the graph was opened.
pub fn fake_graph() -> (GraphFactory, GraphHandle, Arc<Mutex<usize>>) {
    let state = Arc::new(Mutex::new(GraphState {
        master: 1.0,
        ..Default::default()
    }));
    let opened = Arc::new(Mutex::new(0));

    let shared = Arc::clone(&state);
    let count = Arc::clone(&opened);
    let factory: GraphFactory = Box::new(move || {
        *count.lock().unwrap() += 1;
        Ok(Box::new(FakeGraph {
            state: Arc::clone(&shared),
        }) as Box<dyn AudioGraph>)
    });

    (factory, GraphHandle(state), opened)
}

/// Factory that never finds a device
pub fn missing_graph() -> GraphFactory {
    Box::new(|| Err(BuddyError::Audio("no output device".to_string())))
}
