//! Audio device output through cpal
//!
//! The cpal stream lives on its own thread (streams are not `Send` on every
//! platform); the control side talks to it through a channel and shares the
//! mixer with the stream callback. The stream is built paused and the
//! mixer clock stays frozen until the synth resumes it.

use crate::music::graph::{AudioGraph, Tone, ToneId};
use crate::music::mixer::SharedMixer;
use crate::{BuddyError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, info, warn};
use std::sync::mpsc::{self, Sender};
use std::thread;

enum StreamCommand {
    Play,
}

/// Default output device
pub struct CpalOutput {
    mixer: SharedMixer,
    control: Sender<StreamCommand>,
}

impl CpalOutput {
    /// Open the default output device, suspended
    pub fn open() -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (control, commands) = mpsc::channel::<StreamCommand>();

        thread::Builder::new()
            .name("alphabuddy-audio".to_string())
            .spawn(move || {
                let stream = match Self::build_stream() {
                    Ok((stream, mixer)) => {
                        let _ = ready_tx.send(Ok(mixer));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Runs until the CpalOutput is dropped
                for command in commands {
                    match command {
                        StreamCommand::Play => {
                            if let Err(e) = stream.play() {
                                warn!("Failed to start audio stream: {}", e);
                            }
                        }
                    }
                }
                debug!("Audio stream closed");
            })?;

        let mixer = ready_rx
            .recv()
            .map_err(|_| BuddyError::Audio("audio thread exited during setup".to_string()))??;

        Ok(Self { mixer, control })
    }

    fn build_stream() -> Result<(cpal::Stream, SharedMixer)> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            BuddyError::ProviderUnavailable("no default output device available".to_string())
        })?;
        let config = device
            .default_output_config()
            .map_err(|e| BuddyError::Audio(format!("failed to fetch default output config: {}", e)))?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!("Audio output: {} Hz, {} channels", sample_rate, channels);

        let mixer = SharedMixer::new(sample_rate);
        mixer.lock().set_suspended(true);

        let render = mixer.clone();
        let mut mono = Vec::new();
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    let frames = data.len() / channels;
                    mono.resize(frames, 0.0);
                    render.render(&mut mono);

                    // Copy to output (mono to all channels)
                    for (frame, &sample) in data.chunks_mut(channels).zip(mono.iter()) {
                        frame.fill(sample);
                    }
                },
                |err| warn!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| BuddyError::Audio(format!("failed to build output stream: {}", e)))?;

        stream
            .pause()
            .map_err(|e| BuddyError::Audio(format!("failed to pause output stream: {}", e)))?;

        Ok((stream, mixer))
    }
}

impl AudioGraph for CpalOutput {
    fn current_time(&self) -> f64 {
        self.mixer.current_time()
    }

    fn is_suspended(&self) -> bool {
        self.mixer.is_suspended()
    }

    fn resume(&mut self) -> Result<()> {
        self.control
            .send(StreamCommand::Play)
            .map_err(|_| BuddyError::Audio("audio thread is gone".to_string()))?;
        self.mixer.resume()
    }

    fn master_gain(&self) -> f32 {
        self.mixer.master_gain()
    }

    fn set_master_gain(&mut self, value: f32) {
        self.mixer.set_master_gain(value);
    }

    fn ramp_master_gain(&mut self, target: f32, end_time: f64) {
        self.mixer.ramp_master_gain(target, end_time);
    }

    fn start_tone(&mut self, tone: Tone) -> Result<ToneId> {
        self.mixer.start_tone(tone)
    }

    fn stop_tone(&mut self, id: ToneId) {
        self.mixer.stop_tone(id);
    }
}
