//! Background music: a short looping melody synthesized from layered tones

pub mod graph;
pub mod melody;
pub mod mixer;
#[cfg(feature = "audio-output")]
pub mod output;
pub mod player;
pub mod synth;

pub use graph::{AudioGraph, GraphFactory, Tone, ToneId, Waveform};
pub use mixer::{Mixer, SharedMixer};
pub use player::MelodyPlayer;
pub use synth::MelodySynth;

/// Factory for the default output device
///
/// Without the `audio-output` feature there is no device, and music stays
/// silent.
pub fn default_graph_factory() -> GraphFactory {
    Box::new(|| {
        #[cfg(feature = "audio-output")]
        {
            let output = output::CpalOutput::open()?;
            Ok(Box::new(output) as Box<dyn AudioGraph>)
        }
        #[cfg(not(feature = "audio-output"))]
        {
            Err(crate::BuddyError::ProviderUnavailable(
                "built without audio output support".to_string(),
            ))
        }
    })
}
