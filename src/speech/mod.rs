//! Speech: engines, voice selection and the orchestrator that sequences
//! everything the tutor says

pub mod backends;
pub mod loader;
pub mod speaker;
pub mod synth;
pub mod text;
pub mod voices;

pub use loader::PremiumSlot;
pub use speaker::{Speaker, SpeechSettings};
pub use synth::{create_platform_provider, Completion, CompletionSender, SpeechProvider, Utterance};
pub use voices::{Locale, Voice, VoiceCatalog, VoiceWatch, VoicesChanged};
