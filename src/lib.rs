//! alphabuddy - a talking alphabet tutor
//!
//! Walks a young child through the letters A to Z: each letter and an
//! example word are spoken aloud and spelled out, with a quiet procedurally
//! generated melody playing underneath.

pub mod clock;
pub mod error;
pub mod music;
pub mod platform;
pub mod speech;
pub mod state;

pub use error::{BuddyError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "alphabuddy";
