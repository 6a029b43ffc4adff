//! Platform detection for audio routing

use crate::{BuddyError, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// PulseAudio socket WSLg exposes to Linux programs
const WSLG_PULSE_PATH: &str = "/mnt/wslg/PulseServer";

/// Detect if running in WSL (Windows Subsystem for Linux)
pub fn is_wsl() -> bool {
    if let Ok(contents) = fs::read_to_string("/proc/version") {
        let lower = contents.to_lowercase();
        if lower.contains("microsoft") || lower.contains("wsl") {
            return true;
        }
    }

    std::env::var("WSL_DISTRO_NAME").is_ok()
}

/// Make sure child processes can reach a sound server
///
/// Outside WSL, or when PULSE_SERVER is already set, there's nothing to do.
/// Under WSL the WSLg server is exported through PULSE_SERVER; without
/// WSLg no audio can leave the Linux side and this fails.
pub fn ensure_pulse_server() -> Result<()> {
    if !is_wsl() || std::env::var("PULSE_SERVER").is_ok() {
        return Ok(());
    }

    if Path::new(WSLG_PULSE_PATH).exists() {
        info!("Auto-detected WSLg PulseAudio server at {}", WSLG_PULSE_PATH);
        std::env::set_var("PULSE_SERVER", WSLG_PULSE_PATH);
        return Ok(());
    }

    warn!("WSLg PulseAudio server not found at {}", WSLG_PULSE_PATH);
    Err(BuddyError::LoadFailure(
        "PulseAudio server not found. Install WSLg or set PULSE_SERVER.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_wsl() {
        // Result depends on the host; it just mustn't panic
        let _ = is_wsl();
    }

    #[test]
    fn test_pulse_server_outside_wsl() {
        if !is_wsl() {
            assert!(ensure_pulse_server().is_ok());
        }
    }
}
