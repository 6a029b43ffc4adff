//! The child's name, remembered between sessions

use crate::state::config::Config;
use crate::Result;
use log::info;

const SECTION: &str = "child";
const KEY: &str = "name";

/// Stored name, if any
///
/// A name that is empty after trimming counts as absent.
pub fn load(config: &Config) -> Option<String> {
    let name = config.get_string(SECTION, KEY, "");
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Remember `name` (trimmed) and write the config file
pub fn save(config: &mut Config, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return clear(config);
    }
    config.set(SECTION, KEY, name);
    config.save()?;
    info!("Saved child's name");
    Ok(())
}

/// Forget the stored name and write the config file
pub fn clear(config: &mut Config) -> Result<()> {
    config.remove(SECTION, KEY);
    config.save()?;
    info!("Cleared child's name");
    Ok(())
}
