//! The background tune
//!
//! A C major scale and a short looping phrase over it. The phrase is given
//! as scale-degree offsets from G (degree 4), wrapping around the octave.

/// C4 to C5, equal tempered
pub const SCALE: [f32; 8] = [
    261.63, // C4
    293.66, // D4
    329.63, // E4
    349.23, // F4
    392.00, // G4
    440.00, // A4
    493.88, // B4
    523.25, // C5
];

/// Scale-degree offsets, looped
pub const PATTERN: [usize; 13] = [0, 2, 4, 2, 4, 5, 4, 2, 0, 2, 4, 2, 0];

/// Degree every offset is counted from
pub const BASE_DEGREE: usize = 4;

/// Seconds per note
pub const NOTE_DURATION: f64 = 0.3;

/// A note fires if a scheduling check lands within this many seconds of its start
pub const TRIGGER_WINDOW: f64 = 0.1;

/// One scheduled musical event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Hz
    pub frequency: f32,
    /// Seconds
    pub duration: f64,
}

/// Frequency of pattern step `step` (wraps past the pattern end)
pub fn frequency_for_step(step: usize) -> f32 {
    let offset = PATTERN[step % PATTERN.len()];
    SCALE[(BASE_DEGREE + offset) % SCALE.len()]
}

pub fn note_for_step(step: usize, duration: f64) -> Note {
    Note {
        frequency: frequency_for_step(step),
        duration,
    }
}

/// Index of the note whose trigger window contains `elapsed`
///
/// Note `i` is due from `i * note_duration` until `TRIGGER_WINDOW` seconds
/// later. Returns `None` between windows, before the pattern starts and
/// after its last note.
pub fn next_note_index(elapsed: f64, pattern_len: usize, note_duration: f64) -> Option<usize> {
    if elapsed < 0.0 || note_duration <= 0.0 || !elapsed.is_finite() {
        return None;
    }

    let index = (elapsed / note_duration).floor() as usize;
    if index >= pattern_len {
        return None;
    }

    let since_start = elapsed - index as f64 * note_duration;
    if since_start < TRIGGER_WINDOW {
        Some(index)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_is_g4() {
        assert_eq!(frequency_for_step(0), 392.00);
        assert_eq!(frequency_for_step(13), 392.00);
    }

    #[test]
    fn test_offsets_wrap_the_octave() {
        // 4 + 4 = 8 wraps to C4, 4 + 5 = 9 wraps to D4
        assert_eq!(frequency_for_step(2), 261.63);
        assert_eq!(frequency_for_step(5), 293.66);
        assert_eq!(frequency_for_step(1), 493.88);
    }

    #[test]
    fn test_phrase() {
        let phrase: Vec<f32> = (0..PATTERN.len()).map(frequency_for_step).collect();
        assert_eq!(
            phrase,
            vec![
                392.00, 493.88, 261.63, 493.88, 261.63, 293.66, 261.63, 493.88, 392.00, 493.88,
                261.63, 493.88, 392.00
            ]
        );
    }

    #[test]
    fn test_next_note_index_windows() {
        assert_eq!(next_note_index(0.0, 13, 0.3), Some(0));
        assert_eq!(next_note_index(0.05, 13, 0.3), Some(0));
        assert_eq!(next_note_index(0.15, 13, 0.3), None);
        assert_eq!(next_note_index(0.32, 13, 0.3), Some(1));
        assert_eq!(next_note_index(3.65, 13, 0.3), Some(12));
    }

    #[test]
    fn test_next_note_index_out_of_range() {
        assert_eq!(next_note_index(-0.01, 13, 0.3), None);
        assert_eq!(next_note_index(3.95, 13, 0.3), None);
        assert_eq!(next_note_index(1.0, 13, 0.0), None);
        assert_eq!(next_note_index(f64::NAN, 13, 0.3), None);
    }
}
