//! Text preparation before an utterance is dispatched
//!
//! Engines pause more naturally when punctuation is followed by a space,
//! so each comma, period, exclamation and question mark gets one and runs
//! of whitespace are collapsed.

const PAUSE_MARKS: [char; 4] = [',', '.', '!', '?'];

/// Normalize text for speaking
pub fn normalize(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        spaced.push(ch);
        if PAUSE_MARKS.contains(&ch) {
            spaced.push(' ');
        }
    }

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "Name, " prefix used when the child's name is known
pub fn greeting(child_name: Option<&str>) -> String {
    match child_name.map(str::trim) {
        Some(name) if !name.is_empty() => format!("{}, ", name),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_spaces_punctuation() {
        assert_eq!(
            normalize("Mia,this is the letter B!, B!"),
            "Mia, this is the letter B! , B!"
        );
        assert_eq!(normalize("Hi!Welcome.Ready?"), "Hi! Welcome. Ready?");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Cat   starts \t with\nC  "), "Cat starts with C");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_greeting() {
        assert_eq!(greeting(Some("Mia")), "Mia, ");
        assert_eq!(greeting(Some("  Mia ")), "Mia, ");
        assert_eq!(greeting(Some("   ")), "");
        assert_eq!(greeting(None), "");
    }
}
