//! The alphabet the tutor walks through
//!
//! Every letter comes with three example words a small child knows.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One letter and its example words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letter {
    pub letter: char,
    pub words: [&'static str; 3],
}

impl Letter {
    pub fn uppercase(&self) -> char {
        self.letter.to_ascii_uppercase()
    }

    pub fn lowercase(&self) -> char {
        self.letter.to_ascii_lowercase()
    }
}

/// A to Z in order
pub static LETTERS: Lazy<Vec<Letter>> = Lazy::new(|| {
    let table: [(char, [&'static str; 3]); 26] = [
        ('A', ["Apple", "Ant", "Airplane"]),
        ('B', ["Ball", "Bear", "Book"]),
        ('C', ["Cat", "Car", "Cake"]),
        ('D', ["Dog", "Duck", "Dinosaur"]),
        ('E', ["Elephant", "Egg", "Earth"]),
        ('F', ["Fish", "Flower", "Fire"]),
        ('G', ["Giraffe", "Guitar", "Gift"]),
        ('H', ["House", "Heart", "Horse"]),
        ('I', ["Ice cream", "Igloo", "Island"]),
        ('J', ["Jellyfish", "Juice", "Jungle"]),
        ('K', ["Kite", "Kangaroo", "Key"]),
        ('L', ["Lion", "Lemon", "Light"]),
        ('M', ["Monkey", "Moon", "Music"]),
        ('N', ["Nest", "Net", "Night"]),
        ('O', ["Orange", "Octopus", "Owl"]),
        ('P', ["Pig", "Penguin", "Pizza"]),
        ('Q', ["Queen", "Quilt", "Quack"]),
        ('R', ["Rabbit", "Rainbow", "Robot"]),
        ('S', ["Sun", "Star", "Snake"]),
        ('T', ["Tiger", "Tree", "Train"]),
        ('U', ["Umbrella", "Unicorn", "Up"]),
        ('V', ["Violin", "Volcano", "Vase"]),
        ('W', ["Watermelon", "Whale", "Wheel"]),
        ('X', ["X-ray", "Xylophone", "Box"]),
        ('Y', ["Yak", "Yo-yo", "Yacht"]),
        ('Z', ["Zebra", "Zipper", "Zoo"]),
    ];
    table
        .into_iter()
        .map(|(letter, words)| Letter { letter, words })
        .collect()
});

static BY_CHAR: Lazy<HashMap<char, usize>> = Lazy::new(|| {
    LETTERS
        .iter()
        .enumerate()
        .map(|(i, l)| (l.letter, i))
        .collect()
});

/// Look up a letter, case-insensitively
pub fn find(letter: char) -> Option<&'static Letter> {
    BY_CHAR
        .get(&letter.to_ascii_uppercase())
        .map(|&i| &LETTERS[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_is_complete_and_ordered() {
        assert_eq!(LETTERS.len(), 26);
        for (i, letter) in LETTERS.iter().enumerate() {
            assert_eq!(letter.letter, (b'A' + i as u8) as char);
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find('c').unwrap().words[0], "Cat");
        assert_eq!(find('C').unwrap().lowercase(), 'c');
        assert!(find('1').is_none());
    }
}
