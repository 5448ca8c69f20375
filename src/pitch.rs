//! Letter-pitch notation for MIDI key numbers.
//!
//! This is the crate's built-in stand-in for a full music-theory library:
//! enough to name sonorities ("C4", "F#2") and to map letter pitches back to
//! key numbers. Enharmonics always spell with sharps.

use std::fmt;

/// One of the seven note letters.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}
impl Letter {
    pub fn char(&self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }

    /// Semitones above C within one octave.
    fn semitone(&self) -> u8 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }
}

/// A note name in scientific pitch notation: letter, optional sharp, octave.
///
/// Octaves follow the MIDI convention where key 60 is C4, so the lowest key
/// (0) sits in octave -1.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct NotePitch {
    pub letter: Letter,
    pub sharp: bool,
    pub octave: i8,
}
impl NotePitch {
    /// Name the given MIDI key number.
    ///
    /// # Examples
    ///
    /// ```
    /// use smfedit::NotePitch;
    ///
    /// assert_eq!(NotePitch::from_key(60).to_string(), "C4");
    /// assert_eq!(NotePitch::from_key(66).to_string(), "F#4");
    /// ```
    pub fn from_key(key: u8) -> NotePitch {
        const TABLE: [(Letter, bool); 12] = [
            (Letter::C, false),
            (Letter::C, true),
            (Letter::D, false),
            (Letter::D, true),
            (Letter::E, false),
            (Letter::F, false),
            (Letter::F, true),
            (Letter::G, false),
            (Letter::G, true),
            (Letter::A, false),
            (Letter::A, true),
            (Letter::B, false),
        ];
        let (letter, sharp) = TABLE[(key % 12) as usize];
        NotePitch {
            letter,
            sharp,
            octave: (key / 12) as i8 - 1,
        }
    }

    /// The MIDI key number this pitch names. Inverse of
    /// [`from_key`](NotePitch::from_key).
    pub fn key(&self) -> u8 {
        let semitone = self.letter.semitone() as i16 + self.sharp as i16;
        ((self.octave as i16 + 1) * 12 + semitone) as u8
    }
}
impl fmt::Display for NotePitch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.letter.char(),
            if self.sharp { "#" } else { "" },
            self.octave
        )
    }
}
