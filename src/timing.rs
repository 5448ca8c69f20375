//! The division word: metrical vs SMPTE time bases.

use crate::prelude::*;

/// The time basis of a sequence, decoded from the 16-bit division word of the
/// header chunk.
///
/// Exactly one interpretation applies: if bit 15 of the word is clear the
/// file counts ticks per quarter note (metrical time), otherwise it counts
/// ticks per SMPTE frame at one of four fixed frame rates. The raw word is
/// derived on emit; it is never stored alongside the decoded arms.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Timing {
    /// Ticks per quarter note, as a 15-bit integer.
    ///
    /// The wall-clock length of a tick then depends on the current tempo
    /// (see [`MetaMessage::Tempo`](crate::MetaMessage::Tempo)).
    Metrical { ppqn: u16 },
    /// Ticks per frame at a fixed frame rate, making a tick a constant
    /// `1 / (fps * ticks_per_frame)` seconds.
    Smpte { fps: Fps, ticks_per_frame: u8 },
}
impl Timing {
    /// A metrical time basis. The value is truncated to 15 bits.
    #[inline]
    pub fn metrical(ppqn: u16) -> Timing {
        Timing::Metrical {
            ppqn: ppqn & 0x7FFF,
        }
    }

    /// An SMPTE time basis.
    #[inline]
    pub fn smpte(fps: Fps, ticks_per_frame: u8) -> Timing {
        Timing::Smpte {
            fps,
            ticks_per_frame,
        }
    }

    #[inline]
    pub fn is_metrical(&self) -> bool {
        matches!(self, Timing::Metrical { .. })
    }

    #[inline]
    pub fn is_smpte(&self) -> bool {
        matches!(self, Timing::Smpte { .. })
    }

    /// Ticks per quarter note, or `None` for an SMPTE basis.
    #[inline]
    pub fn ppqn(&self) -> Option<u16> {
        match *self {
            Timing::Metrical { ppqn } => Some(ppqn),
            Timing::Smpte { .. } => None,
        }
    }

    /// The frame rate, or `None` for a metrical basis.
    #[inline]
    pub fn smpte_fps(&self) -> Option<Fps> {
        match *self {
            Timing::Smpte { fps, .. } => Some(fps),
            Timing::Metrical { .. } => None,
        }
    }

    /// Ticks per frame, or `None` for a metrical basis.
    #[inline]
    pub fn smpte_ticks_per_frame(&self) -> Option<u8> {
        match *self {
            Timing::Smpte {
                ticks_per_frame, ..
            } => Some(ticks_per_frame),
            Timing::Metrical { .. } => None,
        }
    }

    /// Decode a raw division word.
    ///
    /// # Examples
    ///
    /// ```
    /// use smfedit::{Fps, Timing};
    ///
    /// assert_eq!(Timing::from_division(0x01E0).unwrap(), Timing::metrical(480));
    /// assert_eq!(Timing::from_division(0xE728).unwrap(), Timing::smpte(Fps::Fps25, 40));
    /// ```
    pub fn from_division(word: u16) -> Result<Timing> {
        if word & 0x8000 != 0 {
            // Timecode: the high byte is a negative 7-bit frame rate
            let fps = Fps::from_division_byte((word >> 8) as u8)?;
            Ok(Timing::Smpte {
                fps,
                ticks_per_frame: (word & 0xFF) as u8,
            })
        } else {
            // Metrical
            Ok(Timing::Metrical { ppqn: word })
        }
    }

    /// The exact inverse of [`from_division`](Timing::from_division).
    #[inline]
    pub fn to_division(&self) -> u16 {
        match *self {
            Timing::Metrical { ppqn } => ppqn & 0x7FFF,
            Timing::Smpte {
                fps,
                ticks_per_frame,
            } => ((fps.as_division_byte() as u16) << 8) | ticks_per_frame as u16,
        }
    }

    pub(crate) fn read(raw: &mut &[u8]) -> Result<Timing> {
        Timing::from_division(read_u16(raw)?)
    }

    #[inline]
    pub(crate) fn encode(&self) -> [u8; 2] {
        self.to_division().to_be_bytes()
    }
}

/// One of the four SMPTE frame rates recognized by the MIDI standard.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Fps {
    /// `24` frames per second.
    Fps24,
    /// `25` frames per second.
    Fps25,
    /// `29.97 = 30/1.001` frames per second (NTSC drop-frame).
    Fps29,
    /// `30` frames per second.
    Fps30,
}
impl Fps {
    /// Decode the high byte of an SMPTE division word, which holds the frame
    /// rate negated in 7-bit two's complement (with bit 7 set).
    ///
    /// Only `-24`, `-25`, `-29` and `-30` are legal encodings.
    pub(crate) fn from_division_byte(byte: u8) -> Result<Fps> {
        match (byte as i8).checked_neg() {
            Some(24) => Ok(Fps::Fps24),
            Some(25) => Ok(Fps::Fps25),
            Some(29) => Ok(Fps::Fps29),
            Some(30) => Ok(Fps::Fps30),
            _ => Err(Error::UnknownSmpteFps(byte)),
        }
    }

    /// The inverse of `from_division_byte`.
    #[inline]
    pub(crate) fn as_division_byte(self) -> u8 {
        (-(self.as_int() as i8)) as u8
    }

    /// The nominal integer frame rate.
    #[inline]
    pub fn as_int(self) -> u8 {
        match self {
            Fps::Fps24 => 24,
            Fps::Fps25 => 25,
            Fps::Fps29 => 29,
            Fps::Fps30 => 30,
        }
    }

    /// The exact frame rate.
    #[inline]
    pub fn as_f32(self) -> f32 {
        match self {
            Fps::Fps24 => 24.0,
            Fps::Fps25 => 25.0,
            Fps::Fps29 => 30.0 / 1.001,
            Fps::Fps30 => 30.0,
        }
    }
}
