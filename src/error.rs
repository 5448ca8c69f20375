//! The error taxonomy of the crate.
//!
//! Errors fall into two classes: file-level corruption that makes further
//! parsing impossible (`BadCookie`, `TruncatedChunk`, `MalformedVarlen`,
//! `UnknownSmpteFps`) and caller-induced errors surfaced synchronously by the
//! editing entry points (`TrackOutOfRange`, `InvalidKey`, `InvalidVelocity`).
//! Anomalies *inside* an intact track chunk are never errors: the reader
//! recovers by emitting pass-through events, so any byte stream with sound
//! chunk framing parses into some sequence.

use std::io;

use thiserror::Error;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Anything that can go wrong while reading, writing or editing a sequence.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Failure in the underlying file system, bubbled up unchanged.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A required chunk cookie (`MThd` or `MTrk`) was not found.
    #[error("no {0} chunk cookie found")]
    BadCookie(&'static str),

    /// A chunk declared more bytes than the stream has left.
    #[error("truncated chunk: needed {needed} bytes, only {available} available")]
    TruncatedChunk { needed: usize, available: usize },

    /// A variable-length quantity ran past its 4-byte limit or past the end
    /// of its chunk.
    #[error("malformed variable-length quantity")]
    MalformedVarlen,

    /// The value cannot be represented as a variable-length quantity.
    #[error("value {0:#x} does not fit in a variable-length quantity")]
    VarlenOverflow(u32),

    /// The division word requested an SMPTE frame rate other than
    /// 24, 25, 29.97 or 30 fps.
    #[error("unrecognized smpte frame rate byte {0:#04x}")]
    UnknownSmpteFps(u8),

    /// The caller addressed a track the sequence does not have.
    #[error("track index {index} out of range (sequence has {count} tracks)")]
    TrackOutOfRange { index: usize, count: usize },

    /// A key number outside the 7-bit MIDI range.
    #[error("key number {0} outside 0..=127")]
    InvalidKey(u8),

    /// A velocity outside the 7-bit MIDI range.
    #[error("velocity {0} outside 0..=127")]
    InvalidVelocity(u8),

    /// The writer refused to emit data that would not survive a round trip.
    #[error("cannot encode: {0}")]
    Unencodable(&'static str),
}
