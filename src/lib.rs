//! # Overview
//!
//! `smfedit` reads, writes and edits Standard Midi Files (`.mid` files,
//! formats 0 and 1), with a focus on bit-exact codec behavior: running
//! status, variable-length quantities and the two interpretations of the
//! division word are all implemented symmetrically in the reader and the
//! writer, so a parsed file re-encodes to an equivalent event stream.
//!
//! Parsing a `.mid` file is done through the [`Sequence`] type:
//!
//! ```no_run
//! let seq = smfedit::read("song.mid").unwrap();
//!
//! for (i, track) in seq.tracks.iter().enumerate() {
//!     println!("track {} has {} events", i, track.events.len());
//! }
//! ```
//!
//! On read, every file is normalized to the format-1 shape: a conductor
//! track holding file-level metadata (tempo, time signature, key signature,
//! name) followed by content tracks. Format-0 files have their single track
//! split accordingly. Files are always written back as format 1.
//!
//! # Building and round-tripping sequences
//!
//! Sequences are plain owned values and can be built, compared and cloned
//! freely:
//!
//! ```
//! use smfedit::{Event, Sequence, Timing, Track};
//!
//! let mut seq = Sequence::new(Timing::metrical(480));
//!
//! let mut conductor = Track::default();
//! conductor.events.push(Event::tempo(0, 500_000));
//! conductor.ensure_terminated();
//! seq.conductor = Some(conductor);
//!
//! let mut track = Track::default();
//! track.events.push(Event::note_on(0, 0, 60, 100).unwrap());
//! track.events.push(Event::note_off(480, 0, 60, 64).unwrap());
//! track.ensure_terminated();
//! seq.tracks.push(track);
//!
//! // Round-trip through the binary codec
//! let bytes = seq.to_bytes().unwrap();
//! let back = Sequence::from_bytes(&bytes).unwrap();
//! assert_eq!(back, seq);
//! assert_eq!(back.bpm(), Some(120.0));
//! ```
//!
//! # Editing
//!
//! The editing entry points are pure: each returns a new [`Sequence`] and
//! leaves the input untouched. All of them preserve event timing. Removing
//! an event folds its delta time into the next survivor, so the absolute
//! time of everything kept (and the total track duration) is conserved.
//!
//! - [`filter_events`] / [`filter_event_class`] drop events by predicate or
//!   by tag.
//! - [`process_notes`] pairs note-ons with their note-offs and removes,
//!   transposes or re-velocities whole notes at a time.
//! - [`track_to_sonorities`] reduces a track to its chronological sequence
//!   of rests, notes and chords for analysis.
//!
//! ```
//! use smfedit::{track_to_sonorities, Event, SonorityOptions, Track};
//!
//! let mut track = Track::default();
//! track.events.push(Event::note_on(0, 0, 60, 100).unwrap());
//! track.events.push(Event::note_off(480, 0, 60, 64).unwrap());
//! track.ensure_terminated();
//!
//! let opts = SonorityOptions { ppqn: Some(480), ..SonorityOptions::default() };
//! let sonorities = track_to_sonorities(&track, &opts);
//! assert_eq!(sonorities.len(), 1);
//! assert_eq!(sonorities[0].duration(), 1.0);
//! ```
//!
//! # Error policy
//!
//! File-level corruption (no `MThd`, truncated chunks, malformed varlens)
//! aborts the read. Anomalies *inside* an intact track chunk never do:
//! unrecognized status bytes and meta types become pass-through events
//! ([`EventKind::UnknownStatus`], [`MetaMessage::Unknown`]) that re-emit
//! verbatim, because files in the wild contain vendor-specific oddities.
//! The crate never prints; recovery paths emit [`log`] records only.

mod prelude {
    pub(crate) use crate::{
        error::{Error, Result},
        primitive::{
            read_slice, read_u16, read_u24, read_u32, read_u8, read_varlen, read_varlen_slice,
            write_varlen, write_varlen_slice,
        },
    };
}

mod error;
mod event;
mod filter;
mod notes;
mod pitch;
mod primitive;
mod sequence;
mod smf;
mod sonority;
mod timing;

pub use crate::{
    error::{Error, Result},
    event::{ChannelMessage, Event, EventClass, EventKind, MetaMessage},
    filter::{filter_event_class, filter_events, preserve_delta_times},
    notes::{pair_notes, process_notes, Note, NoteOp},
    pitch::{Letter, NotePitch},
    primitive::{decode_varlen, encode_varlen, MAX_VARLEN},
    sequence::{read, write, Diagnostic, Sequence, Track},
    smf::{parse, Format, Header},
    sonority::{track_to_sonorities, Sonority, SonorityOptions},
    timing::{Fps, Timing},
};
