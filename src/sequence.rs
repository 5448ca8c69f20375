//! The in-memory sequence model: a conductor track plus content tracks.

use std::{fmt, fs, path::Path};

use crate::{
    event::{Event, EventKind, MetaMessage},
    prelude::*,
    smf::{self, Format},
    timing::Timing,
};

pub(crate) const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;

/// An ordered list of events, terminated by exactly one end-of-track event.
#[derive(Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct Track {
    pub events: Vec<Event>,
}
impl Track {
    #[inline]
    pub fn new(events: Vec<Event>) -> Track {
        Track { events }
    }

    /// The total tick duration of the track: the sum of all delta times.
    #[inline]
    pub fn total_ticks(&self) -> u64 {
        self.events.iter().map(|event| event.delta as u64).sum()
    }

    /// Whether the track already ends with an end-of-track event.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.events.last().map_or(false, Event::is_end_of_track)
    }

    /// Append a synthetic end-of-track marker if the track lacks one.
    pub fn ensure_terminated(&mut self) {
        if !self.is_terminated() {
            self.events.push(Event::end_of_track(0));
        }
    }

    /// Iterate over the events together with their derived absolute times,
    /// in ticks since the start of the track.
    pub fn events_with_time(&self) -> impl Iterator<Item = (u64, &Event)> {
        self.events.iter().scan(0u64, |at, event| {
            *at += event.delta as u64;
            Some((*at, event))
        })
    }
}
impl<'a> IntoIterator for &'a Track {
    type IntoIter = std::slice::Iter<'a, Event>;
    type Item = &'a Event;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// A parsed MIDI sequence, normalized to the format-1 shape: an optional
/// conductor track of file-level metadata followed by content tracks.
///
/// All edits are copy-on-write: the editing entry points return new
/// sequences and never observably mutate their input.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Sequence {
    /// The format declared by the file this sequence was read from.
    /// Files are always written back as format 1.
    pub format: Format,
    /// The time basis shared by every track.
    pub timing: Timing,
    /// The meta-only track carrying tempo, time signature, key signature and
    /// the sequence name.
    pub conductor: Option<Track>,
    /// The content tracks.
    pub tracks: Vec<Track>,
}
impl Sequence {
    /// An empty sequence with no conductor and no tracks.
    #[inline]
    pub fn new(timing: Timing) -> Sequence {
        Sequence {
            format: Format::Parallel,
            timing,
            conductor: None,
            tracks: Vec::new(),
        }
    }

    /// Parse a sequence from raw SMF bytes.
    ///
    /// Format-0 files are normalized to the format-1 shape: conductor-class
    /// meta events are routed to a synthesized conductor track and the rest
    /// become a single content track. Every track is terminated with a
    /// synthetic end-of-track event if the file lacks one.
    pub fn from_bytes(raw: &[u8]) -> Result<Sequence> {
        let (header, mut raw_tracks) = smf::parse(raw)?;
        let mut sequence = Sequence {
            format: header.format,
            timing: header.timing,
            conductor: None,
            tracks: Vec::new(),
        };
        match header.format {
            Format::SingleTrack => {
                let mut raw_tracks = raw_tracks.into_iter();
                if let Some(track) = raw_tracks.next() {
                    let (conductor, content) = split_conductor(track);
                    sequence.conductor = Some(conductor);
                    sequence.tracks.push(content);
                }
                // Nonstandard extra tracks in a format-0 file pass through
                sequence.tracks.extend(raw_tracks.map(|mut track| {
                    track.ensure_terminated();
                    track
                }));
            }
            Format::Parallel | Format::Sequential => {
                if !raw_tracks.is_empty() {
                    let mut conductor = raw_tracks.remove(0);
                    conductor.ensure_terminated();
                    sequence.conductor = Some(conductor);
                }
                for mut track in raw_tracks {
                    track.ensure_terminated();
                    sequence.tracks.push(track);
                }
            }
        }
        Ok(sequence)
    }

    /// Encode the sequence as a complete SMF byte image.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(1024);
        smf::write_header(self.track_count(), &self.timing, &mut out)?;
        if let Some(conductor) = &self.conductor {
            smf::write_track(conductor, &mut out)?;
        }
        for track in &self.tracks {
            smf::write_track(track, &mut out)?;
        }
        Ok(out)
    }

    /// Read and parse the file at `path`.
    ///
    /// The file is read fully before parsing starts, so the handle is
    /// released on every exit path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Sequence> {
        let bytes = fs::read(path)?;
        Sequence::from_bytes(&bytes)
    }

    /// Encode the sequence and write it to `path` in a single file write.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// How many tracks the file image has: the conductor (when present)
    /// followed by the content tracks.
    #[inline]
    pub fn track_count(&self) -> usize {
        self.conductor.is_some() as usize + self.tracks.len()
    }

    /// The track at `index` in file order: index 0 is the conductor when one
    /// is present, content tracks follow.
    pub fn track(&self, index: usize) -> Option<&Track> {
        match &self.conductor {
            Some(conductor) if index == 0 => Some(conductor),
            Some(_) => self.tracks.get(index - 1),
            None => self.tracks.get(index),
        }
    }

    /// Copy-on-write edit of a single track: returns a new sequence in which
    /// the track at `index` has been replaced by `edit`'s output.
    pub(crate) fn map_track<F>(&self, index: usize, edit: F) -> Result<Sequence>
    where
        F: FnOnce(&Track) -> Track,
    {
        let count = self.track_count();
        if index >= count {
            return Err(Error::TrackOutOfRange { index, count });
        }
        let mut out = self.clone();
        let slot = match &mut out.conductor {
            Some(conductor) if index == 0 => conductor,
            Some(_) => &mut out.tracks[index - 1],
            None => &mut out.tracks[index],
        };
        let edited = edit(&*slot);
        *slot = edited;
        Ok(out)
    }

    /// The tick duration of the longest track.
    pub fn duration_ticks(&self) -> u64 {
        let conductor = self.conductor.iter().map(Track::total_ticks);
        let content = self.tracks.iter().map(Track::total_ticks);
        conductor.chain(content).max().unwrap_or(0)
    }

    /// The initial tempo in beats per minute, derived from the first tempo
    /// event of the conductor track.
    pub fn bpm(&self) -> Option<f64> {
        let conductor = self.conductor.as_ref()?;
        conductor.events.iter().find_map(|event| match event.kind {
            EventKind::Meta(MetaMessage::Tempo(micros)) if micros > 0 => {
                Some(MICROSECONDS_PER_MINUTE / micros as f64)
            }
            _ => None,
        })
    }

    /// Set the initial tempo, replacing the conductor's first tempo event or
    /// inserting one at tick 0.
    ///
    /// When the edit cannot apply the sequence is left untouched and the
    /// reason is returned; this is a diagnosed no-op, not an error.
    pub fn set_bpm(&mut self, bpm: f64) -> Option<Diagnostic> {
        if !(bpm > 0.0) {
            return Some(Diagnostic::NonPositiveBpm);
        }
        let conductor = match &mut self.conductor {
            Some(conductor) => conductor,
            None => return Some(Diagnostic::NoConductor),
        };
        let micros = (MICROSECONDS_PER_MINUTE / bpm).round() as u32;
        for event in &mut conductor.events {
            if let EventKind::Meta(MetaMessage::Tempo(slot)) = &mut event.kind {
                *slot = micros;
                return None;
            }
        }
        conductor.events.insert(0, Event::tempo(0, micros));
        None
    }
}

/// Why an edit was refused and left the sequence unchanged.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Diagnostic {
    /// The sequence has no conductor track to carry the edit.
    NoConductor,
    /// A tempo must be a positive number of beats per minute.
    NonPositiveBpm,
}
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::NoConductor => write!(f, "sequence has no conductor track"),
            Diagnostic::NonPositiveBpm => write!(f, "tempo must be positive"),
        }
    }
}

/// Split a format-0 track into a conductor and a content track, preserving
/// every event's absolute time across the re-derived delta times.
fn split_conductor(track: Track) -> (Track, Track) {
    let mut conductor = Track::default();
    let mut content = Track::default();
    let mut at = 0u64;
    let mut conductor_at = 0u64;
    let mut content_at = 0u64;
    for event in track.events {
        at += event.delta as u64;
        if routes_to_conductor(&event.kind) {
            conductor
                .events
                .push(Event::new((at - conductor_at) as u32, event.kind));
            conductor_at = at;
        } else {
            content
                .events
                .push(Event::new((at - content_at) as u32, event.kind));
            content_at = at;
        }
    }
    conductor.ensure_terminated();
    content.ensure_terminated();
    (conductor, content)
}

fn routes_to_conductor(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Meta(
            MetaMessage::Tempo(_)
                | MetaMessage::TimeSignature(..)
                | MetaMessage::KeySignature(..)
                | MetaMessage::TrackName(_)
                | MetaMessage::EndOfTrack
        )
    )
}

/// Read and parse the SMF file at `path`.
#[inline]
pub fn read<P: AsRef<Path>>(path: P) -> Result<Sequence> {
    Sequence::open(path)
}

/// Encode `sequence` and write it to `path`.
#[inline]
pub fn write<P: AsRef<Path>>(sequence: &Sequence, path: P) -> Result<()> {
    sequence.save(path)
}
