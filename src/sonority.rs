//! Reconstruction of sonorities (rests, notes and chords) from a track.
//!
//! A track's note pairs carve its timeline into segments at every note start
//! and end. Each segment holds zero, one or several sounding notes, which
//! makes it a rest, a note or a chord. The segmentation is deterministic:
//! the same note set and tolerance always yield the same sonority sequence.

use std::collections::BTreeSet;

use crate::{
    notes::{pair_notes, Note},
    pitch::NotePitch,
    sequence::Track,
};

/// A musical unit occupying a contiguous time interval.
///
/// Durations are in beats (ticks divided by ppqn) when
/// [`SonorityOptions::ppqn`] is supplied, raw ticks otherwise.
#[derive(Clone, PartialEq, Debug)]
pub enum Sonority {
    /// Silence.
    Rest { duration: f64 },
    /// A single sounding note.
    Note {
        pitch: NotePitch,
        velocity: u8,
        duration: f64,
    },
    /// Two or more simultaneous notes, ordered by ascending key.
    Chord {
        notes: Vec<NotePitch>,
        duration: f64,
    },
}
impl Sonority {
    pub fn duration(&self) -> f64 {
        match self {
            Sonority::Rest { duration } => *duration,
            Sonority::Note { duration, .. } => *duration,
            Sonority::Chord { duration, .. } => *duration,
        }
    }
}

/// Options for [`track_to_sonorities`].
#[derive(Copy, Clone, Debug, Default)]
pub struct SonorityOptions {
    /// How many ticks note starts may be staggered and still be grouped into
    /// one chord.
    pub chord_tolerance: u32,
    /// Divide tick durations by this to emit beats instead of ticks.
    pub ppqn: Option<u16>,
}

/// Reduce a track to its chronological sequence of sonorities.
pub fn track_to_sonorities(track: &Track, options: &SonorityOptions) -> Vec<Sonority> {
    let notes = pair_notes(&track.events);
    if notes.is_empty() {
        return Vec::new();
    }
    let tolerance = options.chord_tolerance as u64;

    // Every distinct start and end tick is a segment boundary. Tick 0 is one
    // too, so a late first attack shows up as a leading rest.
    let mut boundaries = BTreeSet::new();
    boundaries.insert(0u64);
    for note in &notes {
        boundaries.insert(note.start_tick);
        boundaries.insert(note.end_tick);
    }

    // Boundaries within the tolerance of each other collapse into one edge,
    // letting slightly staggered attacks read as a single chord onset.
    let mut edges: Vec<u64> = Vec::with_capacity(boundaries.len());
    for tick in boundaries {
        match edges.last() {
            Some(&anchor) if tick - anchor <= tolerance => {}
            _ => edges.push(tick),
        }
    }

    let mut out = Vec::with_capacity(edges.len());
    for pair in edges.windows(2) {
        let (segment_start, segment_end) = (pair[0], pair[1]);
        let sounding: Vec<&Note> = notes
            .iter()
            .filter(|note| {
                note.start_tick <= segment_start + tolerance && note.end_tick >= segment_end
            })
            .collect();
        let ticks = (segment_end - segment_start) as f64;
        let duration = match options.ppqn {
            Some(ppqn) if ppqn > 0 => ticks / ppqn as f64,
            _ => ticks,
        };
        out.push(match sounding.as_slice() {
            [] => Sonority::Rest { duration },
            [note] => Sonority::Note {
                pitch: NotePitch::from_key(note.key),
                velocity: note.velocity,
                duration,
            },
            _ => {
                let mut pitches: Vec<NotePitch> = sounding
                    .iter()
                    .map(|note| NotePitch::from_key(note.key))
                    .collect();
                pitches.sort_by_key(NotePitch::key);
                Sonority::Chord {
                    notes: pitches,
                    duration,
                }
            }
        });
    }
    out
}
