//! Note-pair reconstruction and per-note transforms.
//!
//! The wire format never says "play key 60 for 100 ticks"; it says "key 60
//! down" and, some events later, "key 60 up". Everything in this module
//! starts from the pairing pass that turns those two halves back into
//! logical notes.

use std::collections::HashMap;

use log::warn;

use crate::{
    event::{ChannelMessage, Event, EventKind},
    prelude::*,
    sequence::{Sequence, Track},
};

/// A logical note: a paired note-on and note-off on one channel and key.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Note {
    pub channel: u8,
    pub key: u8,
    /// Absolute tick of the note-on.
    pub start_tick: u64,
    /// Absolute tick of the note-off.
    pub end_tick: u64,
    /// The note-on velocity.
    pub velocity: u8,
}
impl Note {
    #[inline]
    pub fn duration_ticks(&self) -> u64 {
        self.end_tick - self.start_tick
    }
}

/// What to do with the notes matched by a [`process_notes`] predicate.
pub enum NoteOp {
    /// Excise both the note-on and the matching note-off, folding their
    /// delta times into the following events.
    Remove,
    /// Add a signed number of semitones to both paired events, clamping the
    /// result to the 7-bit key range.
    ShiftPitch(i32),
    /// Set the note-on velocity; the note-off is left alone.
    SetVelocity(u8),
    /// Derive the note-on velocity from the full paired-note record. The
    /// output is clamped to the 7-bit range.
    MapVelocity(Box<dyn Fn(&Note) -> u8>),
}

/// A paired note plus the indices of its two halves in the event list.
struct PairedNote {
    note: Note,
    on_index: usize,
    off_index: Option<usize>,
}

/// The pairing pass.
///
/// Scans in order, keeping a map of open notes per `(channel, key)`. A
/// note-off (or zero-velocity note-on in hand-built event lists) closes the
/// open note on its key; unmatched note-offs are dropped silently; note-ons
/// still open at the end of the stream are closed at the stream's final
/// absolute time. Paired notes come out in note-off order, dangling ones
/// after them in note-on order.
fn pair_events(events: &[Event]) -> Vec<PairedNote> {
    let mut open: HashMap<(u8, u8), (u64, u8, usize)> = HashMap::new();
    let mut pairs = Vec::new();
    let mut at = 0u64;
    for (index, event) in events.iter().enumerate() {
        at += event.delta as u64;
        if let EventKind::Channel { channel, msg } = &event.kind {
            match *msg {
                ChannelMessage::NoteOn { key, vel } if vel > 0 => {
                    open.insert((*channel, key), (at, vel, index));
                }
                ChannelMessage::NoteOn { key, .. } | ChannelMessage::NoteOff { key, .. } => {
                    if let Some((start_tick, velocity, on_index)) = open.remove(&(*channel, key)) {
                        pairs.push(PairedNote {
                            note: Note {
                                channel: *channel,
                                key,
                                start_tick,
                                end_tick: at,
                                velocity,
                            },
                            on_index,
                            off_index: Some(index),
                        });
                    }
                    // Unmatched note-offs are dropped
                }
                _ => {}
            }
        }
    }
    if !open.is_empty() {
        let mut dangling: Vec<_> = open.into_iter().collect();
        dangling.sort_by_key(|&(_, (_, _, on_index))| on_index);
        for ((channel, key), (start_tick, velocity, on_index)) in dangling {
            warn!(
                "auto-closing unmatched note-on key {} channel {} at tick {}",
                key, channel, at
            );
            pairs.push(PairedNote {
                note: Note {
                    channel,
                    key,
                    start_tick,
                    end_tick: at,
                    velocity,
                },
                on_index,
                off_index: None,
            });
        }
    }
    pairs
}

/// Reconstruct the logical notes of an event list.
pub fn pair_notes(events: &[Event]) -> Vec<Note> {
    pair_events(events)
        .into_iter()
        .map(|paired| paired.note)
        .collect()
}

/// Copy-on-write per-note transform over one track of a sequence.
///
/// Notes are paired, the predicate selects among the paired records, and
/// `op` is applied to both halves of every selected pair. Events that are
/// not part of a selected pair pass through untouched, except that removals
/// fold their delta times into the next surviving event, so every survivor
/// keeps its absolute time.
///
/// Fails with [`Error::TrackOutOfRange`] for a bad index and
/// [`Error::InvalidVelocity`] for an out-of-range `SetVelocity`.
pub fn process_notes<P>(
    sequence: &Sequence,
    track_index: usize,
    predicate: P,
    op: NoteOp,
) -> Result<Sequence>
where
    P: Fn(&Note) -> bool,
{
    if let NoteOp::SetVelocity(vel) = &op {
        if *vel > 127 {
            return Err(Error::InvalidVelocity(*vel));
        }
    }
    sequence.map_track(track_index, |track| apply_note_op(track, &predicate, &op))
}

fn apply_note_op(track: &Track, predicate: &dyn Fn(&Note) -> bool, op: &NoteOp) -> Track {
    let selected: Vec<PairedNote> = pair_events(&track.events)
        .into_iter()
        .filter(|paired| predicate(&paired.note))
        .collect();
    match op {
        NoteOp::Remove => {
            let mut dropped = vec![false; track.events.len()];
            for paired in &selected {
                dropped[paired.on_index] = true;
                if let Some(off_index) = paired.off_index {
                    dropped[off_index] = true;
                }
            }
            let mut events = Vec::with_capacity(track.events.len());
            let mut carried = 0u32;
            for (index, event) in track.events.iter().enumerate() {
                if dropped[index] {
                    carried = carried.saturating_add(event.delta);
                } else {
                    let mut kept = event.clone();
                    kept.delta = kept.delta.saturating_add(carried);
                    carried = 0;
                    events.push(kept);
                }
            }
            Track::new(events)
        }
        _ => {
            let mut events = track.events.clone();
            for paired in &selected {
                match op {
                    NoteOp::ShiftPitch(semitones) => {
                        shift_key(&mut events[paired.on_index], *semitones);
                        if let Some(off_index) = paired.off_index {
                            shift_key(&mut events[off_index], *semitones);
                        }
                    }
                    NoteOp::SetVelocity(vel) => {
                        set_on_velocity(&mut events[paired.on_index], *vel);
                    }
                    NoteOp::MapVelocity(map) => {
                        set_on_velocity(&mut events[paired.on_index], map(&paired.note).min(127));
                    }
                    NoteOp::Remove => unreachable!(),
                }
            }
            Track::new(events)
        }
    }
}

fn shift_key(event: &mut Event, semitones: i32) {
    if let EventKind::Channel { msg, .. } = &mut event.kind {
        match msg {
            ChannelMessage::NoteOn { key, .. } | ChannelMessage::NoteOff { key, .. } => {
                *key = (*key as i32 + semitones).clamp(0, 127) as u8;
            }
            _ => {}
        }
    }
}

fn set_on_velocity(event: &mut Event, vel: u8) {
    if let EventKind::Channel {
        msg: ChannelMessage::NoteOn { vel: slot, .. },
        ..
    } = &mut event.kind
    {
        *slot = vel;
    }
}
