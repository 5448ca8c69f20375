//! Event filtering that conserves track timing.

use crate::{
    event::{Event, EventClass},
    prelude::*,
    sequence::{Sequence, Track},
};

/// Keep the events matching `keep`, in order, folding the delta times of
/// every dropped event into the next kept event.
///
/// The sum of delta times is invariant under this transform as long as the
/// last event is kept; deltas dropped after the final kept event accumulate
/// in no event and are lost. Track-level callers keep the end-of-track
/// marker, which pins the tail (see [`filter_events`]).
pub fn preserve_delta_times<F>(events: &[Event], mut keep: F) -> Vec<Event>
where
    F: FnMut(&Event) -> bool,
{
    let mut out = Vec::with_capacity(events.len());
    let mut carried = 0u32;
    for event in events {
        if keep(event) {
            let mut kept = event.clone();
            kept.delta = kept.delta.saturating_add(carried);
            carried = 0;
            out.push(kept);
        } else {
            carried = carried.saturating_add(event.delta);
        }
    }
    out
}

/// Copy-on-write removal of events from one track of a sequence.
///
/// Every event for which `keep` returns `false` is dropped and its delta
/// time folded into the following kept event, so the absolute time of every
/// surviving event (and the total track duration) is unchanged. The
/// end-of-track marker is always kept, whatever the predicate says, since a
/// track without one is not a track.
///
/// Fails with [`Error::TrackOutOfRange`] for a bad index.
pub fn filter_events<F>(sequence: &Sequence, track_index: usize, mut keep: F) -> Result<Sequence>
where
    F: FnMut(&Event) -> bool,
{
    sequence.map_track(track_index, |track| {
        Track::new(preserve_delta_times(&track.events, |event| {
            event.is_end_of_track() || keep(event)
        }))
    })
}

/// The common filtering case: drop every event of one kind.
pub fn filter_event_class(
    sequence: &Sequence,
    track_index: usize,
    class: EventClass,
) -> Result<Sequence> {
    filter_events(sequence, track_index, |event| event.class() != class)
}
