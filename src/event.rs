//! All sort of events and their parsers.

use log::debug;

use crate::prelude::*;

/// A single event in a track.
///
/// Consists of a delta time (in MIDI ticks relative to the previous event of
/// the same track) and the event payload. Only the delta time is stored;
/// absolute times are derived views (see
/// [`Track::events_with_time`](crate::Track::events_with_time)).
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Event {
    /// How many MIDI ticks after the previous event this event fires.
    pub delta: u32,
    /// The decoded payload.
    pub kind: EventKind,
}
impl Event {
    #[inline]
    pub fn new(delta: u32, kind: EventKind) -> Event {
        Event { delta, kind }
    }

    /// A note-on event. Fails with [`Error::InvalidKey`] or
    /// [`Error::InvalidVelocity`] outside the 7-bit range.
    pub fn note_on(delta: u32, channel: u8, key: u8, vel: u8) -> Result<Event> {
        Ok(Event::new(
            delta,
            EventKind::Channel {
                channel: channel & 0xF,
                msg: ChannelMessage::NoteOn {
                    key: check_key(key)?,
                    vel: check_vel(vel)?,
                },
            },
        ))
    }

    /// A note-off event.
    pub fn note_off(delta: u32, channel: u8, key: u8, vel: u8) -> Result<Event> {
        Ok(Event::new(
            delta,
            EventKind::Channel {
                channel: channel & 0xF,
                msg: ChannelMessage::NoteOff {
                    key: check_key(key)?,
                    vel: check_vel(vel)?,
                },
            },
        ))
    }

    /// A controller-change event.
    pub fn controller(delta: u32, channel: u8, controller: u8, value: u8) -> Result<Event> {
        Ok(Event::new(
            delta,
            EventKind::Channel {
                channel: channel & 0xF,
                msg: ChannelMessage::Controller {
                    controller: check_key(controller)?,
                    value: check_vel(value)?,
                },
            },
        ))
    }

    /// A meta event.
    #[inline]
    pub fn meta(delta: u32, msg: MetaMessage) -> Event {
        Event::new(delta, EventKind::Meta(msg))
    }

    /// The end-of-track marker.
    #[inline]
    pub fn end_of_track(delta: u32) -> Event {
        Event::meta(delta, MetaMessage::EndOfTrack)
    }

    /// A set-tempo event, in microseconds per quarter note.
    #[inline]
    pub fn tempo(delta: u32, micros_per_quarter: u32) -> Event {
        Event::meta(delta, MetaMessage::Tempo(micros_per_quarter))
    }

    /// The tag of this event, for predicate-by-kind edits.
    #[inline]
    pub fn class(&self) -> EventClass {
        self.kind.class()
    }

    /// Whether this event is the end-of-track marker.
    #[inline]
    pub fn is_end_of_track(&self) -> bool {
        matches!(self.kind, EventKind::Meta(MetaMessage::EndOfTrack))
    }

    /// Advances the slice and updates `running_status`.
    pub(crate) fn read(raw: &mut &[u8], running_status: &mut Option<u8>) -> Result<Event> {
        let delta = read_varlen(raw)?;
        let kind = read_kind(raw, running_status)?;
        Ok(Event { delta, kind })
    }

    /// Emit the event, compressing the status byte under running status
    /// exactly as the reader expands it.
    pub(crate) fn write(&self, running_status: &mut Option<u8>, out: &mut Vec<u8>) -> Result<()> {
        write_varlen(out, self.delta)?;
        write_kind(&self.kind, running_status, out)
    }
}

#[inline]
fn check_key(key: u8) -> Result<u8> {
    if key > 127 {
        return Err(Error::InvalidKey(key));
    }
    Ok(key)
}

#[inline]
fn check_vel(vel: u8) -> Result<u8> {
    if vel > 127 {
        return Err(Error::InvalidVelocity(vel));
    }
    Ok(vel)
}

/// The payload of an event.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventKind {
    /// A channel-voice message.
    Channel { channel: u8, msg: ChannelMessage },
    /// A system-exclusive dump, stored opaque (the `0xF0` status byte and the
    /// length prefix are not part of the payload).
    SysEx(Vec<u8>),
    /// A meta message.
    Meta(MetaMessage),
    /// A byte the parser did not recognize as a status, passed through so the
    /// file still round-trips.
    UnknownStatus(u8),
}
impl EventKind {
    /// The tag of this payload.
    pub fn class(&self) -> EventClass {
        match self {
            EventKind::Channel { msg, .. } => match msg {
                ChannelMessage::NoteOff { .. } => EventClass::NoteOff,
                ChannelMessage::NoteOn { .. } => EventClass::NoteOn,
                ChannelMessage::Aftertouch { .. } => EventClass::Aftertouch,
                ChannelMessage::Controller { .. } => EventClass::Controller,
                ChannelMessage::ProgramChange { .. } => EventClass::ProgramChange,
                ChannelMessage::ChannelAftertouch { .. } => EventClass::ChannelAftertouch,
                ChannelMessage::PitchBend { .. } => EventClass::PitchBend,
            },
            EventKind::SysEx(_) => EventClass::SysEx,
            EventKind::Meta(msg) => match msg {
                MetaMessage::SequenceNumber(_) => EventClass::SequenceNumber,
                MetaMessage::Text(_) => EventClass::Text,
                MetaMessage::Copyright(_) => EventClass::Copyright,
                MetaMessage::TrackName(_) => EventClass::TrackName,
                MetaMessage::InstrumentName(_) => EventClass::InstrumentName,
                MetaMessage::Lyric(_) => EventClass::Lyric,
                MetaMessage::Marker(_) => EventClass::Marker,
                MetaMessage::CuePoint(_) => EventClass::CuePoint,
                MetaMessage::ChannelPrefix(_) => EventClass::ChannelPrefix,
                MetaMessage::EndOfTrack => EventClass::EndOfTrack,
                MetaMessage::Tempo(_) => EventClass::Tempo,
                MetaMessage::SmpteOffset(_) => EventClass::SmpteOffset,
                MetaMessage::TimeSignature(..) => EventClass::TimeSignature,
                MetaMessage::KeySignature(..) => EventClass::KeySignature,
                MetaMessage::SequencerSpecific(_) => EventClass::SequencerSpecific,
                MetaMessage::Unknown { .. } => EventClass::UnknownMeta,
            },
            EventKind::UnknownStatus(_) => EventClass::UnknownStatus,
        }
    }
}

/// A channel-voice message: the status upper nibble decides the variant, the
/// lower nibble is the channel carried by [`EventKind::Channel`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ChannelMessage {
    /// Stop playing a note.
    NoteOff { key: u8, vel: u8 },
    /// Start playing a note.
    ///
    /// The reader never produces a `NoteOn` with velocity 0: the wire
    /// convention makes that a note-off, and it is normalized on read.
    NoteOn { key: u8, vel: u8 },
    /// Polyphonic key pressure.
    Aftertouch { key: u8, vel: u8 },
    /// Modify a controller value.
    Controller { controller: u8, value: u8 },
    /// Change the program (instrument) of a channel.
    ProgramChange { program: u8 },
    /// Channel-wide key pressure.
    ChannelAftertouch { vel: u8 },
    /// Bend the pitch of a channel.
    ///
    /// The bend is a 14-bit value, LSB first on the wire, combined MSB first
    /// in memory; `0x2000` is centered.
    PitchBend { bend: u16 },
}
impl ChannelMessage {
    /// The status byte for this message kind on channel 0.
    #[inline]
    pub(crate) fn base_status(&self) -> u8 {
        match self {
            ChannelMessage::NoteOff { .. } => 0x80,
            ChannelMessage::NoteOn { .. } => 0x90,
            ChannelMessage::Aftertouch { .. } => 0xA0,
            ChannelMessage::Controller { .. } => 0xB0,
            ChannelMessage::ProgramChange { .. } => 0xC0,
            ChannelMessage::ChannelAftertouch { .. } => 0xD0,
            ChannelMessage::PitchBend { .. } => 0xE0,
        }
    }
}

/// A meta message, identified on the wire by the `0xFF` status byte.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum MetaMessage {
    /// Identifies the sequence with a number (`None` when the event carried
    /// no payload and the track index applies).
    SequenceNumber(Option<u16>),
    /// Arbitrary text at a position in the file.
    Text(Vec<u8>),
    /// Copyright notice.
    Copyright(Vec<u8>),
    /// The sequence or track name.
    TrackName(Vec<u8>),
    /// The instrumentation of the track.
    InstrumentName(Vec<u8>),
    /// A lyric fragment.
    Lyric(Vec<u8>),
    /// A rehearsal or section marker.
    Marker(Vec<u8>),
    /// A cue point.
    CuePoint(Vec<u8>),
    /// Associates following meta events with a MIDI channel.
    ChannelPrefix(u8),
    /// Must appear as the last event of every track.
    EndOfTrack,
    /// The duration of a quarter note, in microseconds (24 bits).
    Tempo(u32),
    /// An SMPTE offset for the track, kept as its raw 5 bytes.
    SmpteOffset([u8; 5]),
    /// Numerator, denominator power, MIDI clocks per click and 32nd notes
    /// per quarter.
    TimeSignature(u8, u8, u8, u8),
    /// Sharps (positive) or flats (negative), and whether the key is minor.
    KeySignature(i8, bool),
    /// A blob addressed to a specific sequencer.
    SequencerSpecific(Vec<u8>),
    /// A meta type this crate does not recognize, round-tripped verbatim.
    Unknown { kind: u8, data: Vec<u8> },
}

/// The tag enumeration of every event the codec can produce, used to filter
/// events by kind without touching their payloads.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventClass {
    NoteOff,
    NoteOn,
    Aftertouch,
    Controller,
    ProgramChange,
    ChannelAftertouch,
    PitchBend,
    SysEx,
    SequenceNumber,
    Text,
    Copyright,
    TrackName,
    InstrumentName,
    Lyric,
    Marker,
    CuePoint,
    ChannelPrefix,
    EndOfTrack,
    Tempo,
    SmpteOffset,
    TimeSignature,
    KeySignature,
    SequencerSpecific,
    UnknownMeta,
    UnknownStatus,
}

/// Read a single event payload following an event delta time.
fn read_kind(raw: &mut &[u8], running_status: &mut Option<u8>) -> Result<EventKind> {
    // Read status
    let byte = *raw.first().ok_or(Error::TruncatedChunk {
        needed: 1,
        available: 0,
    })?;
    let status = if byte < 0x80 {
        // Data byte: resume the running status if there is one
        match *running_status {
            Some(status) => status,
            None => {
                *raw = &raw[1..];
                debug!("data byte {:#04x} with no running status active", byte);
                return Ok(EventKind::UnknownStatus(byte));
            }
        }
    } else {
        *raw = &raw[1..];
        byte
    };
    Ok(match status {
        0x80..=0xEF => {
            *running_status = Some(status);
            let channel = status & 0xF;
            match read_channel_msg(raw, status >> 4) {
                Ok(msg) => EventKind::Channel { channel, msg },
                Err(_) => {
                    // Data bytes ran past the chunk; the framing decides
                    debug!("truncated data bytes for status {:#04x}", status);
                    *raw = &[];
                    EventKind::UnknownStatus(status)
                }
            }
        }
        0xF0 => {
            *running_status = None;
            EventKind::SysEx(read_varlen_slice(raw)?.to_vec())
        }
        0xFF => {
            *running_status = None;
            EventKind::Meta(read_meta(raw)?)
        }
        _ => {
            // 0xF1..=0xFE: system common/realtime, not part of an SMF stream
            *running_status = None;
            debug!("unrecognized status byte {:#04x}", status);
            EventKind::UnknownStatus(status)
        }
    })
}

fn read_channel_msg(raw: &mut &[u8], kind_nibble: u8) -> Result<ChannelMessage> {
    Ok(match kind_nibble {
        0x8 => ChannelMessage::NoteOff {
            key: read_u8(raw)?,
            vel: read_u8(raw)?,
        },
        0x9 => {
            let key = read_u8(raw)?;
            let vel = read_u8(raw)?;
            if vel == 0 {
                // Wire convention: a zero-velocity note-on is a note-off
                ChannelMessage::NoteOff { key, vel: 64 }
            } else {
                ChannelMessage::NoteOn { key, vel }
            }
        }
        0xA => ChannelMessage::Aftertouch {
            key: read_u8(raw)?,
            vel: read_u8(raw)?,
        },
        0xB => ChannelMessage::Controller {
            controller: read_u8(raw)?,
            value: read_u8(raw)?,
        },
        0xC => ChannelMessage::ProgramChange {
            program: read_u8(raw)?,
        },
        0xD => ChannelMessage::ChannelAftertouch { vel: read_u8(raw)? },
        0xE => {
            let lsb = read_u8(raw)?;
            let msb = read_u8(raw)?;
            ChannelMessage::PitchBend {
                bend: (lsb & 0x7F) as u16 | (((msb & 0x7F) as u16) << 7),
            }
        }
        _ => unreachable!(),
    })
}

/// Read a single meta message, following a `0xFF` status byte.
fn read_meta(raw: &mut &[u8]) -> Result<MetaMessage> {
    let kind = read_u8(raw)?;
    let data = read_varlen_slice(raw)?;
    Ok(match kind {
        0x00 => MetaMessage::SequenceNumber(if data.len() >= 2 {
            Some(u16::from_be_bytes([data[0], data[1]]))
        } else {
            None
        }),
        0x01 => MetaMessage::Text(data.to_vec()),
        0x02 => MetaMessage::Copyright(data.to_vec()),
        0x03 => MetaMessage::TrackName(data.to_vec()),
        0x04 => MetaMessage::InstrumentName(data.to_vec()),
        0x05 => MetaMessage::Lyric(data.to_vec()),
        0x06 => MetaMessage::Marker(data.to_vec()),
        0x07 => MetaMessage::CuePoint(data.to_vec()),
        0x20 if !data.is_empty() => MetaMessage::ChannelPrefix(data[0]),
        0x2F => MetaMessage::EndOfTrack,
        0x51 if data.len() >= 3 => {
            let mut data = data;
            MetaMessage::Tempo(read_u24(&mut data)?)
        }
        0x54 if data.len() >= 5 => {
            MetaMessage::SmpteOffset([data[0], data[1], data[2], data[3], data[4]])
        }
        0x58 if data.len() >= 4 => MetaMessage::TimeSignature(data[0], data[1], data[2], data[3]),
        0x59 if data.len() >= 2 => MetaMessage::KeySignature(data[0] as i8, data[1] != 0),
        0x7F => MetaMessage::SequencerSpecific(data.to_vec()),
        _ => {
            debug!("unknown meta type {:#04x} ({} bytes)", kind, data.len());
            MetaMessage::Unknown {
                kind,
                data: data.to_vec(),
            }
        }
    })
}

/// Write a single event payload, using running status where the reader would
/// reconstruct it.
fn write_kind(kind: &EventKind, running_status: &mut Option<u8>, out: &mut Vec<u8>) -> Result<()> {
    match kind {
        EventKind::Channel { channel, msg } => {
            let status = msg.base_status() | channel;
            // A note-off at the default velocity chained behind a note-on on
            // the same channel re-encodes as a zero-velocity note-on, which
            // is exactly what the reader normalized it from.
            if let ChannelMessage::NoteOff { key, vel: 64 } = *msg {
                if *running_status == Some(0x90 | channel) {
                    out.extend_from_slice(&[key, 0]);
                    return Ok(());
                }
            }
            if *running_status != Some(status) {
                out.push(status);
            }
            *running_status = Some(status);
            match *msg {
                ChannelMessage::NoteOff { key, vel } => out.extend_from_slice(&[key, vel]),
                ChannelMessage::NoteOn { key, vel } => out.extend_from_slice(&[key, vel]),
                ChannelMessage::Aftertouch { key, vel } => out.extend_from_slice(&[key, vel]),
                ChannelMessage::Controller { controller, value } => {
                    out.extend_from_slice(&[controller, value])
                }
                ChannelMessage::ProgramChange { program } => out.push(program),
                ChannelMessage::ChannelAftertouch { vel } => out.push(vel),
                ChannelMessage::PitchBend { bend } => {
                    out.extend_from_slice(&[(bend & 0x7F) as u8, ((bend >> 7) & 0x7F) as u8])
                }
            }
            Ok(())
        }
        EventKind::SysEx(data) => {
            *running_status = None;
            out.push(0xF0);
            write_varlen_slice(out, data)
        }
        EventKind::Meta(meta) => {
            *running_status = None;
            write_meta(meta, out)
        }
        EventKind::UnknownStatus(byte) => {
            if byte & 0x80 != 0 {
                *running_status = None;
            }
            out.push(*byte);
            Ok(())
        }
    }
}

/// Write a single meta message, including the `0xFF` status byte.
fn write_meta(meta: &MetaMessage, out: &mut Vec<u8>) -> Result<()> {
    out.push(0xFF);
    match meta {
        MetaMessage::SequenceNumber(num) => {
            out.push(0x00);
            match num {
                Some(num) => write_varlen_slice(out, &num.to_be_bytes()),
                None => write_varlen_slice(out, &[]),
            }
        }
        MetaMessage::Text(data) => {
            out.push(0x01);
            write_varlen_slice(out, data)
        }
        MetaMessage::Copyright(data) => {
            out.push(0x02);
            write_varlen_slice(out, data)
        }
        MetaMessage::TrackName(data) => {
            out.push(0x03);
            write_varlen_slice(out, data)
        }
        MetaMessage::InstrumentName(data) => {
            out.push(0x04);
            write_varlen_slice(out, data)
        }
        MetaMessage::Lyric(data) => {
            out.push(0x05);
            write_varlen_slice(out, data)
        }
        MetaMessage::Marker(data) => {
            out.push(0x06);
            write_varlen_slice(out, data)
        }
        MetaMessage::CuePoint(data) => {
            out.push(0x07);
            write_varlen_slice(out, data)
        }
        MetaMessage::ChannelPrefix(channel) => {
            out.push(0x20);
            write_varlen_slice(out, &[*channel])
        }
        MetaMessage::EndOfTrack => {
            out.push(0x2F);
            write_varlen_slice(out, &[])
        }
        MetaMessage::Tempo(micros_per_quarter) => {
            if *micros_per_quarter > 0xFF_FFFF {
                return Err(Error::Unencodable("tempo exceeds 24 bits"));
            }
            out.push(0x51);
            write_varlen_slice(out, &micros_per_quarter.to_be_bytes()[1..])
        }
        MetaMessage::SmpteOffset(bytes) => {
            out.push(0x54);
            write_varlen_slice(out, bytes)
        }
        MetaMessage::TimeSignature(num, den, clocks_per_click, thirtyseconds_per_quarter) => {
            out.push(0x58);
            write_varlen_slice(
                out,
                &[*num, *den, *clocks_per_click, *thirtyseconds_per_quarter],
            )
        }
        MetaMessage::KeySignature(sharps, minor) => {
            out.push(0x59);
            write_varlen_slice(out, &[*sharps as u8, *minor as u8])
        }
        MetaMessage::SequencerSpecific(data) => {
            out.push(0x7F);
            write_varlen_slice(out, data)
        }
        MetaMessage::Unknown { kind, data } => {
            out.push(*kind);
            write_varlen_slice(out, data)
        }
    }
}
