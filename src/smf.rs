//! Chunk framing: locating `MThd` and `MTrk` cookies, and assembling whole
//! files from tracks.

use log::debug;

use crate::{
    event::Event,
    prelude::*,
    sequence::Track,
    timing::Timing,
};

pub(crate) const HEADER_COOKIE: &[u8; 4] = b"MThd";
pub(crate) const TRACK_COOKIE: &[u8; 4] = b"MTrk";

/// How many bytes per event to assume when sizing buffers. Most events are a
/// delta time plus two or three message bytes.
const BYTES_PER_EVENT: usize = 3;

/// A MIDI file header: the layout of the tracks and the time basis.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Header {
    pub format: Format,
    pub timing: Timing,
}

/// The track layout declared by the header chunk.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Format {
    /// A single track carrying both metadata and content.
    SingleTrack,
    /// Several tracks played simultaneously; the first carries tempo and
    /// other song metadata.
    Parallel,
    /// Several tracks, each a separate song.
    Sequential,
}
impl Format {
    /// Decode the 16-bit format word. Unknown values are treated as
    /// [`Format::Parallel`] so that an intact file always parses.
    pub fn from_bits(bits: u16) -> Format {
        match bits {
            0 => Format::SingleTrack,
            1 => Format::Parallel,
            2 => Format::Sequential,
            other => {
                debug!("unknown smf format {}, assuming parallel", other);
                Format::Parallel
            }
        }
    }

    #[inline]
    pub fn as_bits(&self) -> u16 {
        *self as u8 as u16
    }
}

#[inline]
fn find_cookie(haystack: &[u8], cookie: &[u8; 4]) -> Option<usize> {
    haystack.windows(4).position(|window| window == cookie)
}

/// Parse a raw byte stream into its header and raw (un-normalized) tracks.
///
/// The `MThd` cookie is located by linear scan, so leading garbage or a
/// foreign container around the SMF data is tolerated. Each `MTrk` is
/// likewise scanned for, skipping foreign chunks between tracks.
pub fn parse(raw: &[u8]) -> Result<(Header, Vec<Track>)> {
    let at = find_cookie(raw, HEADER_COOKIE).ok_or(Error::BadCookie("MThd"))?;
    if at > 0 {
        debug!("skipped {} bytes before MThd", at);
    }
    let mut rest = &raw[at + 4..];
    let len = read_u32(&mut rest)? as usize;
    let mut header = read_slice(&mut rest, len)?;
    let format = Format::from_bits(read_u16(&mut header)?);
    let track_count = read_u16(&mut header)?;
    let timing = Timing::read(&mut header)?;

    let mut tracks = Vec::with_capacity(track_count as usize);
    for _ in 0..track_count {
        let at = find_cookie(rest, TRACK_COOKIE).ok_or(Error::BadCookie("MTrk"))?;
        if at > 0 {
            debug!("skipped {} foreign bytes before MTrk", at);
        }
        rest = &rest[at + 4..];
        let len = read_u32(&mut rest)? as usize;
        let chunk = read_slice(&mut rest, len)?;
        tracks.push(read_track(chunk)?);
    }
    Ok((Header { format, timing }, tracks))
}

/// Decode the event data of one track chunk.
///
/// End-of-track terminates the loop even if bytes remain; the remainder is
/// consumed but ignored.
fn read_track(mut data: &[u8]) -> Result<Track> {
    let mut events = Vec::with_capacity(data.len() / BYTES_PER_EVENT + 1);
    let mut running_status = None;
    while !data.is_empty() {
        let event = match Event::read(&mut data, &mut running_status) {
            Ok(event) => event,
            Err(Error::TruncatedChunk { .. }) => {
                // A dangling delta time at the end of the chunk; the framing
                // is intact, so the track just ends here
                debug!("track chunk ends in the middle of an event");
                break;
            }
            Err(err) => return Err(err),
        };
        let end = event.is_end_of_track();
        events.push(event);
        if end {
            if !data.is_empty() {
                debug!("ignoring {} bytes after end-of-track", data.len());
            }
            break;
        }
    }
    Ok(Track { events })
}

/// Emit the header chunk. The format word is always written as 1 (parallel),
/// matching the normalized in-memory shape.
pub(crate) fn write_header(track_count: usize, timing: &Timing, out: &mut Vec<u8>) -> Result<()> {
    let track_count = u16::try_from(track_count)
        .map_err(|_| Error::Unencodable("track count exceeds 16 bit range"))?;
    out.extend_from_slice(HEADER_COOKIE);
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&Format::Parallel.as_bits().to_be_bytes());
    out.extend_from_slice(&track_count.to_be_bytes());
    out.extend_from_slice(&timing.encode());
    Ok(())
}

/// Emit one track chunk. The body is serialized first and the chunk length
/// backpatched, so the caller gets a single contiguous byte image.
pub(crate) fn write_track(track: &Track, out: &mut Vec<u8>) -> Result<()> {
    out.reserve(8 + track.events.len() * BYTES_PER_EVENT);
    out.extend_from_slice(TRACK_COOKIE);
    out.extend_from_slice(&[0, 0, 0, 0]);
    let body_start = out.len();
    let mut running_status = None;
    for event in &track.events {
        event.write(&mut running_status, out)?;
    }
    let body_len = u32::try_from(out.len() - body_start)
        .map_err(|_| Error::Unencodable("track chunk length exceeds 32 bit range"))?;
    out[body_start - 4..body_start].copy_from_slice(&body_len.to_be_bytes());
    Ok(())
}
