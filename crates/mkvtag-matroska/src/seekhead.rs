//! SeekHead rebuild.
//!
//! The SeekHead lives in a reserved region at the start of the Segment
//! payload. The region is the retained SeekHead plus any Void that follows
//! it. Rebuilding writes a fresh SeekHead into the region and pads the rest
//! with Void, growing the region only when the new index cannot fit.

use mkvtag_ebml::{ids, vint, void_padding, Element, ElementBuilder, Stream};

use crate::{Error, Result};

/// SeekHead ID plus the widest size field.
const SEEK_HEAD_OVERHEAD: u64 = 4 + 8;

/// Widest Seek entry: header (3), SeekID with a 4 byte ID (7) and
/// SeekPosition with an 8 byte offset (11).
const SEEK_ENTRY_BOUND: u64 = 3 + 7 + 11;

/// One SeekHead entry. `position` is relative to the Segment payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SeekEntry {
    pub id: u32,
    pub position: u64,
}

/// Bytes at the start of the Segment payload owned by the SeekHead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Region {
    pub offset: u64,
    pub size: u64,
}

impl Region {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Upper bound on the encoded size of a SeekHead with `entries` entries.
pub fn reservation_bound(entries: usize) -> u64 {
    SEEK_HEAD_OVERHEAD + SEEK_ENTRY_BOUND * entries as u64
}

/// Read the entries of an existing SeekHead. Malformed entries are skipped.
pub fn read_seek_head<S: Stream + ?Sized>(stream: &mut S, seek_head: &Element) -> Result<Vec<SeekEntry>> {
    let mut entries = Vec::new();
    for seek in seek_head.children(stream)? {
        if seek.id() != ids::SEEK {
            continue;
        }
        let mut id = None;
        let mut position = None;
        for field in seek.children(stream)? {
            match field.id() {
                ids::SEEK_ID => {
                    let raw = field.read_uint(stream)?;
                    id = u32::try_from(raw).ok();
                }
                ids::SEEK_POSITION => position = Some(field.read_uint(stream)?),
                _ => {}
            }
        }
        match (id, position) {
            (Some(id), Some(position)) => entries.push(SeekEntry { id, position }),
            _ => tracing::warn!("Skipping incomplete Seek entry at {}", seek.offset()),
        }
    }
    Ok(entries)
}

/// Replace `region` with a SeekHead indexing `targets`.
///
/// `targets` must all lie after the region; their handles describe the
/// stream as it is before this call. Returns the net delta, i.e. how far
/// everything after the region moved.
pub(crate) fn write_seek_head<S: Stream + ?Sized>(
    stream: &mut S,
    region: Region,
    segment_data_offset: u64,
    targets: &[Element],
) -> Result<i64> {
    let reserved = reservation_bound(targets.len()).max(region.size);
    let net_delta = reserved as i64 - region.size as i64;

    let mut seek_head = ElementBuilder::new(ids::SEEK_HEAD);
    for target in targets {
        let position = target
            .offset()
            .checked_add_signed(net_delta)
            .and_then(|p| p.checked_sub(segment_data_offset))
            .ok_or(mkvtag_ebml::Error::ShiftOverflow)?;
        tracing::trace!("Seek entry {} at {}", ids::name(target.id()), position);

        let mut seek = ElementBuilder::new(ids::SEEK);
        seek.binary(ids::SEEK_ID, &vint::encode_id(target.id()))?
            .uint(ids::SEEK_POSITION, position)?;
        seek_head.child(seek)?;
    }

    let bytes = render_into(seek_head, reserved)?;
    stream.replace(region.offset, region.size, &bytes)?;
    tracing::debug!(
        "Wrote SeekHead with {} entries into {} reserved bytes (delta {})",
        targets.len(),
        reserved,
        net_delta
    );
    Ok(net_delta)
}

/// Render `seek_head` and pad it with Void to exactly `reserved` bytes.
fn render_into(seek_head: ElementBuilder, reserved: u64) -> Result<Vec<u8>> {
    let natural = seek_head.encoded_len();
    let remaining = reserved
        .checked_sub(natural)
        .ok_or(Error::SeekReservation { reserved, remaining: 0 })?;

    let mut bytes = match remaining {
        0 => return Ok(seek_head.build()?.to_vec()),
        // A one byte gap fits no Void; widen the size field instead.
        1 => {
            let size_len = vint::size_length(seek_head.body_len()) + 1;
            if size_len > vint::MAX_SIZE_LENGTH {
                return Err(Error::SeekReservation { reserved, remaining });
            }
            return Ok(seek_head.build_with_size_length(size_len)?.to_vec());
        }
        _ => seek_head.build()?.to_vec(),
    };
    bytes.extend(void_padding(remaining)?);
    Ok(bytes)
}
