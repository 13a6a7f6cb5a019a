//! Read/write driver for a Matroska stream.
//!
//! Both modes make a single pass over the Segment children. In write mode
//! edits are applied as the walk reaches them, so the walk keeps a running
//! delta `ret` and re-derives the Segment's payload end from it on every
//! step. Handles recorded for the SeekHead always describe the stream as it
//! is at the end of the walk: edits only ever happen at or after the cursor.
//!
//! Regenerated Tags and Attachments replace the first box of their kind in
//! place, so an unchanged model leaves every Cluster where it was. Only a
//! file without such a box gets the new one appended to the Segment.

use mkvtag_ebml::{ids, vint, void_padding, Element, ElementBuilder, Stream};

use crate::attachment::{parse_attachments, render_attachments, Attachment};
use crate::info::{parse_info, write_title, SegmentInfo};
use crate::properties::ReadStyle;
use crate::seekhead::{read_seek_head, write_seek_head, Region, SeekEntry};
use crate::tag::{parse_tags, render_tags, Tag, Tags};
use crate::target::resolve_targets;
use crate::track::{parse_tracks, Track};
use crate::{Error, Result};

/// DocTypes this crate accepts.
pub const SUPPORTED_DOC_TYPES: [&str; 2] = ["matroska", "webm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Read,
    Write,
}

/// Everything a read pass extracts.
#[derive(Debug, Default)]
pub(crate) struct Document {
    pub doc_type: String,
    pub info: SegmentInfo,
    pub tracks: Vec<Track>,
    pub tags: Vec<Tag>,
    pub attachments: Vec<Attachment>,
    pub seek_entries: Vec<SeekEntry>,
}

/// Parse the whole stream.
pub(crate) fn read<S: Stream + ?Sized>(stream: &mut S, style: ReadStyle) -> Result<Document> {
    let mut engine = Engine {
        stream,
        mode: Mode::Read,
        style,
        doc: Document::default(),
    };
    engine.run(None)?;
    let mut doc = engine.doc;
    resolve_targets(&mut doc.tags, &doc.tracks, &doc.attachments);
    Ok(doc)
}

/// Rewrite title, tags, attachments and SeekHead from `tags`.
pub(crate) fn write<S: Stream + ?Sized>(stream: &mut S, tags: &Tags) -> Result<()> {
    let mut engine = Engine {
        stream,
        mode: Mode::Write,
        style: ReadStyle::None,
        doc: Document::default(),
    };
    engine.run(Some(tags))
}

struct Engine<'a, S: Stream + ?Sized> {
    stream: &'a mut S,
    mode: Mode,
    style: ReadStyle,
    doc: Document,
}

impl<S: Stream + ?Sized> Engine<'_, S> {
    fn run(&mut self, model: Option<&Tags>) -> Result<()> {
        let mut len = self.stream.len()?;
        let header = match Element::read(self.stream, 0, len) {
            Ok(Some(header)) if header.id() == ids::EBML => header,
            Ok(_) => return Err(Error::unsupported("missing EBML header")),
            Err(e) if e.is_malformed() => return Err(Error::unsupported("missing EBML header")),
            Err(e) => return Err(e.into()),
        };
        self.doc.doc_type = read_doc_type(self.stream, &header)?;
        tracing::debug!("EBML header: DocType {}", self.doc.doc_type);

        let mut pos = header.end();
        let mut seen_segment = false;
        loop {
            let element = match Element::read(self.stream, pos, len) {
                Ok(Some(element)) => element,
                Ok(None) => break,
                Err(e) if e.is_malformed() => {
                    tracing::warn!("Stopping top-level scan at {}: {}", pos, e);
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            tracing::debug!(
                "Top-level {} at {} ({} bytes)",
                ids::name(element.id()),
                element.offset(),
                element.size()
            );

            pos = match element.id() {
                ids::SEGMENT if !seen_segment => {
                    seen_segment = true;
                    let segment = self.walk_segment(element, model)?;
                    len = self.stream.len()?;
                    segment.end()
                }
                ids::SEGMENT => {
                    tracing::warn!("Ignoring additional Segment at {}", element.offset());
                    element.end()
                }
                _ => element.end(),
            };
        }

        if !seen_segment {
            return Err(Error::unsupported("no Segment element"));
        }
        Ok(())
    }

    /// Walk the Segment children. Returns the Segment handle as it is after
    /// all edits.
    fn walk_segment(&mut self, mut segment: Element, model: Option<&Tags>) -> Result<Element> {
        let data_offset = segment.data_offset();
        let original_end = segment.end();
        let mut ret: i64 = 0;
        let mut pos = data_offset;
        let mut region = Region {
            offset: data_offset,
            size: 0,
        };
        let mut kept_seek_head = false;
        let mut reindex: Vec<Element> = Vec::new();
        let (mut pending_attachments, mut pending_tags) = match (self.mode, model) {
            (Mode::Write, Some(model)) => {
                (render_attachments(model.attachments())?, render_tags(model)?)
            }
            _ => (None, None),
        };

        loop {
            let limit = shifted(original_end, ret)?;
            let mut element = match Element::read(self.stream, pos, limit) {
                Ok(Some(element)) => element,
                Ok(None) => break,
                Err(e) if e.is_malformed() => {
                    tracing::warn!("Stopping Segment walk at {}: {}", pos, e);
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            element.close_unknown_size(self.stream, &ids::SEGMENT_LEVEL)?;
            let joins_region = element.offset() == region.end() && reindex.is_empty();

            match element.id() {
                ids::SEEK_HEAD if joins_region && !kept_seek_head => {
                    kept_seek_head = true;
                    region.size += element.size();
                    if self.mode == Mode::Read {
                        self.doc.seek_entries = read_seek_head(self.stream, &element)?;
                    }
                }
                ids::VOID if joins_region => region.size += element.size(),
                ids::TAGS | ids::ATTACHMENTS if self.mode == Mode::Write => {
                    let pending = if element.id() == ids::TAGS {
                        pending_tags.take()
                    } else {
                        pending_attachments.take()
                    };
                    if let Some(builder) = pending {
                        let (rebuilt, delta) =
                            rebuild_in_place(self.stream, &element, limit, builder)?;
                        tracing::debug!(
                            "Rewrote {} at {} ({} -> {} bytes)",
                            ids::name(rebuilt.id()),
                            rebuilt.offset(),
                            element.size(),
                            rebuilt.size()
                        );
                        ret += delta;
                        reindex.push(rebuilt);
                        pos = rebuilt.end();
                    } else {
                        ret += self.remove_duplicate(&element)?;
                    }
                    continue;
                }
                ids::SEEK_HEAD if self.mode == Mode::Write => {
                    ret += self.remove_duplicate(&element)?;
                    continue;
                }
                ids::SEEK_HEAD => {}
                ids::TAGS => self.doc.tags.extend(parse_tags(self.stream, &element)?),
                ids::ATTACHMENTS => self
                    .doc
                    .attachments
                    .extend(parse_attachments(self.stream, &element)?),
                ids::INFO => {
                    match (self.mode, model) {
                        (Mode::Write, Some(model)) => {
                            ret += write_title(self.stream, &mut element, model.title.as_deref())?;
                        }
                        _ => self.doc.info = parse_info(self.stream, &element)?,
                    }
                    reindex.push(element);
                }
                ids::TRACKS => {
                    if self.mode == Mode::Read && self.style != ReadStyle::None {
                        self.doc.tracks = parse_tracks(self.stream, &element)?;
                    }
                    reindex.push(element);
                }
                ids::VOID | ids::CRC32 => {}
                _ => reindex.push(element),
            }
            pos = element.end();
        }

        if self.mode == Mode::Write {
            let mut end = shifted(original_end, ret)?;
            for builder in [pending_attachments, pending_tags].into_iter().flatten() {
                let element = builder.insert_at(self.stream, end)?;
                tracing::debug!(
                    "Wrote {} at {} ({} bytes)",
                    ids::name(element.id()),
                    element.offset(),
                    element.size()
                );
                ret += element.size() as i64;
                end = element.end();
                reindex.push(element);
            }

            ret += write_seek_head(self.stream, region, data_offset, &reindex)?;
            let header_delta = segment.resize(self.stream, ret)?;
            tracing::debug!(
                "Segment payload changed by {} bytes (header {})",
                ret,
                header_delta
            );
        }
        Ok(segment)
    }

    fn remove_duplicate(&mut self, element: &Element) -> Result<i64> {
        let delta = element.remove(self.stream)?;
        tracing::debug!(
            "Removed {} at {} ({} bytes)",
            ids::name(element.id()),
            element.offset(),
            -delta
        );
        Ok(delta)
    }
}

/// Overwrite `old` with the rendered `builder`.
///
/// A Void directly after `old` counts as free space. A rendering smaller
/// than the available span is padded back to it with Void, or with a wider
/// size field when only one byte is left over. Returns the new handle and
/// how far the trailing bytes moved.
fn rebuild_in_place<S: Stream + ?Sized>(
    stream: &mut S,
    old: &Element,
    limit: u64,
    builder: ElementBuilder,
) -> Result<(Element, i64)> {
    let mut span = old.size();
    match Element::read(stream, old.end(), limit) {
        Ok(Some(next)) if next.id() == ids::VOID => span += next.size(),
        Ok(_) => {}
        Err(e) if e.is_malformed() => {}
        Err(e) => return Err(e.into()),
    }

    let min_size_len = vint::size_length(builder.body_len());
    let (mut bytes, padding) = match span.checked_sub(builder.encoded_len()) {
        Some(1) if min_size_len < vint::MAX_SIZE_LENGTH => {
            (builder.build_with_size_length(min_size_len + 1)?.to_vec(), 0)
        }
        Some(gap) if gap >= 2 => (builder.build()?.to_vec(), gap),
        _ => (builder.build()?.to_vec(), 0),
    };
    let len = bytes.len() as u64;
    if padding > 0 {
        bytes.extend(void_padding(padding)?);
    }

    let delta = stream.replace(old.offset(), span, &bytes)?;
    let element = Element::read(stream, old.offset(), old.offset() + len)?
        .ok_or(mkvtag_ebml::Error::ShiftOverflow)?;
    Ok((element, delta))
}

fn shifted(offset: u64, delta: i64) -> Result<u64> {
    offset
        .checked_add_signed(delta)
        .ok_or_else(|| mkvtag_ebml::Error::ShiftOverflow.into())
}

fn read_doc_type<S: Stream + ?Sized>(stream: &mut S, header: &Element) -> Result<String> {
    let doc_type = header
        .children(stream)?
        .into_iter()
        .find(|c| c.id() == ids::DOC_TYPE)
        .map(|c| c.read_string(stream))
        .transpose()?
        .ok_or_else(|| Error::unsupported("EBML header has no DocType"))?;

    if !SUPPORTED_DOC_TYPES.contains(&doc_type.as_str()) {
        return Err(Error::unsupported(format!("DocType {:?}", doc_type)));
    }
    Ok(doc_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkvtag_ebml::{ElementBuilder, MemoryStream};

    fn header(doc_type: Option<&str>) -> Vec<u8> {
        let mut header = ElementBuilder::new(ids::EBML);
        header.uint(ids::DOC_TYPE_VERSION, 4).unwrap();
        if let Some(doc_type) = doc_type {
            header.string(ids::DOC_TYPE, doc_type).unwrap();
        }
        header.build().unwrap().to_vec()
    }

    fn file(doc_type: Option<&str>) -> MemoryStream {
        let mut bytes = header(doc_type);
        let mut info = ElementBuilder::new(ids::INFO);
        info.uint(ids::TIMESTAMP_SCALE, 1_000_000).unwrap();
        let mut segment = ElementBuilder::new(ids::SEGMENT);
        segment.child(info).unwrap();
        bytes.extend_from_slice(&segment.build_with_size_length(8).unwrap());
        MemoryStream::from(bytes)
    }

    #[test]
    fn test_doc_types() {
        assert_eq!(read(&mut file(Some("webm")), ReadStyle::Average).unwrap().doc_type, "webm");
        assert!(read(&mut file(Some("matroska")), ReadStyle::Average).is_ok());
        for doc_type in [Some("avi"), None] {
            let err = read(&mut file(doc_type), ReadStyle::Average).unwrap_err();
            assert!(err.is_unsupported_format(), "{err}");
        }
    }

    #[test]
    fn test_not_ebml() {
        let mut stream = MemoryStream::from(b"RIFF\0\0\0\0AVI LIST".to_vec());
        assert!(read(&mut stream, ReadStyle::Average).unwrap_err().is_unsupported_format());
        let mut empty = MemoryStream::new();
        assert!(read(&mut empty, ReadStyle::Average).unwrap_err().is_unsupported_format());
    }

    #[test]
    fn test_write_title_only() {
        let mut stream = file(Some("matroska"));
        let mut tags = Tags::new();
        tags.title = Some("Hello".to_string());
        write(&mut stream, &tags).unwrap();

        let doc = read(&mut stream, ReadStyle::Average).unwrap();
        assert_eq!(doc.info.title.as_deref(), Some("Hello"));
        assert_eq!(doc.seek_entries.len(), 1);
        assert_eq!(doc.seek_entries[0].id, ids::INFO);
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_write_is_stable() {
        let mut stream = file(Some("matroska"));
        let mut tags = Tags::new();
        tags.title = Some("Stable".to_string());
        tags.medium_mut().set_text("ARTIST", "Someone");
        write(&mut stream, &tags).unwrap();
        let first = stream.as_slice().to_vec();
        write(&mut stream, &tags).unwrap();
        assert_eq!(stream.as_slice(), first.as_slice());
    }
}
