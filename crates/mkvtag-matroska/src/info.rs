//! SegmentInfo: duration, timestamp scale and title.

use mkvtag_ebml::{ids, Element, ElementBuilder, Stream};

use crate::Result;

/// Nanoseconds per tick when the file does not say otherwise.
pub const DEFAULT_TIMESTAMP_SCALE: u64 = 1_000_000;

/// Parsed SegmentInfo fields.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SegmentInfo {
    pub timestamp_scale: u64,
    /// Raw duration in timestamp-scale ticks.
    pub duration: Option<f64>,
    pub title: Option<String>,
    pub muxing_app: Option<String>,
    pub writing_app: Option<String>,
}

impl Default for SegmentInfo {
    fn default() -> Self {
        Self {
            timestamp_scale: DEFAULT_TIMESTAMP_SCALE,
            duration: None,
            title: None,
            muxing_app: None,
            writing_app: None,
        }
    }
}

impl SegmentInfo {
    /// Duration in milliseconds, 0 when unknown.
    ///
    /// `duration` counts ticks of `timestamp_scale` nanoseconds, so 10.0 at
    /// the default scale is 10 ms, not 10 s.
    pub fn duration_ms(&self) -> u64 {
        match self.duration {
            Some(ticks) if ticks.is_finite() && ticks > 0.0 => {
                (ticks * self.timestamp_scale as f64 / 1_000_000.0).round() as u64
            }
            _ => 0,
        }
    }
}

pub(crate) fn parse_info<S: Stream + ?Sized>(stream: &mut S, info: &Element) -> Result<SegmentInfo> {
    let mut out = SegmentInfo::default();
    for child in info.children(stream)? {
        match child.id() {
            ids::TIMESTAMP_SCALE => {
                let scale = child.read_uint(stream)?;
                if scale > 0 {
                    out.timestamp_scale = scale;
                }
            }
            ids::DURATION => out.duration = Some(child.read_float(stream)?),
            ids::TITLE => out.title = Some(child.read_string(stream)?),
            ids::MUXING_APP => out.muxing_app = Some(child.read_string(stream)?),
            ids::WRITING_APP => out.writing_app = Some(child.read_string(stream)?),
            _ => {}
        }
    }
    tracing::debug!(
        "SegmentInfo: scale={} duration={:?} title={:?}",
        out.timestamp_scale,
        out.duration,
        out.title
    );
    Ok(out)
}

/// Bring the Title child of `info` in line with `title`.
///
/// Returns the total number of bytes `info` grew or shrank by, header
/// included. `info` is updated to its new layout.
pub(crate) fn write_title<S: Stream + ?Sized>(
    stream: &mut S,
    info: &mut Element,
    title: Option<&str>,
) -> Result<i64> {
    let existing = info
        .children(stream)?
        .into_iter()
        .find(|c| c.id() == ids::TITLE);

    let data_delta = match (existing, title) {
        (None, None) => 0,
        (None, Some(title)) => {
            let mut element = ElementBuilder::new(ids::TITLE);
            element.raw(title.as_bytes());
            let inserted = element.insert_at(stream, info.end())?;
            inserted.size() as i64
        }
        (Some(mut element), Some(title)) => {
            if element.read_string(stream)? == title {
                0
            } else {
                element.write_string(stream, title)?
            }
        }
        (Some(element), None) => element.remove(stream)?,
    };

    if data_delta == 0 {
        return Ok(0);
    }
    tracing::debug!("Title edit changed SegmentInfo by {} bytes", data_delta);
    let header_delta = info.resize(stream, data_delta)?;
    Ok(data_delta + header_delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkvtag_ebml::MemoryStream;

    fn info_stream(title: Option<&str>, trailer: &[u8]) -> (MemoryStream, Element) {
        let mut info = ElementBuilder::new(ids::INFO);
        info.uint(ids::TIMESTAMP_SCALE, 1_000_000).unwrap();
        if let Some(title) = title {
            info.string(ids::TITLE, title).unwrap();
        }
        info.float(ids::DURATION, 2500.0).unwrap();
        let mut bytes = info.build().unwrap().to_vec();
        bytes.extend_from_slice(trailer);
        let len = bytes.len() as u64;
        let mut stream = MemoryStream::from(bytes);
        let element = Element::read(&mut stream, 0, len).unwrap().unwrap();
        (stream, element)
    }

    fn reparse(stream: &mut MemoryStream) -> (Element, SegmentInfo) {
        let len = stream.as_slice().len() as u64;
        let element = Element::read(stream, 0, len).unwrap().unwrap();
        let info = parse_info(stream, &element).unwrap();
        (element, info)
    }

    #[test]
    fn test_duration_any_order() {
        let mut info = ElementBuilder::new(ids::INFO);
        info.float(ids::DURATION, 10.0)
            .unwrap()
            .uint(ids::TIMESTAMP_SCALE, 1_000_000_000)
            .unwrap();
        let bytes = info.build().unwrap().to_vec();
        let len = bytes.len() as u64;
        let mut stream = MemoryStream::from(bytes);
        let element = Element::read(&mut stream, 0, len).unwrap().unwrap();
        let parsed = parse_info(&mut stream, &element).unwrap();
        assert_eq!(parsed.duration_ms(), 10_000);
    }

    #[test]
    fn test_default_scale() {
        let parsed = SegmentInfo {
            duration: Some(10_000.0),
            ..SegmentInfo::default()
        };
        assert_eq!(parsed.duration_ms(), 10_000);
        assert_eq!(SegmentInfo::default().duration_ms(), 0);
    }

    #[test]
    fn test_duration_is_in_ticks() {
        let short = SegmentInfo {
            duration: Some(10.0),
            ..SegmentInfo::default()
        };
        assert_eq!(short.duration_ms(), 10);
    }

    #[test]
    fn test_append_title() {
        let (mut stream, mut info) = info_stream(None, b"TAIL");
        let before = info.size();
        let delta = write_title(&mut stream, &mut info, Some("Hello")).unwrap();
        assert_eq!(info.size() as i64, before as i64 + delta);
        assert!(stream.as_slice().ends_with(b"TAIL"));

        let (_, parsed) = reparse(&mut stream);
        assert_eq!(parsed.title.as_deref(), Some("Hello"));
        assert_eq!(parsed.duration, Some(2500.0));
    }

    #[test]
    fn test_overwrite_title() {
        let (mut stream, mut info) = info_stream(Some("Old"), b"");
        let delta = write_title(&mut stream, &mut info, Some("Much longer title")).unwrap();
        assert_eq!(delta, 14);
        let (_, parsed) = reparse(&mut stream);
        assert_eq!(parsed.title.as_deref(), Some("Much longer title"));
    }

    #[test]
    fn test_same_title_is_noop() {
        let (mut stream, mut info) = info_stream(Some("Same"), b"");
        let snapshot = stream.as_slice().to_vec();
        assert_eq!(write_title(&mut stream, &mut info, Some("Same")).unwrap(), 0);
        assert_eq!(stream.as_slice(), snapshot.as_slice());
    }

    #[test]
    fn test_remove_title() {
        let (mut stream, mut info) = info_stream(Some("Bye"), b"");
        let delta = write_title(&mut stream, &mut info, None).unwrap();
        assert_eq!(delta, -6);
        let (_, parsed) = reparse(&mut stream);
        assert!(parsed.title.is_none());
        assert_eq!(parsed.timestamp_scale, 1_000_000);
    }
}
