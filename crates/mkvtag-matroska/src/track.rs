//! Track model built from `TrackEntry` elements.

use mkvtag_ebml::{ids, Element, Stream};

use crate::Result;

/// Declared Matroska track type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum TrackType {
    Video,
    Audio,
    Complex,
    Logo,
    Subtitle,
    Buttons,
    Control,
    Metadata,
    Unknown(u64),
}

impl From<u64> for TrackType {
    fn from(value: u64) -> Self {
        match value {
            0x01 => Self::Video,
            0x02 => Self::Audio,
            0x03 => Self::Complex,
            0x10 => Self::Logo,
            0x11 => Self::Subtitle,
            0x12 => Self::Buttons,
            0x20 => Self::Control,
            0x21 => Self::Metadata,
            other => Self::Unknown(other),
        }
    }
}

/// Video track parameters.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct VideoSettings {
    pub pixel_width: u64,
    pub pixel_height: u64,
    pub display_width: Option<u64>,
    pub display_height: Option<u64>,
}

/// Audio track parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct AudioSettings {
    /// Sampling frequency in Hz (Matroska default 8000).
    pub sampling_frequency: f64,
    /// Channel count (Matroska default 1).
    pub channels: u64,
    pub bit_depth: Option<u64>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sampling_frequency: 8000.0,
            channels: 1,
            bit_depth: None,
        }
    }
}

/// Modeled kind of a track, with per-kind codec metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum TrackKind {
    Video(VideoSettings),
    Audio(AudioSettings),
    Subtitle,
    /// A track type value this crate does not know.
    Unknown(u64),
}

/// A track of the file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Track {
    pub number: u64,
    pub uid: u64,
    pub codec_id: String,
    pub name: Option<String>,
    pub language: Option<String>,
    pub default: bool,
    /// Nanoseconds per frame, when declared.
    pub default_duration: Option<u64>,
    pub kind: TrackKind,
}

impl Track {
    /// Whether this is a video track.
    pub fn is_video(&self) -> bool {
        matches!(self.kind, TrackKind::Video(_))
    }

    /// Whether this is an audio track.
    pub fn is_audio(&self) -> bool {
        matches!(self.kind, TrackKind::Audio(_))
    }

    /// Whether this is a subtitle track.
    pub fn is_subtitle(&self) -> bool {
        matches!(self.kind, TrackKind::Subtitle)
    }

    /// Frames per second derived from the default duration.
    pub fn frame_rate(&self) -> Option<f64> {
        match (&self.kind, self.default_duration) {
            (TrackKind::Video(_), Some(ns)) if ns > 0 => Some(1_000_000_000.0 / ns as f64),
            _ => None,
        }
    }

    /// Human-readable codec name.
    pub fn codec_name(&self) -> String {
        codec_id_to_name(&self.codec_id)
    }
}

/// Turn a declared track type into a modeled kind.
///
/// Complex, Logo, Buttons, Control and Metadata tracks are recognized but
/// not modeled, so they yield `None`.
pub fn classify(
    track_type: TrackType,
    video: Option<VideoSettings>,
    audio: Option<AudioSettings>,
) -> Option<TrackKind> {
    match track_type {
        TrackType::Video => Some(TrackKind::Video(video.unwrap_or_default())),
        TrackType::Audio => Some(TrackKind::Audio(audio.unwrap_or_default())),
        TrackType::Subtitle => Some(TrackKind::Subtitle),
        TrackType::Unknown(raw) => Some(TrackKind::Unknown(raw)),
        TrackType::Complex
        | TrackType::Logo
        | TrackType::Buttons
        | TrackType::Control
        | TrackType::Metadata => None,
    }
}

/// Parse every `TrackEntry` of a `Tracks` element.
pub(crate) fn parse_tracks<S: Stream + ?Sized>(stream: &mut S, tracks: &Element) -> Result<Vec<Track>> {
    let mut out = Vec::new();
    for entry in tracks.children(stream)? {
        if entry.id() != ids::TRACK_ENTRY {
            continue;
        }
        match parse_track_entry(stream, &entry)? {
            Some(track) => {
                tracing::debug!(
                    "Track {}: {} ({:?})",
                    track.number,
                    track.codec_id,
                    track.kind
                );
                out.push(track);
            }
            None => tracing::debug!("Ignoring unmodeled track at {}", entry.offset()),
        }
    }
    Ok(out)
}

fn parse_track_entry<S: Stream + ?Sized>(stream: &mut S, entry: &Element) -> Result<Option<Track>> {
    let mut number = 0;
    let mut uid = 0;
    let mut track_type = TrackType::Unknown(0);
    let mut codec_id = String::new();
    let mut name = None;
    let mut language = None;
    let mut default = true;
    let mut default_duration = None;
    let mut video = None;
    let mut audio = None;

    for child in entry.children(stream)? {
        match child.id() {
            ids::TRACK_NUMBER => number = child.read_uint(stream)?,
            ids::TRACK_UID => uid = child.read_uint(stream)?,
            ids::TRACK_TYPE => track_type = TrackType::from(child.read_uint(stream)?),
            ids::CODEC_ID => codec_id = child.read_string(stream)?,
            ids::NAME => name = Some(child.read_string(stream)?),
            ids::LANGUAGE => language = Some(child.read_string(stream)?),
            ids::FLAG_DEFAULT => default = child.read_uint(stream)? != 0,
            ids::DEFAULT_DURATION => default_duration = Some(child.read_uint(stream)?),
            ids::VIDEO => video = Some(parse_video(stream, &child)?),
            ids::AUDIO => audio = Some(parse_audio(stream, &child)?),
            _ => {}
        }
    }

    Ok(classify(track_type, video, audio).map(|kind| Track {
        number,
        uid,
        codec_id,
        name,
        language,
        default,
        default_duration,
        kind,
    }))
}

fn parse_video<S: Stream + ?Sized>(stream: &mut S, video: &Element) -> Result<VideoSettings> {
    let mut settings = VideoSettings::default();
    for child in video.children(stream)? {
        match child.id() {
            ids::PIXEL_WIDTH => settings.pixel_width = child.read_uint(stream)?,
            ids::PIXEL_HEIGHT => settings.pixel_height = child.read_uint(stream)?,
            ids::DISPLAY_WIDTH => settings.display_width = Some(child.read_uint(stream)?),
            ids::DISPLAY_HEIGHT => settings.display_height = Some(child.read_uint(stream)?),
            _ => {}
        }
    }
    Ok(settings)
}

fn parse_audio<S: Stream + ?Sized>(stream: &mut S, audio: &Element) -> Result<AudioSettings> {
    let mut settings = AudioSettings::default();
    for child in audio.children(stream)? {
        match child.id() {
            ids::SAMPLING_FREQUENCY => settings.sampling_frequency = child.read_float(stream)?,
            ids::CHANNELS => settings.channels = child.read_uint(stream)?,
            ids::BIT_DEPTH => settings.bit_depth = Some(child.read_uint(stream)?),
            _ => {}
        }
    }
    Ok(settings)
}

/// Convert a Matroska codec ID to a human-readable name.
pub fn codec_id_to_name(codec_id: &str) -> String {
    match codec_id {
        // Video codecs
        "V_MPEG4/ISO/AVC" => "AVC".to_string(),
        "V_MPEGH/ISO/HEVC" => "HEVC".to_string(),
        "V_AV1" => "AV1".to_string(),
        "V_VP8" => "VP8".to_string(),
        "V_VP9" => "VP9".to_string(),
        "V_MPEG2" => "MPEG-2".to_string(),
        "V_THEORA" => "Theora".to_string(),

        // Audio codecs
        "A_AAC" | "A_AAC/MPEG4/LC" | "A_AAC/MPEG2/LC" => "AAC".to_string(),
        "A_AC3" => "AC-3".to_string(),
        "A_EAC3" => "E-AC-3".to_string(),
        "A_DTS" => "DTS".to_string(),
        "A_TRUEHD" => "TrueHD".to_string(),
        "A_FLAC" => "FLAC".to_string(),
        "A_VORBIS" => "Vorbis".to_string(),
        "A_OPUS" => "Opus".to_string(),
        "A_MPEG/L3" => "MP3".to_string(),
        "A_PCM/INT/LIT" | "A_PCM/INT/BIG" => "PCM".to_string(),

        // Subtitle codecs
        "S_TEXT/UTF8" => "SRT".to_string(),
        "S_TEXT/ASS" | "S_TEXT/SSA" => "ASS".to_string(),
        "S_TEXT/WEBVTT" => "WebVTT".to_string(),
        "S_HDMV/PGS" => "PGS".to_string(),
        "S_VOBSUB" => "VobSub".to_string(),

        other => other
            .strip_prefix("V_")
            .or_else(|| other.strip_prefix("A_"))
            .or_else(|| other.strip_prefix("S_"))
            .unwrap_or(other)
            .to_string(),
    }
}
