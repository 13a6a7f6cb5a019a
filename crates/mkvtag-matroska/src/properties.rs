//! Audio/video properties exposed alongside the tags.

use std::fmt;

use crate::track::Track;

/// How much work a read pass spends on properties.
///
/// `None` skips Tracks entirely; the other levels all parse Tracks, since
/// nothing coarser than a full TrackEntry walk exists for Matroska.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum ReadStyle {
    None,
    Fast,
    #[default]
    Average,
    Accurate,
}

impl fmt::Display for ReadStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Fast => write!(f, "fast"),
            Self::Average => write!(f, "average"),
            Self::Accurate => write!(f, "accurate"),
        }
    }
}

impl std::str::FromStr for ReadStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "fast" => Ok(Self::Fast),
            "average" => Ok(Self::Average),
            "accurate" => Ok(Self::Accurate),
            _ => Err(format!("Invalid read style: {}", s)),
        }
    }
}

/// File-level properties.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Properties {
    /// Duration in milliseconds, 0 when the file does not declare one
    pub duration_ms: u64,
    /// Modeled tracks in file order
    pub tracks: Vec<Track>,
}

impl Properties {
    /// Whether the file has at least one video track.
    pub fn is_video(&self) -> bool {
        self.tracks.iter().any(Track::is_video)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.is_video())
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.is_audio())
    }

    pub fn subtitle_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.is_subtitle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{AudioSettings, TrackKind, VideoSettings};

    fn track(kind: TrackKind) -> Track {
        Track {
            number: 1,
            uid: 1,
            codec_id: String::new(),
            name: None,
            language: None,
            default: true,
            default_duration: None,
            kind,
        }
    }

    #[test]
    fn test_read_style_parse() {
        assert_eq!("Accurate".parse::<ReadStyle>(), Ok(ReadStyle::Accurate));
        assert_eq!("none".parse::<ReadStyle>(), Ok(ReadStyle::None));
        assert!("slow".parse::<ReadStyle>().is_err());
        assert_eq!(ReadStyle::default().to_string(), "average");
    }

    #[test]
    fn test_is_video() {
        let mut props = Properties {
            duration_ms: 0,
            tracks: vec![track(TrackKind::Audio(AudioSettings::default())), track(TrackKind::Subtitle)],
        };
        assert!(!props.is_video());
        assert_eq!(props.audio_tracks().count(), 1);
        assert_eq!(props.subtitle_tracks().count(), 1);

        props.tracks.push(track(TrackKind::Video(VideoSettings::default())));
        assert!(props.is_video());
        assert_eq!(props.video_tracks().count(), 1);
    }
}
