use mkvtag_matroska::{ReadStyle, TargetPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub targets: TargetsConfig,

    #[serde(default)]
    pub read: ReadConfig,
}

impl Config {
    /// Open options for the Matroska library.
    pub fn open_options(&self) -> anyhow::Result<mkvtag_matroska::OpenOptions> {
        Ok(mkvtag_matroska::OpenOptions::new(self.targets.policy()).read_style(self.read.style()?))
    }
}

/// TargetTypeValue assigned to file-wide tags that do not declare one.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetsConfig {
    /// Scope for files with at least one video track (default: 50, MOVIE)
    #[serde(default = "default_video_target")]
    pub video: u16,

    /// Scope for audio-only files (default: 30, TRACK)
    #[serde(default = "default_audio_target")]
    pub audio: u16,
}

fn default_video_target() -> u16 {
    50
}

fn default_audio_target() -> u16 {
    30
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            video: default_video_target(),
            audio: default_audio_target(),
        }
    }
}

impl TargetsConfig {
    pub fn policy(&self) -> TargetPolicy {
        TargetPolicy::new(self.video, self.audio)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadConfig {
    /// How much effort to spend on properties: none, fast, average, accurate
    #[serde(default = "default_properties")]
    pub properties: String,
}

fn default_properties() -> String {
    ReadStyle::default().to_string()
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            properties: default_properties(),
        }
    }
}

impl ReadConfig {
    pub fn style(&self) -> anyhow::Result<ReadStyle> {
        self.properties.parse().map_err(anyhow::Error::msg)
    }
}
