//! Host-facing API: open, inspect, edit and save a Matroska file.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use mkvtag_ebml::Stream;

use crate::engine;
use crate::info::SegmentInfo;
use crate::properties::{Properties, ReadStyle};
use crate::seekhead::SeekEntry;
use crate::tag::{Tag, TagTypes, Tags};
use crate::{Error, Result};

/// TargetTypeValue given to medium tags that did not declare one.
///
/// Which scope a file-wide tag belongs to depends on whether the file is a
/// video. The numbers are a caller decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPolicy {
    pub video: u16,
    pub audio: u16,
}

impl TargetPolicy {
    pub fn new(video: u16, audio: u16) -> Self {
        Self { video, audio }
    }

    /// Scope value for a file with or without video.
    pub fn for_file(&self, is_video: bool) -> u16 {
        if is_video {
            self.video
        } else {
            self.audio
        }
    }
}

/// Options for opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub read_style: ReadStyle,
    pub target_policy: TargetPolicy,
}

impl OpenOptions {
    pub fn new(target_policy: TargetPolicy) -> Self {
        Self {
            read_style: ReadStyle::default(),
            target_policy,
        }
    }

    pub fn read_style(mut self, read_style: ReadStyle) -> Self {
        self.read_style = read_style;
        self
    }
}

/// An open Matroska or WebM file.
#[derive(Debug)]
pub struct MatroskaFile<S: Stream = File> {
    stream: S,
    writable: bool,
    options: OpenOptions,
    doc_type: String,
    info: SegmentInfo,
    properties: Properties,
    seek_entries: Vec<SeekEntry>,
    tags: Tags,
}

impl MatroskaFile<File> {
    /// Open a file on disk. Without write permission the file is opened
    /// read-only and [`MatroskaFile::save`] fails with [`Error::ReadOnly`].
    pub fn open(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let (file, writable) = match fs::OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => (file, true),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                tracing::debug!("{} is not writable, opening read-only", path.display());
                (File::open(path)?, false)
            }
            Err(e) => return Err(e.into()),
        };
        Self::load(file, options, writable)
    }
}

impl<S: Stream> MatroskaFile<S> {
    /// Read a file from any stream. The stream is assumed writable.
    pub fn from_stream(stream: S, options: OpenOptions) -> Result<Self> {
        Self::load(stream, options, true)
    }

    fn load(mut stream: S, options: OpenOptions, writable: bool) -> Result<Self> {
        let doc = engine::read(&mut stream, options.read_style)?;

        let mut tags = Tags::new();
        tags.title = doc.info.title.clone();
        tags.set_parsed(doc.tags, doc.attachments);

        let properties = Properties {
            duration_ms: doc.info.duration_ms(),
            tracks: doc.tracks,
        };
        tracing::debug!(
            "Opened {} file: {} tags, {} attachments, {} tracks",
            doc.doc_type,
            tags.len(),
            tags.attachments().len(),
            properties.tracks.len()
        );

        Ok(Self {
            stream,
            writable,
            options,
            doc_type: doc.doc_type,
            info: doc.info,
            properties,
            seek_entries: doc.seek_entries,
            tags,
        })
    }

    /// Write the current model back to the stream.
    pub fn save(&mut self) -> Result<()> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }
        engine::write(&mut self.stream, &self.tags)?;

        // Pick up the new layout; the in-memory model stays authoritative.
        let doc = engine::read(&mut self.stream, ReadStyle::None)?;
        self.info = doc.info;
        self.seek_entries = doc.seek_entries;
        tracing::info!("Saved {} file", self.doc_type);
        Ok(())
    }

    /// Clear tags, title and attachments when `types` covers Matroska tags.
    pub fn remove_tags(&mut self, types: TagTypes) {
        if types.contains(TagTypes::MATROSKA) {
            self.tags.clear();
        }
    }

    /// The medium tag when `types` covers Matroska tags.
    ///
    /// With `create` the medium tag is materialized if missing; without it
    /// only an existing one is returned.
    pub fn get_tag(&mut self, types: TagTypes, create: bool) -> Option<&mut Tag> {
        if !types.contains(TagTypes::MATROSKA) {
            return None;
        }
        self.resolve_defaults();
        if create {
            return Some(self.tags.medium_mut());
        }
        let index = self.tags.medium_index()?;
        self.tags.tags_mut().get_mut(index)
    }

    /// All tags, with defaults resolved and a medium tag present.
    pub fn tag(&mut self) -> &mut Tags {
        self.resolve_defaults();
        self.tags.medium_mut();
        &mut self.tags
    }

    /// Tags as read, without resolving defaults.
    pub fn raw_tags(&self) -> &Tags {
        &self.tags
    }

    fn resolve_defaults(&mut self) {
        if self.tags.default_target_value().is_none() {
            let value = self
                .options
                .target_policy
                .for_file(self.properties.is_video());
            self.tags.resolve_defaults(value);
        }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn info(&self) -> &SegmentInfo {
        &self.info
    }

    /// "matroska" or "webm".
    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// SeekHead entries as of the last read or save.
    pub fn seek_entries(&self) -> &[SeekEntry] {
        &self.seek_entries
    }

    pub fn is_read_only(&self) -> bool {
        !self.writable
    }

    /// Release the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}
