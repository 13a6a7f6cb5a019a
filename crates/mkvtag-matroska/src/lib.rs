//! # mkvtag-matroska
//!
//! Read and rewrite the metadata of Matroska/WebM files in place: title,
//! tags (with nested SimpleTags and UID targets) and attachments. Clusters
//! and every other Segment child are passed through byte for byte; only
//! the Tags, Attachments and SeekHead regions are regenerated on save.
//!
//! ## Example
//!
//! ```no_run
//! use mkvtag_matroska::{MatroskaFile, OpenOptions, TargetPolicy};
//!
//! let options = OpenOptions::new(TargetPolicy::new(50, 30));
//! let mut file = MatroskaFile::open("movie.mkv", options).unwrap();
//!
//! println!("Duration: {}ms", file.properties().duration_ms);
//! let tags = file.tag();
//! tags.title = Some("A Movie".to_string());
//! tags.medium_mut().set_text("DIRECTOR", "Someone");
//! file.save().unwrap();
//! ```

pub mod attachment;
mod engine;
pub mod error;
pub mod file;
pub mod info;
pub mod properties;
pub mod seekhead;
pub mod tag;
pub mod target;
pub mod track;

pub use attachment::{Attachment, PictureType};
pub use engine::SUPPORTED_DOC_TYPES;
pub use error::{Error, Result};
pub use file::{MatroskaFile, OpenOptions, TargetPolicy};
pub use info::SegmentInfo;
pub use properties::{Properties, ReadStyle};
pub use seekhead::SeekEntry;
pub use tag::{SimpleTag, SimpleTagMap, Tag, TagTypes, TagValue, Tags};
pub use target::{TargetRef, UidKind, UidTarget};
pub use track::{AudioSettings, Track, TrackKind, TrackType, VideoSettings};
