//! Attached files (cover art, fonts, subtitles shipped as files).

use mkvtag_ebml::{ids, Element, ElementBuilder, Stream};

use crate::Result;

/// Role of an image attachment, guessed from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum PictureType {
    /// The attachment is not an image.
    NotAPicture,
    Other,
    FileIcon,
    OtherFileIcon,
    FrontCover,
    BackCover,
    LeafletPage,
    Media,
    LeadArtist,
    Artist,
    Conductor,
    Band,
    Composer,
    Lyricist,
    RecordingLocation,
    DuringRecording,
    DuringPerformance,
    MovieScreenCapture,
    ColouredFish,
    Illustration,
    BandLogo,
    PublisherLogo,
}

/// Named picture types in matching order. Names that contain another
/// name ("lead artist" contains "artist") come first.
const NAMED_PICTURE_TYPES: [PictureType; 20] = [
    PictureType::OtherFileIcon,
    PictureType::FileIcon,
    PictureType::FrontCover,
    PictureType::BackCover,
    PictureType::LeafletPage,
    PictureType::Media,
    PictureType::LeadArtist,
    PictureType::Artist,
    PictureType::Conductor,
    PictureType::BandLogo,
    PictureType::Band,
    PictureType::Composer,
    PictureType::Lyricist,
    PictureType::RecordingLocation,
    PictureType::DuringRecording,
    PictureType::DuringPerformance,
    PictureType::MovieScreenCapture,
    PictureType::ColouredFish,
    PictureType::Illustration,
    PictureType::PublisherLogo,
];

impl PictureType {
    /// Lower-case display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::NotAPicture => "not a picture",
            Self::Other => "other",
            Self::FileIcon => "file icon",
            Self::OtherFileIcon => "other file icon",
            Self::FrontCover => "front cover",
            Self::BackCover => "back cover",
            Self::LeafletPage => "leaflet page",
            Self::Media => "media",
            Self::LeadArtist => "lead artist",
            Self::Artist => "artist",
            Self::Conductor => "conductor",
            Self::Band => "band",
            Self::Composer => "composer",
            Self::Lyricist => "lyricist",
            Self::RecordingLocation => "recording location",
            Self::DuringRecording => "during recording",
            Self::DuringPerformance => "during performance",
            Self::MovieScreenCapture => "movie screen capture",
            Self::ColouredFish => "coloured fish",
            Self::Illustration => "illustration",
            Self::BandLogo => "band logo",
            Self::PublisherLogo => "publisher logo",
        }
    }

    /// Whether `filename` (already lower-cased) mentions this type, with
    /// words joined by a space, underscore, dash, or nothing.
    fn matches(self, filename: &str) -> bool {
        let name = self.name();
        [" ", "_", "-", ""]
            .iter()
            .any(|sep| filename.contains(&name.replace(' ', sep)))
    }

    /// Guess the picture type of an attachment.
    pub fn infer(mime_type: &str, filename: Option<&str>) -> Self {
        if !mime_type.starts_with("image/") {
            return Self::NotAPicture;
        }
        let Some(filename) = filename else {
            return Self::Other;
        };
        let lower = filename.to_lowercase();
        if let Some(found) = NAMED_PICTURE_TYPES.iter().find(|t| t.matches(&lower)) {
            return *found;
        }
        if lower.contains("cover") || lower.contains("poster") {
            Self::FrontCover
        } else {
            Self::Other
        }
    }
}

/// One attached file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Attachment {
    pub filename: Option<String>,
    pub description: Option<String>,
    pub mime_type: String,
    /// 0 means no UID; it is then omitted on write.
    pub uid: u64,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment without description or UID.
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: Some(filename.into()),
            description: None,
            mime_type: mime_type.into(),
            uid: 0,
            data,
        }
    }

    /// Set the UID.
    pub fn with_uid(mut self, uid: u64) -> Self {
        self.uid = uid;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Guessed role of this attachment.
    pub fn picture_type(&self) -> PictureType {
        PictureType::infer(&self.mime_type, self.filename.as_deref())
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty; empty attachments are never written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Parse every `AttachedFile` of an `Attachments` element.
pub(crate) fn parse_attachments<S: Stream + ?Sized>(
    stream: &mut S,
    attachments: &Element,
) -> Result<Vec<Attachment>> {
    let mut out = Vec::new();
    for file in attachments.children(stream)? {
        if file.id() != ids::ATTACHED_FILE {
            continue;
        }
        if let Some(attachment) = parse_attached_file(stream, &file)? {
            out.push(attachment);
        }
    }
    Ok(out)
}

fn parse_attached_file<S: Stream + ?Sized>(stream: &mut S, file: &Element) -> Result<Option<Attachment>> {
    let mut filename = None;
    let mut description = None;
    let mut mime_type = None;
    let mut uid = 0;
    let mut data = None;

    for child in file.children(stream)? {
        match child.id() {
            ids::FILE_NAME => filename = Some(child.read_string(stream)?),
            ids::FILE_DESCRIPTION => description = Some(child.read_string(stream)?),
            ids::FILE_MIME_TYPE => mime_type = Some(child.read_string(stream)?),
            ids::FILE_UID => uid = child.read_uint(stream)?,
            ids::FILE_DATA => data = Some(child.read_bytes(stream)?),
            _ => {}
        }
    }

    let (Some(mime_type), Some(data)) = (mime_type, data) else {
        tracing::warn!(
            "Skipping attached file at {} without MIME type or data",
            file.offset()
        );
        return Ok(None);
    };

    Ok(Some(Attachment {
        description: description.or_else(|| filename.clone()),
        filename,
        mime_type,
        uid,
        data,
    }))
}

/// Render an `Attachments` element, or `None` when nothing carries data.
pub(crate) fn render_attachments(attachments: &[Attachment]) -> Result<Option<ElementBuilder>> {
    let mut out = ElementBuilder::new(ids::ATTACHMENTS);
    for attachment in attachments.iter().filter(|a| !a.is_empty()) {
        let mut file = ElementBuilder::new(ids::ATTACHED_FILE);
        if let Some(description) = &attachment.description {
            if attachment.filename.as_ref() != Some(description) {
                file.string(ids::FILE_DESCRIPTION, description)?;
            }
        }
        if let Some(filename) = &attachment.filename {
            file.string(ids::FILE_NAME, filename)?;
        }
        file.string(ids::FILE_MIME_TYPE, &attachment.mime_type)?;
        if attachment.uid != 0 {
            file.uint(ids::FILE_UID, attachment.uid)?;
        }
        file.binary(ids::FILE_DATA, &attachment.data)?;
        out.child(file)?;
    }
    Ok((!out.is_empty()).then_some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkvtag_ebml::MemoryStream;

    fn round_trip(attachments: &[Attachment]) -> Vec<Attachment> {
        let Some(builder) = render_attachments(attachments).unwrap() else {
            return Vec::new();
        };
        let bytes = builder.build().unwrap();
        let len = bytes.len() as u64;
        let mut stream = MemoryStream::from(bytes.to_vec());
        let element = Element::read(&mut stream, 0, len).unwrap().unwrap();
        parse_attachments(&mut stream, &element).unwrap()
    }

    #[test]
    fn test_picture_type_inference() {
        assert_eq!(
            PictureType::infer("image/jpeg", Some("Front_Cover.jpg")),
            PictureType::FrontCover
        );
        assert_eq!(
            PictureType::infer("image/png", Some("back-cover.png")),
            PictureType::BackCover
        );
        assert_eq!(
            PictureType::infer("image/png", Some("lead artist.png")),
            PictureType::LeadArtist
        );
        assert_eq!(
            PictureType::infer("image/png", Some("BandLogo.png")),
            PictureType::BandLogo
        );
        assert_eq!(
            PictureType::infer("image/jpeg", Some("movie_poster.jpg")),
            PictureType::FrontCover
        );
        assert_eq!(
            PictureType::infer("image/jpeg", Some("cover.jpg")),
            PictureType::FrontCover
        );
        assert_eq!(
            PictureType::infer("image/jpeg", Some("scan01.jpg")),
            PictureType::Other
        );
        assert_eq!(PictureType::infer("image/jpeg", None), PictureType::Other);
        assert_eq!(
            PictureType::infer("application/x-truetype-font", Some("cover.ttf")),
            PictureType::NotAPicture
        );
    }

    #[test]
    fn test_description_defaults_to_filename() {
        let parsed = round_trip(&[Attachment::new("a.ttf", "font/ttf", vec![1])]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].description.as_deref(), Some("a.ttf"));
    }

    #[test]
    fn test_description_equal_to_filename_is_omitted() {
        let a = Attachment::new("a.ttf", "font/ttf", vec![1]).with_description("a.ttf");
        let bytes = render_attachments(&[a]).unwrap().unwrap().build().unwrap();
        let needle = ids::FILE_DESCRIPTION.to_be_bytes();
        assert!(!bytes.windows(2).any(|w| w == &needle[2..]));
    }

    #[test]
    fn test_empty_payload_is_skipped() {
        let attachments = [
            Attachment::new("empty.png", "image/png", Vec::new()),
            Attachment::new("cover.png", "image/png", vec![9; 16])
                .with_uid(42)
                .with_description("Cover art"),
        ];
        let parsed = round_trip(&attachments);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].filename.as_deref(), Some("cover.png"));
        assert_eq!(parsed[0].description.as_deref(), Some("Cover art"));
        assert_eq!(parsed[0].uid, 42);
        assert_eq!(parsed[0].data, vec![9; 16]);
        assert_eq!(parsed[0].picture_type(), PictureType::FrontCover);

        assert!(render_attachments(&attachments[..1]).unwrap().is_none());
    }

    #[test]
    fn test_file_data_is_last() {
        let a = Attachment::new("x.bin", "application/octet-stream", vec![0xAA; 4]).with_uid(5);
        let bytes = render_attachments(&[a]).unwrap().unwrap().build().unwrap();
        // FileData header (0x465C, size 4) and payload end the element
        let tail = &bytes[bytes.len() - 7..];
        assert_eq!(tail, &[0x46, 0x5C, 0x84, 0xAA, 0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn test_missing_mime_is_skipped() {
        let mut file = ElementBuilder::new(ids::ATTACHED_FILE);
        file.string(ids::FILE_NAME, "x").unwrap();
        file.binary(ids::FILE_DATA, &[1]).unwrap();
        let mut attachments = ElementBuilder::new(ids::ATTACHMENTS);
        attachments.child(file).unwrap();
        let bytes = attachments.build().unwrap();
        let len = bytes.len() as u64;
        let mut stream = MemoryStream::from(bytes.to_vec());
        let element = Element::read(&mut stream, 0, len).unwrap().unwrap();
        assert!(parse_attachments(&mut stream, &element).unwrap().is_empty());
    }
}
