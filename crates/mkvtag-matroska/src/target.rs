//! Tag targets and the UID resolution pass.
//!
//! Targets are recorded as raw `(kind, value)` stubs while tags are parsed.
//! Once the whole segment has been read, [`resolve_targets`] links each stub
//! to the track or attachment it names. A resolved target only stores the
//! index into the owning list; the lists stay the sole owners.

use mkvtag_ebml::ids;

use crate::attachment::Attachment;
use crate::tag::Tag;
use crate::track::Track;

/// Which UID field of `Targets` a target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum UidKind {
    Track,
    Edition,
    Chapter,
    Attachment,
}

impl UidKind {
    /// Element ID of the matching `Tag*UID` field.
    pub fn element_id(self) -> u32 {
        match self {
            Self::Track => ids::TAG_TRACK_UID,
            Self::Edition => ids::TAG_EDITION_UID,
            Self::Chapter => ids::TAG_CHAPTER_UID,
            Self::Attachment => ids::TAG_ATTACHMENT_UID,
        }
    }

    /// Kind for a `Tag*UID` element ID.
    pub fn from_element_id(id: u32) -> Option<Self> {
        match id {
            ids::TAG_TRACK_UID => Some(Self::Track),
            ids::TAG_EDITION_UID => Some(Self::Edition),
            ids::TAG_CHAPTER_UID => Some(Self::Chapter),
            ids::TAG_ATTACHMENT_UID => Some(Self::Attachment),
            _ => None,
        }
    }
}

/// Non-owning link from a target to a parsed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum TargetRef {
    /// Index into the file's track list.
    Track(usize),
    /// Index into the attachment list.
    Attachment(usize),
}

/// One UID a tag applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct UidTarget {
    kind: UidKind,
    value: u64,
    resolved: Option<TargetRef>,
}

impl UidTarget {
    /// Create an unresolved target. A UID of 0 means "applies to all" and
    /// produces no target.
    pub fn new(kind: UidKind, value: u64) -> Option<Self> {
        (value != 0).then_some(Self {
            kind,
            value,
            resolved: None,
        })
    }

    pub fn kind(&self) -> UidKind {
        self.kind
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// The linked entity, if resolution found one.
    pub fn resolved(&self) -> Option<TargetRef> {
        self.resolved
    }

    /// Whether this target is still a stub.
    pub fn is_stub(&self) -> bool {
        self.resolved.is_none()
    }

    /// The linked track, looked up in the owning list.
    pub fn track<'a>(&self, tracks: &'a [Track]) -> Option<&'a Track> {
        match self.resolved {
            Some(TargetRef::Track(index)) => tracks.get(index),
            _ => None,
        }
    }

    /// The linked attachment, looked up in the owning list.
    pub fn attachment<'a>(&self, attachments: &'a [Attachment]) -> Option<&'a Attachment> {
        match self.resolved {
            Some(TargetRef::Attachment(index)) => attachments.get(index),
            _ => None,
        }
    }

    pub(crate) fn unlink(&mut self) {
        self.resolved = None;
    }

    pub(crate) fn resolve(&mut self, tracks: &[Track], attachments: &[Attachment]) {
        self.resolved = match self.kind {
            UidKind::Attachment => attachments
                .iter()
                .position(|a| a.uid == self.value)
                .map(TargetRef::Attachment),
            UidKind::Track => tracks
                .iter()
                .position(|t| t.uid == self.value)
                .map(TargetRef::Track),
            // Editions and chapters are not modeled.
            UidKind::Edition | UidKind::Chapter => None,
        };
    }
}

/// Link every stub target of `tags` to the attachment or track it names.
///
/// Unmatched stubs stay stubs; a dangling UID is not an error.
pub fn resolve_targets(tags: &mut [Tag], tracks: &[Track], attachments: &[Attachment]) {
    let mut linked = 0usize;
    let mut dangling = 0usize;
    for tag in tags.iter_mut() {
        for target in tag.targets.iter_mut().filter(|t| t.is_stub()) {
            target.resolve(tracks, attachments);
            if target.is_stub() {
                dangling += 1;
            } else {
                linked += 1;
            }
        }
    }
    tracing::debug!("Resolved {} tag targets, {} left unresolved", linked, dangling);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackKind;

    fn track(uid: u64) -> Track {
        Track {
            number: 1,
            uid,
            codec_id: "A_FLAC".to_string(),
            name: None,
            language: None,
            default: true,
            default_duration: None,
            kind: TrackKind::Subtitle,
        }
    }

    #[test]
    fn test_zero_uid_is_not_a_target() {
        assert!(UidTarget::new(UidKind::Track, 0).is_none());
        assert!(UidTarget::new(UidKind::Track, 5).is_some());
    }

    #[test]
    fn test_element_id_round_trip() {
        for kind in [
            UidKind::Track,
            UidKind::Edition,
            UidKind::Chapter,
            UidKind::Attachment,
        ] {
            assert_eq!(UidKind::from_element_id(kind.element_id()), Some(kind));
        }
        assert_eq!(UidKind::from_element_id(ids::TARGET_TYPE), None);
    }

    #[test]
    fn test_resolve_targets() {
        let tracks = vec![track(11), track(22)];
        let attachments = vec![Attachment::new("cover.jpg", "image/jpeg", vec![1, 2, 3]).with_uid(22)];

        let mut tag = Tag::new(30);
        tag.targets.extend(UidTarget::new(UidKind::Track, 22));
        tag.targets.extend(UidTarget::new(UidKind::Attachment, 22));
        tag.targets.extend(UidTarget::new(UidKind::Chapter, 22));
        tag.targets.extend(UidTarget::new(UidKind::Track, 99));
        let mut tags = vec![tag];

        resolve_targets(&mut tags, &tracks, &attachments);
        let targets = &tags[0].targets;
        assert_eq!(targets[0].resolved(), Some(TargetRef::Track(1)));
        assert_eq!(targets[0].track(&tracks).map(|t| t.uid), Some(22));
        assert_eq!(targets[1].resolved(), Some(TargetRef::Attachment(0)));
        assert!(targets[1].attachment(&attachments).is_some());
        assert!(targets[2].is_stub());
        assert!(targets[3].is_stub());
    }

    #[test]
    fn test_resolve_is_stable() {
        let tracks = vec![track(7)];
        let mut tag = Tag::new(30);
        tag.targets.extend(UidTarget::new(UidKind::Track, 7));
        let mut tags = vec![tag];
        resolve_targets(&mut tags, &tracks, &[]);
        resolve_targets(&mut tags, &tracks, &[]);
        assert_eq!(tags[0].targets[0].resolved(), Some(TargetRef::Track(0)));
    }
}
