//! Tag, SimpleTag and the file-level tag collection.

use std::collections::BTreeMap;

use mkvtag_ebml::{ids, Element, ElementBuilder, Stream};

use crate::attachment::Attachment;
use crate::target::{UidKind, UidTarget};
use crate::Result;

/// Upper-case key to the ordered list of values stored under it.
pub type SimpleTagMap = BTreeMap<String, Vec<SimpleTag>>;

/// Bit mask of tag formats, as used by `remove_tags` and `get_tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagTypes(u32);

impl TagTypes {
    pub const NONE: Self = Self(0);
    pub const MATROSKA: Self = Self(1);
    pub const ALL: Self = Self(u32::MAX);

    /// Whether every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TagTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Value of a SimpleTag: text and binary are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum TagValue {
    Text(String),
    Binary(Vec<u8>),
}

/// One key/value entry, possibly with nested entries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SimpleTag {
    pub value: TagValue,
    pub language: Option<String>,
    /// Matroska's TagDefault, true unless the file says otherwise.
    pub is_default: bool,
    children: SimpleTagMap,
}

impl SimpleTag {
    /// Text entry with no language.
    pub fn text(value: impl Into<String>) -> Self {
        Self::with_value(TagValue::Text(value.into()))
    }

    /// Binary entry with no language.
    pub fn binary(value: Vec<u8>) -> Self {
        Self::with_value(TagValue::Binary(value))
    }

    fn with_value(value: TagValue) -> Self {
        Self {
            value,
            language: None,
            is_default: true,
            children: SimpleTagMap::new(),
        }
    }

    /// Set the language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.value, TagValue::Binary(_))
    }

    /// The text value, if this is a text entry.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            TagValue::Text(s) => Some(s),
            TagValue::Binary(_) => None,
        }
    }

    /// Nested entries.
    pub fn children(&self) -> &SimpleTagMap {
        &self.children
    }

    /// Append a nested entry under `key` (stored upper-case).
    pub fn insert_child(&mut self, key: &str, child: SimpleTag) {
        self.children.entry(key.to_uppercase()).or_default().push(child);
    }
}

/// A tag: a scope, the UIDs it targets, and its entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Tag {
    /// 0 until defaults are resolved when the file did not declare one.
    pub target_type_value: u16,
    pub target_type: Option<String>,
    /// Empty means the tag applies to the whole file.
    pub targets: Vec<UidTarget>,
    simple_tags: SimpleTagMap,
}

impl Tag {
    /// Empty file-wide tag with the given scope.
    pub fn new(target_type_value: u16) -> Self {
        Self {
            target_type_value,
            ..Self::default()
        }
    }

    /// All entries.
    pub fn simple_tags(&self) -> &SimpleTagMap {
        &self.simple_tags
    }

    /// Entries stored under `key`.
    pub fn get(&self, key: &str) -> &[SimpleTag] {
        self.simple_tags
            .get(&key.to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First text value under `key`.
    pub fn first_text(&self, key: &str) -> Option<&str> {
        self.get(key).iter().find_map(SimpleTag::as_text)
    }

    /// Append an entry under `key` (stored upper-case).
    pub fn insert(&mut self, key: &str, value: SimpleTag) {
        self.simple_tags.entry(key.to_uppercase()).or_default().push(value);
    }

    /// Replace every entry under `key` with a single text value.
    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.simple_tags
            .insert(key.to_uppercase(), vec![SimpleTag::text(value)]);
    }

    /// Remove every entry under `key`.
    pub fn remove(&mut self, key: &str) -> Vec<SimpleTag> {
        self.simple_tags.remove(&key.to_uppercase()).unwrap_or_default()
    }

    /// Whether the tag has no entries.
    pub fn is_empty(&self) -> bool {
        self.simple_tags.values().all(Vec::is_empty)
    }

    /// Whether the tag applies to the whole file.
    pub fn is_file_wide(&self) -> bool {
        self.targets.is_empty()
    }

    /// Add a UID target. A UID of 0 is ignored.
    pub fn add_target(&mut self, kind: UidKind, uid: u64) {
        self.targets.extend(UidTarget::new(kind, uid));
    }
}

/// Everything taggable in a file: tags, title and attachments.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Tags {
    tags: Vec<Tag>,
    pub title: Option<String>,
    attachments: Vec<Attachment>,
    default_target_value: Option<u16>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// All tags in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Mutable access to all tags.
    pub fn tags_mut(&mut self) -> &mut [Tag] {
        &mut self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether there are no tags at all (title and attachments aside).
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Append a tag.
    pub fn push(&mut self, mut tag: Tag) {
        if let Some(default) = self.default_target_value.filter(|_| tag.target_type_value == 0) {
            tag.target_type_value = default;
        }
        self.tags.push(tag);
    }

    /// Whether any tag has entries worth writing.
    pub fn has_content(&self) -> bool {
        self.tags.iter().any(|t| !t.is_empty())
    }

    /// Fill in the scope of every tag that did not declare one.
    ///
    /// Idempotent: only tags still at 0 change.
    pub fn resolve_defaults(&mut self, default_target_value: u16) {
        for tag in self.tags.iter_mut().filter(|t| t.target_type_value == 0) {
            tag.target_type_value = default_target_value;
        }
        self.default_target_value = Some(default_target_value);
    }

    /// The scope value defaults resolved to, once resolved.
    pub fn default_target_value(&self) -> Option<u16> {
        self.default_target_value
    }

    pub(crate) fn medium_index(&self) -> Option<usize> {
        let wanted = self.default_target_value.unwrap_or(0);
        let file_wide = || self.tags.iter().enumerate().filter(|(_, t)| t.is_file_wide());
        file_wide()
            .find(|(_, t)| t.target_type_value == wanted)
            .or_else(|| file_wide().min_by_key(|(_, t)| t.target_type_value))
            .map(|(i, _)| i)
    }

    /// The file-wide tag at the default (or lowest) scope, if one exists.
    pub fn medium(&self) -> Option<&Tag> {
        self.medium_index().map(|i| &self.tags[i])
    }

    /// The medium tag, created when missing.
    pub fn medium_mut(&mut self) -> &mut Tag {
        let index = match self.medium_index() {
            Some(i) => i,
            None => {
                let default = self.default_target_value.unwrap_or(0);
                self.tags.push(Tag::new(default));
                self.tags.len() - 1
            }
        };
        &mut self.tags[index]
    }

    /// Attached files.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Add an attached file.
    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
        self.relink_attachments();
    }

    /// Remove attached files whose filename or description equals `name`.
    /// Returns the number removed.
    pub fn detach(&mut self, name: &str) -> usize {
        let before = self.attachments.len();
        self.attachments.retain(|a| {
            a.filename.as_deref() != Some(name) && a.description.as_deref() != Some(name)
        });
        let removed = before - self.attachments.len();
        if removed > 0 {
            self.relink_attachments();
        }
        removed
    }

    /// Remove the attached file with the given UID.
    pub fn detach_uid(&mut self, uid: u64) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.uid != uid);
        let removed = self.attachments.len() != before;
        if removed {
            self.relink_attachments();
        }
        removed
    }

    /// Remove every tag, the title and all attachments.
    pub fn clear(&mut self) {
        self.tags.clear();
        self.title = None;
        self.attachments.clear();
    }

    pub(crate) fn set_parsed(&mut self, tags: Vec<Tag>, attachments: Vec<Attachment>) {
        self.tags = tags;
        self.attachments = attachments;
    }

    // Attachment indices move when the list changes; re-point the links.
    fn relink_attachments(&mut self) {
        let attachments = &self.attachments;
        for target in self.tags.iter_mut().flat_map(|t| t.targets.iter_mut()) {
            if target.kind() == UidKind::Attachment {
                target.unlink();
                target.resolve(&[], attachments);
            }
        }
    }
}

/// Parse every `Tag` of a `Tags` element.
pub(crate) fn parse_tags<S: Stream + ?Sized>(stream: &mut S, tags: &Element) -> Result<Vec<Tag>> {
    let mut out = Vec::new();
    for child in tags.children(stream)? {
        if child.id() == ids::TAG {
            out.push(parse_tag(stream, &child)?);
        }
    }
    Ok(out)
}

fn parse_tag<S: Stream + ?Sized>(stream: &mut S, element: &Element) -> Result<Tag> {
    let mut tag = Tag::default();
    for child in element.children(stream)? {
        match child.id() {
            ids::TARGETS => parse_targets(stream, &child, &mut tag)?,
            ids::SIMPLE_TAG => {
                if let Some((key, simple)) = parse_simple_tag(stream, &child)? {
                    tag.simple_tags.entry(key).or_default().push(simple);
                }
            }
            _ => {}
        }
    }
    Ok(tag)
}

fn parse_targets<S: Stream + ?Sized>(stream: &mut S, element: &Element, tag: &mut Tag) -> Result<()> {
    for child in element.children(stream)? {
        match child.id() {
            ids::TARGET_TYPE_VALUE => {
                let raw = child.read_uint(stream)?;
                tag.target_type_value = u16::try_from(raw).unwrap_or(u16::MAX);
            }
            ids::TARGET_TYPE => tag.target_type = Some(child.read_string(stream)?),
            id => {
                if let Some(kind) = UidKind::from_element_id(id) {
                    tag.add_target(kind, child.read_uint(stream)?);
                }
            }
        }
    }
    Ok(())
}

fn parse_simple_tag<S: Stream + ?Sized>(
    stream: &mut S,
    element: &Element,
) -> Result<Option<(String, SimpleTag)>> {
    let mut name = None;
    let mut language = None;
    let mut bcp47 = None;
    let mut is_default = true;
    let mut value = None;
    let mut children = SimpleTagMap::new();

    for child in element.children(stream)? {
        match child.id() {
            ids::TAG_NAME => name = Some(child.read_string(stream)?),
            ids::TAG_LANGUAGE => language = Some(child.read_string(stream)?),
            ids::TAG_LANGUAGE_BCP47 => bcp47 = Some(child.read_string(stream)?),
            ids::TAG_DEFAULT => is_default = child.read_uint(stream)? != 0,
            ids::TAG_STRING => value = Some(TagValue::Text(child.read_string(stream)?)),
            ids::TAG_BINARY => value = Some(TagValue::Binary(child.read_bytes(stream)?)),
            ids::SIMPLE_TAG => {
                if let Some((key, nested)) = parse_simple_tag(stream, &child)? {
                    children.entry(key).or_default().push(nested);
                }
            }
            _ => {}
        }
    }

    let Some(name) = name else {
        tracing::warn!("Skipping SimpleTag at {} without TagName", element.offset());
        return Ok(None);
    };

    Ok(Some((
        name.to_uppercase(),
        SimpleTag {
            // A nested-only entry carries an empty text value.
            value: value.unwrap_or_else(|| TagValue::Text(String::new())),
            language: language.or(bcp47),
            is_default,
            children,
        },
    )))
}

/// Render a `Tags` element holding every non-empty tag, or `None`.
pub(crate) fn render_tags(tags: &Tags) -> Result<Option<ElementBuilder>> {
    let mut out = ElementBuilder::new(ids::TAGS);
    for tag in tags.iter().filter(|t| !t.is_empty()) {
        out.child(render_tag(tag)?)?;
    }
    Ok((!out.is_empty()).then_some(out))
}

fn render_tag(tag: &Tag) -> Result<ElementBuilder> {
    let mut targets = ElementBuilder::new(ids::TARGETS);
    if tag.target_type_value > 0 {
        targets.uint(ids::TARGET_TYPE_VALUE, u64::from(tag.target_type_value))?;
    }
    if let Some(target_type) = &tag.target_type {
        targets.string(ids::TARGET_TYPE, target_type)?;
    }
    for target in &tag.targets {
        targets.uint(target.kind().element_id(), target.value())?;
    }

    let mut out = ElementBuilder::new(ids::TAG);
    out.child(targets)?;
    render_simple_tags(&mut out, &tag.simple_tags)?;
    Ok(out)
}

fn render_simple_tags(parent: &mut ElementBuilder, map: &SimpleTagMap) -> Result<()> {
    for (key, values) in map {
        for simple in values {
            let mut element = ElementBuilder::new(ids::SIMPLE_TAG);
            element.string(ids::TAG_NAME, key)?;
            if let Some(language) = &simple.language {
                element.string(ids::TAG_LANGUAGE, language)?;
            }
            if !simple.is_default {
                element.uint(ids::TAG_DEFAULT, 0)?;
            }
            match &simple.value {
                TagValue::Text(text) => element.string(ids::TAG_STRING, text)?,
                TagValue::Binary(data) => element.binary(ids::TAG_BINARY, data)?,
            };
            render_simple_tags(&mut element, &simple.children)?;
            parent.child(element)?;
        }
    }
    Ok(())
}
