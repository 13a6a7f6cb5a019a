//! mkvtag-ebml: EBML element handles for in-place editing
//!
//! This crate is the primitive layer under `mkvtag-matroska`. It reads EBML
//! element headers from a random-access [`Stream`], exposes typed payload
//! readers and writers, and performs every size change as a physical shift
//! of the trailing bytes so that sibling offsets stay consistent.
//!
//! # Modules
//!
//! - `stream` - Random-access byte streams (files and memory) with insert/remove
//! - `vint` - Variable-length integer coding for IDs and sizes
//! - `element` - Handles to existing elements: read, write, resize, remove
//! - `builder` - Rendering brand-new elements and Void padding
//! - `ids` - Matroska element IDs

pub mod builder;
pub mod element;
pub mod error;
pub mod ids;
pub mod stream;
pub mod vint;

pub use builder::{void_padding, ElementBuilder};
pub use element::Element;
pub use error::{Error, Result};
pub use stream::{MemoryStream, Stream};
