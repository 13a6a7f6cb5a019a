//! mkvtag - Matroska/WebM tag editor
//!
//! This library crate exposes the configuration layer for integration testing.

pub mod config;
