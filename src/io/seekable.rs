//! Seekable input streams
//!
//! The FITS reader jumps between headers and rows of data units, so every
//! input it accepts must support both reading and seeking.

use std::io::{Read, Seek};

/// A stream that can be read and repositioned
///
/// Files, buffered files and in-memory cursors all qualify.
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}
