//! Walking packed directory records.
//!
//! The kernel fills a buffer with variable-length records, each carrying its
//! own length. [`Dirents`] walks such a buffer and yields borrowed
//! [`DirEntry`] views. It checks every record against the bytes actually
//! filled and stops at the first one that is truncated, too short, or
//! overshoots the end, so a corrupt buffer can end the walk early but can
//! never cause an out-of-bounds read.

use core::{ffi::CStr, fmt};

use super::FileType;
use crate::abi::DirentLayout;

/// One entry of a directory listing, borrowed from the listing buffer.
#[derive(Clone, Copy)]
pub struct DirEntry<'a> {
    name: &'a CStr,
    d_type: Option<u8>,
}

impl<'a> DirEntry<'a> {
    /// The entry name (no path prefix).
    pub fn name(&self) -> &'a CStr {
        self.name
    }

    /// The entry name without its terminator.
    pub fn name_bytes(&self) -> &'a [u8] {
        self.name.to_bytes()
    }

    /// Is this the `.` or `..` entry?
    pub fn is_dot(&self) -> bool {
        matches!(self.name_bytes(), b"." | b"..")
    }

    /// The entry type, when the record format carries one.
    pub fn file_type(&self) -> FileType {
        self.d_type
            .map(FileType::from_dirent_type)
            .unwrap_or(FileType::Unknown)
    }
}

impl fmt::Debug for DirEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirEntry")
            .field("name", &self.name)
            .field("type", &self.file_type())
            .finish()
    }
}

/// Iterator over the records of a filled buffer.
#[derive(Clone)]
pub struct Dirents<'a> {
    buf: &'a [u8],
    layout: DirentLayout,
    cursor: usize,
}

impl<'a> Dirents<'a> {
    /// Walk `buf`, which must contain exactly the bytes the kernel reported.
    pub fn new(buf: &'a [u8], layout: DirentLayout) -> Self {
        Dirents {
            buf,
            layout,
            cursor: 0,
        }
    }

    /// Offset of the next record.
    pub fn offset(&self) -> usize {
        self.cursor
    }

    fn corrupt(&mut self, what: &str) -> Option<DirEntry<'a>> {
        log::warn!(
            "directory record at offset {} of {}: {}",
            self.cursor,
            self.buf.len(),
            what
        );
        self.cursor = self.buf.len();
        None
    }
}

impl<'a> Iterator for Dirents<'a> {
    type Item = DirEntry<'a>;

    fn next(&mut self) -> Option<DirEntry<'a>> {
        let remaining = self.buf.len().checked_sub(self.cursor)?;
        if remaining == 0 {
            return None;
        }
        if remaining < self.layout.header_len() {
            return self.corrupt("truncated header");
        }

        let record = &self.buf[self.cursor..];
        let at = self.layout.reclen_offset;
        let reclen = u16::from_ne_bytes([record[at], record[at + 1]]) as usize;
        if reclen < self.layout.min_reclen() {
            return self.corrupt("record length too small");
        }
        if reclen > remaining {
            return self.corrupt("record length overshoots buffer");
        }

        let record = &record[..reclen];
        let Ok(name) = CStr::from_bytes_until_nul(&record[self.layout.name_offset..]) else {
            return self.corrupt("unterminated name");
        };
        let d_type = self.layout.type_offset.map(|off| record[off]);

        self.cursor += reclen;
        Some(DirEntry { name, d_type })
    }
}

impl core::iter::FusedIterator for Dirents<'_> {}
