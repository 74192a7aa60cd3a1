//! Filesystem handles.
//!
//! - [`File`]: an owned descriptor with open/create/seek/metadata/mapping
//! - [`Directory`]: an owned directory descriptor with enumeration
//! - [`Owner`] / [`Rights`] / [`FileType`]: stat-derived values
//!
//! Paths are borrowed `&CStr`; nothing in this module allocates.

mod dir;
pub mod dirent;
mod file;
pub mod listing;

pub use dir::Directory;
pub use dirent::{DirEntry, Dirents};
pub use file::File;
pub use listing::Listing;

pub use crate::flags::{OpenFlags, Protection, Seek};
pub use crate::handle::{Close, Scoped};

// ============================================================================
// Mode bits
// ============================================================================

/// File type mask.
pub const S_IFMT: u32 = 0o170000;
/// Regular file.
pub const S_IFREG: u32 = 0o100000;
/// Directory.
pub const S_IFDIR: u32 = 0o040000;
/// Symbolic link.
pub const S_IFLNK: u32 = 0o120000;
/// Character device.
pub const S_IFCHR: u32 = 0o020000;
/// Block device.
pub const S_IFBLK: u32 = 0o060000;
/// FIFO (named pipe).
pub const S_IFIFO: u32 = 0o010000;
/// Socket.
pub const S_IFSOCK: u32 = 0o140000;

// Directory entry type bytes. Shared by every supported kernel.

/// The file system did not record a type; stat the entry to find out.
pub const DT_UNKNOWN: u8 = 0;
/// FIFO (named pipe).
pub const DT_FIFO: u8 = 1;
/// Character device.
pub const DT_CHR: u8 = 2;
/// Directory.
pub const DT_DIR: u8 = 4;
/// Block device.
pub const DT_BLK: u8 = 6;
/// Regular file.
pub const DT_REG: u8 = 8;
/// Symbolic link.
pub const DT_LNK: u8 = 10;
/// Socket.
pub const DT_SOCK: u8 = 12;

// ============================================================================
// Owner / Rights
// ============================================================================

/// The user and group owning a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner {
    /// Numeric user id.
    pub user: u32,
    /// Numeric group id.
    pub group: u32,
}

impl Owner {
    /// Pair a user id with a group id.
    pub const fn new(user: u32, group: u32) -> Self {
        Owner { user, group }
    }
}

/// Kernel-defined permission bits.
///
/// Passed through to the kernel unchanged. Values read back from a file
/// carry the file type bits too; [`Rights::permissions`] strips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rights(u32);

impl Rights {
    /// `rw-r--r--`.
    pub const DEFAULT_FILE: Rights = Rights(0o644);
    /// `rwxr-xr-x`.
    pub const DEFAULT_DIR: Rights = Rights(0o755);

    /// Wrap a raw mode value such as `0o640`.
    pub const fn new(value: u32) -> Self {
        Rights(value)
    }

    /// The raw value as stored or passed to the kernel.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Permission, setuid/setgid and sticky bits only.
    pub const fn permissions(self) -> u32 {
        self.0 & 0o7777
    }

    /// Type of the file these rights were read from.
    pub fn file_type(self) -> FileType {
        FileType::from_mode(self.0)
    }
}

impl Default for Rights {
    fn default() -> Self {
        Self::DEFAULT_FILE
    }
}

// ============================================================================
// FileType
// ============================================================================

/// The type of a file (regular, directory, symlink, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Symbolic link.
    Symlink,
    /// Character device.
    CharDevice,
    /// Block device.
    BlockDevice,
    /// FIFO (named pipe).
    Fifo,
    /// Socket.
    Socket,
    /// Not reported, or not one of the above.
    Unknown,
}

impl FileType {
    /// From the `st_mode` field of a stat result.
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFREG => FileType::File,
            S_IFDIR => FileType::Dir,
            S_IFLNK => FileType::Symlink,
            S_IFCHR => FileType::CharDevice,
            S_IFBLK => FileType::BlockDevice,
            S_IFIFO => FileType::Fifo,
            S_IFSOCK => FileType::Socket,
            _ => FileType::Unknown,
        }
    }

    /// From a directory record's type byte.
    pub fn from_dirent_type(d_type: u8) -> Self {
        match d_type {
            DT_REG => FileType::File,
            DT_DIR => FileType::Dir,
            DT_LNK => FileType::Symlink,
            DT_CHR => FileType::CharDevice,
            DT_BLK => FileType::BlockDevice,
            DT_FIFO => FileType::Fifo,
            DT_SOCK => FileType::Socket,
            _ => FileType::Unknown,
        }
    }

    /// Regular file?
    pub fn is_file(self) -> bool {
        self == FileType::File
    }

    /// Directory?
    pub fn is_dir(self) -> bool {
        self == FileType::Dir
    }
}
