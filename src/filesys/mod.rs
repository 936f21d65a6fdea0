use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::result::Result;
use core::str::FromStr;

use bitflags::bitflags;

pub mod block;
pub mod fat;
pub mod source;

pub use source::ContentSource;

// Define error types for the filesystem operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    NotFound,
    AlreadyExists,
    InvalidName,
    /// Access rights string is not a single octal digit
    InvalidRights,
    NameTooLong,
    NotAFile,
    NotADirectory,
    DirectoryFull,
    DirectoryNotEmpty,
    DiskFull,
    IOError,
    /// Device geometry does not match the volume layout
    UnsupportedDevice { block_size: usize, total_blocks: u64 },
    /// Allocation table walk hit an impossible value
    CorruptChain { block: u16 },
    /// Parent links do not lead back to the root
    CorruptDirectory { block: u16 },
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::NotFound => write!(f, "No such file or directory"),
            FsError::AlreadyExists => write!(f, "File already exists"),
            FsError::InvalidName => write!(f, "Invalid file name"),
            FsError::InvalidRights => write!(f, "Invalid access rights (expected 0-7)"),
            FsError::NameTooLong => write!(f, "Filename too long (max 55 characters)"),
            FsError::NotAFile => write!(f, "Not a file"),
            FsError::NotADirectory => write!(f, "Not a directory"),
            FsError::DirectoryFull => write!(f, "Directory is full"),
            FsError::DirectoryNotEmpty => write!(f, "Directory not empty"),
            FsError::DiskFull => write!(f, "Disk is full"),
            FsError::IOError => write!(f, "Block device I/O error"),
            FsError::UnsupportedDevice {
                block_size,
                total_blocks,
            } => write!(
                f,
                "Unsupported device geometry ({} blocks of {} bytes)",
                total_blocks, block_size
            ),
            FsError::CorruptChain { block } => {
                write!(f, "Corrupt allocation chain at block {}", block)
            }
            FsError::CorruptDirectory { block } => {
                write!(f, "Corrupt directory linkage at block {}", block)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FsError {}

// Core traits for filesystem abstraction

/// Represents a block device that can be read from and written to
pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_num: u64, buf: &mut [u8]) -> Result<(), FsError>;
    fn write_block(&mut self, block_num: u64, buf: &[u8]) -> Result<(), FsError>;
    fn block_size(&self) -> usize;
    fn total_blocks(&self) -> u64;
}

impl<T: BlockDevice + ?Sized> BlockDevice for &mut T {
    fn read_block(&self, block_num: u64, buf: &mut [u8]) -> Result<(), FsError> {
        (**self).read_block(block_num, buf)
    }

    fn write_block(&mut self, block_num: u64, buf: &[u8]) -> Result<(), FsError> {
        (**self).write_block(block_num, buf)
    }

    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn total_blocks(&self) -> u64 {
        (**self).total_blocks()
    }
}

/// Kind tag stored in every directory record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "dir"),
        }
    }
}

bitflags! {
    /// Access rights bitmask. Stored only, never enforced.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessRights: u8 {
        const EXECUTE = 0x01;
        const WRITE = 0x02;
        const READ = 0x04;
    }
}

impl AccessRights {
    /// Rights given to newly created files
    pub const FILE_DEFAULT: AccessRights = AccessRights::READ.union(AccessRights::WRITE);

    /// Rights given to new directories and their `..` link
    pub const DIR_DEFAULT: AccessRights = AccessRights::all();
}

impl fmt::Display for AccessRights {
    /// Formats as `rwx`, with `-` for missing bits
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |bit: AccessRights, c: char| if self.contains(bit) { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(AccessRights::READ, 'r'),
            flag(AccessRights::WRITE, 'w'),
            flag(AccessRights::EXECUTE, 'x')
        )
    }
}

impl FromStr for AccessRights {
    type Err = FsError;

    /// Parses the single octal digit form used on the command line ("0" to "7")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = u8::from_str_radix(s.trim(), 8).map_err(|_| FsError::InvalidRights)?;
        AccessRights::from_bits(value).ok_or(FsError::InvalidRights)
    }
}

/// Represents a directory entry as seen by callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub metadata: FileMetadata,
}

/// File metadata information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// Byte length for files, `None` for directories
    pub size: Option<u32>,
    pub kind: EntryKind,
    pub first_block: u16,
    pub permissions: AccessRights,
}

impl FileMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// The command surface every volume implementation exposes.
///
/// Names are single path components resolved against the working directory;
/// only `cd` understands the root marker `/`.
pub trait FileSystem {
    /// Discards all content and writes an empty table and root directory
    fn format(&mut self) -> Result<(), FsError>;
    /// Creates a file whose content is drained from `source`
    fn create(&mut self, name: &str, source: &mut dyn ContentSource) -> Result<(), FsError>;
    /// Returns the full content of a file
    fn cat(&self, name: &str) -> Result<Vec<u8>, FsError>;
    /// Lists the working directory in slot order
    fn ls(&self) -> Result<Vec<DirEntry>, FsError>;
    fn cp(&mut self, src: &str, dst: &str) -> Result<(), FsError>;
    fn mv(&mut self, src: &str, dst: &str) -> Result<(), FsError>;
    fn rm(&mut self, name: &str) -> Result<(), FsError>;
    /// Appends the content of `src` to the end of `dst`
    fn append(&mut self, src: &str, dst: &str) -> Result<(), FsError>;
    fn mkdir(&mut self, name: &str) -> Result<(), FsError>;
    fn cd(&mut self, name: &str) -> Result<(), FsError>;
    fn pwd(&self) -> Result<String, FsError>;
    fn chmod(&mut self, rights: AccessRights, name: &str) -> Result<(), FsError>;
}
