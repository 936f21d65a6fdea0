//! A small FAT-style file system living on a fixed 2048 x 4 KiB block volume.
//!
//! Block 0 is the root directory, block 1 the allocation table, and the rest
//! hold file data and subdirectories. [`FatFs`] implements the command surface
//! of [`FileSystem`] on top of any [`BlockDevice`].
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]
extern crate alloc;

pub mod constants;
pub mod filesys;
pub mod logging;

pub use filesys::block::MemoryBlockDevice;
pub use filesys::fat::FatFs;
pub use filesys::{
    AccessRights, BlockDevice, ContentSource, DirEntry, EntryKind, FileMetadata, FileSystem,
    FsError,
};

#[cfg(feature = "std")]
pub use filesys::block::FileBlockDevice;
#[cfg(feature = "std")]
pub use filesys::source::LineSource;

/// Traits needed to drive a mounted volume
pub mod prelude {
    pub use crate::filesys::{BlockDevice, ContentSource, FileSystem};
}
