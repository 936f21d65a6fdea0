//! Directory record layout.
//!
//! A record is 64 bytes, little endian:
//! `name[56] | size: u32 | first_block: u16 | kind: u8 | rights: u8`.

use super::disk::BLOCK_SIZE;

/// Size of one directory record in bytes
pub const DIR_ENTRY_SIZE: usize = 64;

/// Number of record slots in one directory block
pub const SLOTS_PER_DIR: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;

/// Width of the NUL terminated name field
pub const NAME_FIELD_LEN: usize = 56;

/// Longest name that still leaves room for the terminator
pub const MAX_NAME_LEN: usize = NAME_FIELD_LEN - 1;

pub const SIZE_OFFSET: usize = 56;
pub const FIRST_BLOCK_OFFSET: usize = 60;
pub const KIND_OFFSET: usize = 62;
pub const RIGHTS_OFFSET: usize = 63;

/// Raw kind tag of a regular file
pub const TYPE_FILE: u8 = 0;

/// Raw kind tag of a directory
pub const TYPE_DIR: u8 = 1;

/// Name of the synthetic back-link stored in every non-root directory
pub const PARENT_ENTRY_NAME: &str = "..";

/// Name accepted by `cd` to jump back to the root
pub const ROOT_MARKER: &str = "/";
