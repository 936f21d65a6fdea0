//! Allocation table entry

use crate::constants::disk::{FAT_EOF, FAT_FREE, FIRST_DATA_BLOCK, TOTAL_BLOCKS};
use crate::filesys::FsError;

/// One 16-bit table slot describing the state of the block with the same index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    /// Block is unused
    Free,
    /// Block is the last in its chain
    Eof,
    /// Block continues at the given index
    Next(u16),
}

impl FatEntry {
    /// Decodes a raw table value; `block` is only used for error reporting
    pub fn from_raw(raw: i16, block: u16) -> Result<Self, FsError> {
        match raw {
            FAT_FREE => Ok(FatEntry::Free),
            FAT_EOF => Ok(FatEntry::Eof),
            next if next >= FIRST_DATA_BLOCK as i16 && (next as usize) < TOTAL_BLOCKS => {
                Ok(FatEntry::Next(next as u16))
            }
            _ => Err(FsError::CorruptChain { block }),
        }
    }

    pub fn to_raw(self) -> i16 {
        match self {
            FatEntry::Free => FAT_FREE,
            FatEntry::Eof => FAT_EOF,
            FatEntry::Next(next) => next as i16,
        }
    }

    /// Returns true if this entry marks the end of a chain
    pub fn is_end_of_chain(&self) -> bool {
        *self == FatEntry::Eof
    }

    /// Returns true if this block is unused/free
    pub fn is_free(&self) -> bool {
        *self == FatEntry::Free
    }
}
