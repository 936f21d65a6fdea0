//! In-memory copy of the allocation table stored in `FAT_BLOCK`.
//!
//! The table is loaded at the start of an operation and persisted explicitly
//! by the caller; nothing here writes to the device on its own.

use super::fat_entry::FatEntry;
use crate::constants::disk::{
    BLOCK_SIZE, FAT_BLOCK, FAT_ENTRY_SIZE, FIRST_DATA_BLOCK, ROOT_BLOCK, TOTAL_BLOCKS,
};
use crate::filesys::{BlockDevice, FsError};
use alloc::vec;
use alloc::vec::Vec;

pub struct FatTable {
    entries: Vec<FatEntry>,
}

impl FatTable {
    /// Table of a freshly formatted volume: root and table blocks reserved,
    /// everything else free
    pub fn formatted() -> Self {
        let mut entries = vec![FatEntry::Free; TOTAL_BLOCKS];
        entries[ROOT_BLOCK as usize] = FatEntry::Eof;
        entries[FAT_BLOCK as usize] = FatEntry::Eof;
        Self { entries }
    }

    /// Reads and decodes the table block
    pub fn load(device: &dyn BlockDevice) -> Result<Self, FsError> {
        let mut block = vec![0u8; BLOCK_SIZE];
        device.read_block(FAT_BLOCK as u64, &mut block)?;

        let entries = block
            .chunks_exact(FAT_ENTRY_SIZE)
            .enumerate()
            .map(|(index, raw)| {
                FatEntry::from_raw(i16::from_le_bytes([raw[0], raw[1]]), index as u16)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    /// Serializes the table back to its block
    pub fn persist(&self, device: &mut dyn BlockDevice) -> Result<(), FsError> {
        let mut block = vec![0u8; BLOCK_SIZE];
        for (raw, entry) in block.chunks_exact_mut(FAT_ENTRY_SIZE).zip(&self.entries) {
            raw.copy_from_slice(&entry.to_raw().to_le_bytes());
        }
        device.write_block(FAT_BLOCK as u64, &block)
    }

    pub fn get(&self, block: u16) -> Result<FatEntry, FsError> {
        self.entries
            .get(block as usize)
            .copied()
            .ok_or(FsError::CorruptChain { block })
    }

    pub fn set(&mut self, block: u16, entry: FatEntry) -> Result<(), FsError> {
        let slot = self
            .entries
            .get_mut(block as usize)
            .ok_or(FsError::CorruptChain { block })?;
        *slot = entry;
        Ok(())
    }

    /// Follows one link; `None` at the end of the chain.
    /// A free block inside a chain is corruption.
    pub fn next(&self, block: u16) -> Result<Option<u16>, FsError> {
        match self.get(block)? {
            FatEntry::Eof => Ok(None),
            FatEntry::Next(next) => Ok(Some(next)),
            FatEntry::Free => Err(FsError::CorruptChain { block }),
        }
    }

    /// Returns true if blocks 0 and 1 are reserved as a format leaves them
    pub fn is_formatted(&self) -> bool {
        self.entries[ROOT_BLOCK as usize].is_end_of_chain()
            && self.entries[FAT_BLOCK as usize].is_end_of_chain()
    }

    /// First-fit allocation: the lowest free block from `FIRST_DATA_BLOCK`
    /// up is marked as a chain end and returned
    pub fn allocate_one(&mut self) -> Result<u16, FsError> {
        let block = (FIRST_DATA_BLOCK as usize..TOTAL_BLOCKS)
            .find(|&index| self.entries[index].is_free())
            .ok_or(FsError::DiskFull)? as u16;

        self.entries[block as usize] = FatEntry::Eof;
        Ok(block)
    }

    /// Releases every block from `head` to the end of its chain. Stops early
    /// at an already free entry, which also breaks any cycle.
    pub fn free_chain(&mut self, head: u16) -> Result<(), FsError> {
        if head < FIRST_DATA_BLOCK {
            return Err(FsError::CorruptChain { block: head });
        }

        let mut block = head;
        loop {
            let entry = self.get(block)?;
            match entry {
                FatEntry::Free => break,
                FatEntry::Eof => {
                    self.entries[block as usize] = FatEntry::Free;
                    break;
                }
                FatEntry::Next(next) => {
                    self.entries[block as usize] = FatEntry::Free;
                    block = next;
                }
            }
        }
        Ok(())
    }

    /// Blocks of the chain starting at `head`, in order
    pub fn chain(&self, head: u16) -> Result<Vec<u16>, FsError> {
        let mut blocks = vec![head];
        let mut block = head;
        while let Some(next) = self.next(block)? {
            if blocks.len() >= TOTAL_BLOCKS {
                return Err(FsError::CorruptChain { block });
            }
            blocks.push(next);
            block = next;
        }
        Ok(blocks)
    }

    pub fn free_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_free()).count()
    }
}
