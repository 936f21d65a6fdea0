//! Streams file bytes into and out of block chains.
//!
//! Every function works on a table the caller loaded; allocations only become
//! durable once the caller persists that table.

use super::fat_entry::FatEntry;
use super::fat_table::FatTable;
use crate::constants::disk::BLOCK_SIZE;
use crate::filesys::{BlockDevice, FsError};
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::min;

/// Head block and byte length of a freshly written chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub head: u16,
    pub size: u32,
}

/// Number of blocks a file of `len` bytes occupies; empty files still own one
pub fn blocks_needed(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE).max(1)
}

/// Allocates a new chain and writes `bytes` across it, zero-padding the
/// final block. The whole chain is allocated before any block is written.
pub fn write_content(
    device: &mut dyn BlockDevice,
    fat: &mut FatTable,
    bytes: &[u8],
) -> Result<Extent, FsError> {
    let size = u32::try_from(bytes.len()).map_err(|_| FsError::DiskFull)?;

    let mut chain = Vec::with_capacity(blocks_needed(bytes.len()));
    for _ in 0..blocks_needed(bytes.len()) {
        let block = fat.allocate_one()?;
        if let Some(&prev) = chain.last() {
            fat.set(prev, FatEntry::Next(block))?;
        }
        chain.push(block);
    }

    let mut buf = vec![0u8; BLOCK_SIZE];
    for (index, &block) in chain.iter().enumerate() {
        let start = min(index * BLOCK_SIZE, bytes.len());
        let end = min(start + BLOCK_SIZE, bytes.len());
        buf.fill(0);
        buf[..end - start].copy_from_slice(&bytes[start..end]);
        device.write_block(block as u64, &buf)?;
    }

    log::trace!(
        "wrote {} bytes into {} block(s) starting at {}",
        size,
        chain.len(),
        chain[0]
    );
    Ok(Extent {
        head: chain[0],
        size,
    })
}

/// Reads `length` bytes following the chain from `head`. A chain that ends
/// before `length` bytes were produced yields what it holds.
pub fn read_content(
    device: &dyn BlockDevice,
    fat: &FatTable,
    head: u16,
    length: u32,
) -> Result<Vec<u8>, FsError> {
    let mut data = Vec::with_capacity(length as usize);
    let mut buf = vec![0u8; BLOCK_SIZE];
    let mut remaining = length as usize;
    let mut current = Some(head);

    while let Some(block) = current {
        if remaining == 0 {
            break;
        }
        device.read_block(block as u64, &mut buf)?;
        let chunk = min(BLOCK_SIZE, remaining);
        data.extend_from_slice(&buf[..chunk]);
        remaining -= chunk;
        current = fat.next(block)?;
    }

    if remaining > 0 {
        log::warn!(
            "chain at block {} holds {} bytes less than the recorded size {}",
            head,
            remaining,
            length
        );
    }
    Ok(data)
}

/// Appends `extra` to the chain starting at `head` whose content is
/// `existing_size` bytes long, growing the chain as needed. Returns the new
/// total size.
pub fn append_content(
    device: &mut dyn BlockDevice,
    fat: &mut FatTable,
    head: u16,
    existing_size: u32,
    extra: &[u8],
) -> Result<u32, FsError> {
    let new_size = u32::try_from(extra.len())
        .ok()
        .and_then(|len| existing_size.checked_add(len))
        .ok_or(FsError::DiskFull)?;
    if extra.is_empty() {
        return Ok(existing_size);
    }

    let mut last = *fat
        .chain(head)?
        .last()
        .ok_or(FsError::CorruptChain { block: head })?;

    let mut used = existing_size as usize % BLOCK_SIZE;
    if used == 0 && existing_size > 0 {
        used = BLOCK_SIZE;
    }

    let mut buf = vec![0u8; BLOCK_SIZE];
    device.read_block(last as u64, &mut buf)?;

    let mut offset = 0;
    while offset < extra.len() {
        let chunk = min(BLOCK_SIZE - used, extra.len() - offset);
        if chunk > 0 {
            buf[used..used + chunk].copy_from_slice(&extra[offset..offset + chunk]);
            device.write_block(last as u64, &buf)?;
            offset += chunk;
            used += chunk;
        }

        if offset < extra.len() && used == BLOCK_SIZE {
            let block = fat.allocate_one()?;
            fat.set(last, FatEntry::Next(block))?;
            last = block;
            used = 0;
            buf.fill(0);
        }
    }

    Ok(new_size)
}
