//! FAT volume implementation
//!
//! Block 0 holds the root directory, block 1 the allocation table, and every
//! other block is data or a subdirectory. Each operation loads the table and
//! the directory blocks it needs, mutates them in memory, and persists the
//! table before the directory so no record ever names an unallocated chain.
//! An interruption between those two writes can still orphan a chain; nothing
//! here reclaims it.

use super::*;
use alloc::boxed::Box;

pub mod content;
pub mod dir_entry;
pub mod fat_entry;
pub mod fat_table;
mod navigator;

use crate::constants::disk::{BLOCK_SIZE, ROOT_BLOCK, TOTAL_BLOCKS};
use super::source::drain;
use content::{append_content, read_content, write_content};
use dir_entry::{read_entries, validate_name, write_entries, DirBlock, DirRecord};
pub use fat_entry::FatEntry;
pub use fat_table::FatTable;

/// FAT volume driver
pub struct FatFs<'a> {
    /// Underlying block device
    device: Box<dyn BlockDevice + 'a>,
    /// Block of the working directory
    cwd: u16,
}

impl<'a> FatFs<'a> {
    /// Mounts an existing volume. The working directory starts at the root.
    pub fn new(device: Box<dyn BlockDevice + 'a>) -> Result<Self, FsError> {
        let fs = Self::attach(device)?;
        let fat = FatTable::load(&*fs.device)?;
        if !fat.is_formatted() {
            log::warn!("mounted volume has no reserved root/table blocks; format it first");
        }
        log::info!("mounted volume with {} free blocks", fat.free_count());
        Ok(fs)
    }

    /// Formats the device and mounts the empty volume
    pub fn format(device: Box<dyn BlockDevice + 'a>) -> Result<Self, FsError> {
        let mut fs = Self::attach(device)?;
        FileSystem::format(&mut fs)?;
        Ok(fs)
    }

    fn attach(device: Box<dyn BlockDevice + 'a>) -> Result<Self, FsError> {
        let block_size = device.block_size();
        let total_blocks = device.total_blocks();
        if block_size != BLOCK_SIZE || total_blocks < TOTAL_BLOCKS as u64 {
            return Err(FsError::UnsupportedDevice {
                block_size,
                total_blocks,
            });
        }
        Ok(Self {
            device,
            cwd: ROOT_BLOCK,
        })
    }

    /// Block index of the working directory
    pub fn current_dir_block(&self) -> u16 {
        self.cwd
    }

    /// Number of unallocated blocks
    pub fn free_blocks(&self) -> Result<usize, FsError> {
        Ok(FatTable::load(&*self.device)?.free_count())
    }

    /// Metadata of one entry in the working directory
    pub fn stat(&self, name: &str) -> Result<FileMetadata, FsError> {
        let entries = read_entries(&*self.device, self.cwd)?;
        let slot = entries.find(name).ok_or(FsError::NotFound)?;
        Ok(entries.slot(slot).metadata())
    }

    /// Read-only view of the mounted device, for inspecting raw blocks
    pub fn device(&self) -> &dyn BlockDevice {
        &*self.device
    }

    /// Unmounts, handing the device back
    pub fn into_device(self) -> Box<dyn BlockDevice + 'a> {
        self.device
    }

    /// Working directory plus the slot of a file called `name`
    fn find_file(&self, name: &str) -> Result<(DirBlock, usize), FsError> {
        let entries = read_entries(&*self.device, self.cwd)?;
        let slot = entries.find(name).ok_or(FsError::NotFound)?;
        if entries.slot(slot).kind != EntryKind::File {
            return Err(FsError::NotAFile);
        }
        Ok((entries, slot))
    }

    /// Working directory plus a free slot for the new entry `name`
    fn reserve_slot(&self, name: &str) -> Result<(DirBlock, usize), FsError> {
        let entries = read_entries(&*self.device, self.cwd)?;
        if entries.find(name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        let slot = entries.free_slot().ok_or(FsError::DirectoryFull)?;
        Ok((entries, slot))
    }
}

impl FileSystem for FatFs<'_> {
    fn format(&mut self) -> Result<(), FsError> {
        FatTable::formatted().persist(&mut *self.device)?;
        write_entries(&mut *self.device, ROOT_BLOCK, &DirBlock::empty())?;
        self.cwd = ROOT_BLOCK;
        log::info!("formatted volume: {} blocks of {} bytes", TOTAL_BLOCKS, BLOCK_SIZE);
        Ok(())
    }

    fn create(&mut self, name: &str, source: &mut dyn ContentSource) -> Result<(), FsError> {
        let name = validate_name(name)?;
        let (mut entries, slot) = self.reserve_slot(&name)?;

        let data = drain(source)?;
        let mut fat = FatTable::load(&*self.device)?;
        let extent = write_content(&mut *self.device, &mut fat, &data)?;
        fat.persist(&mut *self.device)?;

        *entries.slot_mut(slot) = DirRecord::new_file(name, extent.head, extent.size);
        write_entries(&mut *self.device, self.cwd, &entries)?;
        log::debug!("create {} ({} bytes at block {})", name, extent.size, extent.head);
        Ok(())
    }

    fn cat(&self, name: &str) -> Result<Vec<u8>, FsError> {
        let (entries, slot) = self.find_file(name)?;
        let record = entries.slot(slot);
        let fat = FatTable::load(&*self.device)?;
        read_content(&*self.device, &fat, record.first_block, record.size)
    }

    fn ls(&self) -> Result<Vec<DirEntry>, FsError> {
        let entries = read_entries(&*self.device, self.cwd)?;
        Ok(entries
            .live()
            .map(|record| DirEntry {
                name: String::from(record.name.as_str()),
                metadata: record.metadata(),
            })
            .collect())
    }

    fn cp(&mut self, src: &str, dst: &str) -> Result<(), FsError> {
        let dst = validate_name(dst)?;
        let (_, src_slot) = self.find_file(src)?;
        let (mut entries, dst_slot) = self.reserve_slot(&dst)?;
        let source = *entries.slot(src_slot);

        let mut fat = FatTable::load(&*self.device)?;
        let data = read_content(&*self.device, &fat, source.first_block, source.size)?;
        let extent = write_content(&mut *self.device, &mut fat, &data)?;
        fat.persist(&mut *self.device)?;

        *entries.slot_mut(dst_slot) = DirRecord::new_file(dst, extent.head, extent.size);
        write_entries(&mut *self.device, self.cwd, &entries)?;
        log::debug!("cp {} -> {} (block {})", src, dst, extent.head);
        Ok(())
    }

    /// Renames within the working directory only; a `dst` naming an existing
    /// directory is a collision, not a move target
    fn mv(&mut self, src: &str, dst: &str) -> Result<(), FsError> {
        let dst = validate_name(dst)?;
        let (mut entries, slot) = self.find_file(src)?;
        if entries.find(&dst).is_some() {
            return Err(FsError::AlreadyExists);
        }

        entries.slot_mut(slot).name = dst;
        write_entries(&mut *self.device, self.cwd, &entries)?;
        log::debug!("mv {} -> {}", src, dst);
        Ok(())
    }

    fn rm(&mut self, name: &str) -> Result<(), FsError> {
        let mut entries = read_entries(&*self.device, self.cwd)?;
        let slot = entries.find(name).ok_or(FsError::NotFound)?;
        let record = *entries.slot(slot);
        if record.is_parent_link() {
            return Err(FsError::InvalidName);
        }

        let mut fat = FatTable::load(&*self.device)?;
        if record.is_directory() && !read_entries(&*self.device, record.first_block)?.is_empty_dir()
        {
            return Err(FsError::DirectoryNotEmpty);
        }
        fat.free_chain(record.first_block)?;
        fat.persist(&mut *self.device)?;

        entries.clear(slot);
        write_entries(&mut *self.device, self.cwd, &entries)?;
        log::debug!("rm {} (freed chain at block {})", name, record.first_block);
        Ok(())
    }

    fn append(&mut self, src: &str, dst: &str) -> Result<(), FsError> {
        let mut entries = read_entries(&*self.device, self.cwd)?;
        let src_slot = entries.find(src).ok_or(FsError::NotFound)?;
        let dst_slot = entries.find(dst).ok_or(FsError::NotFound)?;
        let source = *entries.slot(src_slot);
        let target = *entries.slot(dst_slot);
        if source.kind != EntryKind::File || target.kind != EntryKind::File {
            return Err(FsError::NotAFile);
        }

        let mut fat = FatTable::load(&*self.device)?;
        let data = read_content(&*self.device, &fat, source.first_block, source.size)?;
        if data.is_empty() {
            return Ok(());
        }

        let size = append_content(
            &mut *self.device,
            &mut fat,
            target.first_block,
            target.size,
            &data,
        )?;
        fat.persist(&mut *self.device)?;

        entries.slot_mut(dst_slot).size = size;
        write_entries(&mut *self.device, self.cwd, &entries)?;
        log::debug!("append {} -> {} (now {} bytes)", src, dst, size);
        Ok(())
    }

    fn mkdir(&mut self, name: &str) -> Result<(), FsError> {
        let name = validate_name(name)?;
        let (mut entries, slot) = self.reserve_slot(&name)?;

        let mut fat = FatTable::load(&*self.device)?;
        let block = fat.allocate_one()?;
        fat.persist(&mut *self.device)?;
        write_entries(&mut *self.device, block, &DirBlock::with_parent(self.cwd))?;

        *entries.slot_mut(slot) = DirRecord::new_directory(name, block);
        write_entries(&mut *self.device, self.cwd, &entries)?;
        log::debug!("mkdir {} at block {}", name, block);
        Ok(())
    }

    fn cd(&mut self, name: &str) -> Result<(), FsError> {
        self.change_directory(name)
    }

    fn pwd(&self) -> Result<String, FsError> {
        self.current_path()
    }

    fn chmod(&mut self, rights: AccessRights, name: &str) -> Result<(), FsError> {
        let mut entries = read_entries(&*self.device, self.cwd)?;
        let slot = entries.find(name).ok_or(FsError::NotFound)?;
        entries.slot_mut(slot).rights = rights;
        write_entries(&mut *self.device, self.cwd, &entries)?;
        log::debug!("chmod {} {}", rights, name);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
