//! Working directory changes and path reconstruction.
//!
//! Directories are known only by block index. The path is rebuilt on demand by
//! following `..` links upward and looking the current block up in each parent.

use super::dir_entry::read_entries;
use super::FatFs;
use crate::constants::dir::ROOT_MARKER;
use crate::constants::disk::{ROOT_BLOCK, TOTAL_BLOCKS};
use crate::filesys::FsError;
use alloc::string::String;
use alloc::vec::Vec;

impl FatFs<'_> {
    /// Moves the working directory one level, or back to the root for `/`
    pub fn change_directory(&mut self, name: &str) -> Result<(), FsError> {
        if name == ROOT_MARKER {
            self.cwd = ROOT_BLOCK;
            return Ok(());
        }

        let entries = read_entries(&*self.device, self.cwd)?;
        let slot = entries.find(name).ok_or(FsError::NotFound)?;
        let record = entries.slot(slot);
        if !record.is_directory() {
            return Err(FsError::NotADirectory);
        }

        log::debug!("cd {} -> block {}", name, record.first_block);
        self.cwd = record.first_block;
        Ok(())
    }

    /// Absolute path of the working directory, `/` at the root
    pub fn current_path(&self) -> Result<String, FsError> {
        if self.cwd == ROOT_BLOCK {
            return Ok(String::from(ROOT_MARKER));
        }

        let mut segments: Vec<String> = Vec::new();
        let mut block = self.cwd;
        while block != ROOT_BLOCK {
            // a longer walk can only be a cycle
            if segments.len() >= TOTAL_BLOCKS {
                return Err(FsError::CorruptDirectory { block });
            }

            let parent = read_entries(&*self.device, block)?
                .parent()
                .ok_or(FsError::CorruptDirectory { block })?;
            let parent_entries = read_entries(&*self.device, parent)?;
            let name = parent_entries
                .child_dir_name(block)
                .ok_or(FsError::CorruptDirectory { block })?;

            segments.push(String::from(name));
            block = parent;
        }

        let mut path = String::new();
        for segment in segments.iter().rev() {
            path.push('/');
            path.push_str(segment);
        }
        Ok(path)
    }
}
