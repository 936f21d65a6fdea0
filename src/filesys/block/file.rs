//! Block device backed by a host disk image

use crate::constants::disk::{BLOCK_SIZE, TOTAL_BLOCKS};
use crate::filesys::{BlockDevice, FsError};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Disk image file holding `TOTAL_BLOCKS` blocks of `BLOCK_SIZE` bytes
pub struct FileBlockDevice {
    file: File,
}

impl FileBlockDevice {
    /// Opens an image, creating and sizing it when missing or short
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FsError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())
            .map_err(io_error)?;

        let image_len = (TOTAL_BLOCKS * BLOCK_SIZE) as u64;
        let current_len = file.metadata().map_err(io_error)?.len();
        if current_len < image_len {
            log::info!(
                "sizing disk image {} to {} bytes",
                path.as_ref().display(),
                image_len
            );
            file.set_len(image_len).map_err(io_error)?;
        }

        Ok(Self { file })
    }

    fn seek_to(&self, block_num: u64) -> Result<(), FsError> {
        if block_num >= TOTAL_BLOCKS as u64 {
            return Err(FsError::IOError);
        }
        (&self.file)
            .seek(SeekFrom::Start(block_num * BLOCK_SIZE as u64))
            .map_err(io_error)?;
        Ok(())
    }
}

fn io_error(err: std::io::Error) -> FsError {
    log::error!("disk image I/O failed: {}", err);
    FsError::IOError
}

impl BlockDevice for FileBlockDevice {
    fn read_block(&self, block_num: u64, buf: &mut [u8]) -> Result<(), FsError> {
        if buf.len() != BLOCK_SIZE {
            return Err(FsError::IOError);
        }
        self.seek_to(block_num)?;
        (&self.file).read_exact(buf).map_err(io_error)
    }

    fn write_block(&mut self, block_num: u64, buf: &[u8]) -> Result<(), FsError> {
        if buf.len() != BLOCK_SIZE {
            return Err(FsError::IOError);
        }
        self.seek_to(block_num)?;
        self.file.write_all(buf).map_err(io_error)?;
        // The next call must observe this write
        self.file.flush().map_err(io_error)
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn total_blocks(&self) -> u64 {
        TOTAL_BLOCKS as u64
    }
}
