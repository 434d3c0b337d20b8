//! File-backed flash image.
//!
//! The image is held in a `MemoryFlash` and written back to disk after every
//! erase and write, so a restarted gateway sees exactly what was programmed.

use super::memory::MemoryFlash;
use super::{Flash, StoreError};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct FileFlash {
    path: PathBuf,
    inner: MemoryFlash,
}

impl FileFlash {
    /// Opens the image at `path`, creating an erased one when it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            MemoryFlash::from_image(fs::read(&path)?)
        } else {
            let flash = MemoryFlash::new();
            fs::write(&path, flash.image())?;
            debug!("Created erased flash image {}", path.display());
            flash
        };
        Ok(FileFlash { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        fs::write(&self.path, self.inner.image())?;
        Ok(())
    }
}

impl Flash for FileFlash {
    fn read(&self, address: u32, buf: &mut [u8]) -> Result<(), StoreError> {
        self.inner.read(address, buf)
    }

    fn erase(&mut self, address: u32, len: usize) -> Result<(), StoreError> {
        self.inner.erase(address, len)?;
        self.persist()
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), StoreError> {
        self.inner.write(address, data)?;
        self.persist()
    }
}
