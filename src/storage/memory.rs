//! In-memory flash emulator covering the sixteen device record pages.

use super::{Flash, StoreError};
use crate::constants::{
    FLASH_DEVICE_BASE_ADDRESS, FLASH_ERASED_BYTE, FLASH_LOWEST_ADDRESS, FLASH_PAGE_SIZE,
};
use std::ops::Range;

/// Total bytes covered by the emulated region.
pub const FLASH_REGION_SIZE: usize =
    (FLASH_DEVICE_BASE_ADDRESS + FLASH_PAGE_SIZE - FLASH_LOWEST_ADDRESS) as usize;

/// RAM-backed flash with NOR semantics: erase sets 0xFF, writes only program
/// erased bytes.
#[derive(Debug, Clone)]
pub struct MemoryFlash {
    data: Vec<u8>,
    fail_reads: bool,
    fail_erases: bool,
    fail_writes: bool,
}

impl Default for MemoryFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFlash {
    /// A fully erased region.
    pub fn new() -> Self {
        MemoryFlash {
            data: vec![FLASH_ERASED_BYTE; FLASH_REGION_SIZE],
            fail_reads: false,
            fail_erases: false,
            fail_writes: false,
        }
    }

    /// Wraps an existing image; a short image is padded with erased bytes.
    pub fn from_image(mut image: Vec<u8>) -> Self {
        image.resize(FLASH_REGION_SIZE, FLASH_ERASED_BYTE);
        MemoryFlash {
            data: image,
            ..Self::new()
        }
    }

    pub fn image(&self) -> &[u8] {
        &self.data
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_erases(&mut self, fail: bool) {
        self.fail_erases = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn range(&self, address: u32, len: usize) -> Result<Range<usize>, StoreError> {
        let out_of_range = StoreError::OutOfRange { address, len };
        let start = address
            .checked_sub(FLASH_LOWEST_ADDRESS)
            .ok_or(out_of_range.clone())? as usize;
        let end = start.checked_add(len).ok_or(out_of_range.clone())?;
        if end > self.data.len() {
            return Err(out_of_range);
        }
        Ok(start..end)
    }
}

impl Flash for MemoryFlash {
    fn read(&self, address: u32, buf: &mut [u8]) -> Result<(), StoreError> {
        if self.fail_reads {
            return Err(StoreError::ReadFailed { address });
        }
        let range = self.range(address, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn erase(&mut self, address: u32, len: usize) -> Result<(), StoreError> {
        if self.fail_erases {
            return Err(StoreError::EraseFailed { address });
        }
        let range = self.range(address, len)?;
        let page = FLASH_PAGE_SIZE as usize;
        let first = range.start / page * page;
        let last = range.end.div_ceil(page) * page;
        let last = last.min(self.data.len());
        self.data[first..last].fill(FLASH_ERASED_BYTE);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteFailed { address });
        }
        let range = self.range(address, data.len())?;
        if let Some(pos) = self.data[range.clone()]
            .iter()
            .position(|&b| b != FLASH_ERASED_BYTE)
        {
            return Err(StoreError::NotErased {
                address: address + pos as u32,
            });
        }
        self.data[range].copy_from_slice(data);
        Ok(())
    }
}
