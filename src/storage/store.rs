//! Keyed access to the per-device records.

use super::record::{DeviceRecord, RECORD_SIZE};
use super::{Flash, StoreError};
use crate::constants::{DEVICE_FLASH_ADDRESSES, FLASH_PAGE_SIZE};
use log::{debug, error};

/// Record store over a flash device, keyed by zero-based device index.
#[derive(Debug)]
pub struct RecordStore<F: Flash> {
    flash: F,
}

impl<F: Flash> RecordStore<F> {
    pub fn new(flash: F) -> Self {
        RecordStore { flash }
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Flash address of record `index`.
    pub fn address(index: usize) -> Result<u32, StoreError> {
        DEVICE_FLASH_ADDRESSES
            .get(index)
            .copied()
            .ok_or(StoreError::InvalidIndex(index))
    }

    pub fn load(&self, index: usize) -> Result<DeviceRecord, StoreError> {
        let address = Self::address(index)?;
        let mut buf = [0u8; RECORD_SIZE];
        match self.flash.read(address, &mut buf) {
            Ok(()) => debug!("READ OK (record {})", index + 1),
            Err(e) => {
                error!("READ ERROR (record {}): {e}", index + 1);
                return Err(e);
            }
        }
        DeviceRecord::decode(&buf)
    }

    /// Erases the record page and programs `record`.
    pub fn save(&mut self, index: usize, record: &DeviceRecord) -> Result<(), StoreError> {
        let address = Self::address(index)?;
        let bytes = record.encode();

        if let Err(e) = self.flash.erase(address, FLASH_PAGE_SIZE as usize) {
            error!("ERASE ERROR (record {}): {e}", index + 1);
            return Err(e);
        }
        debug!("ERASE OK (record {})", index + 1);

        if let Err(e) = self.flash.write(address, &bytes) {
            error!("WRITE ERROR (record {}): {e}", index + 1);
            return Err(e);
        }
        debug!("WRITE OK (record {})", index + 1);
        Ok(())
    }

    /// Read-modify-write of record `index`. Nothing is written when the load
    /// fails.
    pub fn update<R>(
        &mut self,
        index: usize,
        modify: impl FnOnce(&mut DeviceRecord) -> R,
    ) -> Result<(R, DeviceRecord), StoreError> {
        let mut record = self.load(index)?;
        let result = modify(&mut record);
        self.save(index, &record)?;
        Ok((result, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryFlash;

    #[test]
    fn test_save_then_load() {
        let mut store = RecordStore::new(MemoryFlash::new());
        let mut record = DeviceRecord::default();
        record.device.active = true;
        record.device.id = 4;
        store.save(3, &record).unwrap();
        store.save(3, &record).unwrap();
        assert_eq!(store.load(3).unwrap(), record);
        assert!(!store.load(2).unwrap().device.active);
    }

    #[test]
    fn test_failed_read_leaves_record_untouched() {
        let mut store = RecordStore::new(MemoryFlash::new());
        let mut record = DeviceRecord::default();
        record.device.active = true;
        store.save(0, &record).unwrap();

        store.flash_mut().set_fail_reads(true);
        let result = store.update(0, |r| r.device.active = false);
        assert_eq!(
            result.map(|_| ()),
            Err(StoreError::ReadFailed {
                address: DEVICE_FLASH_ADDRESSES[0]
            })
        );

        store.flash_mut().set_fail_reads(false);
        assert!(store.load(0).unwrap().device.active);
    }

    #[test]
    fn test_invalid_index() {
        let store = RecordStore::new(MemoryFlash::new());
        assert_eq!(store.load(16), Err(StoreError::InvalidIndex(16)));
    }
}
