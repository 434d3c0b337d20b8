#![no_main]

use libfuzzer_sys::fuzz_target;
use lora_modbus_rs::DeviceRecord;

fuzz_target!(|data: &[u8]| {
    if let Ok(record) = DeviceRecord::decode(data) {
        // a decoded record re-encodes to a full record
        assert_eq!(record.encode().len(), lora_modbus_rs::storage::RECORD_SIZE);
    }
});
