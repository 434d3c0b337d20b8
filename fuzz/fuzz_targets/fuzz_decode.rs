#![no_main]

use libfuzzer_sys::fuzz_target;
use lora_modbus_rs::decode_tag;

fuzz_target!(|data: &[u8]| {
    // First byte selects the tag; unknown tags must be rejected, not panic
    if let Some((&tag, bytes)) = data.split_first() {
        let _ = decode_tag(bytes, tag);
        let _ = decode_tag(bytes, tag % 18);
    }
});
