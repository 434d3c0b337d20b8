#![no_main]

use libfuzzer_sys::fuzz_target;
use lora_modbus_rs::parse_command;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        let _ = parse_command(line);
    }
});
