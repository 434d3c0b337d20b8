#![no_main]

use libfuzzer_sys::fuzz_target;
use lora_modbus_rs::config::FilterLimits;
use lora_modbus_rs::filter_response;

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }
    let (mask, response) = data.split_at(8);
    let mut raw = [0u8; 8];
    raw.copy_from_slice(mask);
    let valid_addresses = u64::from_le_bytes(raw);

    let limits = FilterLimits {
        candidate_registers: 64,
        max_output_registers: (raw[0] % 65) as usize,
    };
    let filtered = filter_response(response, valid_addresses, &limits);
    assert!(filtered.count() <= response.len().max(limits.max_output_registers * 2));
});
