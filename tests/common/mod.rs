// Shared fixtures for the integration tests

#![allow(dead_code)]

use lora_modbus_rs::config::LinkTiming;
use lora_modbus_rs::modbus::frame::append_crc;
use lora_modbus_rs::{Gateway, GatewayConfig, MemoryFlash, MockTransport};

pub type TestGateway = Gateway<MockTransport, MemoryFlash>;

/// Gateway over an erased in-memory flash and a mock link with no waiting.
/// Returns a handle sharing the mock's state.
pub fn gateway() -> (TestGateway, MockTransport) {
    let mock = MockTransport::new();
    let handle = mock.clone();
    let config = GatewayConfig {
        timing: LinkTiming::immediate(),
        ..GatewayConfig::default()
    };
    let mut gateway = Gateway::new(mock, MemoryFlash::new(), config);
    gateway.boot().expect("boot");
    (gateway, handle)
}

/// Read-holding-registers response `[addr, 0x03, byte count, registers...]`.
pub fn holding_response(address: u8, registers: &[u16]) -> Vec<u8> {
    let mut response = vec![address, 0x03, (registers.len() * 2) as u8];
    for register in registers {
        response.extend_from_slice(&register.to_be_bytes());
    }
    response
}

/// Same as `holding_response` with a CRC-16 trailer.
pub fn holding_response_with_crc(address: u8, registers: &[u16]) -> Vec<u8> {
    let mut response = holding_response(address, registers);
    append_crc(&mut response);
    response
}

/// Activates device `device` at 9600 8N1.
pub fn activate_device(gateway: &mut TestGateway, device: u8) {
    gateway
        .execute(&format!("set device-params 1 {device} 0 0 0 1"))
        .expect("set device-params");
}

/// Provisions slot `slot` to read one `uInt16_AB` register at offset 3,
/// with the given threshold-active mask (hex, two bytes) and operands, then
/// activates it.
pub fn provision_u16_slot(
    gateway: &mut TestGateway,
    slot: u8,
    active: [u8; 2],
    spike: u16,
    high: u16,
    low: u16,
    on_change: bool,
) {
    let s = spike.to_be_bytes();
    let h = high.to_be_bytes();
    let l = low.to_be_bytes();
    let line = format!(
        "set slot-params 1 {slot:X} 0 3 {:02X} {:02X} \
         {:02X} {:02X} 00 00 {:02X} {:02X} 00 00 \
         {:02X} {:02X} 00 00 {:02X} {:02X} 00 00 \
         {} 8 01 03 00 00 00 01 84 0A",
        active[0],
        active[1],
        s[0],
        s[1],
        s[0],
        s[1],
        h[0],
        h[1],
        l[0],
        l[1],
        u8::from(on_change),
    );
    gateway.execute(&line).expect("set slot-params");
    gateway
        .execute(&format!("set slot-active {slot} 1"))
        .expect("set slot-active");
}
