//! Gateway Constants
//!
//! Sizes, limits and flash layout shared by the scan pipeline, the monitoring
//! engine and the configuration store.

/// Number of Modbus devices the gateway can be provisioned with
pub const NUM_DEVICES: usize = 16;

/// Number of request segments per device
pub const NUM_DEV_SEGMENTS: usize = 16;

/// Number of monitoring slots (slot i conventionally pairs with device i)
pub const NUM_MONITOR_SLOTS: usize = 16;

/// Capacity of a segment or slot raw command buffer
pub const MAX_COMMAND_SIZE: usize = 32;

/// Size of the serial response buffer
pub const MAX_RESPONSE_SIZE: usize = 256;

/// Minimum number of received bytes for a monitoring response to be decoded
pub const MIN_RESPONSE_BYTES: usize = 2;

// ----------------------------------------------------------------------------
// Register filtering
// ----------------------------------------------------------------------------

/// Offset of the Modbus function / command-type byte in a response
pub const RESPONSE_FUNCTION_OFFSET: usize = 1;

/// Offset of the first register payload byte in a read response (addr, fc, byte count)
pub const RESPONSE_PAYLOAD_OFFSET: usize = 3;

/// Register positions examined in the validity bitmask by default
pub const DEFAULT_CANDIDATE_REGISTERS: usize = 32;

/// Filtered output capacity in 16-bit registers by default
pub const DEFAULT_OUTPUT_REGISTERS: usize = 64;

/// Upper bound for candidate positions (width of the validity bitmask)
pub const MAX_CANDIDATE_REGISTERS: usize = 64;

// ----------------------------------------------------------------------------
// Flash layout
// ----------------------------------------------------------------------------

/// Flash address of the device 1 / slot 1 record
pub const FLASH_DEVICE_BASE_ADDRESS: u32 = 0x0803_C800;

/// Flash page size; each record occupies its own page
pub const FLASH_PAGE_SIZE: u32 = 0x800;

/// Flash address of the lowest record (device 16)
pub const FLASH_LOWEST_ADDRESS: u32 =
    FLASH_DEVICE_BASE_ADDRESS - FLASH_PAGE_SIZE * (NUM_DEVICES as u32 - 1);

/// Erased flash byte value
pub const FLASH_ERASED_BYTE: u8 = 0xFF;

/// Per-device / per-slot record address table, index 0 is device 1
pub const DEVICE_FLASH_ADDRESSES: [u32; NUM_DEVICES] = {
    let mut table = [0u32; NUM_DEVICES];
    let mut i = 0;
    while i < NUM_DEVICES {
        table[i] = FLASH_DEVICE_BASE_ADDRESS - FLASH_PAGE_SIZE * i as u32;
        i += 1;
    }
    table
};

// ----------------------------------------------------------------------------
// Uplink
// ----------------------------------------------------------------------------

/// Largest application payload forwarded upstream in one uplink
pub const MAX_UPLINK_PAYLOAD: usize = 242;
