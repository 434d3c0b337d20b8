//! Tests for the logging helpers.

use lora_modbus_rs::logging::{
    init_logger, init_logger_with_level, log_block, log_debug, log_error, log_info, log_warn,
};
use log::{Level, LevelFilter};

#[test]
fn test_repeated_initialization_is_harmless() {
    init_logger();
    init_logger();
    init_logger_with_level(LevelFilter::Debug);
}

#[test]
fn test_helpers_log_without_panicking() {
    init_logger();
    log_error("flash erase failed");
    log_warn("slot 3: no response");
    log_info("scan cycle complete");
    log_debug("MODBUS COMMAND (Hex): 01 03 00 00 00 02 C4 0B");
    log_block(Level::Info, "MONITORING SLOT 1 PARAMETERS:\nDataType: 12 (Float_ABCD)\n");
}
