//! # Gateway Configuration
//!
//! Host-side settings for the gateway core, persisted as JSON. Device, segment
//! and slot provisioning is not part of this file; it lives in the flash record
//! store and is edited through the provisioning commands.

use crate::constants::{
    DEFAULT_CANDIDATE_REGISTERS, DEFAULT_OUTPUT_REGISTERS, MAX_CANDIDATE_REGISTERS,
};
use crate::error::GatewayError;
use crate::transport::ExchangeWindow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timing of one request/response exchange, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeTiming {
    /// Settle time after reconfiguring the serial link
    pub settle_ms: u64,
    /// Response collection window
    pub response_window_ms: u64,
    /// Inter-byte silence ending collection early; 0 waits out the whole window
    #[serde(default)]
    pub frame_gap_ms: u64,
}

impl ExchangeTiming {
    pub fn window(&self) -> ExchangeWindow {
        ExchangeWindow {
            settle: Duration::from_millis(self.settle_ms),
            response: Duration::from_millis(self.response_window_ms),
            frame_gap: (self.frame_gap_ms > 0).then(|| Duration::from_millis(self.frame_gap_ms)),
        }
    }

    /// No waiting at all; used with transports that answer instantly.
    pub const fn immediate() -> Self {
        ExchangeTiming {
            settle_ms: 0,
            response_window_ms: 0,
            frame_gap_ms: 0,
        }
    }
}

/// Timing for bulk segment scans and for monitoring checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTiming {
    pub scan: ExchangeTiming,
    pub monitor: ExchangeTiming,
}

impl Default for LinkTiming {
    fn default() -> Self {
        LinkTiming {
            scan: ExchangeTiming {
                settle_ms: 1100,
                response_window_ms: 2000,
                frame_gap_ms: 0,
            },
            monitor: ExchangeTiming {
                settle_ms: 100,
                response_window_ms: 1000,
                frame_gap_ms: 0,
            },
        }
    }
}

impl LinkTiming {
    pub const fn immediate() -> Self {
        LinkTiming {
            scan: ExchangeTiming::immediate(),
            monitor: ExchangeTiming::immediate(),
        }
    }
}

/// Register filtering bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterLimits {
    /// Register positions of the validity mask that are examined
    pub candidate_registers: usize,
    /// Registers that fit the filtered output; further selections are dropped
    pub max_output_registers: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        FilterLimits {
            candidate_registers: DEFAULT_CANDIDATE_REGISTERS,
            max_output_registers: DEFAULT_OUTPUT_REGISTERS,
        }
    }
}

impl FilterLimits {
    /// Candidate positions actually examined (never wider than the mask).
    pub fn candidates(&self) -> usize {
        self.candidate_registers.min(MAX_CANDIDATE_REGISTERS)
    }
}

/// Scheduler intervals, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Interval between bulk scan cycles
    pub scan_interval_secs: u64,
    /// Interval between monitoring passes over all slots
    pub monitor_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            scan_interval_secs: 900,
            monitor_interval_secs: 60,
        }
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Serial port the RS-485 transceiver is attached to
    pub serial_port: String,
    /// File holding the emulated configuration flash
    pub flash_image: PathBuf,
    pub timing: LinkTiming,
    pub filter: FilterLimits,
    pub schedule: ScheduleConfig,
    /// Bit i set marks monitoring slot i+1 active at boot
    pub active_slots: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            serial_port: "/dev/ttyUSB0".to_string(),
            flash_image: PathBuf::from("gateway-flash.bin"),
            timing: LinkTiming::default(),
            filter: FilterLimits::default(),
            schedule: ScheduleConfig::default(),
            active_slots: 0xFFFF,
        }
    }
}

impl GatewayConfig {
    /// Loads a JSON configuration file; absent fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.display())))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GatewayError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.display())))
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, GatewayError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
