//! # Serial Transport
//!
//! The request/response seam between the gateway core and the RS-485 link. The
//! core reconfigures the link per device, transmits a raw request and then
//! collects whatever arrives inside a bounded response window; it never waits
//! for a completion signal.

pub mod mock;
pub mod serial;

pub use mock::MockTransport;
pub use serial::SerialTransport;

use crate::util::hex::format_hex_spaced;
use log::debug;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to open serial port {port}: {reason}")]
    Open { port: String, reason: String },

    #[error("Serial link used before it was configured")]
    NotConfigured,

    #[error("Failed to configure serial link: {0}")]
    Configure(String),

    #[error("Serial write failed: {0}")]
    Write(String),

    #[error("Serial read failed: {0}")]
    Read(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// Resolved serial settings for one device (8 data bits, no flow control).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    pub baud_rate: u32,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl fmt::Display for LinkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "{} 8{}{}", self.baud_rate, parity, stop)
    }
}

/// How long a single request/response exchange waits at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeWindow {
    /// Settle time after reconfiguring the link, before transmitting
    pub settle: Duration,
    /// Upper bound on response collection
    pub response: Duration,
    /// Inter-byte silence that ends collection early once bytes have arrived
    pub frame_gap: Option<Duration>,
}

/// Serial request/response transport.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Applies baud rate, parity and stop bits, opening the port if needed.
    async fn configure_link(&mut self, settings: &LinkSettings) -> Result<(), TransportError>;

    /// Sends `frame` verbatim.
    async fn transmit(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Collects received bytes until `window` elapses, or earlier when a
    /// `frame_gap` of silence follows at least one byte.
    async fn collect_response(
        &mut self,
        window: Duration,
        frame_gap: Option<Duration>,
    ) -> Result<Vec<u8>, TransportError>;
}

/// Configures the link, sends `request` and returns whatever was received in the window.
pub async fn exchange<T: Transport + ?Sized>(
    transport: &mut T,
    settings: &LinkSettings,
    request: &[u8],
    window: &ExchangeWindow,
) -> Result<Vec<u8>, TransportError> {
    transport.configure_link(settings).await?;
    if !window.settle.is_zero() {
        tokio::time::sleep(window.settle).await;
    }

    debug!("MODBUS COMMAND (Hex): {}", format_hex_spaced(request));
    transport.transmit(request).await?;

    let response = transport
        .collect_response(window.response, window.frame_gap)
        .await?;
    debug!("MODBUS RESPONSE (Hex): {}", format_hex_spaced(&response));
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_settings_display() {
        let settings = LinkSettings {
            baud_rate: 9600,
            parity: Parity::Even,
            stop_bits: StopBits::One,
        };
        assert_eq!(settings.to_string(), "9600 8E1");
    }

    #[tokio::test]
    async fn test_exchange_order() {
        let mut mock = MockTransport::new();
        mock.queue_response(&[0x01, 0x03, 0x02, 0x00, 0x07]);
        let settings = LinkSettings {
            baud_rate: 115200,
            parity: Parity::None,
            stop_bits: StopBits::Two,
        };
        let window = ExchangeWindow {
            settle: Duration::ZERO,
            response: Duration::ZERO,
            frame_gap: None,
        };

        let response = exchange(&mut mock, &settings, &[0x01, 0x03], &window)
            .await
            .unwrap();

        assert_eq!(response, vec![0x01, 0x03, 0x02, 0x00, 0x07]);
        assert_eq!(mock.configurations(), vec![settings]);
        assert_eq!(mock.transmissions(), vec![vec![0x01, 0x03]]);
    }
}
