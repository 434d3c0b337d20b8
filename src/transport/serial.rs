//! # RS-485 Serial Transport
//!
//! `tokio-serial` backed transport. The port is opened on the first link
//! configuration and reconfigured in place for every following device.

use super::{LinkSettings, Parity, StopBits, Transport, TransportError};
use crate::constants::MAX_RESPONSE_SIZE;
use log::debug;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{timeout, Instant};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

/// Transport over a native serial port.
pub struct SerialTransport {
    port_name: String,
    port: Option<SerialStream>,
    settings: Option<LinkSettings>,
}

impl SerialTransport {
    /// Creates a transport for `port_name`; nothing is opened until the first
    /// `configure_link`.
    pub fn new(port_name: &str) -> Self {
        SerialTransport {
            port_name: port_name.to_string(),
            port: None,
            settings: None,
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Currently applied settings
    pub fn settings(&self) -> Option<LinkSettings> {
        self.settings
    }

    fn port_mut(&mut self) -> Result<&mut SerialStream, TransportError> {
        self.port.as_mut().ok_or(TransportError::NotConfigured)
    }
}

fn serial_parity(parity: Parity) -> tokio_serial::Parity {
    match parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Even => tokio_serial::Parity::Even,
        Parity::Odd => tokio_serial::Parity::Odd,
    }
}

fn serial_stop_bits(stop_bits: StopBits) -> tokio_serial::StopBits {
    match stop_bits {
        StopBits::One => tokio_serial::StopBits::One,
        StopBits::Two => tokio_serial::StopBits::Two,
    }
}

#[async_trait::async_trait]
impl Transport for SerialTransport {
    async fn configure_link(&mut self, settings: &LinkSettings) -> Result<(), TransportError> {
        match self.port.as_mut() {
            Some(port) => {
                let configure = |e: tokio_serial::Error| TransportError::Configure(e.to_string());
                port.set_baud_rate(settings.baud_rate).map_err(configure)?;
                port.set_parity(serial_parity(settings.parity)).map_err(configure)?;
                port.set_stop_bits(serial_stop_bits(settings.stop_bits))
                    .map_err(configure)?;
                port.clear(tokio_serial::ClearBuffer::Input)
                    .map_err(configure)?;
            }
            None => {
                let port = tokio_serial::new(&self.port_name, settings.baud_rate)
                    .data_bits(tokio_serial::DataBits::Eight)
                    .parity(serial_parity(settings.parity))
                    .stop_bits(serial_stop_bits(settings.stop_bits))
                    .flow_control(tokio_serial::FlowControl::None)
                    .open_native_async()
                    .map_err(|e| TransportError::Open {
                        port: self.port_name.clone(),
                        reason: e.to_string(),
                    })?;
                self.port = Some(port);
            }
        }

        debug!("{}: link configured {}", self.port_name, settings);
        self.settings = Some(*settings);
        Ok(())
    }

    async fn transmit(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let port = self.port_mut()?;
        port.write_all(frame)
            .await
            .map_err(|e| TransportError::Write(e.to_string()))?;
        AsyncWriteExt::flush(port)
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn collect_response(
        &mut self,
        window: Duration,
        frame_gap: Option<Duration>,
    ) -> Result<Vec<u8>, TransportError> {
        let port = self.port_mut()?;
        let deadline = Instant::now() + window;
        let mut response = Vec::with_capacity(MAX_RESPONSE_SIZE);
        let mut chunk = [0u8; 64];

        while response.len() < MAX_RESPONSE_SIZE {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let wait = match frame_gap {
                Some(gap) if !response.is_empty() => gap.min(remaining),
                _ => remaining,
            };

            match timeout(wait, AsyncReadExt::read(&mut *port, &mut chunk)).await {
                // window or inter-byte gap elapsed
                Err(_) => break,
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    let room = MAX_RESPONSE_SIZE - response.len();
                    response.extend_from_slice(&chunk[..n.min(room)]);
                }
                Ok(Err(e)) => return Err(TransportError::Read(e.to_string())),
            }
        }

        Ok(response)
    }
}
