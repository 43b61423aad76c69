//! Sending commands to the screener server over TCP.
//!
//! This module provides a small helper that writes one JSON `Command` line and
//! reads back the server's JSON `Reply` line on the same connection.
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use log::{debug, info};
use screener_common::{Command, Reply, Result, ScreenerError};

/// Connection to the screener server.
pub struct CommandSender {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl CommandSender {
    /// Connects to `address` (e.g. `127.0.0.1:8080`).
    pub fn connect(address: &str) -> Result<Self> {
        let stream = TcpStream::connect(address)
            .map_err(|e| ScreenerError::Format(format!("Failed to connect to server: {}", e)))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            writer: stream,
            reader,
        })
    }

    /// Sends `command` and waits for its reply.
    pub fn send_command(&mut self, command: &Command) -> Result<Reply> {
        let mut payload = serde_json::to_vec(command)?;
        payload.push(b'\n');
        info!("Sending command: {} {:?}", command.action, command.params);
        self.writer.write_all(&payload)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(ScreenerError::Format(String::from(
                "Server closed the connection",
            )));
        }
        debug!("Reply of {} bytes", line.len());
        Ok(serde_json::from_str(line.trim_end())?)
    }
}
