//! Shared networking constants and helpers used by client and server.

/// TCP port for the command channel (client -> server -> client).
pub const COMMAND_PORT: u16 = 8080;

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
