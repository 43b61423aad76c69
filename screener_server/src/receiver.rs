use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use log::{debug, error, info, warn};
use screener_common::{Action, Command, Reply, Result, ScreenerError};

use crate::screener::{Screened, Screener};

/// TCP command receiver.
///
/// Every accepted connection gets its own thread, which reads newline-delimited
/// JSON `Command`s and answers each with one JSON `Reply` line. A connection that
/// sends garbage only gets an error reply; the accept loop keeps serving others.
pub struct CommandReceiver {
    /// The underlying TCP listening socket.
    pub(crate) socket: TcpListener,
}

impl CommandReceiver {
    /// Bind a new TCP receiver to the provided `bind_addr` (e.g., `0.0.0.0:8080`).
    pub fn new(bind_addr: &str) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self { socket })
    }

    /// Blocking accept loop.
    pub fn serve(self, screener: Arc<Screener>) -> Result<()> {
        info!("Command TCP server is started on {}", self.socket.local_addr()?);

        for stream in self.socket.incoming() {
            match stream {
                Ok(stream) => {
                    let screener = Arc::clone(&screener);
                    thread::spawn(move || {
                        let peer = stream
                            .peer_addr()
                            .map(|a| a.to_string())
                            .unwrap_or_else(|_| String::from("unknown"));
                        if let Err(e) = handle_connection(stream, &screener) {
                            warn!("Connection {} closed with error: {}", peer, e);
                        }
                    });
                }
                Err(e) => error!("TCP connection error: {}", e),
            }
        }
        Ok(())
    }
}

fn handle_connection(stream: TcpStream, screener: &Screener) -> Result<()> {
    let peer = stream.peer_addr()?;
    debug!("client_tcp_addr: {:?}", peer);
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Command>(&line) {
            Ok(cmd) => dispatch(screener, &cmd),
            Err(e) => {
                warn!("Undecodable command from {}: {}", peer, e);
                Reply::from(&ScreenerError::Format(format!("Bad command: {}", e)))
            }
        };
        let mut payload = serde_json::to_vec(&reply)?;
        payload.push(b'\n');
        writer.write_all(&payload)?;
        writer.flush()?;
    }
    debug!("Client {} disconnected", peer);
    Ok(())
}

/// Runs one command against the screener and turns the outcome into a reply.
pub fn dispatch(screener: &Screener, cmd: &Command) -> Reply {
    info!("{} : {} with params: {:?}", Local::now(), cmd.action, cmd.params);
    let outcome = match cmd.action {
        Action::LoadAll => screener.load_all(&cmd.params),
        Action::Refresh => screener.refresh(&cmd.params),
        Action::Filter => screener.filter_only(&cmd.params),
    };
    match outcome {
        Ok(Screened { as_of, rows }) => {
            info!("{} : {} rows matched", cmd.action, rows.len());
            Reply::StockData { as_of, rows }
        }
        Err(e) => {
            error!("{} failed: {}", cmd.action, e);
            Reply::from(&e)
        }
    }
}
