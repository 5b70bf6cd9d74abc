//! Telnet-style line ingest front-end.
//!
//! Speaks the OpenTSDB wire protocol subset: newline-framed ASCII with a
//! single `put <name> <timestamp> <value> <tag>...` verb. Bytes outside the
//! allowed set are silently discarded; errors are answered on the same
//! connection as `put: <diagnostic>`.

use crate::state::AppState;
use shared::models::Metric;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

/// Per-read buffer size.
const READ_CHUNK: usize = 2048;

/// Runs the ingest listener until shutdown is signaled.
///
/// Each accepted connection gets its own task holding a line buffer; the
/// shutdown channel tears the acceptor and every client down together.
pub async fn run(listener: TcpListener, state: AppState, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, peer)) => {
                        tracing::debug!(%peer, "new telnet connection");
                        tokio::spawn(handle_connection(
                            socket,
                            peer,
                            state.clone(),
                            shutdown.clone(),
                        ));
                    }
                    Err(error) => {
                        tracing::warn!(%error, "failed to accept telnet connection");
                    }
                }
            }
            _ = shutdown.changed() => break,
        }
    }
    tracing::info!("telnet interface stopped");
}

async fn handle_connection(
    mut socket: TcpStream,
    peer: SocketAddr,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = [0u8; READ_CHUNK];
    let mut line = String::new();

    loop {
        tokio::select! {
            read = socket.read(&mut buf) => {
                match read {
                    Ok(0) => {
                        tracing::debug!(%peer, "telnet connection closed");
                        break;
                    }
                    Ok(n) => {
                        for &byte in &buf[..n] {
                            let Some(reply) = ingest_byte(&mut line, byte, &state) else {
                                continue;
                            };
                            if socket.write_all(reply.as_bytes()).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%peer, %error, "telnet read failed");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// Returns true for bytes the line filter discards.
///
/// The wire format keeps alphanumerics, punctuation other than the
/// apostrophe, and spaces; a newline terminates the line and everything
/// else (control bytes, quoting noise) is dropped.
pub(crate) fn is_discarded(byte: u8) -> bool {
    !(byte.is_ascii_alphanumeric()
        || (byte.is_ascii_punctuation() && byte != b'\'')
        || byte == b' ')
}

/// Applies the byte filter to a whole line, as the HTTP put body does.
pub(crate) fn clean_line(line: &str) -> String {
    line.bytes()
        .filter(|&b| !is_discarded(b))
        .map(char::from)
        .collect()
}

/// Feeds one byte into the connection's line buffer.
///
/// Returns an error reply owed to the client when a newline completes a
/// line that fails to parse.
fn ingest_byte(line: &mut String, byte: u8, state: &AppState) -> Option<String> {
    if byte == b'\n' {
        let reply = handle_line(line, state);
        line.clear();
        return reply;
    }
    if !is_discarded(byte) {
        line.push(char::from(byte));
    }
    None
}

/// Handles one framed line; returns the error reply when one is owed.
fn handle_line(line: &str, state: &AppState) -> Option<String> {
    // tolerate framing noise: drop a leading non-alphabetic character
    let line = match line.as_bytes().first() {
        Some(first) if !first.is_ascii_alphabetic() => &line[1..],
        _ => line,
    };
    if line.is_empty() {
        return None;
    }

    if line != "put" && !line.starts_with("put ") {
        // other verbs are reserved
        return None;
    }

    // put <metric> <timestamp> <value> <tagk_1=tagv_1> [<tagk_n=tagv_n>]
    let field_count = line.split(' ').count();
    if field_count < 5 {
        return Some(format!(
            "put: invalid number of parameters ({field_count}), 5 required.\r\n"
        ));
    }

    match line[4..].parse::<Metric>() {
        Ok(metric) => {
            state.datastore().queue_metric(metric);
            state.stats().add_put_count(1);
            None
        }
        Err(error) => Some(format!("put: invalid value: {error}\r\n")),
    }
}
