//! Active HTTP line probe.
//!
//! # Responsibilities
//! - Dial a peer with the configured timeout
//! - Send the raw request bytes, read one status line
//! - Judge the status line against the allowed codes
//! - Feed the result to the state machine
//!
//! # Design Decisions
//! - Only the leading `HTTP/<major>.<minor> <code>` of the first line is
//!   inspected; headers and body are never read
//! - Connect, send and receive each get the full timeout
//! - Failures of peers already down are not logged

use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time;

use crate::health::state::{self, Verdict};
use crate::health::{CheckerContext, CheckerSettings};
use crate::observability::metrics;
use crate::upstream::Peer;

/// Longest status line read from a peer.
const MAX_STATUS_LINE: u64 = 8 * 1024;

/// Why a probe counted as a failure.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("failed to connect: {0}")]
    Connect(io::Error),

    #[error("timed out connecting")]
    ConnectTimeout,

    #[error("failed to send request: {0}")]
    Send(io::Error),

    #[error("timed out sending request")]
    SendTimeout,

    #[error("failed to receive status line: {0}")]
    Receive(io::Error),

    #[error("timed out receiving status line")]
    ReceiveTimeout,

    #[error("connection closed before status line")]
    Closed,

    #[error("bad status line: {0:?}")]
    BadStatusLine(String),

    #[error("bad status code: {0}")]
    BadStatus(u16),
}

trait ProbeStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ProbeStream for T {}

/// Probe one peer and record the result.
pub async fn probe(ctx: &CheckerContext, peer: &mut Peer) -> Verdict {
    match check_peer(&ctx.settings, peer).await {
        Ok(()) => {
            metrics::record_probe(&ctx.zone, true);
            state::record_success(ctx, peer).await
        }
        Err(failure) => {
            if !peer.down {
                tracing::warn!(
                    zone = %ctx.zone,
                    peer = %peer.name,
                    error = %failure,
                    "Health check probe failed"
                );
            }
            metrics::record_probe(&ctx.zone, false);
            state::record_failure(ctx, peer).await
        }
    }
}

/// Run the network exchange only.
pub async fn check_peer(settings: &CheckerSettings, peer: &Peer) -> Result<(), ProbeFailure> {
    let timeout = settings.timeout;

    let stream = match time::timeout(timeout, dial(peer)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(ProbeFailure::Connect(e)),
        Err(_) => return Err(ProbeFailure::ConnectTimeout),
    };
    let mut stream = BufReader::new(stream);

    match time::timeout(timeout, stream.write_all(&settings.request)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(ProbeFailure::Send(e)),
        Err(_) => return Err(ProbeFailure::SendTimeout),
    }

    let mut line = Vec::new();
    let read = time::timeout(
        timeout,
        (&mut stream).take(MAX_STATUS_LINE).read_until(b'\n', &mut line),
    )
    .await;
    match read {
        Ok(Ok(0)) => return Err(ProbeFailure::Closed),
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return Err(ProbeFailure::Receive(e)),
        Err(_) => {
            drop(stream);
            return Err(ProbeFailure::ReceiveTimeout);
        }
    }
    drop(stream);

    if let Some(valid) = &settings.valid_statuses {
        let line = String::from_utf8_lossy(&line);
        let code = parse_status_code(&line)
            .ok_or_else(|| ProbeFailure::BadStatusLine(line.trim_end().to_string()))?;
        if !valid.contains(&code) {
            return Err(ProbeFailure::BadStatus(code));
        }
    }
    Ok(())
}

async fn dial(peer: &Peer) -> io::Result<Box<dyn ProbeStream>> {
    #[cfg(unix)]
    {
        if let Some(path) = peer.name.strip_prefix("unix:") {
            let stream = tokio::net::UnixStream::connect(path).await?;
            return Ok(Box::new(stream));
        }
    }

    let stream = match (&peer.host, peer.port) {
        (Some(host), Some(port)) => TcpStream::connect((host.as_str(), port)).await?,
        _ => TcpStream::connect(peer.name.as_str()).await?,
    };
    Ok(Box::new(stream))
}

/// Extract the status code from a leading `HTTP/<major>.<minor> <code>`.
pub fn parse_status_code(line: &str) -> Option<u16> {
    let rest = line.strip_prefix("HTTP/")?;
    let (version, rest) = rest.split_once(|c: char| c.is_ascii_whitespace())?;
    let (major, minor) = version.split_once('.')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(major) || !all_digits(minor) {
        return None;
    }

    let rest = rest.trim_start();
    let end = rest.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse().ok()
}
