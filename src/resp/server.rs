//! RESP Server
//!
//! Accept loop and per-connection handling for the line protocol. Each
//! connection runs on its own task and calls straight into the shared cache.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::metrics::Metrics;
use crate::resp::codec::parse_frame;
use crate::resp::commands::Command;

/// Connections whose unparsed input grows past this are dropped.
pub const MAX_BUFFER_BYTES: usize = 64 * 1024 * 1024;

const READ_CHUNK_BYTES: usize = 16 * 1024;

/// Serves the line protocol on `listener` until the task is aborted.
///
/// Accept failures are logged and skipped so a burst of them (for example
/// running out of file descriptors) does not take the listener down.
pub async fn serve(listener: TcpListener, cache: Arc<Cache>, metrics: Arc<Metrics>) -> anyhow::Result<()> {
    let addr = listener
        .local_addr()
        .context("Failed to read RESP listener address")?;
    info!("RESP listening on {}", addr);

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "Failed to accept RESP connection");
                continue;
            }
        };
        debug!(%peer, "RESP client connected");

        let cache = Arc::clone(&cache);
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            match handle_connection(socket, &cache, &metrics).await {
                Ok(()) => debug!(%peer, "RESP client disconnected"),
                Err(err) => debug!(%peer, error = %err, "RESP connection closed with error"),
            }
        });
    }
}

/// Reads frames from `stream` and writes one reply per frame, in order.
///
/// Returns when the peer closes the stream, after `QUIT`, or when the buffered
/// input exceeds [`MAX_BUFFER_BYTES`] without forming a frame.
pub async fn handle_connection<S>(mut stream: S, cache: &Cache, metrics: &Metrics) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer: Vec<u8> = Vec::with_capacity(READ_CHUNK_BYTES);
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    let mut out = Vec::new();

    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..read]);

        let mut consumed = 0;
        let mut quit = false;
        while let Some((frame, used)) = parse_frame(&buffer[consumed..]) {
            consumed += used;
            let reply = match Command::parse(&frame) {
                Ok(command) => {
                    let started = Instant::now();
                    let name = command.name();
                    quit = command.closes_connection();
                    let reply = command.execute(cache);
                    metrics.observe_resp(name, started.elapsed());
                    reply
                }
                Err(reply) => reply,
            };
            reply.encode(&mut out);
            if quit {
                break;
            }
        }
        buffer.drain(..consumed);

        if !out.is_empty() {
            stream.write_all(&out).await?;
            out.clear();
        }
        if quit {
            stream.shutdown().await?;
            return Ok(());
        }
        if buffer.len() > MAX_BUFFER_BYTES {
            warn!(
                buffered = buffer.len(),
                "RESP input exceeded buffer limit, closing connection"
            );
            return Ok(());
        }
    }
}
