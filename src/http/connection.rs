//! Per-connection read/dispatch/write loop.
//!
//! # Responsibilities
//! - Read batches from the socket and feed the framing stage
//! - Hand every frame to the connection's adapter, in arrival order
//! - Write adapter output, flush at the end of each read batch
//! - Close after a non-persistent exchange, on idle timeout, or when draining

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::watch;

use crate::config::LimitsConfig;
use crate::http::adapter::ProtocolAdapter;
use crate::http::codec::RequestDecoder;
use crate::http::error::TransportError;

const READ_CHUNK: usize = 8 * 1024;

/// Per-connection knobs, copied from the server configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub limits: LimitsConfig,
    /// Close when no bytes arrive for this long. `None` waits forever.
    pub idle_timeout: Option<Duration>,
}

/// Serves HTTP exchanges on `stream` until it closes.
///
/// `shutdown` flips to `true` when the owning event loop drains: idle
/// connections close at once, a partially received request is completed and
/// answered first.
pub async fn serve<S>(
    stream: S,
    mut adapter: ProtocolAdapter,
    settings: ConnectionSettings,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufWriter::new(stream);
    let mut decoder = RequestDecoder::new(settings.limits);
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut wire = Vec::with_capacity(READ_CHUNK);
    let mut draining = *shutdown.borrow();

    loop {
        if draining && decoder.is_idle() {
            tracing::debug!("Closing connection for shutdown");
            break;
        }

        let read = tokio::select! {
            _ = shutdown.changed(), if !draining => {
                draining = true;
                continue;
            }
            read = read_chunk(&mut stream, &mut chunk, settings.idle_timeout) => read?,
        };
        if read == 0 {
            tracing::trace!("Peer closed connection");
            break;
        }

        decoder.feed(&chunk[..read]);
        loop {
            let frame = match decoder.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(error) => {
                    // Answers to requests earlier in this batch still go out.
                    let _ = stream.flush().await;
                    return Err(error.into());
                }
            };
            for outbound in adapter.on_frame(frame) {
                let closing = draining || *shutdown.borrow();
                let outbound = if closing { outbound.closing() } else { outbound };
                wire.clear();
                outbound.response.write_to(&mut wire);
                stream.write_all(&wire).await?;
                if outbound.close_after {
                    stream.flush().await?;
                    stream.shutdown().await?;
                    return Ok(());
                }
            }
        }
        stream.flush().await?;
    }

    let _ = stream.shutdown().await;
    Ok(())
}

async fn read_chunk<R>(
    reader: &mut R,
    buf: &mut [u8],
    idle_timeout: Option<Duration>,
) -> Result<usize, TransportError>
where
    R: AsyncRead + Unpin,
{
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, reader.read(buf))
            .await
            .map_err(|_| TransportError::IdleTimeout(limit))?
            .map_err(TransportError::from),
        None => Ok(reader.read(buf).await?),
    }
}
