//! Unix domain socket transport.
//!
//! One persistent connection per `UnixTransport`. Exchanges are serialized
//! on that connection under an async mutex and bounded by a timeout. A
//! connection is marked broken for the duration of every exchange and only
//! cleared once the response frame has been read. An exchange that failed,
//! timed out or was dropped by its caller therefore leaves it broken, since
//! a stale response may still arrive, and later exchanges are refused.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::framing::{read_frame, write_frame};
use super::Transport;
use crate::error::TransportError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Initial connect retry delay, doubled per attempt.
const INITIAL_BACKOFF_MS: u64 = 100;

/// Upper bound on a single connect retry delay.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Delay before retrying after the given failed attempt (1-based).
fn backoff_delay(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(16);
    Duration::from_millis(INITIAL_BACKOFF_MS << shift).min(MAX_BACKOFF)
}

/// Map a framing failure to a transport error, keeping I/O errors typed.
fn frame_error(action: &str, err: anyhow::Error) -> TransportError {
    let message = format!("{}: {:#}", action, err);
    match err.downcast::<std::io::Error>() {
        Ok(io_err) => {
            debug!("{}", message);
            TransportError::from(io_err)
        }
        Err(_) => TransportError::Protocol(message),
    }
}

/// Resolve the default socket path for the chat service.
///
/// Resolution order:
/// 1. `$XDG_RUNTIME_DIR/chatwire.sock` (Linux standard)
/// 2. `<cache dir>/chatwire.sock` (e.g. `~/Library/Caches` on macOS)
/// 3. `/tmp/chatwire.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join("chatwire.sock");
    }

    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join("chatwire.sock");
    }

    PathBuf::from("/tmp/chatwire.sock")
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    broken: bool,
}

/// Transport over a Unix domain socket.
///
/// # Example
///
/// ```ignore
/// use chatwire::transport::UnixTransport;
///
/// let transport = UnixTransport::connect_with_retry(&socket_path, 5).await?;
/// ```
pub struct UnixTransport {
    connection: Mutex<Connection>,
    timeout: Duration,
}

impl UnixTransport {
    /// Connect to the service at the given socket path.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::ConnectionFailed` if the socket does not
    /// exist or the connection is refused, `TransportError::Io` for any
    /// other I/O failure.
    pub async fn connect(socket_path: &Path) -> Result<Self, TransportError> {
        let stream = UnixStream::connect(socket_path).await?;

        debug!("Connected to {}", socket_path.display());
        Ok(Self::from_stream(stream))
    }

    /// Connect with automatic retry and exponential backoff.
    ///
    /// Retries with delays of 100ms, 200ms, 400ms, etc., capped at 5s. A
    /// `max_attempts` of zero is treated as one attempt.
    pub async fn connect_with_retry(
        socket_path: &Path,
        max_attempts: u32,
    ) -> Result<Self, TransportError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match Self::connect(socket_path).await {
                Ok(transport) => return Ok(transport),
                Err(e) if attempt < max_attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "Connect attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: UnixStream) -> Self {
        let (read_half, write_half) = stream.into_split();

        Self {
            connection: Mutex::new(Connection {
                reader: BufReader::new(read_half),
                writer: write_half,
                broken: false,
            }),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the per-exchange timeout. Default is 30 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Write one request frame and read one response frame (no timeout).
    async fn send_receive(
        conn: &mut Connection,
        location: &str,
        body: &[u8],
    ) -> Result<Vec<u8>, TransportError> {
        write_frame(&mut conn.writer, Some(location), body)
            .await
            .map_err(|e| frame_error("Failed to send request", e))?;

        let frame = read_frame(&mut conn.reader)
            .await
            .map_err(|e| frame_error("Failed to read response", e))?;

        Ok(frame.body)
    }
}

impl Transport for UnixTransport {
    async fn exchange(&self, location: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let mut conn = self.connection.lock().await;

        if conn.broken {
            return Err(TransportError::Protocol(
                "Connection is unusable after an earlier failure".to_string(),
            ));
        }

        // Cleared only after a full response; a dropped future keeps it set.
        conn.broken = true;
        match timeout(self.timeout, Self::send_receive(&mut conn, location, &body)).await {
            Ok(Ok(response)) => {
                conn.broken = false;
                Ok(response)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }
}
