//! Header framing for RPC bodies over stream sockets.
//!
//! # Wire Format
//!
//! ```text
//! Location: /chat/send\r\n
//! Content-Length: <length>\r\n
//! \r\n
//! <message-body>
//! ```
//!
//! `Location` is sent on requests and omitted on responses. Header names are
//! case-insensitive and both CRLF and LF line endings are accepted. The body
//! is opaque bytes.

use anyhow::{anyhow, bail, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum body size (100MB) to prevent OOM from malicious/buggy peers.
pub const MAX_FRAME_SIZE: usize = 100 * 1024 * 1024;

/// One framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Routing location, present on requests.
    pub location: Option<String>,
    pub body: Vec<u8>,
}

/// Read a framed message from the stream.
///
/// # Errors
///
/// Returns an error if:
/// - The stream is closed (EOF)
/// - No Content-Length header is found
/// - Content-Length exceeds MAX_FRAME_SIZE (100MB)
/// - The body cannot be read completely
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut location: Option<String> = None;

    loop {
        let mut line = String::new();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .context("Failed to read header line")?;

        if bytes_read == 0 {
            bail!("Connection closed by peer");
        }

        let trimmed = line.trim();

        // Empty line signals end of headers
        if trimmed.is_empty() {
            break;
        }

        if let Some((key, value)) = trimmed.split_once(':') {
            let key = key.trim();
            let value = value.trim();

            if key.eq_ignore_ascii_case("Content-Length") {
                content_length = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid Content-Length value: {}", value))?,
                );
            } else if key.eq_ignore_ascii_case("Location") {
                location = Some(value.to_string());
            }
            // Ignore other headers (e.g., Content-Type)
        }
    }

    let size = content_length.ok_or_else(|| anyhow!("Missing Content-Length header"))?;

    if size > MAX_FRAME_SIZE {
        bail!("Frame size {} exceeds maximum {} bytes", size, MAX_FRAME_SIZE);
    }

    let mut body = vec![0u8; size];
    reader
        .read_exact(&mut body)
        .await
        .context("Failed to read frame body")?;

    Ok(Frame { location, body })
}

/// Write a framed message to the stream and flush it.
///
/// # Errors
///
/// Returns an error if the location contains a line break, or if the write
/// or flush fails.
pub async fn write_frame<W>(writer: &mut W, location: Option<&str>, body: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut header = String::new();
    if let Some(location) = location {
        if location.contains(['\r', '\n']) {
            bail!("Location must not contain line breaks: {:?}", location);
        }
        header.push_str(&format!("Location: {}\r\n", location));
    }
    header.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

    writer
        .write_all(header.as_bytes())
        .await
        .context("Failed to write frame header")?;

    writer
        .write_all(body)
        .await
        .context("Failed to write frame body")?;

    writer.flush().await.context("Failed to flush frame")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::BufReader;
    use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
    use tokio::net::UnixStream;
    use tokio::time::timeout;

    /// Test timeout to prevent hanging tests.
    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connected pair: the reader sees what the writer writes.
    fn socket_pair() -> (OwnedReadHalf, OwnedWriteHalf) {
        let (stream_a, stream_b) = UnixStream::pair().expect("Failed to create socket pair");
        let (a_read, _a_write) = stream_a.into_split();
        let (_b_read, b_write) = stream_b.into_split();
        (a_read, b_write)
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let (server_read, mut client_write) = socket_pair();

        let body = br#"{"conversation_id":"c1","text":"hi"}"#;
        write_frame(&mut client_write, Some("/chat/send"), body)
            .await
            .expect("Write failed");

        let mut reader = BufReader::new(server_read);
        let frame = timeout(TEST_TIMEOUT, read_frame(&mut reader))
            .await
            .expect("Test timed out")
            .expect("Read failed");

        assert_eq!(frame.location.as_deref(), Some("/chat/send"));
        assert_eq!(frame.body, body.to_vec());
    }

    #[tokio::test]
    async fn test_response_frame_has_no_location() {
        let (server_read, mut client_write) = socket_pair();

        write_frame(&mut client_write, None, b"{}").await.expect("Write failed");

        let mut reader = BufReader::new(server_read);
        let frame = read_frame(&mut reader).await.expect("Read failed");
        assert_eq!(frame.location, None);
        assert_eq!(frame.body, b"{}".to_vec());
    }

    #[tokio::test]
    async fn test_binary_body_is_opaque() {
        let (server_read, mut client_write) = socket_pair();

        let body = [0u8, 0xff, b'\r', b'\n', b'\r', b'\n', 7];
        write_frame(&mut client_write, None, &body).await.expect("Write failed");

        let mut reader = BufReader::new(server_read);
        let frame = read_frame(&mut reader).await.expect("Read failed");
        assert_eq!(frame.body, body.to_vec());
    }

    #[tokio::test]
    async fn test_read_missing_content_length() {
        let (server_read, mut client_write) = socket_pair();

        client_write
            .write_all(b"Location: /chat/send\r\n\r\n")
            .await
            .expect("Write failed");
        drop(client_write);

        let mut reader = BufReader::new(server_read);
        let result = timeout(TEST_TIMEOUT, read_frame(&mut reader))
            .await
            .expect("Test timed out");

        let err_msg = result.unwrap_err().to_string();
        assert!(
            err_msg.contains("Missing Content-Length"),
            "Expected 'Missing Content-Length' error, got: {}",
            err_msg
        );
    }

    #[tokio::test]
    async fn test_read_handles_lf_and_case_insensitive_headers() {
        let (server_read, mut client_write) = socket_pair();

        let body = r#"{"test":true}"#;
        let raw = format!("location: /x\ncontent-length: {}\n\n{}", body.len(), body);
        client_write
            .write_all(raw.as_bytes())
            .await
            .expect("Write failed");

        let mut reader = BufReader::new(server_read);
        let frame = read_frame(&mut reader).await.expect("Read failed");
        assert_eq!(frame.location.as_deref(), Some("/x"));
        assert_eq!(frame.body, body.as_bytes().to_vec());
    }

    #[tokio::test]
    async fn test_read_rejects_oversized_frame() {
        let (server_read, mut client_write) = socket_pair();

        let raw = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_SIZE + 1);
        client_write
            .write_all(raw.as_bytes())
            .await
            .expect("Write failed");

        let mut reader = BufReader::new(server_read);
        let result = timeout(TEST_TIMEOUT, read_frame(&mut reader))
            .await
            .expect("Test timed out");

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("exceeds maximum"), "Expected size error, got: {}", err_msg);
    }

    #[tokio::test]
    async fn test_read_truncated_body() {
        let (server_read, mut client_write) = socket_pair();

        client_write
            .write_all(b"Content-Length: 10\r\n\r\nabc")
            .await
            .expect("Write failed");
        drop(client_write);

        let mut reader = BufReader::new(server_read);
        let result = read_frame(&mut reader).await;
        assert!(result.unwrap_err().to_string().contains("frame body"));
    }

    #[tokio::test]
    async fn test_connection_closed_returns_error() {
        let (server_read, client_write) = socket_pair();
        drop(client_write);

        let mut reader = BufReader::new(server_read);
        let result = timeout(TEST_TIMEOUT, read_frame(&mut reader))
            .await
            .expect("Test timed out");

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("closed"), "Expected connection closed error, got: {}", err_msg);
    }

    #[tokio::test]
    async fn test_write_rejects_header_injection() {
        let (_server_read, mut client_write) = socket_pair();

        let result = write_frame(&mut client_write, Some("/chat\r\nContent-Length: 0"), b"x").await;
        assert!(result.unwrap_err().to_string().contains("line breaks"));
    }
}
