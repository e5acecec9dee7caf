//! Transport boundary for RPC exchanges.
//!
//! The RPC layer hands a transport the encoded request and the request
//! type's static location, and gets back raw response bytes or a
//! [`TransportError`]. Framing, connections and timeouts belong here; the
//! RPC layer never sees transport details beyond success or failure.
//!
//! ```text
//! ┌─────────────────┐        Unix Socket          ┌─────────────────────┐
//! │   RpcClient     │  ◄─────────────────────────►│    chat service     │
//! │ (UnixTransport) │   Location + Content-Length │                     │
//! └─────────────────┘          framing            └─────────────────────┘
//! ```

mod framing;
mod unix;

use std::future::Future;
use std::sync::Arc;

pub use framing::{read_frame, write_frame, Frame, MAX_FRAME_SIZE};
pub use unix::{default_socket_path, UnixTransport};

use crate::error::TransportError;

/// Sends one encoded request and returns the raw response bytes.
///
/// Implementations must tolerate concurrent calls; each exchange is
/// independent and no ordering between them is promised.
pub trait Transport: Send + Sync {
    fn exchange(
        &self,
        location: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn exchange(
        &self,
        location: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send {
        (**self).exchange(location, body)
    }
}
