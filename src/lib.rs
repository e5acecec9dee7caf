//! chatwire: client runtime for the chat service's binary RPC protocol.
//!
//! - `wire_enum` - integer-backed enumerations that survive unknown values
//! - `message` - the message contract (encode, decode, equality, hashing)
//! - `hash` - deterministic structural hashing shared by all messages
//! - `rpc` - typed request/response dispatch and error classification
//! - `transport` - the byte-level boundary and a Unix socket transport
//! - `random` - unbiased bounded sampling for correlation ids
//! - `timestamp` - microsecond epoch conversion
//!
//! # Usage
//!
//! ```ignore
//! use chatwire::config::ClientConfig;
//! use chatwire::rpc::RpcClient;
//! use chatwire::schema::SendChatMessageRequest;
//! use chatwire::transport::UnixTransport;
//!
//! let config = ClientConfig::from_env()?;
//! let transport = UnixTransport::connect(&config.socket_path).await?;
//! let client = RpcClient::new(transport.with_timeout(config.timeout), config.session());
//! let response = client.execute(SendChatMessageRequest::new("conv-1", "hello")).await?;
//! ```

pub mod config;
pub mod error;
pub mod hash;
pub mod message;
pub mod random;
pub mod rpc;
pub mod schema;
pub mod timestamp;
pub mod transport;
pub mod wire_enum;

pub use error::{ServiceError, TransportError};
pub use message::{DecodeError, EncodeError, ProtoMessage};
pub use rpc::{RpcClient, ServiceRequest, ServiceResponse};

#[doc(hidden)]
pub use serde as __serde;
