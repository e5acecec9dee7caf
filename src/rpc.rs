//! Typed RPC dispatch.
//!
//! Each request type names exactly one response type and one static
//! location. [`RpcClient::execute`] drives a request through
//!
//! ```text
//! Built ──► Sent ──► Succeeded
//!                └─► Failed
//! ```
//!
//! and returns either the decoded response or a [`ServiceError`]. The
//! request is taken by value, so a failed or cancelled call leaves nothing
//! half-updated in the caller's hands.
//!
//! The request/response pairing is checked by the compiler:
//!
//! ```compile_fail
//! use chatwire::rpc::ServiceRequest;
//! use chatwire::schema::{ListConversationsResponse, SendChatMessageRequest};
//!
//! fn expects_listing<R: ServiceRequest<Response = ListConversationsResponse>>(_: R) {}
//!
//! expects_listing(SendChatMessageRequest::new("conv-1", "hi"));
//! ```

use std::fmt;

use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::message::ProtoMessage;
use crate::random::{EntropySource, OsEntropy, RandomSampler};
use crate::schema::{RequestHeader, ResponseHeader, ResponseStatus};
use crate::transport::Transport;

/// Upper bound (exclusive) for client-generated correlation ids.
pub const CORRELATION_ID_BOUND: u64 = 1 << 32;

/// A message sent as an RPC request.
pub trait ServiceRequest: ProtoMessage {
    /// The only response type this request can produce.
    type Response: ServiceResponse;

    /// Where requests of this type are routed.
    const LOCATION: &'static str;

    /// Header identifying the caller, if set.
    fn request_header(&self) -> Option<&RequestHeader>;

    /// Header slot stamped by `RpcClient` before sending.
    fn request_header_mut(&mut self) -> &mut Option<RequestHeader>;
}

/// A message received as an RPC response.
pub trait ServiceResponse: ProtoMessage {
    /// Header carrying the server's status, if present.
    fn response_header(&self) -> Option<&ResponseHeader>;

    /// Mutable access to the response header slot.
    fn response_header_mut(&mut self) -> &mut Option<ResponseHeader>;
}

/// Lifecycle of a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Request constructed and header stamped.
    Built,
    /// Bytes handed to the transport.
    Sent,
    Succeeded,
    Failed,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Succeeded | CallState::Failed)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Built => "built",
            CallState::Sent => "sent",
            CallState::Succeeded => "succeeded",
            CallState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Session-scoped values stamped into every request header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub client_id: Option<String>,
    pub language_code: Option<String>,
}

/// Classify a decoded response.
///
/// Only an `Ok` status is success. A server-reported failure keeps its
/// status and description; a response without a header or without a status
/// is `Unknown`.
pub fn classify<R: ServiceResponse>(response: R) -> Result<R, ServiceError> {
    let Some(header) = response.response_header() else {
        return Err(ServiceError::Unknown);
    };

    match header.status {
        Some(ResponseStatus::Ok) => Ok(response),
        Some(status) => Err(ServiceError::ServerError(
            status,
            header.error_description.clone().unwrap_or_default(),
        )),
        None => Err(ServiceError::Unknown),
    }
}

/// Typed RPC client over a transport.
pub struct RpcClient<T, E = OsEntropy> {
    transport: T,
    session: Session,
    sampler: RandomSampler<E>,
}

impl<T: Transport> RpcClient<T, OsEntropy> {
    /// Client drawing correlation ids from the OS RNG.
    pub fn new(transport: T, session: Session) -> Self {
        Self::with_sampler(transport, session, RandomSampler::os())
    }
}

impl<T: Transport, E: EntropySource> RpcClient<T, E> {
    pub fn with_sampler(transport: T, session: Session, sampler: RandomSampler<E>) -> Self {
        Self {
            transport,
            session,
            sampler,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` to its location and wait for the associated response.
    ///
    /// # Errors
    ///
    /// - `ServiceError::ServerError` if the server answered with a non-`Ok`
    ///   status.
    /// - `ServiceError::Unknown` for everything else: encode, transport or
    ///   decode failures, and responses without a status.
    pub async fn execute<R: ServiceRequest>(&self, mut request: R) -> Result<R::Response, ServiceError> {
        let location = R::LOCATION;
        let correlation_id = self.stamp_header(&mut request)?;
        debug!(location, correlation_id, state = %CallState::Built, "RPC request built");

        let result = self.send(location, &request).await;
        match &result {
            Ok(_) => debug!(location, correlation_id, state = %CallState::Succeeded, "RPC succeeded"),
            Err(e) => debug!(location, correlation_id, state = %CallState::Failed, error = %e, "RPC failed"),
        }
        result
    }

    async fn send<R: ServiceRequest>(&self, location: &str, request: &R) -> Result<R::Response, ServiceError> {
        let body = request.encode().map_err(|e| {
            warn!(location, "Failed to encode request: {}", e);
            ServiceError::Unknown
        })?;

        debug!(location, bytes = body.len(), state = %CallState::Sent, "RPC request sent");
        let bytes = self.transport.exchange(location, body).await.map_err(|e| {
            warn!(location, "Transport failure: {}", e);
            ServiceError::Unknown
        })?;

        let response = R::Response::decode(&bytes).map_err(|e| {
            warn!(location, "Failed to decode response: {}", e);
            ServiceError::Unknown
        })?;

        classify(response)
    }

    /// Fill absent header fields from the session and a fresh correlation id.
    ///
    /// Fields the caller already set are kept. Returns the correlation id.
    fn stamp_header<R: ServiceRequest>(&self, request: &mut R) -> Result<u64, ServiceError> {
        let header = request.request_header_mut().get_or_insert_with(RequestHeader::default);

        if header.client_id.is_none() {
            header.client_id = self.session.client_id.clone();
        }
        if header.language_code.is_none() {
            header.language_code = self.session.language_code.clone();
        }

        match header.client_generated_id {
            Some(id) => Ok(id),
            None => {
                let id = self.sampler.sample(CORRELATION_ID_BOUND).map_err(|e| {
                    warn!("Failed to generate correlation id: {}", e);
                    ServiceError::Unknown
                })?;
                header.client_generated_id = Some(id);
                Ok(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SendChatMessageRequest, SendChatMessageResponse};

    fn response(header: Option<ResponseHeader>) -> SendChatMessageResponse {
        SendChatMessageResponse {
            response_header: header,
            event_id: Some("event-1".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_classify_ok() {
        let ok = response(Some(ResponseHeader::ok()));
        assert_eq!(classify(ok.clone()), Ok(ok));
    }

    #[test]
    fn test_classify_server_failure() {
        let failed = response(Some(ResponseHeader::failure(ResponseStatus::RateLimited, "slow down")));
        assert_eq!(
            classify(failed),
            Err(ServiceError::ServerError(ResponseStatus::RateLimited, "slow down".to_string()))
        );
    }

    #[test]
    fn test_classify_failure_without_description() {
        let header = ResponseHeader {
            status: Some(ResponseStatus::Busy),
            ..ResponseHeader::default()
        };
        assert_eq!(
            classify(response(Some(header))),
            Err(ServiceError::ServerError(ResponseStatus::Busy, String::new()))
        );
    }

    #[test]
    fn test_classify_unrecognized_status_is_server_error() {
        let header = ResponseHeader {
            status: Some(ResponseStatus::Unrecognized(99)),
            ..ResponseHeader::default()
        };
        let result = classify(response(Some(header)));
        assert_eq!(result.unwrap_err().status(), Some(ResponseStatus::Unrecognized(99)));
    }

    #[test]
    fn test_classify_missing_header_or_status() {
        assert_eq!(classify(response(None)), Err(ServiceError::Unknown));
        assert_eq!(
            classify(response(Some(ResponseHeader::default()))),
            Err(ServiceError::Unknown)
        );
    }

    #[test]
    fn test_call_state_terminal() {
        assert!(!CallState::Built.is_terminal());
        assert!(!CallState::Sent.is_terminal());
        assert!(CallState::Succeeded.is_terminal());
        assert!(CallState::Failed.is_terminal());
        assert_eq!(CallState::Sent.to_string(), "sent");
    }

    #[test]
    fn test_request_header_slot() {
        let mut request = SendChatMessageRequest::new("conv-1", "hi");
        assert!(request.request_header().is_none());
        request.request_header_mut().get_or_insert_with(RequestHeader::default).client_id =
            Some("client-7".to_string());
        assert_eq!(
            request.request_header().and_then(|h| h.client_id.as_deref()),
            Some("client-7")
        );
    }
}
