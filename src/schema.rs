//! Chat service payloads.
//!
//! These are the schema-level message types the runtime is exercised with:
//! the request/response headers every RPC carries and the conversation
//! endpoints used by the `chatwire` binary. The runtime only relies on the
//! header slots and on `ResponseHeader` exposing a status and description.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::ProtoMessage;
use crate::rpc::{ServiceRequest, ServiceResponse};
use crate::timestamp::{from_microseconds, TimestampError};
use crate::{proto_enum, structural_hash};

proto_enum! {
    /// Outcome reported by the server in every response header.
    pub enum ResponseStatus {
        Unknown = 0,
        Ok = 1,
        Busy = 2,
        UnexpectedError = 3,
        InvalidRequest = 4,
        RateLimited = 5,
    }
}

/// Client-sent header identifying the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    /// Session-scoped client identifier.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Per-request correlation id.
    #[serde(default)]
    pub client_generated_id: Option<u64>,
    #[serde(default)]
    pub language_code: Option<String>,
}

structural_hash!(RequestHeader {
    client_id,
    client_generated_id,
    language_code,
});

impl ProtoMessage for RequestHeader {}

/// Server-sent header describing the outcome of an RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde(default)]
    pub status: Option<ResponseStatus>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub debug_url: Option<String>,
    #[serde(default)]
    pub request_trace_id: Option<String>,
    /// Server clock in microseconds since the epoch.
    #[serde(default)]
    pub current_server_time: Option<i64>,
}

structural_hash!(ResponseHeader {
    status,
    error_description,
    debug_url,
    request_trace_id,
    current_server_time,
});

impl ProtoMessage for ResponseHeader {}

impl ResponseHeader {
    /// Header with an `Ok` status.
    pub fn ok() -> Self {
        Self {
            status: Some(ResponseStatus::Ok),
            ..Self::default()
        }
    }

    /// Header reporting a failure.
    pub fn failure(status: ResponseStatus, description: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            error_description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(ResponseStatus::Ok)
    }

    /// Server clock as a calendar time. A missing value is the epoch.
    pub fn server_time(&self) -> Result<DateTime<Utc>, TimestampError> {
        from_microseconds(self.current_server_time)
    }
}

// =============================================================================
// Conversations
// =============================================================================

/// Post a text message to a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendChatMessageRequest {
    #[serde(default)]
    pub request_header: Option<RequestHeader>,
    pub conversation_id: String,
    pub text: String,
    /// Client-side dedup key for the message itself.
    #[serde(default)]
    pub client_message_id: Option<u64>,
}

structural_hash!(SendChatMessageRequest {
    request_header,
    conversation_id,
    text,
    client_message_id,
});

impl ProtoMessage for SendChatMessageRequest {}

impl ServiceRequest for SendChatMessageRequest {
    type Response = SendChatMessageResponse;
    const LOCATION: &'static str = "/chat/send";

    fn request_header(&self) -> Option<&RequestHeader> {
        self.request_header.as_ref()
    }

    fn request_header_mut(&mut self) -> &mut Option<RequestHeader> {
        &mut self.request_header
    }
}

impl SendChatMessageRequest {
    pub fn new(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendChatMessageResponse {
    #[serde(default)]
    pub response_header: Option<ResponseHeader>,
    #[serde(default)]
    pub event_id: Option<String>,
    /// Server timestamp of the stored event, microseconds since the epoch.
    #[serde(default)]
    pub created_at: Option<i64>,
}

structural_hash!(SendChatMessageResponse {
    response_header,
    event_id,
    created_at,
});

impl ProtoMessage for SendChatMessageResponse {}

impl ServiceResponse for SendChatMessageResponse {
    fn response_header(&self) -> Option<&ResponseHeader> {
        self.response_header.as_ref()
    }

    fn response_header_mut(&mut self) -> &mut Option<ResponseHeader> {
        &mut self.response_header
    }
}

/// Fetch the most recent conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConversationsRequest {
    #[serde(default)]
    pub request_header: Option<RequestHeader>,
    #[serde(default)]
    pub max_conversations: Option<u32>,
}

structural_hash!(ListConversationsRequest {
    request_header,
    max_conversations,
});

impl ProtoMessage for ListConversationsRequest {}

impl ServiceRequest for ListConversationsRequest {
    type Response = ListConversationsResponse;
    const LOCATION: &'static str = "/conversations/list";

    fn request_header(&self) -> Option<&RequestHeader> {
        self.request_header.as_ref()
    }

    fn request_header_mut(&mut self) -> &mut Option<RequestHeader> {
        &mut self.request_header
    }
}

/// One row of a conversation listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub unread_count: Option<u32>,
    /// Microseconds since the epoch.
    #[serde(default)]
    pub latest_timestamp: Option<i64>,
}

structural_hash!(ConversationSummary {
    conversation_id,
    name,
    participants,
    unread_count,
    latest_timestamp,
});

impl ProtoMessage for ConversationSummary {}

impl ConversationSummary {
    pub fn latest_activity(&self) -> Result<DateTime<Utc>, TimestampError> {
        from_microseconds(self.latest_timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    #[serde(default)]
    pub response_header: Option<ResponseHeader>,
    #[serde(default)]
    pub conversations: Vec<ConversationSummary>,
}

structural_hash!(ListConversationsResponse {
    response_header,
    conversations,
});

impl ProtoMessage for ListConversationsResponse {}

impl ServiceResponse for ListConversationsResponse {
    fn response_header(&self) -> Option<&ResponseHeader> {
        self.response_header.as_ref()
    }

    fn response_header_mut(&mut self) -> &mut Option<ResponseHeader> {
        &mut self.response_header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::StructuralHash;
    use crate::wire_enum::ProtoEnum;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_response_status_wire_values() {
        assert_eq!(ResponseStatus::Ok.raw(), 1);
        assert_eq!(ResponseStatus::RateLimited.raw(), 5);
        assert_eq!(ResponseStatus::from_raw(12), ResponseStatus::Unrecognized(12));
    }

    #[test]
    fn test_response_header_helpers() {
        assert!(ResponseHeader::ok().is_success());
        let failed = ResponseHeader::failure(ResponseStatus::Busy, "try later");
        assert!(!failed.is_success());
        assert_eq!(failed.error_description.as_deref(), Some("try later"));
        assert!(!ResponseHeader::default().is_success());
    }

    #[test]
    fn test_server_time_defaults_to_epoch() {
        let header = ResponseHeader::ok();
        assert_eq!(header.server_time().unwrap(), DateTime::<Utc>::UNIX_EPOCH);

        let header = ResponseHeader {
            current_server_time: Some(1_000_001),
            ..ResponseHeader::ok()
        };
        assert_eq!(header.server_time().unwrap().timestamp_subsec_micros(), 1);
    }

    #[test]
    fn test_response_decodes_with_missing_fields() {
        let response =
            SendChatMessageResponse::decode(br#"{"response_header":{"status":1}}"#).unwrap();
        assert_eq!(response.response_header, Some(ResponseHeader::ok()));
        assert_eq!(response.event_id, None);
    }

    #[test]
    fn test_requests_usable_as_set_keys() {
        let a = SendChatMessageRequest::new("conv-1", "hi");
        let b = SendChatMessageRequest::new("conv-1", "hi");
        let c = SendChatMessageRequest::new("conv-2", "hi");
        assert_eq!(a.structural_hash(), b.structural_hash());

        let set: HashSet<SendChatMessageRequest> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_missing_header_differs_from_empty_header() {
        let bare = ListConversationsRequest::default();
        let with_header = ListConversationsRequest {
            request_header: Some(RequestHeader::default()),
            ..ListConversationsRequest::default()
        };
        assert_ne!(bare.structural_hash(), with_header.structural_hash());
    }

    #[test]
    fn test_locations() {
        assert_eq!(SendChatMessageRequest::LOCATION, "/chat/send");
        assert_eq!(ListConversationsRequest::LOCATION, "/conversations/list");
    }
}
