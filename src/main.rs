//! chatwire - command-line client for the chat service.
//!
//! ```text
//! chatwire send <conversation-id> <text>
//! chatwire list [max]
//! ```
//!
//! Connection settings come from the environment (see `chatwire::config`).

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatwire::config::ClientConfig;
use chatwire::rpc::RpcClient;
use chatwire::schema::{ListConversationsRequest, SendChatMessageRequest};
use chatwire::timestamp::from_microseconds;
use chatwire::transport::UnixTransport;

/// Connection attempts before giving up (100ms, 200ms, 400ms backoff).
const CONNECT_ATTEMPTS: u32 = 4;

const USAGE: &str = "usage: chatwire send <conversation-id> <text> | chatwire list [max]";

enum Command {
    Send { conversation_id: String, text: String },
    List { max: Option<u32> },
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [cmd, conversation_id, text @ ..] if cmd == "send" && !text.is_empty() => Ok(Command::Send {
            conversation_id: conversation_id.clone(),
            text: text.join(" "),
        }),
        [cmd] if cmd == "list" => Ok(Command::List { max: None }),
        [cmd, max] if cmd == "list" => Ok(Command::List {
            max: Some(max.parse().with_context(|| format!("Invalid max value: {}", max))?),
        }),
        _ => bail!(USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "chatwire=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let config = ClientConfig::from_env()?;
    info!("Connecting to {}", config.socket_path.display());
    let transport = UnixTransport::connect_with_retry(&config.socket_path, CONNECT_ATTEMPTS)
        .await
        .with_context(|| format!("Failed to connect to {}", config.socket_path.display()))?
        .with_timeout(config.timeout);
    let client = RpcClient::new(transport, config.session());

    match command {
        Command::Send { conversation_id, text } => {
            let response = client
                .execute(SendChatMessageRequest::new(conversation_id, text))
                .await?;
            let created = from_microseconds(response.created_at)?;
            println!(
                "sent {} at {}",
                response.event_id.as_deref().unwrap_or("-"),
                created.to_rfc3339()
            );
        }
        Command::List { max } => {
            let response = client
                .execute(ListConversationsRequest {
                    max_conversations: max,
                    ..ListConversationsRequest::default()
                })
                .await?;
            for conversation in &response.conversations {
                let latest = conversation.latest_activity()?;
                println!(
                    "{}\t{}\t{} unread\t{}",
                    conversation.conversation_id,
                    conversation.name.as_deref().unwrap_or("(unnamed)"),
                    conversation.unread_count.unwrap_or(0),
                    latest.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_send_joins_text() {
        match parse_args(&args(&["send", "conv-1", "hello", "there"])).unwrap() {
            Command::Send { conversation_id, text } => {
                assert_eq!(conversation_id, "conv-1");
                assert_eq!(text, "hello there");
            }
            _ => panic!("Expected Send"),
        }
    }

    #[test]
    fn test_parse_list() {
        assert!(matches!(parse_args(&args(&["list"])).unwrap(), Command::List { max: None }));
        assert!(matches!(
            parse_args(&args(&["list", "20"])).unwrap(),
            Command::List { max: Some(20) }
        ));
        assert!(parse_args(&args(&["list", "many"])).is_err());
    }

    #[test]
    fn test_parse_rejects_incomplete() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["send", "conv-1"])).is_err());
        assert!(parse_args(&args(&["delete"])).is_err());
    }
}
