//! Client configuration.
//!
//! Values come from the environment, falling back to defaults:
//!
//! | Variable                 | Default                    |
//! |--------------------------|----------------------------|
//! | `CHATWIRE_SOCKET`        | [`default_socket_path()`]  |
//! | `CHATWIRE_TIMEOUT_SECS`  | `30`                       |
//! | `CHATWIRE_CLIENT_ID`     | unset                      |
//! | `CHATWIRE_LANGUAGE`      | `en`                       |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::rpc::Session;
use crate::transport::default_socket_path;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub socket_path: PathBuf,
    /// Per-exchange timeout.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub client_id: Option<String>,
    pub language_code: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client_id: None,
            language_code: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Build from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `CHATWIRE_TIMEOUT_SECS` is not a whole number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("CHATWIRE_SOCKET") {
            config.socket_path = PathBuf::from(path);
        }

        if let Some(secs) = lookup("CHATWIRE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid CHATWIRE_TIMEOUT_SECS value: {}", secs))?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(client_id) = lookup("CHATWIRE_CLIENT_ID").filter(|v| !v.is_empty()) {
            config.client_id = Some(client_id);
        }

        if let Some(language) = lookup("CHATWIRE_LANGUAGE").filter(|v| !v.is_empty()) {
            config.language_code = language;
        }

        Ok(config)
    }

    /// Session values stamped into request headers.
    pub fn session(&self) -> Session {
        Session {
            client_id: self.client_id.clone(),
            language_code: Some(self.language_code.clone()),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
