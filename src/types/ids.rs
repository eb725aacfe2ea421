use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// NewType wrapper for a render history ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RenderId(String);

impl RenderId {
    /// Create a new RenderId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// IDs are the creation time in epoch milliseconds
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RenderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RenderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for RenderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// NewType wrapper for a chat message or chat session ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Create a new MessageId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Millisecond timestamp plus an offset, so ids minted in the same tick stay distinct
    pub fn from_timestamp(at: DateTime<Utc>, offset: i64) -> Self {
        Self((at.timestamp_millis() + offset).to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
