//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{RoutingError, ValueObjectError};

/// Display name used until a client registers one.
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// Connection identifier value object.
///
/// Assigned by the transport layer when a session opens and stable for the
/// lifetime of that session. Clients also send ids back as private message
/// targets, so any non-empty string is accepted: an id that was never issued
/// simply never matches a registered connection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a new ConnectionId.
    ///
    /// # Arguments
    ///
    /// * `id` - The connection identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the ConnectionId or an error if validation fails
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.trim().is_empty() {
            return Err(ValueObjectError::ConnectionIdEmpty);
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name value object.
///
/// Construction never fails: surrounding whitespace is trimmed and blank
/// input falls back to [`DEFAULT_DISPLAY_NAME`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Create a new DisplayName from raw client input.
    pub fn new(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        Self(trimmed.to_string())
    }

    /// Create a DisplayName from an optional field, defaulting when absent.
    pub fn from_optional(name: Option<&str>) -> Self {
        name.map(Self::new).unwrap_or_default()
    }

    /// Whether this is still the sentinel name.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_DISPLAY_NAME
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for DisplayName {
    fn default() -> Self {
        Self(DEFAULT_DISPLAY_NAME.to_string())
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recognized chat message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    File,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
        }
    }
}

impl TryFrom<&str> for MessageKind {
    type Error = RoutingError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "text" => Ok(Self::Text),
            "file" => Ok(Self::File),
            other => Err(RoutingError::InvalidMessageKind(other.to_string())),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a file stored by the upload collaborator.
///
/// The router never sees file bytes, only where they live and what the file
/// was originally called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    url: String,
    original_name: String,
}

impl FileReference {
    /// Create a new FileReference.
    ///
    /// A missing or blank `original_name` is derived from the last path
    /// segment of `url`.
    pub fn new(url: String, original_name: Option<String>) -> Result<Self, ValueObjectError> {
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(ValueObjectError::FileReferenceUrlEmpty);
        }
        let original_name = match original_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => url
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .unwrap_or(url.as_str())
                .to_string(),
        };
        Ok(Self { url, original_name })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (JST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp.
    ///
    /// # Arguments
    ///
    /// * `value` - Unix timestamp in milliseconds
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
