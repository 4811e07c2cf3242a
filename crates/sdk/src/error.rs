//! Tagged SDK errors.
//!
//! Adapters over the real clients pick an [`SdkErrorKind`] at the boundary.
//! Clients that only surface strings can use [`SdkErrorKind::classify`] once,
//! there, so nothing downstream inspects message text.

use serde::{Deserialize, Serialize};

/// Category of an SDK failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkErrorKind {
    Timeout,
    NodeUnreachable,
    NodeCrash,
    Capacity,
    Cancelled,
    Network,
    NotFound,
    Unknown,
}

impl SdkErrorKind {
    /// Maps a free-form client error message onto a kind.
    pub fn classify(message: &str) -> Self {
        let m = message.to_ascii_lowercase();
        if m.contains("abort") || m.contains("cancel") {
            Self::Cancelled
        } else if m.contains("timeout") || m.contains("timed out") {
            Self::Timeout
        } else if m.contains("econnrefused")
            || m.contains("connection refused")
            || m.contains("unreachable")
        {
            Self::NodeUnreachable
        } else if m.contains("500") || m.contains("internal server error") || m.contains("crash")
        {
            Self::NodeCrash
        } else if m.contains("capacity")
            || m.contains("insufficient")
            || m.contains("batch is overissued")
            || m.contains("stamp")
        {
            Self::Capacity
        } else if m.contains("404") || m.contains("not found") {
            Self::NotFound
        } else if m.contains("network") || m.contains("fetch") || m.contains("socket") {
            Self::Network
        } else {
            Self::Unknown
        }
    }

    /// Message suitable for a snackbar or error modal.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Timeout => "The request timed out. The node may be busy, try again shortly.",
            Self::NodeUnreachable => "Cannot reach your node. Check that it is running.",
            Self::NodeCrash => "The node reported an internal error.",
            Self::Capacity => "Not enough storage capacity left on this drive's stamp.",
            Self::Cancelled => "The operation was cancelled.",
            Self::Network => "A network error interrupted the operation.",
            Self::NotFound => "The requested item could not be found.",
            Self::Unknown => "Something went wrong.",
        }
    }

    /// Whether repeating the same call can reasonably succeed.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::NodeUnreachable | Self::NodeCrash | Self::Network
        )
    }
}

/// Error returned by every [`FileManager`](crate::FileManager) and
/// [`StorageNode`](crate::StorageNode) call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct SdkError {
    pub kind: SdkErrorKind,
    pub message: String,
}

impl SdkError {
    pub fn new(kind: SdkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Builds an error from an untyped client message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: SdkErrorKind::classify(&message),
            message,
        }
    }

    pub fn cancelled() -> Self {
        Self::new(SdkErrorKind::Cancelled, "aborted")
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(SdkErrorKind::NotFound, what)
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == SdkErrorKind::Cancelled
    }

    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_common_messages() {
        assert_eq!(
            SdkErrorKind::classify("Request timed out after 30s"),
            SdkErrorKind::Timeout
        );
        assert_eq!(
            SdkErrorKind::classify("connect ECONNREFUSED 127.0.0.1:1633"),
            SdkErrorKind::NodeUnreachable
        );
        assert_eq!(
            SdkErrorKind::classify("The user aborted a request."),
            SdkErrorKind::Cancelled
        );
        assert_eq!(
            SdkErrorKind::classify("batch is overissued"),
            SdkErrorKind::Capacity
        );
        assert_eq!(
            SdkErrorKind::classify("Failed to fetch"),
            SdkErrorKind::Network
        );
        assert_eq!(SdkErrorKind::classify("weird"), SdkErrorKind::Unknown);
    }

    #[test]
    fn retryable_kinds() {
        assert!(SdkErrorKind::Timeout.is_retryable());
        assert!(SdkErrorKind::Network.is_retryable());
        assert!(!SdkErrorKind::Capacity.is_retryable());
        assert!(!SdkErrorKind::Cancelled.is_retryable());
    }

    #[test]
    fn from_message_keeps_text() {
        let e = SdkError::from_message("404 Not Found");
        assert_eq!(e.kind, SdkErrorKind::NotFound);
        assert_eq!(e.message, "404 Not Found");
        assert!(e.to_string().contains("NotFound"));
    }
}
