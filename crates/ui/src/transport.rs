//! Persistence transport
//!
//! Dialogs never talk to a store directly. They hand a request to an
//! [`EntityTransport`] and get back either nothing (the operation could not
//! be started) or a [`Pending`] operation that resolves exactly once.

use crate::entity::SavedEntity;
use confdesk_core::messages::MSG_UNKNOWN_FAILURE;
use confdesk_core::{Attributes, formatted_message};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tokio::sync::oneshot;

// ============================================================================
// Requests
// ============================================================================

/// Whether a save creates or updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveKind {
    Create,
    Update,
}

/// A create or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub component: String,
    pub kind: SaveKind,
    pub name: String,
    pub content: Attributes,
}

/// A delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub component: String,
    pub name: String,
}

// ============================================================================
// PersistenceFailure
// ============================================================================

/// Why the store rejected an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceFailure {
    /// HTTP-style status; 0 when the request never reached the store
    pub status: u16,
    /// Short description of the failure
    pub message: String,
    /// Response body, when there was one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl PersistenceFailure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            raw_response: None,
        }
    }

    pub fn with_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }

    /// A REST error body carrying one message
    pub fn rest(status: u16, text: impl Into<String>) -> Self {
        let text = text.into();
        let body = serde_json::json!({"messages": [{"type": "ERROR", "text": text}]});
        Self::new(status, text).with_response(body.to_string())
    }

    /// The message a user should see
    pub fn display_message(&self) -> String {
        if let Some(raw) = self.raw_response.as_deref().filter(|r| !r.trim().is_empty()) {
            return parse_error_message(raw);
        }
        if self.message.trim().is_empty() {
            formatted_message(MSG_UNKNOWN_FAILURE, &[])
        } else {
            self.message.clone()
        }
    }
}

impl fmt::Display for PersistenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

#[derive(Deserialize)]
struct RestErrorBody {
    messages: Vec<RestMessage>,
}

#[derive(Deserialize)]
struct RestMessage {
    text: String,
}

static SPLUNKD_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s).+"REST Error \[\d+\]:\s+.+\s+--\s+(.*)"\.\s*See splunkd\.log for more details\..*"#,
    )
    .expect("splunkd error pattern is a valid regex")
});

/// Extract the user-facing text from a raw failure response
///
/// A REST error body yields its first message. A message wrapping a
/// backend `REST Error [NNN]: kind -- detail` yields the detail.
pub fn parse_error_message(raw: &str) -> String {
    let text = match serde_json::from_str::<RestErrorBody>(raw) {
        Ok(body) => match body.messages.into_iter().next() {
            Some(message) => message.text,
            None => return formatted_message(MSG_UNKNOWN_FAILURE, &[]),
        },
        Err(_) => raw.to_string(),
    };

    SPLUNKD_ERROR
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or(text)
}

// ============================================================================
// Pending operations
// ============================================================================

/// Outcome delivered to a pending operation
pub type Outcome<T> = Result<T, PersistenceFailure>;

/// An operation the store has started but not finished
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<Outcome<T>>,
}

/// The store's end of a [`Pending`] operation
#[derive(Debug)]
pub struct Completer<T> {
    tx: oneshot::Sender<Outcome<T>>,
}

impl<T> Pending<T> {
    /// Create a linked completer and pending operation
    pub fn channel() -> (Completer<T>, Pending<T>) {
        let (tx, rx) = oneshot::channel();
        (Completer { tx }, Pending { rx })
    }

    /// An operation that has already finished
    pub fn ready(outcome: Outcome<T>) -> Self {
        let (completer, pending) = Self::channel();
        completer.complete(outcome);
        pending
    }

    /// Wait for the outcome
    ///
    /// A completer dropped without answering counts as a failure.
    pub async fn wait(self) -> Outcome<T> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(PersistenceFailure::new(0, "The operation was abandoned")),
        }
    }

    /// Take the outcome if it has arrived
    pub fn try_take(&mut self) -> Option<Outcome<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(PersistenceFailure::new(
                0,
                "The operation was abandoned",
            ))),
        }
    }
}

impl<T> Completer<T> {
    /// Deliver the outcome; returns whether anyone was waiting
    pub fn complete(self, outcome: Outcome<T>) -> bool {
        self.tx.send(outcome).is_ok()
    }

    pub fn succeed(self, value: T) -> bool {
        self.complete(Ok(value))
    }

    pub fn fail(self, failure: PersistenceFailure) -> bool {
        self.complete(Err(failure))
    }
}

// ============================================================================
// EntityTransport
// ============================================================================

/// Where dialogs send their writes
///
/// Each method returns `None` when the operation could not be started.
pub trait EntityTransport {
    fn create(&self, request: SaveRequest) -> Option<Pending<SavedEntity>>;

    fn update(&self, request: SaveRequest) -> Option<Pending<SavedEntity>>;

    fn delete(&self, request: DeleteRequest) -> Option<Pending<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rest_body() {
        let raw = r#"{"messages":[{"type":"ERROR","text":"Name is already in use"}]}"#;
        assert_eq!(parse_error_message(raw), "Name is already in use");
    }

    #[test]
    fn test_parse_splunkd_wrapped_error() {
        let raw = r#"In handler 'conf': Unexpected error "REST Error [400]: Bad Request -- Invalid credentials". See splunkd.log for more details."#;
        assert_eq!(parse_error_message(raw), "Invalid credentials");
    }

    #[test]
    fn test_splunkd_pattern_reused() {
        let re = LazyLock::force(&SPLUNKD_ERROR);
        assert!(std::ptr::eq(re, LazyLock::force(&SPLUNKD_ERROR)));
        assert!(!re.is_match("plain text"));
    }

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(parse_error_message("disk full"), "disk full");
    }

    #[test]
    fn test_display_message_fallbacks() {
        assert_eq!(
            PersistenceFailure::rest(409, "dup").display_message(),
            "dup"
        );
        assert_eq!(
            PersistenceFailure::new(500, "Internal").display_message(),
            "Internal"
        );
        assert_eq!(
            PersistenceFailure::new(0, "").display_message(),
            "An unknown error occurred"
        );
    }

    #[test]
    fn test_pending_ready() {
        let pending = Pending::ready(Ok(7));
        assert_eq!(tokio_test::block_on(pending.wait()), Ok(7));
    }

    #[test]
    fn test_pending_try_take() {
        let (completer, mut pending) = Pending::<u32>::channel();
        assert!(pending.try_take().is_none());
        assert!(completer.fail(PersistenceFailure::new(500, "x")));
        assert_eq!(pending.try_take().unwrap().unwrap_err().status, 500);
    }

    #[test]
    fn test_dropped_completer_is_failure() {
        let (completer, pending) = Pending::<u32>::channel();
        drop(completer);
        let outcome = tokio_test::block_on(pending.wait());
        assert_eq!(outcome.unwrap_err().status, 0);
    }
}
