//! Closed error taxonomy for a single robot session
//!
//! The original handshake/navigation protocol conflated unrelated failure
//! modes onto a couple of generic exception types. Here each failure mode
//! gets its own variant so the session orchestrator can match on it instead
//! of inspecting a message string.

use std::fmt;

/// Why an authentication attempt failed.
///
/// Both variants are reported inline to the client (there is a wire code
/// for each) and end the session normally — they are not escalated to
/// [`SessionError::Auth`] error replies beyond that inline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureKind {
    /// `robot_id` was outside `0..KEYS.len()`.
    KeyOutOfRange,
    /// The client's confirmation key did not match the expected value.
    LoginFailed,
}

impl fmt::Display for AuthFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailureKind::KeyOutOfRange => write!(f, "key out of range"),
            AuthFailureKind::LoginFailed => write!(f, "login failed"),
        }
    }
}

/// Errors that can arise while driving a single robot session.
///
/// # Variants
///
/// - [`Syntax`](SessionError::Syntax): malformed framing or message content
///   (oversized message with no delimiter, non-decimal field, wrong token
///   count in a `MOVE` reply).
/// - [`Logic`](SessionError::Logic): a protocol invariant was violated
///   (a failed recharge handshake, or a navigation step that could not be
///   expressed in turns/moves).
/// - [`Auth`](SessionError::Auth): the handshake failed in a way that still
///   gets its own wire reply.
/// - [`Transport`](SessionError::Transport): the underlying byte stream
///   failed — peer closed, write returned zero, or a read timed out.
#[derive(Debug)]
pub enum SessionError {
    /// Malformed framing or unexpected message shape.
    Syntax(String),
    /// A protocol invariant was violated.
    Logic(String),
    /// Authentication failed in a way with its own wire reply.
    Auth(AuthFailureKind),
    /// The underlying transport failed (closed peer, short write, timeout).
    Transport(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Syntax(msg) => write!(f, "syntax error: {msg}"),
            SessionError::Logic(msg) => write!(f, "logic error: {msg}"),
            SessionError::Auth(kind) => write!(f, "authentication failed: {kind}"),
            SessionError::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl SessionError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        SessionError::Syntax(msg.into())
    }

    pub fn logic(msg: impl Into<String>) -> Self {
        SessionError::Logic(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        SessionError::Transport(msg.into())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Transport(err.to_string())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
