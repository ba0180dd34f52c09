//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, SkillError>;

/// Error enumeration covering all failure classes of the skill runtime.
///
/// The variants map onto distinct recovery policies:
///
/// - [`Framing`](Self::Framing) — malformed line or JSON on the wire.
///   Connection-fatal on the server side, call-fatal on the client side.
/// - [`Protocol`](Self::Protocol) — structurally valid line but an invalid
///   envelope or intent request. Request-local: the offending request is
///   dropped and the connection keeps serving.
/// - [`Transport`](Self::Transport) — connect/read/write failure. Fatal to
///   the owning process; no retry or backoff is performed anywhere.
/// - [`Config`](Self::Config) — configuration parsing or validation failure.
/// - [`Timer`](Self::Timer) — timer misuse (double-schedule, strict cancel
///   with nothing armed). Logged, never surfaced to skill business logic.
#[derive(Debug)]
pub enum SkillError {
    /// Malformed line or JSON on the wire.
    Framing(String),
    /// Invalid envelope or intent request.
    Protocol(String),
    /// Socket connect/read/write failure.
    Transport(String),
    /// Configuration parsing or validation failure.
    Config(String),
    /// Timer misuse.
    Timer(String),
}

impl Display for SkillError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Framing(msg) => write!(f, "framing: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Timer(msg) => write!(f, "timer: {msg}"),
        }
    }
}

impl std::error::Error for SkillError {}

impl From<toml::de::Error> for SkillError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for SkillError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
