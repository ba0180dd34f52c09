//! Bidirectional line-delimited JSON RPC over loopback TCP.
//!
//! Both directions share one wire format — one UTF-8 line per message,
//! carrying a JSON object — but each direction has its own connection and
//! its own half of the crate:
//!
//! - `codec`: line framer with newline escaping and a length cap.
//! - `client`: skill → server calls (`say`, `ask`, arbitrary verbs).
//! - `server`: server → skill calls plus the request dispatcher.

pub mod client;
pub mod codec;
pub mod server;
