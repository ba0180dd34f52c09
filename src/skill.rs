//! Skill capability interface.
//!
//! The [`Skill`] trait decouples the RPC server and dispatcher from the
//! intent-handling business logic supplied by concrete skill
//! implementations. Any type providing both operations can be served.

use std::future::Future;
use std::pin::Pin;

use crate::intent::IntentInvocation;
use crate::Result;

/// Boxed future alias used across trait seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Interface every skill implementation must provide.
///
/// The dispatcher routes inbound `get_intentlist` envelopes to
/// [`intent_list`](Self::intent_list) and `handle` envelopes — after
/// normalization — to [`on_intent`](Self::on_intent).
pub trait Skill: Send + Sync {
    /// Names of the intents this skill handles.
    ///
    /// Used by the orchestrating server to learn which skill owns which
    /// intents. An empty list is a valid answer and is replied to as `[]`.
    fn intent_list(&self) -> Vec<String>;

    /// Handle one normalized intent invocation.
    ///
    /// Returning `Ok(None)` means "nothing to report": no reply envelope is
    /// written for the request. `Ok(Some(value))` is wrapped as
    /// `{"payload": value}` and sent back verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Protocol`](crate::SkillError::Protocol) when
    /// the invocation cannot be handled; the request is dropped and the
    /// connection keeps serving.
    fn on_intent(
        &self,
        invocation: IntentInvocation,
    ) -> BoxFuture<'_, Result<Option<serde_json::Value>>>;
}
