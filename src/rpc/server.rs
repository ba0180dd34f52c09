//! RPC server — server → skill calls — and the request dispatcher.
//!
//! Accepts exactly one long-lived peer (the orchestrating server) on the
//! skill's loopback port and serves framed requests strictly in arrival
//! order, one at a time. The teardown policy is deliberately fail-fast: a
//! corrupt or closed control channel means the skill can no longer be
//! supervised, so the whole listener stops, not just the connection.
//!
//! ## Protocol
//!
//! Request (one JSON object per line):
//! ```json
//! {"command": "get_intentlist", "payload": null}
//! {"command": "handle", "payload": {"intent": {"intentName": "…"}, …}}
//! ```
//!
//! Reply (one JSON object per line, only when there is something to report):
//! ```json
//! {"payload": …}
//! ```

use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::intent;
use crate::rpc::codec::{decode_line, encode_line, LineCodec};
use crate::skill::Skill;
use crate::slots::SlotDictionary;
use crate::{Result, SkillError};

/// Server side of the skill RPC connection.
pub struct RpcServer<S> {
    skill: Arc<S>,
    dictionary: Arc<SlotDictionary>,
    cancel: CancellationToken,
}

impl<S: Skill> RpcServer<S> {
    /// Create a server for one skill instance.
    #[must_use]
    pub fn new(skill: Arc<S>, dictionary: Arc<SlotDictionary>, cancel: CancellationToken) -> Self {
        Self {
            skill,
            dictionary,
            cancel,
        }
    }

    /// Bind and serve in one step.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Transport`] when binding fails; see
    /// [`serve`](Self::serve) for the loop's termination conditions.
    pub async fn start(&self, port: u16) -> Result<()> {
        let listener = bind(port).await?;
        self.serve(listener).await
    }

    /// Accept the single peer and run the read loop until teardown.
    ///
    /// Returns normally on peer EOF, on [`stop`](Self::stop), or after a
    /// framing/transport failure; in every case the listener is released.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Transport`] when accepting the peer fails.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(addr = %listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
              "skill RPC server listening");

        let stream = tokio::select! {
            () = self.cancel.cancelled() => {
                info!("skill RPC server stopped before a peer connected");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted
                    .map_err(|e| SkillError::Transport(format!("accept failed: {e}")))?;
                debug!(%peer, "server connected");
                stream
            }
        };

        // Exactly one peer; the listener is dropped with this frame when
        // the loop ends, tearing the whole server down.
        let (read_half, mut write_half) = stream.into_split();
        let mut framed = FramedRead::new(read_half, LineCodec::new());

        loop {
            let item = tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    info!("shutting down skill RPC server");
                    break;
                }
                item = framed.next() => item,
            };

            let line = match item {
                None => {
                    info!("server closed the RPC connection, shutting down");
                    break;
                }
                Some(Err(e)) => {
                    error!(error = %e, "failed to read RPC connection, shutting down");
                    break;
                }
                Some(Ok(line)) => line,
            };

            let envelope = match decode_line(&line) {
                Ok(envelope) => envelope,
                Err(e) => {
                    error!(error = %e, "failed to parse RPC request, shutting down");
                    break;
                }
            };

            // A missing field drops the one request, not the connection.
            let (Some(command), Some(payload)) = (
                envelope.get("command").and_then(serde_json::Value::as_str),
                envelope.get("payload"),
            ) else {
                error!("RPC request lacks mandatory 'command'/'payload' properties, skipping");
                continue;
            };

            debug!(command, "got RPC request");

            let result = match dispatch(self.skill.as_ref(), &self.dictionary, command, payload)
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    warn!(command, error = %e, "RPC request rejected");
                    continue;
                }
            };

            let Some(result) = result else {
                // Nothing to report; no reply line is owed.
                continue;
            };

            let mut reply = encode_line(&json!({ "payload": result }));
            reply.push('\n');

            if let Err(e) = write_half.write_all(reply.as_bytes()).await {
                error!(command, error = %e, "failed to write RPC reply, shutting down");
                break;
            }
        }

        Ok(())
    }

    /// Request teardown: cancels a blocked read and releases the socket.
    ///
    /// Idempotent — calling it when nothing is running is a no-op.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Bind the skill's listener on `127.0.0.1:<port>`.
///
/// Separate from [`RpcServer::serve`] so callers (and tests) can bind port
/// `0` and read back the assigned address.
///
/// # Errors
///
/// Returns [`SkillError::Transport`] when the port cannot be bound — fatal
/// to the skill process.
pub async fn bind(port: u16) -> Result<TcpListener> {
    TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|e| SkillError::Transport(format!("cannot bind skill port {port}: {e}")))
}

/// Route one inbound envelope to a skill operation.
///
/// - `get_intentlist` → the skill's intent list (payload ignored). An empty
///   list is a valid result and is replied to as `[]`.
/// - `handle` → normalize the payload, then invoke the skill's handler;
///   its result is returned unchanged.
/// - anything else → `Ok(None)`, an extension point that must not disturb
///   the read loop.
///
/// # Errors
///
/// Returns [`SkillError::Protocol`] when normalization rejects the request
/// or the handler fails; the caller drops the request and keeps serving.
pub async fn dispatch<S: Skill>(
    skill: &S,
    dictionary: &SlotDictionary,
    command: &str,
    payload: &serde_json::Value,
) -> Result<Option<serde_json::Value>> {
    match command {
        "get_intentlist" => Ok(Some(json!(skill.intent_list()))),
        "handle" => {
            let invocation = intent::normalize(payload, dictionary)?;
            skill.on_intent(invocation).await
        }
        other => {
            debug!(command = other, "ignoring unknown RPC command");
            Ok(None)
        }
    }
}
