//! RPC client — skill → server calls.
//!
//! Owns the single outbound connection to the orchestrating server's RPC
//! port and issues strictly synchronous call/response exchanges: one
//! envelope out, one reply line in, never more than one call in flight
//! (`&mut self` enforces it by construction).

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, error, info};

use crate::rpc::codec::{decode_line, encode_line};
use crate::{Result, SkillError};

/// Client side of the skill RPC connection.
pub struct RpcClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl RpcClient {
    /// Open the single outbound connection to `127.0.0.1:<parent_port>`.
    ///
    /// No retry or backoff: the parent spawned this skill and is assumed to
    /// be listening already, so an unreachable peer is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Transport`] when the peer is unreachable. The
    /// skill process is expected to exit.
    pub async fn connect(parent_port: u16) -> Result<Self> {
        debug!(parent_port, "connecting to server RPC port");

        let stream = TcpStream::connect(("127.0.0.1", parent_port))
            .await
            .map_err(|e| {
                SkillError::Transport(format!("cannot reach parent on port {parent_port}: {e}"))
            })?;

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// Issue one call and block for its reply.
    ///
    /// Frames `{"command", "payload"}`, writes and flushes it, then reads
    /// exactly one reply line. A reply that cannot be decoded or lacks a
    /// `payload` key is logged and yields `Ok(None)`. There is deliberately
    /// no timeout on the reply wait; a hung peer stalls the caller.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Transport`] when the write fails or the peer
    /// closes the connection before replying — fatal to the skill process.
    pub async fn execute(
        &mut self,
        command: &str,
        payload: serde_json::Value,
    ) -> Result<Option<serde_json::Value>> {
        let envelope = json!({ "command": command, "payload": payload });
        let mut line = encode_line(&envelope);
        line.push('\n');

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;

        let mut reply = String::new();
        let read = self.reader.read_line(&mut reply).await?;
        if read == 0 {
            return Err(SkillError::Transport(
                "connection closed before reply".into(),
            ));
        }

        let value = match decode_line(reply.trim_end_matches(['\r', '\n'])) {
            Ok(value) => value,
            Err(e) => {
                error!(command, error = %e, "malformed RPC reply");
                return Ok(None);
            }
        };

        match value.get("payload") {
            Some(payload) => Ok(Some(payload.clone())),
            None => {
                error!(command, "RPC reply lacks mandatory 'payload' property");
                Ok(None)
            }
        }
    }

    /// Ask the server to speak `text` on a site.
    ///
    /// # Errors
    ///
    /// Propagates [`SkillError::Transport`] from [`execute`](Self::execute).
    pub async fn say(
        &mut self,
        text: &str,
        lang: &str,
        site_id: Option<&str>,
    ) -> Result<Option<serde_json::Value>> {
        self.execute(
            "say",
            json!({ "text": text, "lang": lang, "siteId": site_id }),
        )
        .await
    }

    /// Ask the server to pose a follow-up question and keep the session
    /// open for the intents in `intent_filter`.
    ///
    /// # Errors
    ///
    /// Propagates [`SkillError::Transport`] from [`execute`](Self::execute).
    pub async fn ask(
        &mut self,
        text: &str,
        lang: &str,
        site_id: Option<&str>,
        intent_filter: &[String],
    ) -> Result<Option<serde_json::Value>> {
        self.execute(
            "ask",
            json!({
                "text": text,
                "lang": lang,
                "siteId": site_id,
                "intentFilter": intent_filter,
            }),
        )
        .await
    }

    /// Close the write side and await full shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Transport`] when the shutdown handshake fails.
    pub async fn disconnect(mut self) -> Result<()> {
        info!("disconnecting from server RPC port");
        self.writer.shutdown().await?;
        Ok(())
    }
}
