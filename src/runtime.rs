//! Skill host: wires configuration, slot dictionary, RPC client, timer and
//! RPC server into one running skill process.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{SkillConfig, SkillMetadata, DEFAULT_LANGUAGE};
use crate::rpc::client::RpcClient;
use crate::rpc::server::RpcServer;
use crate::skill::Skill;
use crate::slots::SlotDictionary;
use crate::timer::Timer;
use crate::{Result, SkillError};

/// One skill process's runtime state.
///
/// Owns the outbound [`RpcClient`], the single [`Timer`] slot, the loaded
/// [`SlotDictionary`] and the cancellation token that tears the RPC server
/// down.
pub struct SkillHost {
    config: SkillConfig,
    language: String,
    dictionary: Arc<SlotDictionary>,
    client: RpcClient,
    timer: Timer,
    cancel: CancellationToken,
}

impl SkillHost {
    /// Bootstrap the runtime for one skill instance.
    ///
    /// Resolves the default language from the metadata, loads the slot
    /// dictionary for it from `<resource_dir>/slotdict.<language>.json`
    /// (absent file → no translation), and opens the outbound connection
    /// to the parent.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Transport`] when the parent is unreachable —
    /// fatal, the parent spawned this process and must already listen.
    pub async fn bootstrap(
        config: SkillConfig,
        metadata: &SkillMetadata,
        resource_dir: &Path,
    ) -> Result<Self> {
        let language = metadata.default_language().to_owned();
        let dictionary = Arc::new(SlotDictionary::load(
            &resource_dir.join(format!("slotdict.{language}.json")),
        ));

        if !dictionary.is_empty() {
            info!(language, "slot dictionary loaded");
        }

        let client = RpcClient::connect(config.parent_port).await?;
        info!(skill = config.skill_name, language, "skill host ready");

        Ok(Self {
            config,
            language,
            dictionary,
            client,
            timer: Timer::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// Serve the skill's RPC port until the peer disconnects or
    /// [`cancellation`](Self::cancellation) is triggered.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Transport`] when binding or accepting fails.
    pub async fn serve<S: Skill + 'static>(&self, skill: Arc<S>) -> Result<()> {
        let server = RpcServer::new(skill, Arc::clone(&self.dictionary), self.cancel.clone());
        server.start(self.config.port).await
    }

    /// Shut down: stop the server and close the outbound connection.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Transport`] when the client shutdown fails.
    pub async fn close(self) -> Result<()> {
        self.cancel.cancel();
        self.timer.cancel(false).await;
        self.client.disconnect().await
    }

    /// Token that tears the RPC server down when cancelled.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The outbound RPC client, for `say`/`ask`/custom verbs.
    pub fn client_mut(&mut self) -> &mut RpcClient {
        &mut self.client
    }

    /// A clone of this skill's timer slot.
    #[must_use]
    pub fn timer(&self) -> Timer {
        self.timer.clone()
    }

    /// The loaded slot dictionary.
    #[must_use]
    pub fn dictionary(&self) -> Arc<SlotDictionary> {
        Arc::clone(&self.dictionary)
    }

    /// The skill's default language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The resolved configuration.
    #[must_use]
    pub fn config(&self) -> &SkillConfig {
        &self.config
    }
}

/// Build the terminal answer object for a handled intent.
///
/// `lang` falls back to [`DEFAULT_LANGUAGE`] when absent.
#[must_use]
pub fn answer(
    session_id: Option<&str>,
    site_id: Option<&str>,
    intent_name: &str,
    text: &str,
    lang: Option<&str>,
) -> serde_json::Value {
    json!({
        "sessionId": session_id,
        "siteId": site_id,
        "intentName": intent_name,
        "text": text,
        "lang": lang.unwrap_or(DEFAULT_LANGUAGE),
    })
}

/// Initialize the process-wide tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `debug` lowers the default filter
/// from `info` to `debug`.
///
/// # Errors
///
/// Returns [`SkillError::Config`] when a subscriber is already installed.
pub fn init_tracing(debug: bool) -> Result<()> {
    let default_filter = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| SkillError::Config(format!("failed to init tracing: {e}")))
}
