//! Skill configuration: command line, config file, and skill metadata.
//!
//! The orchestrating server spawns every skill with `--skill-name`,
//! `--port` (the skill's listen port) and `--parent-port` (the server's RPC
//! port); a TOML config file may supply the same keys, with the command
//! line winning on conflict. Skill metadata — the descriptor shipped with
//! the skill — contributes the language list used to pick a slot
//! dictionary.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::{Result, SkillError};

/// Language used when the skill metadata names none.
pub const DEFAULT_LANGUAGE: &str = "en_GB";

/// Command-line arguments passed by the orchestrating server.
#[derive(Debug, Parser)]
#[command(name = "skill-relay", about = "skill plugin process", version, long_about = None)]
pub struct SkillArgs {
    /// Unique name of this skill.
    #[arg(long = "skill-name")]
    pub skill_name: Option<String>,

    /// Port this skill listens on for server → skill RPC.
    #[arg(long)]
    pub port: Option<u16>,

    /// RPC port of the orchestrating server.
    #[arg(long = "parent-port")]
    pub parent_port: Option<u16>,

    /// Path to the TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose logging.
    #[arg(long)]
    pub debug: bool,

    /// Development mode (skill-defined semantics).
    #[arg(long)]
    pub develop: bool,
}

/// Optional config-file counterpart of [`SkillArgs`].
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    /// Unique name of this skill.
    pub skill_name: Option<String>,
    /// Port this skill listens on.
    pub port: Option<u16>,
    /// RPC port of the orchestrating server.
    pub parent_port: Option<u16>,
    /// Verbose logging.
    #[serde(default)]
    pub debug: bool,
    /// Development mode.
    #[serde(default)]
    pub develop: bool,
}

impl FileConfig {
    /// Load the file, treating an absent file as the empty config.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Config`] when the file exists but cannot be
    /// read or parsed.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| SkillError::Config(format!("cannot read config: {e}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Config`] when the TOML is invalid.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Fully resolved skill configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillConfig {
    /// Unique name of this skill.
    pub skill_name: String,
    /// Port this skill listens on for server → skill RPC.
    pub port: u16,
    /// RPC port of the orchestrating server.
    pub parent_port: u16,
    /// Verbose logging.
    pub debug: bool,
    /// Development mode.
    pub develop: bool,
}

impl SkillConfig {
    /// Merge command line over config file and validate.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Config`] when `skill-name`, `port` or
    /// `parent-port` is missing from both sources.
    pub fn resolve(args: &SkillArgs, file: &FileConfig) -> Result<Self> {
        let skill_name = args
            .skill_name
            .clone()
            .or_else(|| file.skill_name.clone())
            .ok_or_else(|| SkillError::Config("missing required 'skill-name'".into()))?;
        let port = args
            .port
            .or(file.port)
            .ok_or_else(|| SkillError::Config("missing required 'port'".into()))?;
        let parent_port = args
            .parent_port
            .or(file.parent_port)
            .ok_or_else(|| SkillError::Config("missing required 'parent-port'".into()))?;

        Ok(Self {
            skill_name,
            port,
            parent_port,
            debug: args.debug || file.debug,
            develop: args.develop || file.develop,
        })
    }

    /// Resolve from the process arguments, loading `--config` when given.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Config`] on unreadable config or missing
    /// required keys.
    pub fn from_args(args: &SkillArgs) -> Result<Self> {
        let file = match args.config {
            Some(ref path) => FileConfig::load_from_path(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(args, &file)
    }
}

/// Skill descriptor metadata (the `skill.json` equivalent).
#[derive(Debug, Default, Deserialize)]
pub struct SkillMetadata {
    /// Supported language(s); the first entry is the default.
    #[serde(default)]
    language: Languages,
    /// Arbitrary descriptor fields, preserved as raw JSON.
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// The metadata `language` field: a string or an ordered list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Languages {
    /// Single language.
    One(String),
    /// Ordered list; first entry is the default.
    Many(Vec<String>),
}

impl Default for Languages {
    fn default() -> Self {
        Self::One(DEFAULT_LANGUAGE.to_owned())
    }
}

impl SkillMetadata {
    /// Parse from the descriptor's JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Config`] when the JSON is invalid.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| SkillError::Config(format!("invalid skill metadata: {e}")))
    }

    /// Load the descriptor, treating an absent file as empty metadata.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Config`] when the file exists but cannot be
    /// read or parsed.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| SkillError::Config(format!("cannot read skill metadata: {e}")))?;
        Self::from_json_str(&raw)
    }

    /// The skill's default language.
    #[must_use]
    pub fn default_language(&self) -> &str {
        match self.language {
            Languages::One(ref language) => language,
            Languages::Many(ref languages) => languages
                .first()
                .map_or(DEFAULT_LANGUAGE, String::as_str),
        }
    }

    /// The remaining descriptor fields.
    #[must_use]
    pub fn extra(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extra
    }
}
