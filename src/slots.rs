//! Per-language slot dictionary.
//!
//! The on-disk resource maps every slot (or entity) name to canonical
//! identifiers and their surface-text variants:
//!
//! ```json
//! {
//!   "relay_room": {
//!     "kitchen": ["kitchen", "the kitchen"],
//!     "livingroom": ["living room", "lounge"]
//!   }
//! }
//! ```
//!
//! At skill start-up the resource is inverted once into
//! `surface text → canonical identifier` per slot name, and is immutable
//! for the process lifetime. An absent file or bad JSON falls back to the
//! empty dictionary ("no translation"), not an error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::{Result, SkillError};

/// Immutable inverted slot dictionary.
#[derive(Debug, Default)]
pub struct SlotDictionary {
    inner: HashMap<String, HashMap<String, String>>,
}

impl SlotDictionary {
    /// The empty dictionary; every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the inverted dictionary from the JSON resource text.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Config`] when the text is not valid JSON of
    /// the documented shape.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let source: HashMap<String, HashMap<String, Vec<String>>> = serde_json::from_str(raw)
            .map_err(|e| SkillError::Config(format!("invalid slot dictionary: {e}")))?;

        let mut inner: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (slot_name, canonicals) in source {
            let inverted = inner.entry(slot_name).or_default();
            for (canonical, variants) in canonicals {
                for variant in variants {
                    inverted.insert(variant, canonical.clone());
                }
            }
        }

        Ok(Self { inner })
    }

    /// Load the dictionary resource for one language, never failing.
    ///
    /// An absent file is the common case for skills without slot
    /// translation and is logged at debug; unreadable or malformed content
    /// is logged at warning. Both fall back to the empty dictionary.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no slot dictionary, translation disabled");
                return Self::empty();
            }
        };

        match Self::from_json_str(&raw) {
            Ok(dictionary) => dictionary,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unusable slot dictionary, translation disabled");
                Self::empty()
            }
        }
    }

    /// Resolve a raw surface text under a slot/entity name.
    ///
    /// `None` means no mapping exists and the caller uses the raw value.
    #[must_use]
    pub fn lookup(&self, slot_name: &str, surface: &str) -> Option<&str> {
        self.inner
            .get(slot_name)
            .and_then(|inverted| inverted.get(surface))
            .map(String::as_str)
    }

    /// Whether the dictionary holds no mappings at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
