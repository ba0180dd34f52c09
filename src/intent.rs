//! Intent request model and the inbound normalization pipeline.
//!
//! Converts a raw intent-engine payload (intent name, session id, site id,
//! multi-valued slot list) into the normalized slot mappings handed to the
//! skill: a raw-value mapping and a parallel canonical mapping translated
//! through the loaded [`SlotDictionary`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::slots::SlotDictionary;
use crate::{Result, SkillError};

/// One slot occurrence as delivered by the intent engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Slot {
    /// Name the occurrence is grouped under.
    #[serde(rename = "slotName")]
    pub slot_name: String,
    /// Entity type; the slot dictionary is keyed by it.
    pub entity: String,
    /// Wrapped slot value.
    pub value: SlotPayload,
}

/// The `{"value": …}` wrapper around a slot's raw value.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotPayload {
    /// Raw language-specific slot value.
    pub value: serde_json::Value,
}

/// Normalized value of one named slot.
///
/// Exactly one occurrence collapses to a bare scalar; two or more are kept
/// as an ordered sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SlotValue {
    /// Single occurrence, collapsed to the bare value.
    One(serde_json::Value),
    /// Two or more occurrences, in the order they were listed.
    Many(Vec<serde_json::Value>),
}

impl SlotValue {
    /// The value as `&str` when it is a single string occurrence.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::One(value) => value.as_str(),
            Self::Many(_) => None,
        }
    }

    /// The first occurrence, regardless of arity.
    #[must_use]
    pub fn first(&self) -> Option<&serde_json::Value> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.first(),
        }
    }
}

/// Mapping from slot name to its normalized value(s).
pub type SlotMap = HashMap<String, SlotValue>;

/// A fully normalized intent invocation, ready for the skill handler.
#[derive(Debug)]
pub struct IntentInvocation {
    /// The original request payload, untouched.
    pub request: serde_json::Value,
    /// Dialogue session identifier, when present.
    pub session_id: Option<String>,
    /// Originating site identifier, when present.
    pub site_id: Option<String>,
    /// Name of the recognized intent.
    pub intent_name: String,
    /// Raw slot values grouped by slot name.
    pub slots: SlotMap,
    /// Dictionary-translated slot values grouped by slot name.
    ///
    /// Values without a dictionary entry equal their raw counterpart.
    pub mapped_slots: SlotMap,
}

// Loose shape parsed before validation so that a missing `intentName` and a
// malformed slot record produce distinct protocol errors.
#[derive(Debug, Deserialize)]
struct RawRequest {
    intent: Option<RawIntent>,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
    #[serde(rename = "siteId")]
    site_id: Option<String>,
    slots: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(rename = "intentName")]
    intent_name: Option<String>,
}

/// Normalize a raw `handle` payload into an [`IntentInvocation`].
///
/// Rejects the request before any skill logic runs when `intent.intentName`
/// is absent or any slot record is malformed; slots are never partially
/// delivered. Zero slots yield two empty mappings, not absent ones.
///
/// # Errors
///
/// Returns [`SkillError::Protocol`] describing the offending field. The
/// error is request-local: the caller drops the request and keeps serving.
pub fn normalize(
    payload: &serde_json::Value,
    dictionary: &SlotDictionary,
) -> Result<IntentInvocation> {
    let raw: RawRequest = serde_json::from_value(payload.clone())
        .map_err(|e| SkillError::Protocol(format!("invalid intent request: {e}")))?;

    let intent_name = raw
        .intent
        .and_then(|intent| intent.intent_name)
        .ok_or_else(|| SkillError::Protocol("missing 'intent.intentName'".into()))?;

    let mut grouped: HashMap<String, Vec<serde_json::Value>> = HashMap::new();
    let mut grouped_mapped: HashMap<String, Vec<serde_json::Value>> = HashMap::new();

    for record in raw.slots.unwrap_or_default() {
        let slot: Slot = serde_json::from_value(record)
            .map_err(|e| SkillError::Protocol(format!("malformed slot record: {e}")))?;

        let raw_value = slot.value.value;
        let mapped_value = translate(dictionary, &slot.entity, &raw_value);

        grouped
            .entry(slot.slot_name.clone())
            .or_default()
            .push(raw_value);
        grouped_mapped
            .entry(slot.slot_name)
            .or_default()
            .push(mapped_value);
    }

    Ok(IntentInvocation {
        request: payload.clone(),
        session_id: raw.session_id,
        site_id: raw.site_id,
        intent_name,
        slots: collapse(grouped),
        mapped_slots: collapse(grouped_mapped),
    })
}

/// Translate one raw slot value through the dictionary.
///
/// Only string values are translatable surface text; anything else — and
/// any string without a dictionary entry — passes through unchanged.
fn translate(
    dictionary: &SlotDictionary,
    entity: &str,
    raw: &serde_json::Value,
) -> serde_json::Value {
    match raw.as_str().and_then(|text| dictionary.lookup(entity, text)) {
        Some(canonical) => serde_json::Value::String(canonical.to_owned()),
        None => raw.clone(),
    }
}

/// Collapse every single-element value list to a bare scalar.
fn collapse(grouped: HashMap<String, Vec<serde_json::Value>>) -> SlotMap {
    grouped
        .into_iter()
        .map(|(name, mut values)| {
            let value = if values.len() == 1 {
                SlotValue::One(values.remove(0))
            } else {
                SlotValue::Many(values)
            };
            (name, value)
        })
        .collect()
}
