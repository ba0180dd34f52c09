#![forbid(unsafe_code)]

//! Runtime library for out-of-process skill plugins.
//!
//! A skill is a separate process paired with a central orchestrating
//! server over loopback TCP. Each direction carries line-delimited JSON
//! envelopes: the server calls into the skill (`get_intentlist`, `handle`)
//! through [`rpc::server`], and the skill calls back out (`say`, `ask`)
//! through [`rpc::client`]. Inbound intent requests pass through the
//! [`intent`] normalizer — slot grouping plus language-aware translation
//! via a [`slots::SlotDictionary`] — before reaching the [`skill::Skill`]
//! implementation, and a single-slot cancellable [`timer::Timer`] drives
//! time-boxed conversational follow-ups.

pub mod config;
pub mod errors;
pub mod intent;
pub mod rpc;
pub mod runtime;
pub mod skill;
pub mod slots;
pub mod timer;

pub use errors::{Result, SkillError};
pub use skill::Skill;
