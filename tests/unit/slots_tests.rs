//! Unit tests for the slot dictionary: inversion, lookup, and the
//! non-fatal fallback for absent or unusable resources.

use std::io::Write;

use skill_relay::slots::SlotDictionary;
use skill_relay::SkillError;

const RESOURCE: &str = r#"{
    "relay_room": {
        "kitchen": ["kitchen", "the kitchen"],
        "livingroom": ["living room", "lounge"]
    },
    "relay_device": {
        "main_light": ["light", "lamp"]
    }
}"#;

/// Every surface variant resolves to its canonical identifier.
#[test]
fn inversion_maps_every_variant() {
    let dict = SlotDictionary::from_json_str(RESOURCE).expect("resource must parse");

    assert_eq!(dict.lookup("relay_room", "kitchen"), Some("kitchen"));
    assert_eq!(dict.lookup("relay_room", "the kitchen"), Some("kitchen"));
    assert_eq!(dict.lookup("relay_room", "lounge"), Some("livingroom"));
    assert_eq!(dict.lookup("relay_device", "lamp"), Some("main_light"));
}

/// Unknown slot names and unknown surface text both miss.
#[test]
fn lookup_misses_return_none() {
    let dict = SlotDictionary::from_json_str(RESOURCE).expect("resource must parse");

    assert_eq!(dict.lookup("relay_room", "garage"), None);
    assert_eq!(dict.lookup("relay_color", "red"), None);
}

#[test]
fn empty_dictionary_always_misses() {
    let dict = SlotDictionary::empty();
    assert!(dict.is_empty());
    assert_eq!(dict.lookup("anything", "anything"), None);
}

/// Malformed resource text is a config error from the strict constructor.
#[test]
fn from_json_str_rejects_malformed_resource() {
    let result = SlotDictionary::from_json_str("{\"relay_room\": 42}");
    assert!(matches!(result, Err(SkillError::Config(_))));
}

/// An absent file falls back to the empty dictionary, not an error.
#[test]
fn load_missing_file_falls_back_to_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dict = SlotDictionary::load(&dir.path().join("slotdict.en_GB.json"));
    assert!(dict.is_empty());
}

/// Unparseable file content also falls back to the empty dictionary.
#[test]
fn load_bad_json_falls_back_to_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("slotdict.en_GB.json");
    let mut file = std::fs::File::create(&path).expect("create file");
    file.write_all(b"not json at all").expect("write");

    let dict = SlotDictionary::load(&path);
    assert!(dict.is_empty());
}

/// A well-formed file loads with translations enabled.
#[test]
fn load_valid_file_enables_translation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("slotdict.de_DE.json");
    std::fs::write(&path, r#"{"relay_room": {"kitchen": ["Küche"]}}"#).expect("write");

    let dict = SlotDictionary::load(&path);
    assert_eq!(dict.lookup("relay_room", "Küche"), Some("kitchen"));
}
