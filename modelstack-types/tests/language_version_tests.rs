use modelstack_types::{Language, ModelVersion};
use proptest::prelude::*;

// ── Language ─────────────────────────────────────────────────────

#[test]
fn language_is_upper_cased() {
    let lang = Language::parse("bg").unwrap();
    assert_eq!(lang.as_str(), "BG");
    assert_eq!(lang, Language::parse("BG").unwrap());
}

#[test]
fn language_trims_whitespace() {
    assert_eq!(Language::parse("  en ").unwrap().as_str(), "EN");
}

#[test]
fn language_rejects_empty_and_garbage() {
    assert!(Language::parse("").is_err());
    assert!(Language::parse("   ").is_err());
    assert!(Language::parse("e n").is_err());
    assert!(Language::parse("en/us").is_err());
}

#[test]
fn language_default_is_fallback() {
    assert_eq!(Language::default().as_str(), Language::FALLBACK);
}

#[test]
fn language_serde_normalizes() {
    let lang: Language = serde_json::from_str("\"de\"").unwrap();
    assert_eq!(lang.as_str(), "DE");
    assert_eq!(serde_json::to_string(&lang).unwrap(), "\"DE\"");
    assert!(serde_json::from_str::<Language>("\"\"").is_err());
}

// ── ModelVersion ─────────────────────────────────────────────────

#[test]
fn version_advances_forward() {
    let mut v = ModelVersion::new(3);
    assert!(v.advance_to(ModelVersion::new(5)));
    assert_eq!(v.value(), 5);
}

#[test]
fn version_never_goes_back() {
    let mut v = ModelVersion::new(5);
    assert!(!v.advance_to(ModelVersion::new(2)));
    assert!(!v.advance_to(ModelVersion::new(5)));
    assert_eq!(v.value(), 5);
}

#[test]
fn version_display() {
    assert_eq!(ModelVersion::new(11).to_string(), "v11");
}

proptest! {
    #[test]
    fn version_is_max_of_all_advances(values in proptest::collection::vec(0u64..10_000, 0..50)) {
        let mut v = ModelVersion::default();
        for value in &values {
            v.advance_to(ModelVersion::new(*value));
        }
        let expected = values.iter().copied().max().unwrap_or(0);
        prop_assert_eq!(v.value(), expected);
    }
}
