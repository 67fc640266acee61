//! Property tests for the pure pipeline stages: deduplication and
//! resolution must hold their invariants for arbitrary inputs.

use std::collections::HashSet;

use applicator::{
    dedup_by_locator, ApplicantProfile, ExtractorSource, FieldKind, FieldResolver,
    RecognizedField,
};
use proptest::prelude::*;

fn arb_field() -> impl Strategy<Value = RecognizedField> {
    (
        prop::sample::select(vec!["email", "name", "phone", "city", "resume"]),
        0.0f32..=1.0,
        prop::bool::ANY,
    )
        .prop_map(|(locator, confidence, from_vision)| {
            let source = if from_vision {
                ExtractorSource::Vision
            } else {
                ExtractorSource::Ocr
            };
            RecognizedField::new(
                FieldKind::Text,
                locator,
                format!("label={locator}"),
                source,
            )
            .with_confidence(confidence)
        })
}

proptest! {
    /// No two output fields share a locator, and the survivor for each
    /// locator carries the maximum confidence seen for it.
    #[test]
    fn dedup_yields_unique_locators_with_max_confidence(
        fields in prop::collection::vec(arb_field(), 0..40)
    ) {
        let deduped = dedup_by_locator(fields.clone());

        let locators: HashSet<_> = deduped.iter().map(|f| f.locator.clone()).collect();
        prop_assert_eq!(locators.len(), deduped.len());
        prop_assert!(deduped.len() <= fields.len());

        for survivor in &deduped {
            let max = fields
                .iter()
                .filter(|f| f.locator == survivor.locator)
                .map(|f| f.confidence)
                .fold(f32::MIN, f32::max);
            prop_assert_eq!(survivor.confidence, max);
        }
    }

    /// Every input field with a locator appears exactly once in the output.
    #[test]
    fn dedup_drops_nothing_but_duplicates(
        fields in prop::collection::vec(arb_field(), 0..40)
    ) {
        let input_locators: HashSet<_> = fields.iter().map(|f| f.locator.clone()).collect();
        let deduped = dedup_by_locator(fields);
        let output_locators: HashSet<_> = deduped.iter().map(|f| f.locator.clone()).collect();
        prop_assert_eq!(input_locators, output_locators);
    }

    /// Resolution is a pure function of (fields, profile).
    #[test]
    fn resolution_is_deterministic(
        labels in prop::collection::vec("[a-zA-Z ]{1,24}", 0..20)
    ) {
        let profile = ApplicantProfile::new()
            .with_fact("first_name", "Ada")
            .with_fact("email", "ada@example.com")
            .with_fact("phone", "+1 555 0100");

        let fields: Vec<_> = labels
            .iter()
            .map(|label| {
                RecognizedField::new(
                    FieldKind::Text,
                    label.as_str(),
                    format!("label={}", label.to_lowercase()),
                    ExtractorSource::Ocr,
                )
            })
            .collect();

        let resolver = FieldResolver::new();
        let first = resolver.resolve(&fields, &profile);
        let second = resolver.resolve(&fields, &profile);

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        prop_assert_eq!(first_json, second_json);

        // The resolver never fabricates: every resolution is either an
        // action derived from the profile or an explicit skip with a
        // recorded discrepancy.
        for resolution in &first {
            if !resolution.action.is_actionable() {
                prop_assert!(resolution.discrepancy.is_some());
            }
        }
    }
}
