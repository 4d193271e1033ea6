//! Property-based checks for the scoring engine and requirements gate.

use proptest::prelude::*;

use crs_advisor::workflows::eligibility::{
    AssessmentError, CanonicalProfile, CoreTableVariant, EducationLevel, EligibilityEngine,
    LanguageResult, LanguageTest, MaritalStatus, Observed, SkillBands,
};

const EDUCATION: [EducationLevel; 7] = [
    EducationLevel::LessThanSecondary,
    EducationLevel::Secondary,
    EducationLevel::OneOrTwoYearDiploma,
    EducationLevel::Bachelors,
    EducationLevel::TwoOrMoreCredentials,
    EducationLevel::Masters,
    EducationLevel::Phd,
];

const MARITAL: [MaritalStatus; 3] = [
    MaritalStatus::Single,
    MaritalStatus::Married,
    MaritalStatus::CommonLaw,
];

fn engine() -> EligibilityEngine {
    EligibilityEngine::standard().expect("standard policy validates")
}

fn bands() -> impl Strategy<Value = SkillBands> {
    (0u8..=12, 0u8..=12, 0u8..=12, 0u8..=12).prop_map(|(speaking, listening, reading, writing)| {
        SkillBands {
            speaking,
            listening,
            reading,
            writing,
        }
    })
}

fn result(test: LanguageTest) -> impl Strategy<Value = LanguageResult> {
    bands().prop_map(move |bands| LanguageResult {
        test,
        bands,
        tested_on: None,
    })
}

/// Known most of the time, otherwise unknown or declared not applicable.
fn observed<T: Clone + std::fmt::Debug + 'static>(
    inner: impl Strategy<Value = T> + 'static,
) -> impl Strategy<Value = Observed<T>> {
    prop_oneof![
        6 => inner.prop_map(Observed::Known),
        1 => Just(Observed::Unknown),
        1 => Just(Observed::NotApplicable),
    ]
}

fn education() -> impl Strategy<Value = EducationLevel> {
    (0usize..EDUCATION.len()).prop_map(|index| EDUCATION[index])
}

#[derive(Debug, Clone)]
struct OptionalFields {
    canadian_education: Observed<bool>,
    canadian_work: Observed<u8>,
    foreign_work: Observed<u8>,
    certificate: Observed<bool>,
    nomination: Observed<bool>,
    sibling: Observed<bool>,
    spouse_work: Observed<u8>,
}

prop_compose! {
    fn optional_fields()(
        canadian_education in observed(any::<bool>()),
        canadian_work in observed(0u8..=12),
        foreign_work in observed(0u8..=12),
        certificate in observed(any::<bool>()),
        nomination in observed(any::<bool>()),
        sibling in observed(any::<bool>()),
        spouse_work in observed(0u8..=12),
    ) -> OptionalFields {
        OptionalFields {
            canadian_education,
            canadian_work,
            foreign_work,
            certificate,
            nomination,
            sibling,
            spouse_work,
        }
    }
}

prop_compose! {
    fn scorable_profile()(
        age in 0u8..=120,
        marital in 0usize..MARITAL.len(),
        accompanying in any::<bool>(),
        education in education(),
        french_first in any::<bool>(),
        first_bands in bands(),
        second in observed(bands()),
        spouse_education in education(),
        spouse_language in result(LanguageTest::Celpip),
        optional in optional_fields(),
    ) -> CanonicalProfile {
        let (first_test, second_test) = if french_first {
            (LanguageTest::TefCanada, LanguageTest::Celpip)
        } else {
            (LanguageTest::Celpip, LanguageTest::TefCanada)
        };
        let marital_status = MARITAL[marital];
        let spouse_accompanying = if marital_status.has_partner() {
            Observed::Known(accompanying)
        } else {
            Observed::NotApplicable
        };

        CanonicalProfile {
            age: Observed::Known(age),
            marital_status: Observed::Known(marital_status),
            spouse_accompanying,
            education_level: Observed::Known(education),
            canadian_education: optional.canadian_education,
            first_official_language: Observed::Known(LanguageResult {
                test: first_test,
                bands: first_bands,
                tested_on: None,
            }),
            second_official_language: match second {
                Observed::Known(bands) => Observed::Known(LanguageResult {
                    test: second_test,
                    bands,
                    tested_on: None,
                }),
                Observed::Unknown => Observed::Unknown,
                _ => Observed::NotApplicable,
            },
            canadian_work_years: optional.canadian_work,
            foreign_work_years: optional.foreign_work,
            certificate_of_qualification: optional.certificate,
            provincial_nomination: optional.nomination,
            sibling_in_canada: optional.sibling,
            spouse_education_level: Observed::Known(spouse_education),
            spouse_language: Observed::Known(spouse_language),
            spouse_canadian_work_years: optional.spouse_work,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn identical_inputs_score_identically(profile in scorable_profile()) {
        let engine = engine();
        let first = engine.score(&profile, None);
        let second = engine.score(&profile, None);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn pillar_caps_always_hold(profile in scorable_profile()) {
        let breakdown = engine().score(&profile, None).expect("required fields are known");

        let core_cap = match breakdown.core_table {
            CoreTableVariant::Single => 500,
            CoreTableVariant::WithSpouse => 460,
        };
        prop_assert!(breakdown.core_human_capital <= core_cap);
        prop_assert!(breakdown.spouse_factors <= 40);
        prop_assert!(breakdown.skill_transferability <= 100);
        prop_assert!(breakdown.additional_points <= 600);
        prop_assert!(breakdown.total <= 1200);
        prop_assert_eq!(
            breakdown.total,
            breakdown.core_human_capital
                + breakdown.spouse_factors
                + breakdown.skill_transferability
                + breakdown.additional_points
        );
    }

    #[test]
    fn table_variant_follows_the_accompanying_spouse(profile in scorable_profile()) {
        let breakdown = engine().score(&profile, None).expect("required fields are known");

        let expected = if profile.spouse_counts() {
            CoreTableVariant::WithSpouse
        } else {
            CoreTableVariant::Single
        };
        prop_assert_eq!(breakdown.core_table, expected);
        if !profile.spouse_counts() {
            prop_assert_eq!(breakdown.spouse_factors, 0);
        }
    }

    #[test]
    fn unknown_required_field_never_yields_a_total(
        profile in scorable_profile(),
        which in 0usize..4,
    ) {
        let mut profile = profile;
        match which {
            0 => profile.age = Observed::Unknown,
            1 => profile.education_level = Observed::Unknown,
            2 => profile.first_official_language = Observed::Unknown,
            _ => profile.marital_status = Observed::Unknown,
        }

        let outcome = engine().score(&profile, None);

        prop_assert!(matches!(outcome, Err(AssessmentError::Gating(_))));
    }

    #[test]
    fn analysis_is_idempotent_and_bounded(profile in scorable_profile()) {
        let engine = engine();
        let first = engine.analyze(&profile);
        let second = engine.analyze(&profile);

        prop_assert!(first.completion_percentage <= 100);
        prop_assert_eq!(first.can_calculate, first.missing_required.is_empty());
        prop_assert_eq!(first, second);
    }
}
