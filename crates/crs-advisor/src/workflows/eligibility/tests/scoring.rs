use serde_json::json;

use super::common::*;
use crate::workflows::eligibility::domain::{
    CanonicalProfile, EducationLevel, MaritalStatus, Observed, ProfileField,
};
use crate::workflows::eligibility::error::{AssessmentError, ValidationError};
use crate::workflows::eligibility::requirements::{DocumentType, Priority};
use crate::workflows::eligibility::scoring::{
    CoreTableVariant, Ladder, PointGrid, ProfileOverrides, ScoreRule, ScoringEngine,
};

#[test]
fn single_applicant_core_matches_official_grid() {
    let breakdown = engine()
        .score(&single_profile(), None)
        .expect("complete profile scores");

    assert_eq!(breakdown.core_table, CoreTableVariant::Single);
    assert_eq!(breakdown.line_items[&ScoreRule::Age], 110);
    assert_eq!(breakdown.line_items[&ScoreRule::Education], 120);
    assert_eq!(breakdown.line_items[&ScoreRule::FirstOfficialLanguage], 124);
    assert_eq!(breakdown.line_items[&ScoreRule::CanadianWorkExperience], 64);
    assert_eq!(breakdown.core_human_capital, 418);
    assert_eq!(breakdown.spouse_factors, 0);
    assert_eq!(breakdown.skill_transferability, 50);
    assert_eq!(breakdown.additional_points, 0);
    assert_eq!(breakdown.total, 468);
    assert!(breakdown.unscored_fields.is_empty());
}

#[test]
fn accompanying_spouse_switches_every_core_lookup() {
    let breakdown = engine()
        .score(&married_profile(), None)
        .expect("complete profile scores");

    assert_eq!(breakdown.core_table, CoreTableVariant::WithSpouse);
    assert_eq!(breakdown.line_items[&ScoreRule::Age], 100);
    assert_eq!(breakdown.line_items[&ScoreRule::Education], 112);
    assert_eq!(breakdown.line_items[&ScoreRule::FirstOfficialLanguage], 116);
    assert_eq!(breakdown.line_items[&ScoreRule::CanadianWorkExperience], 56);
    assert_eq!(breakdown.core_human_capital, 384);

    assert_eq!(breakdown.line_items[&ScoreRule::SpouseEducation], 8);
    assert_eq!(breakdown.line_items[&ScoreRule::SpouseLanguage], 4);
    assert_eq!(
        breakdown.line_items[&ScoreRule::SpouseCanadianWorkExperience],
        0
    );
    assert_eq!(breakdown.spouse_factors, 12);
    assert_eq!(breakdown.total, 384 + 12 + 50);
}

#[test]
fn spouse_left_behind_keeps_single_table() {
    let mut profile = married_profile();
    profile.spouse_accompanying = Observed::Known(false);
    profile.spouse_education_level = Observed::Unknown;
    profile.spouse_language = Observed::Unknown;

    let breakdown = engine().score(&profile, None).expect("spouse not required");

    assert_eq!(breakdown.core_table, CoreTableVariant::Single);
    assert_eq!(breakdown.core_human_capital, 418);
    assert_eq!(breakdown.spouse_factors, 0);
    assert!(!breakdown
        .line_items
        .contains_key(&ScoreRule::SpouseEducation));
}

#[test]
fn missing_first_language_is_gated_with_report() {
    let mut profile = single_profile();
    profile.first_official_language = Observed::Unknown;

    let err = engine()
        .score(&profile, None)
        .expect_err("language is required");

    let gating = match err {
        AssessmentError::Gating(gating) => gating,
        other => panic!("expected gating error, got {other:?}"),
    };
    assert!(!gating.report.can_calculate);
    let missing = gating
        .report
        .missing_required
        .iter()
        .find(|missing| missing.field == ProfileField::FirstOfficialLanguage)
        .expect("language listed");
    assert_eq!(missing.priority, Priority::Required);
    assert!(missing.source_documents.contains(&DocumentType::Ielts));
    assert!(missing.source_documents.contains(&DocumentType::TefCanada));
    assert!(gating.to_string().contains("first_official_language"));
}

#[test]
fn provincial_nomination_adds_exactly_six_hundred() {
    let engine = engine();
    let without = engine.score(&single_profile(), None).expect("scores");

    let mut nominated = single_profile();
    nominated.provincial_nomination = Observed::Known(true);
    let with = engine.score(&nominated, None).expect("scores");

    assert_eq!(with.total - without.total, 600);
    assert_eq!(with.additional_points, 600);
    assert_eq!(with.line_items[&ScoreRule::ProvincialNomination], 600);
}

#[test]
fn pillar_caps_hold_for_a_maximal_profile() {
    let mut profile = single_profile();
    profile.age = Observed::Known(25);
    profile.education_level = Observed::Known(EducationLevel::Phd);
    profile.canadian_education = Observed::Known(true);
    profile.first_official_language = Observed::Known(clb(10));
    profile.second_official_language = Observed::Known(nclc(10));
    profile.canadian_work_years = Observed::Known(5);
    profile.foreign_work_years = Observed::Known(3);
    profile.certificate_of_qualification = Observed::Known(true);
    profile.provincial_nomination = Observed::Known(true);
    profile.sibling_in_canada = Observed::Known(true);

    let breakdown = engine().score(&profile, None).expect("scores");

    assert_eq!(breakdown.core_human_capital, 110 + 150 + 136 + 80);
    assert_eq!(breakdown.line_items[&ScoreRule::EducationLanguage], 50);
    assert_eq!(breakdown.line_items[&ScoreRule::ForeignWorkCanadianWork], 50);
    assert_eq!(breakdown.line_items[&ScoreRule::CertificateLanguage], 50);
    assert_eq!(breakdown.skill_transferability, 100);
    assert_eq!(breakdown.additional_points, 600);
    assert_eq!(breakdown.total, 476 + 100 + 600);
}

#[test]
fn french_bonus_depends_on_english_strength() {
    let mut profile = single_profile();
    profile.first_official_language = Observed::Known(nclc(7));
    profile.second_official_language = Observed::Known(clb(5));

    let strong_english = engine().score(&profile, None).expect("scores");
    assert_eq!(
        strong_english.line_items[&ScoreRule::FrenchLanguageBonus],
        50
    );
    assert_eq!(
        strong_english.line_items[&ScoreRule::SecondOfficialLanguage],
        6
    );

    profile.second_official_language = Observed::Known(clb(4));
    let weak_english = engine().score(&profile, None).expect("scores");
    assert_eq!(weak_english.line_items[&ScoreRule::FrenchLanguageBonus], 25);
    assert_eq!(
        weak_english.line_items[&ScoreRule::SecondOfficialLanguage],
        0
    );

    profile.first_official_language = Observed::Known(nclc(6));
    let below = engine().score(&profile, None).expect("scores");
    assert_eq!(below.line_items[&ScoreRule::FrenchLanguageBonus], 0);
}

#[test]
fn canadian_study_bonus_follows_credential_length() {
    let mut profile = single_profile();
    profile.canadian_education = Observed::Known(true);

    let degree = engine().score(&profile, None).expect("scores");
    assert_eq!(degree.line_items[&ScoreRule::CanadianStudyBonus], 30);

    profile.education_level = Observed::Known(EducationLevel::OneOrTwoYearDiploma);
    let diploma = engine().score(&profile, None).expect("scores");
    assert_eq!(diploma.line_items[&ScoreRule::CanadianStudyBonus], 15);

    profile.education_level = Observed::Known(EducationLevel::Secondary);
    let secondary = engine().score(&profile, None).expect("scores");
    assert_eq!(secondary.line_items[&ScoreRule::CanadianStudyBonus], 0);
}

#[test]
fn unknown_optional_fields_score_nothing_and_are_listed() {
    let mut profile = single_profile();
    profile.foreign_work_years = Observed::Unknown;
    profile.provincial_nomination = Observed::Unknown;
    profile.canadian_work_years = Observed::Malformed {
        raw: "several".to_string(),
    };

    let breakdown = engine().score(&profile, None).expect("optional gaps allowed");

    assert_eq!(
        breakdown.unscored_fields,
        vec![
            ProfileField::CanadianWorkYears,
            ProfileField::ForeignWorkYears,
            ProfileField::ProvincialNomination,
        ]
    );
    assert!(!breakdown
        .line_items
        .contains_key(&ScoreRule::CanadianWorkExperience));
    assert_eq!(breakdown.core_human_capital, 110 + 120 + 124);
}

#[test]
fn less_than_secondary_is_a_valid_zero() {
    let mut profile = single_profile();
    profile.education_level = Observed::Known(EducationLevel::LessThanSecondary);

    let breakdown = engine().score(&profile, None).expect("scores");

    assert_eq!(breakdown.line_items[&ScoreRule::Education], 0);
    assert_eq!(breakdown.line_items[&ScoreRule::EducationLanguage], 0);
}

#[test]
fn overrides_patch_without_touching_the_profile() {
    let profile = single_profile();
    let overrides = ProfileOverrides::from_json(&json!({
        "age": 35,
        "education_level": "masters",
        "first_official_language": {
            "test": "ielts", "speaking": 6.5, "listening": 7.5, "reading": 6.5, "writing": 6.5
        }
    }))
    .expect("valid overrides");

    let breakdown = engine()
        .score(&profile, Some(&overrides))
        .expect("patched profile scores");

    assert_eq!(breakdown.line_items[&ScoreRule::Age], 77);
    assert_eq!(breakdown.line_items[&ScoreRule::Education], 135);
    assert_eq!(breakdown.line_items[&ScoreRule::FirstOfficialLanguage], 92);
    assert_eq!(profile, single_profile());
}

#[test]
fn overrides_can_fill_a_gated_field() {
    let mut profile = single_profile();
    profile.first_official_language = Observed::Unknown;
    let overrides = ProfileOverrides::from_json(&json!({
        "first_official_language": {
            "test": "celpip", "speaking": 9, "listening": 9, "reading": 9, "writing": 9
        }
    }))
    .expect("valid overrides");

    let breakdown = engine()
        .score(&profile, Some(&overrides))
        .expect("override completes the profile");

    assert_eq!(breakdown.core_human_capital, 418);
}

#[test]
fn invalid_overrides_are_rejected_before_scoring() {
    let age = ProfileOverrides::from_json(&json!({ "age": 130 })).expect_err("age above 120");
    assert!(matches!(age, ValidationError::OutOfRange { field: "age", .. }));

    let negative =
        ProfileOverrides::from_json(&json!({ "canadian_work_years": -1 })).expect_err("negative");
    assert!(matches!(negative, ValidationError::OutOfRange { .. }));

    let label = ProfileOverrides::from_json(&json!({ "education_level": "wizardry" }))
        .expect_err("unknown label");
    assert!(matches!(
        label,
        ValidationError::Unrecognized {
            field: "education_level",
            ..
        }
    ));

    let key = ProfileOverrides::from_json(&json!({ "job_offer": true })).expect_err("unknown key");
    assert!(matches!(key, ValidationError::Unrecognized { .. }));

    let shape = ProfileOverrides::from_json(&json!([1, 2])).expect_err("not an object");
    assert!(matches!(shape, ValidationError::Malformed { .. }));

    let score = ProfileOverrides::from_json(&json!({
        "first_official_language": {
            "test": "ielts", "speaking": 9.5, "listening": 8, "reading": 8, "writing": 8
        }
    }))
    .expect_err("band above 9");
    assert!(matches!(score, ValidationError::OutOfRange { .. }));
}

#[test]
fn out_of_domain_profile_fails_validation_before_gating() {
    let mut profile = single_profile();
    profile.age = Observed::Known(130);
    profile.first_official_language = Observed::Unknown;

    let err = engine().score(&profile, None).expect_err("age out of range");

    assert!(matches!(err, AssessmentError::Validation(_)));
}

#[test]
fn scoring_is_deterministic() {
    let engine = engine();
    let first = engine.score(&married_profile(), None).expect("scores");
    let second = engine.score(&married_profile(), None).expect("scores");

    assert_eq!(first, second);
}

#[test]
fn marrying_by_override_requires_the_spouse_answer() {
    let overrides = ProfileOverrides::from_json(&json!({ "marital_status": "married" }))
        .expect("valid overrides");
    let patched = overrides.apply(&single_profile());
    assert_eq!(patched.spouse_accompanying, Observed::Unknown);

    let err = engine()
        .score(&single_profile(), Some(&overrides))
        .expect_err("spouse answer missing");

    let gating = match err {
        AssessmentError::Gating(gating) => gating,
        other => panic!("expected gating error, got {other:?}"),
    };
    assert!(gating
        .report
        .missing_required
        .iter()
        .any(|missing| missing.field == ProfileField::SpouseAccompanying));
}

#[test]
fn marital_override_with_spouse_answer_still_scores() {
    let overrides = ProfileOverrides::from_json(&json!({
        "marital_status": "married",
        "spouse_accompanying": false
    }))
    .expect("valid overrides");

    let breakdown = engine()
        .score(&single_profile(), Some(&overrides))
        .expect("spouse stays behind");

    assert_eq!(breakdown.core_table, CoreTableVariant::Single);
    assert_eq!(breakdown.total, 468);
}

#[test]
fn partnered_profile_with_stale_not_applicable_is_gated() {
    let mut profile = single_profile();
    profile.marital_status = Observed::Known(MaritalStatus::Married);

    let err = engine().score(&profile, None).expect_err("spouse answer missing");

    assert!(matches!(err, AssessmentError::Gating(_)));
}

#[test]
fn oversized_table_values_saturate_instead_of_wrapping() {
    let mut grid = PointGrid::standard();
    grid.additional.provincial_nomination = 60_000;
    grid.additional.sibling_in_canada = 60_000;
    grid.core.single.age = Ladder::new(&[(0, 40_000)]);
    assert!(grid.validate().is_err());

    let mut profile = single_profile();
    profile.provincial_nomination = Observed::Known(true);
    profile.sibling_in_canada = Observed::Known(true);

    let breakdown = ScoringEngine::new(grid).score(&profile);

    assert_eq!(breakdown.additional_points, 600);
    assert_eq!(breakdown.core_human_capital, 500);
    assert_eq!(breakdown.total, 500 + 50 + 600);
}

struct TransferabilityCase {
    education: EducationLevel,
    clb: u8,
    canadian_years: u8,
    foreign_years: u8,
    certificate: bool,
    /// education x language, education x Canadian work, foreign x language,
    /// foreign x Canadian work, certificate x language
    lines: [u16; 5],
    pillar: u16,
}

fn transferability_profile(case: &TransferabilityCase) -> CanonicalProfile {
    CanonicalProfile {
        education_level: Observed::Known(case.education),
        first_official_language: Observed::Known(clb(case.clb)),
        canadian_work_years: Observed::Known(case.canadian_years),
        foreign_work_years: Observed::Known(case.foreign_years),
        certificate_of_qualification: Observed::Known(case.certificate),
        ..single_profile()
    }
}

#[test]
fn transferability_tiers_follow_the_official_combinations() {
    use EducationLevel::{Bachelors, Masters, Secondary};

    let case = |education, clb, canadian_years, foreign_years, certificate, lines, pillar| {
        TransferabilityCase {
            education,
            clb,
            canadian_years,
            foreign_years,
            certificate,
            lines,
            pillar,
        }
    };
    let cases = [
        // post-secondary at the lower tiers
        case(Bachelors, 7, 1, 0, false, [13, 13, 0, 0, 0], 26),
        case(Bachelors, 9, 2, 0, false, [25, 25, 0, 0, 0], 50),
        // advanced credential: the education group cap alone limits the pillar
        case(Masters, 7, 1, 0, false, [25, 25, 0, 0, 0], 50),
        case(Masters, 9, 2, 0, false, [50, 50, 0, 0, 0], 50),
        // foreign work, one to two years is the short tier
        case(Secondary, 9, 0, 2, false, [0, 0, 25, 0, 0], 25),
        case(Secondary, 7, 1, 1, false, [0, 0, 13, 13, 0], 26),
        case(Secondary, 9, 2, 3, false, [0, 0, 50, 50, 0], 50),
        // certificate of qualification
        case(Secondary, 5, 0, 0, true, [0, 0, 0, 0, 25], 25),
        case(Secondary, 6, 0, 0, true, [0, 0, 0, 0, 25], 25),
        case(Secondary, 7, 0, 0, true, [0, 0, 0, 0, 50], 50),
        case(Secondary, 4, 0, 0, true, [0, 0, 0, 0, 0], 0),
        // three full groups meet the pillar ceiling
        case(Masters, 9, 2, 3, true, [50, 50, 50, 50, 50], 100),
    ];
    let rules = [
        ScoreRule::EducationLanguage,
        ScoreRule::EducationCanadianWork,
        ScoreRule::ForeignWorkLanguage,
        ScoreRule::ForeignWorkCanadianWork,
        ScoreRule::CertificateLanguage,
    ];

    let engine = engine();
    for case in &cases {
        let breakdown = engine
            .score(&transferability_profile(case), None)
            .expect("complete profile scores");

        let lines = rules.map(|rule| breakdown.line_items[&rule]);
        assert_eq!(
            lines, case.lines,
            "{:?} CLB {} cdn {} foreign {} certificate {}",
            case.education, case.clb, case.canadian_years, case.foreign_years, case.certificate
        );
        assert_eq!(breakdown.skill_transferability, case.pillar);
    }
}
