use super::common::*;
use crate::workflows::eligibility::band::{BandThresholds, ScoreBand, DISCLAIMER};
use crate::workflows::eligibility::error::ConfigurationError;
use crate::workflows::eligibility::scoring::{Ladder, PointGrid};

#[test]
fn boundaries_fall_on_the_thresholds() {
    let engine = engine();

    assert_eq!(engine.classify(0).band, ScoreBand::Low);
    assert_eq!(engine.classify(399).band, ScoreBand::Low);
    assert_eq!(engine.classify(400).band, ScoreBand::Medium);
    assert_eq!(engine.classify(469).band, ScoreBand::Medium);
    assert_eq!(engine.classify(470).band, ScoreBand::Strong);
    assert_eq!(engine.classify(1200).label, "Strong");
}

#[test]
fn every_band_carries_a_hint() {
    let thresholds = BandThresholds::default();
    for total in [100, 420, 500] {
        let classification = thresholds.classify(total);
        assert!(!classification.hint.is_empty());
        assert_eq!(classification.label, classification.band.label());
    }
}

#[test]
fn thresholds_must_be_ordered_and_reachable() {
    let reversed = BandThresholds {
        medium_from: 480,
        strong_from: 470,
    };
    assert!(reversed.validate(1200).is_err());

    let unreachable = BandThresholds {
        medium_from: 400,
        strong_from: 1300,
    };
    assert!(matches!(
        unreachable.validate(1200),
        Err(ConfigurationError::PointGrid(_))
    ));

    assert!(BandThresholds::default().validate(1200).is_ok());
}

#[test]
fn report_shows_pillars_against_their_maxima() {
    let engine = engine();
    let breakdown = engine.score(&single_profile(), None).expect("scores");

    let report = engine.report(&breakdown);

    assert_eq!(report.total, 468);
    assert_eq!(report.classification.band, ScoreBand::Medium);
    assert_eq!(report.disclaimer, DISCLAIMER);
    let pillars: Vec<(&str, u16, u16)> = report
        .pillars
        .iter()
        .map(|pillar| (pillar.pillar.as_str(), pillar.points, pillar.maximum))
        .collect();
    assert_eq!(
        pillars,
        vec![
            ("core_human_capital", 418, 500),
            ("spouse_factors", 0, 0),
            ("skill_transferability", 50, 100),
            ("additional_points", 0, 600),
        ]
    );
    assert_eq!(report.line_items, breakdown.line_items);
}

#[test]
fn partnered_report_uses_with_spouse_maxima() {
    let engine = engine();
    let breakdown = engine.score(&married_profile(), None).expect("scores");

    let report = engine.report(&breakdown);

    assert_eq!(report.pillars[0].maximum, 460);
    assert_eq!(report.pillars[1].maximum, 40);
}

#[test]
fn standard_grid_validates() {
    assert!(PointGrid::standard().validate().is_ok());
}

#[test]
fn inconsistent_grids_are_rejected() {
    let mut zero_cap = PointGrid::standard();
    zero_cap.additional.cap = 0;
    let err = zero_cap.validate().expect_err("zero cap");
    assert!(err.to_string().contains("additional cap"));

    let mut richer_partner = PointGrid::standard();
    richer_partner.core.with_spouse.education.phd = 200;
    assert!(richer_partner.validate().is_err());

    let mut falling_language = PointGrid::standard();
    falling_language.core.single.first_language = Ladder::new(&[(0, 0), (4, 20), (5, 10)]);
    let err = falling_language.validate().expect_err("ladder drops");
    assert!(err.to_string().contains("single first language"));

    let mut loose_ceiling = PointGrid::standard();
    loose_ceiling.transferability.ceiling = 250;
    assert!(loose_ceiling.validate().is_err());
}

#[test]
fn line_values_must_fit_their_pillar() {
    let mut nomination = PointGrid::standard();
    nomination.additional.provincial_nomination = 60_000;
    let err = nomination.validate().expect_err("nomination above cap");
    let message = err.to_string();
    assert!(message.contains("provincial nomination awards 60000 points"));
    assert!(message.ends_with("above the additional cap of 600"));

    let mut language = PointGrid::standard();
    language.spouse.language = Ladder::new(&[(0, 0), (5, 1), (7, 3), (9, 11)]);
    let err = language.validate().expect_err("four skills at 11 exceed 40");
    assert!(err.to_string().contains("spouse language awards 44 points"));

    let mut combination = PointGrid::standard();
    combination.transferability.advanced_language.upper = 60;
    assert!(combination.validate().is_err());
}

#[test]
fn pillar_caps_must_fit_the_score_range() {
    let mut grid = PointGrid::standard();
    grid.additional.cap = 65_000;

    let err = grid.validate().expect_err("caps overflow u16");

    assert!(err.to_string().contains("pillar caps add up to 65640"));
}

#[test]
fn replacement_grid_loads_from_json() {
    let path = std::env::temp_dir().join(format!("crs-grid-{}.json", std::process::id()));
    let mut grid = PointGrid::standard();
    grid.additional.provincial_nomination = 500;
    std::fs::write(&path, serde_json::to_string(&grid).expect("serialize")).expect("write grid");

    let loaded = PointGrid::load(&path).expect("grid loads");
    std::fs::write(&path, "{ \"core\": 1 }").expect("overwrite grid");
    let broken = PointGrid::load(&path).expect_err("not a grid");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.additional.provincial_nomination, 500);
    assert!(matches!(broken, ConfigurationError::Parse { .. }));
}
