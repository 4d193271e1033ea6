mod grid;
mod overrides;
mod rules;

pub use grid::{
    AdditionalTable, Combination, CoreTable, CoreTables, EducationPoints, Ladder, PointGrid,
    SpouseTable, Step, TransferabilityTable,
};
pub use overrides::ProfileOverrides;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CanonicalProfile, LanguageResult, Observed, ProfileField};
use super::error::ValidationError;
use rules::Tally;

const MAX_AGE: u8 = 120;
const MAX_CLB: u8 = 12;
const MAX_WORK_YEARS: u8 = 80;

/// Every individual rule that can contribute points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    Age,
    Education,
    FirstOfficialLanguage,
    CanadianWorkExperience,
    SpouseEducation,
    SpouseLanguage,
    SpouseCanadianWorkExperience,
    EducationLanguage,
    EducationCanadianWork,
    ForeignWorkLanguage,
    ForeignWorkCanadianWork,
    CertificateLanguage,
    ProvincialNomination,
    CanadianStudyBonus,
    SiblingInCanada,
    CertificateOfQualification,
    FrenchLanguageBonus,
    SecondOfficialLanguage,
}

impl ScoreRule {
    pub const fn name(self) -> &'static str {
        match self {
            ScoreRule::Age => "age",
            ScoreRule::Education => "education",
            ScoreRule::FirstOfficialLanguage => "first_official_language",
            ScoreRule::CanadianWorkExperience => "canadian_work_experience",
            ScoreRule::SpouseEducation => "spouse_education",
            ScoreRule::SpouseLanguage => "spouse_language",
            ScoreRule::SpouseCanadianWorkExperience => "spouse_canadian_work_experience",
            ScoreRule::EducationLanguage => "education_language",
            ScoreRule::EducationCanadianWork => "education_canadian_work",
            ScoreRule::ForeignWorkLanguage => "foreign_work_language",
            ScoreRule::ForeignWorkCanadianWork => "foreign_work_canadian_work",
            ScoreRule::CertificateLanguage => "certificate_language",
            ScoreRule::ProvincialNomination => "provincial_nomination",
            ScoreRule::CanadianStudyBonus => "canadian_study_bonus",
            ScoreRule::SiblingInCanada => "sibling_in_canada",
            ScoreRule::CertificateOfQualification => "certificate_of_qualification",
            ScoreRule::FrenchLanguageBonus => "french_language_bonus",
            ScoreRule::SecondOfficialLanguage => "second_official_language",
        }
    }
}

/// Core table variant picked once per computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreTableVariant {
    Single,
    WithSpouse,
}

/// Pillar subtotals, grand total and the per-rule trail behind them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub core_human_capital: u16,
    pub spouse_factors: u16,
    pub skill_transferability: u16,
    pub additional_points: u16,
    pub total: u16,
    pub core_table: CoreTableVariant,
    pub line_items: BTreeMap<ScoreRule, u16>,
    pub unscored_fields: Vec<ProfileField>,
}

/// Stateless calculator over a validated point grid.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    grid: PointGrid,
}

impl ScoringEngine {
    pub fn new(grid: PointGrid) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &PointGrid {
        &self.grid
    }

    /// Compute the breakdown for a profile that has already passed gating.
    pub fn score(&self, profile: &CanonicalProfile) -> ScoreBreakdown {
        let with_spouse = profile.spouse_counts();
        let core_table = self.grid.core_table(with_spouse);
        let mut tally = Tally::default();

        let core_human_capital = rules::core_human_capital(profile, core_table, &mut tally);
        let spouse_factors = if with_spouse {
            rules::spouse_factors(profile, &self.grid.spouse, &mut tally)
        } else {
            0
        };
        let skill_transferability =
            rules::skill_transferability(profile, &self.grid.transferability, &mut tally);
        let additional_points =
            rules::additional_points(profile, &self.grid.additional, &mut tally);

        let total = rules::sum_capped(
            &[
                core_human_capital,
                spouse_factors,
                skill_transferability,
                additional_points,
            ],
            self.grid.program_maximum,
        );

        ScoreBreakdown {
            core_human_capital,
            spouse_factors,
            skill_transferability,
            additional_points,
            total,
            core_table: if with_spouse {
                CoreTableVariant::WithSpouse
            } else {
                CoreTableVariant::Single
            },
            line_items: tally.line_items,
            unscored_fields: tally.unscored.into_iter().collect(),
        }
    }
}

/// Reject known values outside the domain the grid is defined over.
pub(crate) fn check_domain(profile: &CanonicalProfile) -> Result<(), ValidationError> {
    if let Some(age) = profile.age.copied() {
        if age > MAX_AGE {
            return Err(out_of_range("age", age, MAX_AGE));
        }
    }

    let languages = [
        ("first_official_language", &profile.first_official_language),
        ("second_official_language", &profile.second_official_language),
        ("spouse_language", &profile.spouse_language),
    ];
    for (field, result) in languages {
        if let Some(highest) = result.known().and_then(highest_band) {
            if highest > MAX_CLB {
                return Err(out_of_range(field, highest, MAX_CLB));
            }
        }
    }

    let work = [
        ("canadian_work_years", &profile.canadian_work_years),
        ("foreign_work_years", &profile.foreign_work_years),
        ("spouse_canadian_work_years", &profile.spouse_canadian_work_years),
    ];
    for (field, years) in work {
        if let Some(years) = years.copied() {
            if years > MAX_WORK_YEARS {
                return Err(out_of_range(field, years, MAX_WORK_YEARS));
            }
        }
    }

    if let (Observed::Known(first), Observed::Known(second)) = (
        &profile.first_official_language,
        &profile.second_official_language,
    ) {
        if first.language() == second.language() {
            return Err(ValidationError::Malformed {
                field: "second_official_language",
                message: format!(
                    "second result is in the same language as the first ({})",
                    first.language().label()
                ),
            });
        }
    }

    Ok(())
}

fn highest_band(result: &LanguageResult) -> Option<u8> {
    result.bands.iter().max()
}

fn out_of_range(field: &'static str, value: u8, max: u8) -> ValidationError {
    ValidationError::OutOfRange {
        field,
        value: value.to_string(),
        min: "0".to_string(),
        max: max.to_string(),
    }
}
