use std::collections::{BTreeMap, BTreeSet};

use super::super::domain::{
    CanonicalProfile, EducationLevel, LanguageResult, Observed, OfficialLanguage, ProfileField,
    SkillBands,
};
use super::grid::{AdditionalTable, Combination, CoreTable, SpouseTable, TransferabilityTable};
use super::ScoreRule;

/// Per-computation record of rule contributions and optional fields left unscored.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub line_items: BTreeMap<ScoreRule, u16>,
    pub unscored: BTreeSet<ProfileField>,
}

impl Tally {
    fn award(&mut self, rule: ScoreRule, points: u16) -> u16 {
        self.line_items.insert(rule, points);
        points
    }

    /// Award for an optional field; an unknown value scores nothing and is listed instead.
    fn optional<T>(
        &mut self,
        rule: ScoreRule,
        field: ProfileField,
        value: &Observed<T>,
        points: impl FnOnce(&T) -> u16,
    ) -> u16 {
        match value {
            Observed::Known(known) => self.award(rule, points(known)),
            Observed::NotApplicable => self.award(rule, 0),
            Observed::Unknown | Observed::Malformed { .. } => {
                self.unscored.insert(field);
                0
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credential {
    PostSecondary,
    Advanced,
}

impl Combination {
    fn at(&self, tier: Tier) -> u16 {
        match tier {
            Tier::Lower => self.lower,
            Tier::Upper => self.upper,
        }
    }
}

/// Sum that stops at `cap` instead of overflowing.
pub(crate) fn sum_capped(points: &[u16], cap: u16) -> u16 {
    points
        .iter()
        .fold(0u16, |acc, points| acc.saturating_add(*points))
        .min(cap)
}

fn bands(result: &Observed<LanguageResult>) -> Option<SkillBands> {
    result.known().map(|result| result.bands)
}

fn per_skill(bands: Option<SkillBands>, points: impl Fn(u8) -> u16) -> u16 {
    bands
        .map(|bands| {
            bands
                .iter()
                .map(&points)
                .fold(0u16, u16::saturating_add)
        })
        .unwrap_or(0)
}

/// Age, education, first official language and Canadian work, all read from one table.
pub(crate) fn core_human_capital(
    profile: &CanonicalProfile,
    table: &CoreTable,
    tally: &mut Tally,
) -> u16 {
    let age = profile
        .age
        .copied()
        .map(|age| table.age.lookup(age))
        .unwrap_or(0);
    let education = profile
        .education_level
        .copied()
        .map(|level| table.education.get(level))
        .unwrap_or(0);
    let language = per_skill(bands(&profile.first_official_language), |clb| {
        table.first_language.lookup(clb)
    });

    let canadian_work = tally.optional(
        ScoreRule::CanadianWorkExperience,
        ProfileField::CanadianWorkYears,
        &profile.canadian_work_years,
        |years| table.canadian_work.lookup(*years),
    );

    sum_capped(
        &[
            tally.award(ScoreRule::Age, age),
            tally.award(ScoreRule::Education, education),
            tally.award(ScoreRule::FirstOfficialLanguage, language),
            canadian_work,
        ],
        table.cap,
    )
}

pub(crate) fn spouse_factors(
    profile: &CanonicalProfile,
    table: &SpouseTable,
    tally: &mut Tally,
) -> u16 {
    let education = profile
        .spouse_education_level
        .copied()
        .map(|level| table.education.get(level))
        .unwrap_or(0);
    let language = per_skill(bands(&profile.spouse_language), |clb| {
        table.language.lookup(clb)
    });

    let canadian_work = tally.optional(
        ScoreRule::SpouseCanadianWorkExperience,
        ProfileField::SpouseCanadianWorkYears,
        &profile.spouse_canadian_work_years,
        |years| table.canadian_work.lookup(*years),
    );

    sum_capped(
        &[
            tally.award(ScoreRule::SpouseEducation, education),
            tally.award(ScoreRule::SpouseLanguage, language),
            canadian_work,
        ],
        table.cap,
    )
}

/// Five combinations in three groups, each capped, then the pillar ceiling.
pub(crate) fn skill_transferability(
    profile: &CanonicalProfile,
    table: &TransferabilityTable,
    tally: &mut Tally,
) -> u16 {
    let first = bands(&profile.first_official_language);
    let language = first.and_then(|bands| {
        let floor = bands.minimum();
        if floor >= table.strong_clb {
            Some(Tier::Upper)
        } else if floor >= table.moderate_clb {
            Some(Tier::Lower)
        } else {
            None
        }
    });
    let credential = profile.education_level.copied().and_then(credential_tier);
    let canadian_work = profile
        .canadian_work_years
        .copied()
        .and_then(|years| years_tier(years, table.canadian_work_upper_years));
    let foreign_work = profile
        .foreign_work_years
        .copied()
        .and_then(|years| years_tier(years, table.foreign_work_upper_years));

    let by_credential = |tier: Option<Tier>, post: Combination, advanced: Combination| {
        match (credential, tier) {
            (Some(Credential::PostSecondary), Some(tier)) => post.at(tier),
            (Some(Credential::Advanced), Some(tier)) => advanced.at(tier),
            _ => 0,
        }
    };
    let by_foreign_work = |tier: Option<Tier>, short: Combination, long: Combination| {
        match (foreign_work, tier) {
            (Some(Tier::Lower), Some(tier)) => short.at(tier),
            (Some(Tier::Upper), Some(tier)) => long.at(tier),
            _ => 0,
        }
    };

    let education_language = tally.award(
        ScoreRule::EducationLanguage,
        by_credential(
            language,
            table.post_secondary_language,
            table.advanced_language,
        )
        .min(table.sub_cap),
    );
    let education_canadian_work = tally.award(
        ScoreRule::EducationCanadianWork,
        by_credential(
            canadian_work,
            table.post_secondary_canadian_work,
            table.advanced_canadian_work,
        )
        .min(table.sub_cap),
    );
    let education_group = education_language
        .saturating_add(education_canadian_work)
        .min(table.group_cap);

    let foreign_group = if profile.foreign_work_years.is_known() {
        let foreign_language = tally.award(
            ScoreRule::ForeignWorkLanguage,
            by_foreign_work(
                language,
                table.foreign_work_language_short,
                table.foreign_work_language_long,
            )
            .min(table.sub_cap),
        );
        let foreign_canadian_work = tally.award(
            ScoreRule::ForeignWorkCanadianWork,
            by_foreign_work(
                canadian_work,
                table.foreign_work_canadian_work_short,
                table.foreign_work_canadian_work_long,
            )
            .min(table.sub_cap),
        );
        foreign_language
            .saturating_add(foreign_canadian_work)
            .min(table.group_cap)
    } else {
        tally.unscored.insert(ProfileField::ForeignWorkYears);
        0
    };

    let certificate_group = tally
        .optional(
            ScoreRule::CertificateLanguage,
            ProfileField::CertificateOfQualification,
            &profile.certificate_of_qualification,
            |held| {
                let floor = first.map(|bands| bands.minimum()).unwrap_or(0);
                let points = if !*held {
                    0
                } else if floor >= table.certificate_upper_clb {
                    table.certificate_language.at(Tier::Upper)
                } else if floor >= table.certificate_lower_clb {
                    table.certificate_language.at(Tier::Lower)
                } else {
                    0
                };
                points.min(table.sub_cap)
            },
        )
        .min(table.group_cap);

    education_group
        .saturating_add(foreign_group)
        .saturating_add(certificate_group)
        .min(table.ceiling)
}

pub(crate) fn additional_points(
    profile: &CanonicalProfile,
    table: &AdditionalTable,
    tally: &mut Tally,
) -> u16 {
    let mut total = tally.optional(
        ScoreRule::ProvincialNomination,
        ProfileField::ProvincialNomination,
        &profile.provincial_nomination,
        |nominated| if *nominated { table.provincial_nomination } else { 0 },
    );

    let level = profile.education_level.copied();
    total = total.saturating_add(tally.optional(
        ScoreRule::CanadianStudyBonus,
        ProfileField::CanadianEducation,
        &profile.canadian_education,
        |studied| match (*studied, level) {
            (true, Some(EducationLevel::OneOrTwoYearDiploma)) => table.canadian_study_short,
            (true, Some(level)) if level >= EducationLevel::Bachelors => table.canadian_study_long,
            _ => 0,
        },
    ));

    total = total.saturating_add(tally.optional(
        ScoreRule::SiblingInCanada,
        ProfileField::SiblingInCanada,
        &profile.sibling_in_canada,
        |sibling| if *sibling { table.sibling_in_canada } else { 0 },
    ));

    total = total.saturating_add(tally.optional(
        ScoreRule::CertificateOfQualification,
        ProfileField::CertificateOfQualification,
        &profile.certificate_of_qualification,
        |held| if *held { table.certificate_of_qualification } else { 0 },
    ));

    let french = official_result(profile, OfficialLanguage::French);
    let english = official_result(profile, OfficialLanguage::English);
    let french_bonus = match french {
        Some(french) if french.bands.minimum() >= table.french_clb => match english {
            Some(english) if english.bands.minimum() >= table.english_clb => {
                table.french_with_english
            }
            _ => table.french_with_weak_english,
        },
        _ => 0,
    };
    total = total.saturating_add(tally.award(ScoreRule::FrenchLanguageBonus, french_bonus));

    total = total.saturating_add(tally.optional(
        ScoreRule::SecondOfficialLanguage,
        ProfileField::SecondOfficialLanguage,
        &profile.second_official_language,
        |second| {
            if second.bands.minimum() >= table.second_official_language_clb {
                table.second_official_language
            } else {
                0
            }
        },
    ));

    total.min(table.cap)
}

fn credential_tier(level: EducationLevel) -> Option<Credential> {
    match level {
        EducationLevel::LessThanSecondary | EducationLevel::Secondary => None,
        EducationLevel::OneOrTwoYearDiploma | EducationLevel::Bachelors => {
            Some(Credential::PostSecondary)
        }
        EducationLevel::TwoOrMoreCredentials | EducationLevel::Masters | EducationLevel::Phd => {
            Some(Credential::Advanced)
        }
    }
}

fn years_tier(years: u8, upper_from: u8) -> Option<Tier> {
    if years >= upper_from {
        Some(Tier::Upper)
    } else if years >= 1 {
        Some(Tier::Lower)
    } else {
        None
    }
}

/// The applicant's result in one official language, whichever slot holds it.
fn official_result(
    profile: &CanonicalProfile,
    language: OfficialLanguage,
) -> Option<&LanguageResult> {
    [
        &profile.first_official_language,
        &profile.second_official_language,
    ]
    .into_iter()
    .filter_map(Observed::known)
    .find(|result| result.language() == language)
}
