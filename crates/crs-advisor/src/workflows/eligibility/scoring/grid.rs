use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::super::domain::EducationLevel;
use super::super::error::ConfigurationError;

/// Step function over a small integer domain (age, CLB level, years).
/// Each step applies from `from` up to the next step's `from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ladder(Vec<Step>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub from: u8,
    pub points: u16,
}

impl Ladder {
    pub fn new(steps: &[(u8, u16)]) -> Self {
        Self(
            steps
                .iter()
                .map(|(from, points)| Step {
                    from: *from,
                    points: *points,
                })
                .collect(),
        )
    }

    pub fn lookup(&self, value: u8) -> u16 {
        self.0
            .iter()
            .rev()
            .find(|step| step.from <= value)
            .map(|step| step.points)
            .unwrap_or(0)
    }

    /// Highest value any step awards.
    pub fn peak(&self) -> u16 {
        self.0.iter().map(|step| step.points).max().unwrap_or(0)
    }

    fn validate(&self, name: &str, monotonic: bool) -> Result<(), ConfigurationError> {
        match self.0.first() {
            Some(first) if first.from == 0 => {}
            _ => return Err(invalid(format!("{name} must start at 0"))),
        }
        for pair in self.0.windows(2) {
            if pair[1].from <= pair[0].from {
                return Err(invalid(format!("{name} steps are not in ascending order")));
            }
            if monotonic && pair[1].points < pair[0].points {
                return Err(invalid(format!(
                    "{name} drops from {} to {} points at {}",
                    pair[0].points, pair[1].points, pair[1].from
                )));
            }
        }
        Ok(())
    }
}

/// Points per education level, lowest level first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationPoints {
    pub less_than_secondary: u16,
    pub secondary: u16,
    pub one_or_two_year_diploma: u16,
    pub bachelors: u16,
    pub two_or_more_credentials: u16,
    pub masters: u16,
    pub phd: u16,
}

impl EducationPoints {
    pub const fn get(&self, level: EducationLevel) -> u16 {
        match level {
            EducationLevel::LessThanSecondary => self.less_than_secondary,
            EducationLevel::Secondary => self.secondary,
            EducationLevel::OneOrTwoYearDiploma => self.one_or_two_year_diploma,
            EducationLevel::Bachelors => self.bachelors,
            EducationLevel::TwoOrMoreCredentials => self.two_or_more_credentials,
            EducationLevel::Masters => self.masters,
            EducationLevel::Phd => self.phd,
        }
    }

    fn ordered(&self) -> [u16; 7] {
        [
            self.less_than_secondary,
            self.secondary,
            self.one_or_two_year_diploma,
            self.bachelors,
            self.two_or_more_credentials,
            self.masters,
            self.phd,
        ]
    }

    fn peak(&self) -> u16 {
        self.ordered().into_iter().max().unwrap_or(0)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigurationError> {
        if self.ordered().windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(invalid(format!(
                "{name} points must not fall as education rises"
            )));
        }
        Ok(())
    }
}

/// One core human capital table. Single and with-spouse applicants each get their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreTable {
    pub age: Ladder,
    pub education: EducationPoints,
    /// Points per skill, keyed by CLB level.
    pub first_language: Ladder,
    pub canadian_work: Ladder,
    pub cap: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreTables {
    pub single: CoreTable,
    pub with_spouse: CoreTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpouseTable {
    pub education: EducationPoints,
    /// Points per skill, keyed by CLB level.
    pub language: Ladder,
    pub canadian_work: Ladder,
    pub cap: u16,
}

/// Points for a combination at its lower and upper tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    pub lower: u16,
    pub upper: u16,
}

impl Combination {
    pub const fn new(lower: u16, upper: u16) -> Self {
        Self { lower, upper }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferabilityTable {
    /// All four first-language bands at or above this level form the lower language tier.
    pub moderate_clb: u8,
    /// All four bands at or above this level form the upper language tier.
    pub strong_clb: u8,
    /// Canadian work years that reach the upper tier; one year is the lower tier.
    pub canadian_work_upper_years: u8,
    /// Foreign work years that reach the upper tier; one year is the lower tier.
    pub foreign_work_upper_years: u8,
    pub post_secondary_language: Combination,
    pub advanced_language: Combination,
    pub post_secondary_canadian_work: Combination,
    pub advanced_canadian_work: Combination,
    pub foreign_work_language_short: Combination,
    pub foreign_work_language_long: Combination,
    pub foreign_work_canadian_work_short: Combination,
    pub foreign_work_canadian_work_long: Combination,
    /// Certificate of qualification with all bands at `certificate_lower_clb`
    /// (lower tier) or `certificate_upper_clb` (upper tier).
    pub certificate_language: Combination,
    pub certificate_lower_clb: u8,
    pub certificate_upper_clb: u8,
    pub sub_cap: u16,
    pub group_cap: u16,
    pub ceiling: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalTable {
    pub provincial_nomination: u16,
    pub canadian_study_short: u16,
    pub canadian_study_long: u16,
    pub sibling_in_canada: u16,
    pub certificate_of_qualification: u16,
    pub french_with_weak_english: u16,
    pub french_with_english: u16,
    pub french_clb: u8,
    pub english_clb: u8,
    pub second_official_language: u16,
    pub second_official_language_clb: u8,
    pub cap: u16,
}

/// Full CRS point grid. Loaded once, validated, then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointGrid {
    pub core: CoreTables,
    pub spouse: SpouseTable,
    pub transferability: TransferabilityTable,
    pub additional: AdditionalTable,
    pub program_maximum: u16,
}

impl PointGrid {
    /// Official CRS values.
    pub fn standard() -> Self {
        Self {
            core: CoreTables {
                single: CoreTable {
                    age: Ladder::new(&[
                        (0, 0),
                        (18, 99),
                        (19, 105),
                        (20, 110),
                        (30, 105),
                        (31, 99),
                        (32, 94),
                        (33, 88),
                        (34, 83),
                        (35, 77),
                        (36, 72),
                        (37, 66),
                        (38, 61),
                        (39, 55),
                        (40, 50),
                        (41, 39),
                        (42, 28),
                        (43, 17),
                        (44, 6),
                        (45, 0),
                    ]),
                    education: EducationPoints {
                        less_than_secondary: 0,
                        secondary: 30,
                        one_or_two_year_diploma: 98,
                        bachelors: 120,
                        two_or_more_credentials: 128,
                        masters: 135,
                        phd: 150,
                    },
                    first_language: Ladder::new(&[
                        (0, 0),
                        (4, 6),
                        (6, 9),
                        (7, 17),
                        (8, 23),
                        (9, 31),
                        (10, 34),
                    ]),
                    canadian_work: Ladder::new(&[
                        (0, 0),
                        (1, 40),
                        (2, 53),
                        (3, 64),
                        (4, 72),
                        (5, 80),
                    ]),
                    cap: 500,
                },
                with_spouse: CoreTable {
                    age: Ladder::new(&[
                        (0, 0),
                        (18, 90),
                        (19, 95),
                        (20, 100),
                        (30, 95),
                        (31, 90),
                        (32, 85),
                        (33, 80),
                        (34, 75),
                        (35, 70),
                        (36, 65),
                        (37, 60),
                        (38, 55),
                        (39, 50),
                        (40, 45),
                        (41, 35),
                        (42, 25),
                        (43, 15),
                        (44, 5),
                        (45, 0),
                    ]),
                    education: EducationPoints {
                        less_than_secondary: 0,
                        secondary: 28,
                        one_or_two_year_diploma: 91,
                        bachelors: 112,
                        two_or_more_credentials: 119,
                        masters: 126,
                        phd: 140,
                    },
                    first_language: Ladder::new(&[
                        (0, 0),
                        (4, 6),
                        (6, 8),
                        (7, 16),
                        (8, 22),
                        (9, 29),
                        (10, 32),
                    ]),
                    canadian_work: Ladder::new(&[
                        (0, 0),
                        (1, 35),
                        (2, 46),
                        (3, 56),
                        (4, 63),
                        (5, 70),
                    ]),
                    cap: 460,
                },
            },
            spouse: SpouseTable {
                education: EducationPoints {
                    less_than_secondary: 0,
                    secondary: 2,
                    one_or_two_year_diploma: 7,
                    bachelors: 8,
                    two_or_more_credentials: 9,
                    masters: 10,
                    phd: 10,
                },
                language: Ladder::new(&[(0, 0), (5, 1), (7, 3), (9, 5)]),
                canadian_work: Ladder::new(&[(0, 0), (1, 5), (2, 7), (3, 8), (4, 9), (5, 10)]),
                cap: 40,
            },
            transferability: TransferabilityTable {
                moderate_clb: 7,
                strong_clb: 9,
                canadian_work_upper_years: 2,
                foreign_work_upper_years: 3,
                post_secondary_language: Combination::new(13, 25),
                advanced_language: Combination::new(25, 50),
                post_secondary_canadian_work: Combination::new(13, 25),
                advanced_canadian_work: Combination::new(25, 50),
                foreign_work_language_short: Combination::new(13, 25),
                foreign_work_language_long: Combination::new(25, 50),
                foreign_work_canadian_work_short: Combination::new(13, 25),
                foreign_work_canadian_work_long: Combination::new(25, 50),
                certificate_language: Combination::new(25, 50),
                certificate_lower_clb: 5,
                certificate_upper_clb: 7,
                sub_cap: 50,
                group_cap: 50,
                ceiling: 100,
            },
            additional: AdditionalTable {
                provincial_nomination: 600,
                canadian_study_short: 15,
                canadian_study_long: 30,
                sibling_in_canada: 15,
                certificate_of_qualification: 50,
                french_with_weak_english: 25,
                french_with_english: 50,
                french_clb: 7,
                english_clb: 5,
                second_official_language: 6,
                second_official_language_clb: 5,
                cap: 600,
            },
            program_maximum: 1200,
        }
    }

    /// Read a replacement grid from JSON and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: display.clone(),
            source,
        })?;
        let grid: PointGrid =
            serde_json::from_str(&raw).map_err(|source| ConfigurationError::Parse {
                path: display,
                source,
            })?;
        grid.validate()?;
        Ok(grid)
    }

    pub fn core_table(&self, with_spouse: bool) -> &CoreTable {
        if with_spouse {
            &self.core.with_spouse
        } else {
            &self.core.single
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let single = &self.core.single;
        let partnered = &self.core.with_spouse;

        for (label, table) in [("single", single), ("with-spouse", partnered)] {
            table.age.validate(&format!("{label} age"), false)?;
            table.education.validate(&format!("{label} education"))?;
            table
                .first_language
                .validate(&format!("{label} first language"), true)?;
            table
                .canadian_work
                .validate(&format!("{label} Canadian work"), true)?;
        }
        self.spouse.education.validate("spouse education")?;
        self.spouse.language.validate("spouse language", true)?;
        self.spouse.canadian_work.validate("spouse Canadian work", true)?;

        if (0..=u8::MAX).any(|age| partnered.age.lookup(age) > single.age.lookup(age)) {
            return Err(invalid("with-spouse age points exceed single points".into()));
        }
        if partnered
            .education
            .ordered()
            .iter()
            .zip(single.education.ordered())
            .any(|(with, alone)| *with > alone)
        {
            return Err(invalid(
                "with-spouse education points exceed single points".into(),
            ));
        }
        if (0..=u8::MAX).any(|clb| {
            partnered.first_language.lookup(clb) > single.first_language.lookup(clb)
        }) {
            return Err(invalid(
                "with-spouse language points exceed single points".into(),
            ));
        }
        if (0..=u8::MAX).any(|years| {
            partnered.canadian_work.lookup(years) > single.canadian_work.lookup(years)
        }) {
            return Err(invalid(
                "with-spouse Canadian work points exceed single points".into(),
            ));
        }

        let transferability = &self.transferability;
        let caps = [
            ("single core cap", single.cap),
            ("with-spouse core cap", partnered.cap),
            ("spouse cap", self.spouse.cap),
            ("transferability sub-cap", transferability.sub_cap),
            ("transferability group cap", transferability.group_cap),
            ("transferability ceiling", transferability.ceiling),
            ("additional cap", self.additional.cap),
            ("program maximum", self.program_maximum),
        ];
        if let Some((name, _)) = caps.iter().find(|(_, cap)| *cap == 0) {
            return Err(invalid(format!("{name} must be above zero")));
        }
        if partnered.cap > single.cap {
            return Err(invalid("with-spouse core cap exceeds single cap".into()));
        }
        let pillar_sum = [
            single.cap,
            self.spouse.cap,
            transferability.ceiling,
            self.additional.cap,
        ]
        .iter()
        .map(|cap| u32::from(*cap))
        .sum::<u32>();
        if pillar_sum > u32::from(u16::MAX) {
            return Err(invalid(format!(
                "pillar caps add up to {pillar_sum}, above {}",
                u16::MAX
            )));
        }
        self.validate_line_values()?;
        if u32::from(transferability.ceiling) >= 5 * u32::from(transferability.sub_cap) {
            return Err(invalid(
                "transferability ceiling must sit below the sum of its sub-caps".into(),
            ));
        }
        if transferability.moderate_clb > transferability.strong_clb
            || transferability.certificate_lower_clb > transferability.certificate_upper_clb
        {
            return Err(invalid("transferability language tiers are out of order".into()));
        }
        if transferability.canadian_work_upper_years < 2
            || transferability.foreign_work_upper_years < 2
        {
            return Err(invalid(
                "transferability upper work tiers must start after the first year".into(),
            ));
        }

        Ok(())
    }

    /// Every single line item must fit under the cap of the pillar it feeds.
    fn validate_line_values(&self) -> Result<(), ConfigurationError> {
        let transferability = &self.transferability;
        let additional = &self.additional;
        let mut lines: Vec<(String, u32, u16, &str)> = Vec::new();

        for (label, table) in [
            ("single", &self.core.single),
            ("with-spouse", &self.core.with_spouse),
        ] {
            lines.push((
                format!("{label} age"),
                table.age.peak().into(),
                table.cap,
                "core cap",
            ));
            lines.push((
                format!("{label} education"),
                table.education.peak().into(),
                table.cap,
                "core cap",
            ));
            lines.push((
                format!("{label} first language"),
                4 * u32::from(table.first_language.peak()),
                table.cap,
                "core cap",
            ));
            lines.push((
                format!("{label} Canadian work"),
                table.canadian_work.peak().into(),
                table.cap,
                "core cap",
            ));
        }

        let spouse = &self.spouse;
        lines.push((
            "spouse education".into(),
            spouse.education.peak().into(),
            spouse.cap,
            "spouse cap",
        ));
        lines.push((
            "spouse language".into(),
            4 * u32::from(spouse.language.peak()),
            spouse.cap,
            "spouse cap",
        ));
        lines.push((
            "spouse Canadian work".into(),
            spouse.canadian_work.peak().into(),
            spouse.cap,
            "spouse cap",
        ));

        for (name, combination) in [
            ("post-secondary language", transferability.post_secondary_language),
            ("advanced language", transferability.advanced_language),
            (
                "post-secondary Canadian work",
                transferability.post_secondary_canadian_work,
            ),
            ("advanced Canadian work", transferability.advanced_canadian_work),
            ("short foreign work language", transferability.foreign_work_language_short),
            ("long foreign work language", transferability.foreign_work_language_long),
            (
                "short foreign work Canadian work",
                transferability.foreign_work_canadian_work_short,
            ),
            (
                "long foreign work Canadian work",
                transferability.foreign_work_canadian_work_long,
            ),
            ("certificate language", transferability.certificate_language),
        ] {
            lines.push((
                name.into(),
                combination.lower.max(combination.upper).into(),
                transferability.sub_cap,
                "transferability sub-cap",
            ));
        }
        lines.push((
            "transferability sub-cap".into(),
            transferability.sub_cap.into(),
            transferability.group_cap,
            "transferability group cap",
        ));
        lines.push((
            "transferability group cap".into(),
            transferability.group_cap.into(),
            transferability.ceiling,
            "transferability ceiling",
        ));

        for (name, points) in [
            ("provincial nomination", additional.provincial_nomination),
            ("short Canadian study", additional.canadian_study_short),
            ("long Canadian study", additional.canadian_study_long),
            ("sibling in Canada", additional.sibling_in_canada),
            ("certificate of qualification", additional.certificate_of_qualification),
            ("French with weak English", additional.french_with_weak_english),
            ("French with English", additional.french_with_english),
            ("second official language", additional.second_official_language),
        ] {
            lines.push((name.into(), points.into(), additional.cap, "additional cap"));
        }

        match lines.into_iter().find(|(_, points, cap, _)| *points > u32::from(*cap)) {
            Some((name, points, cap, cap_name)) => Err(invalid(format!(
                "{name} awards {points} points, above the {cap_name} of {cap}"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for PointGrid {
    fn default() -> Self {
        Self::standard()
    }
}

fn invalid(message: String) -> ConfigurationError {
    ConfigurationError::PointGrid(message)
}
