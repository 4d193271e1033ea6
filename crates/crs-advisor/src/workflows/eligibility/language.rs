//! Raw test results to CLB/NCLC levels, one conversion table per test and skill.

use super::domain::{LanguageSkill, LanguageTest, SkillBands};

/// Raw, unconverted sub-scores exactly as printed on a test report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawScores {
    pub speaking: f64,
    pub listening: f64,
    pub reading: f64,
    pub writing: f64,
}

impl RawScores {
    fn get(&self, skill: LanguageSkill) -> f64 {
        match skill {
            LanguageSkill::Speaking => self.speaking,
            LanguageSkill::Listening => self.listening,
            LanguageSkill::Reading => self.reading,
            LanguageSkill::Writing => self.writing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreConversionError {
    #[error("{test} {skill} score {value} is outside 0..={max}")]
    OutOfRange {
        test: &'static str,
        skill: &'static str,
        value: f64,
        max: f64,
    },
    #[error("{test} {skill} score {value} must be a whole level")]
    NotWholeLevel {
        test: &'static str,
        skill: &'static str,
        value: f64,
    },
}

/// (minimum raw score, CLB) pairs, highest level first.
type Ladder = &'static [(f64, u8)];

const IELTS_LISTENING: Ladder = &[
    (8.5, 10),
    (8.0, 9),
    (7.5, 8),
    (6.0, 7),
    (5.5, 6),
    (5.0, 5),
    (4.5, 4),
];
const IELTS_READING: Ladder = &[
    (8.0, 10),
    (7.0, 9),
    (6.5, 8),
    (6.0, 7),
    (5.0, 6),
    (4.0, 5),
    (3.5, 4),
];
const IELTS_PRODUCTIVE: Ladder = &[
    (7.5, 10),
    (7.0, 9),
    (6.5, 8),
    (6.0, 7),
    (5.5, 6),
    (5.0, 5),
    (4.0, 4),
];

const PTE_SPEAKING: Ladder = &[
    (89.0, 10),
    (84.0, 9),
    (76.0, 8),
    (68.0, 7),
    (59.0, 6),
    (51.0, 5),
    (42.0, 4),
];
const PTE_LISTENING: Ladder = &[
    (89.0, 10),
    (82.0, 9),
    (71.0, 8),
    (60.0, 7),
    (50.0, 6),
    (39.0, 5),
    (28.0, 4),
];
const PTE_READING: Ladder = &[
    (88.0, 10),
    (78.0, 9),
    (69.0, 8),
    (60.0, 7),
    (51.0, 6),
    (42.0, 5),
    (33.0, 4),
];
const PTE_WRITING: Ladder = &[
    (90.0, 10),
    (88.0, 9),
    (79.0, 8),
    (69.0, 7),
    (60.0, 6),
    (51.0, 5),
    (41.0, 4),
];

const TEF_PRODUCTIVE: Ladder = &[
    (393.0, 10),
    (371.0, 9),
    (349.0, 8),
    (310.0, 7),
    (271.0, 6),
    (226.0, 5),
    (181.0, 4),
];
const TEF_LISTENING: Ladder = &[
    (316.0, 10),
    (298.0, 9),
    (280.0, 8),
    (249.0, 7),
    (217.0, 6),
    (181.0, 5),
    (145.0, 4),
];
const TEF_READING: Ladder = &[
    (263.0, 10),
    (248.0, 9),
    (233.0, 8),
    (207.0, 7),
    (181.0, 6),
    (151.0, 5),
    (121.0, 4),
];

const TCF_PRODUCTIVE: Ladder = &[
    (16.0, 10),
    (14.0, 9),
    (12.0, 8),
    (10.0, 7),
    (7.0, 6),
    (6.0, 5),
    (4.0, 4),
];
const TCF_LISTENING: Ladder = &[
    (549.0, 10),
    (523.0, 9),
    (503.0, 8),
    (458.0, 7),
    (398.0, 6),
    (369.0, 5),
    (331.0, 4),
];
const TCF_READING: Ladder = &[
    (549.0, 10),
    (524.0, 9),
    (499.0, 8),
    (453.0, 7),
    (406.0, 6),
    (375.0, 5),
    (342.0, 4),
];

fn ladder(test: LanguageTest, skill: LanguageSkill) -> Option<Ladder> {
    use LanguageSkill::*;
    let table = match (test, skill) {
        (LanguageTest::Celpip, _) => return None,
        (LanguageTest::Ielts, Listening) => IELTS_LISTENING,
        (LanguageTest::Ielts, Reading) => IELTS_READING,
        (LanguageTest::Ielts, Speaking | Writing) => IELTS_PRODUCTIVE,
        (LanguageTest::PteCore, Speaking) => PTE_SPEAKING,
        (LanguageTest::PteCore, Listening) => PTE_LISTENING,
        (LanguageTest::PteCore, Reading) => PTE_READING,
        (LanguageTest::PteCore, Writing) => PTE_WRITING,
        (LanguageTest::TefCanada, Speaking | Writing) => TEF_PRODUCTIVE,
        (LanguageTest::TefCanada, Listening) => TEF_LISTENING,
        (LanguageTest::TefCanada, Reading) => TEF_READING,
        (LanguageTest::TcfCanada, Speaking | Writing) => TCF_PRODUCTIVE,
        (LanguageTest::TcfCanada, Listening) => TCF_LISTENING,
        (LanguageTest::TcfCanada, Reading) => TCF_READING,
    };
    Some(table)
}

/// Highest score a test report can carry for the given skill.
pub fn max_score(test: LanguageTest, skill: LanguageSkill) -> f64 {
    match (test, skill) {
        (LanguageTest::Ielts, _) => 9.0,
        (LanguageTest::Celpip, _) => 12.0,
        (LanguageTest::PteCore, _) => 90.0,
        (LanguageTest::TefCanada, LanguageSkill::Speaking | LanguageSkill::Writing) => 450.0,
        (LanguageTest::TefCanada, LanguageSkill::Listening) => 360.0,
        (LanguageTest::TefCanada, LanguageSkill::Reading) => 300.0,
        (LanguageTest::TcfCanada, LanguageSkill::Speaking | LanguageSkill::Writing) => 20.0,
        (LanguageTest::TcfCanada, LanguageSkill::Listening | LanguageSkill::Reading) => 699.0,
    }
}

/// Convert one raw sub-score to its CLB level. Scores below the CLB 4 floor map to 0.
pub fn skill_to_clb(
    test: LanguageTest,
    skill: LanguageSkill,
    value: f64,
) -> Result<u8, ScoreConversionError> {
    let max = max_score(test, skill);
    if !value.is_finite() || value < 0.0 || value > max {
        return Err(ScoreConversionError::OutOfRange {
            test: test.label(),
            skill: skill.label(),
            value,
            max,
        });
    }

    match ladder(test, skill) {
        None => {
            if value.fract() != 0.0 {
                return Err(ScoreConversionError::NotWholeLevel {
                    test: test.label(),
                    skill: skill.label(),
                    value,
                });
            }
            Ok(value as u8)
        }
        Some(table) => Ok(table
            .iter()
            .find(|(floor, _)| value >= *floor)
            .map(|(_, clb)| *clb)
            .unwrap_or(0)),
    }
}

pub fn to_bands(test: LanguageTest, raw: RawScores) -> Result<SkillBands, ScoreConversionError> {
    Ok(SkillBands {
        speaking: skill_to_clb(test, LanguageSkill::Speaking, raw.get(LanguageSkill::Speaking))?,
        listening: skill_to_clb(
            test,
            LanguageSkill::Listening,
            raw.get(LanguageSkill::Listening),
        )?,
        reading: skill_to_clb(test, LanguageSkill::Reading, raw.get(LanguageSkill::Reading))?,
        writing: skill_to_clb(test, LanguageSkill::Writing, raw.get(LanguageSkill::Writing))?,
    })
}
