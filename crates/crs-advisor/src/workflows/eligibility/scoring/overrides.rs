use serde::Serialize;
use serde_json::{Map, Value};

use super::super::aggregator::LanguageRecord;
use super::super::domain::{
    CanonicalProfile, EducationLevel, LanguageResult, LanguageSkill, MaritalStatus, Observed,
};
use super::super::error::ValidationError;
use super::super::language::{self, RawScores, ScoreConversionError};
use super::super::normalizer;

const MAX_AGE: i64 = 120;
const MAX_WORK_YEARS: f64 = 80.0;

/// Request-scoped what-if patch. Validated strictly and never written back to storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileOverrides {
    pub age: Option<u8>,
    pub marital_status: Option<MaritalStatus>,
    pub spouse_accompanying: Option<bool>,
    pub education_level: Option<EducationLevel>,
    pub canadian_education: Option<bool>,
    pub first_official_language: Option<LanguageResult>,
    /// `Some(NotApplicable)` when the patch removes the second language.
    pub second_official_language: Option<Observed<LanguageResult>>,
    pub canadian_work_years: Option<u8>,
    pub foreign_work_years: Option<u8>,
    pub certificate_of_qualification: Option<bool>,
    pub provincial_nomination: Option<bool>,
    pub sibling_in_canada: Option<bool>,
    pub spouse_education_level: Option<EducationLevel>,
    pub spouse_language: Option<LanguageResult>,
    pub spouse_canadian_work_years: Option<u8>,
}

impl ProfileOverrides {
    /// Parse a JSON object of overrides. Unknown keys, wrong types and out-of-domain
    /// values are rejected rather than coerced.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let object = match value {
            Value::Object(object) => object,
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(ValidationError::Malformed {
                    field: "overrides",
                    message: format!("expected an object, found {other}"),
                })
            }
        };

        let mut overrides = Self::default();
        for (key, value) in object {
            match key.as_str() {
                "age" => overrides.age = Some(age(value)?),
                "marital_status" => {
                    overrides.marital_status =
                        Some(label("marital_status", value, normalizer::marital_status)?)
                }
                "spouse_accompanying" => {
                    overrides.spouse_accompanying = Some(boolean("spouse_accompanying", value)?)
                }
                "education_level" => {
                    overrides.education_level =
                        Some(label("education_level", value, normalizer::education_level)?)
                }
                "canadian_education" => {
                    overrides.canadian_education = Some(boolean("canadian_education", value)?)
                }
                "first_official_language" => {
                    overrides.first_official_language =
                        Some(language_result("first_official_language", value)?)
                }
                "second_official_language" => {
                    overrides.second_official_language = Some(match value {
                        Value::Null => Observed::NotApplicable,
                        value => {
                            Observed::Known(language_result("second_official_language", value)?)
                        }
                    })
                }
                "canadian_work_years" => {
                    overrides.canadian_work_years = Some(years("canadian_work_years", value)?)
                }
                "foreign_work_years" => {
                    overrides.foreign_work_years = Some(years("foreign_work_years", value)?)
                }
                "certificate_of_qualification" => {
                    overrides.certificate_of_qualification =
                        Some(boolean("certificate_of_qualification", value)?)
                }
                "provincial_nomination" => {
                    overrides.provincial_nomination =
                        Some(boolean("provincial_nomination", value)?)
                }
                "sibling_in_canada" => {
                    overrides.sibling_in_canada = Some(boolean("sibling_in_canada", value)?)
                }
                "spouse_education_level" => {
                    overrides.spouse_education_level = Some(label(
                        "spouse_education_level",
                        value,
                        normalizer::education_level,
                    )?)
                }
                "spouse_language" => {
                    overrides.spouse_language = Some(language_result("spouse_language", value)?)
                }
                "spouse_canadian_work_years" => {
                    overrides.spouse_canadian_work_years =
                        Some(years("spouse_canadian_work_years", value)?)
                }
                unknown => {
                    return Err(ValidationError::Unrecognized {
                        field: "overrides",
                        value: unknown.to_string(),
                    })
                }
            }
        }

        Ok(overrides)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Patched copy of `profile`; the original is left untouched.
    pub fn apply(&self, profile: &CanonicalProfile) -> CanonicalProfile {
        let mut patched = profile.clone();

        set(&mut patched.age, self.age);
        set(&mut patched.marital_status, self.marital_status);
        set(&mut patched.spouse_accompanying, self.spouse_accompanying);
        set(&mut patched.education_level, self.education_level);
        set(&mut patched.canadian_education, self.canadian_education);
        set(
            &mut patched.first_official_language,
            self.first_official_language.clone(),
        );
        if let Some(second) = &self.second_official_language {
            patched.second_official_language = second.clone();
        }
        set(&mut patched.canadian_work_years, self.canadian_work_years);
        set(&mut patched.foreign_work_years, self.foreign_work_years);
        set(
            &mut patched.certificate_of_qualification,
            self.certificate_of_qualification,
        );
        set(&mut patched.provincial_nomination, self.provincial_nomination);
        set(&mut patched.sibling_in_canada, self.sibling_in_canada);
        set(&mut patched.spouse_education_level, self.spouse_education_level);
        set(&mut patched.spouse_language, self.spouse_language.clone());
        set(
            &mut patched.spouse_canadian_work_years,
            self.spouse_canadian_work_years,
        );

        if let (Some(status), None) = (self.marital_status, self.spouse_accompanying) {
            if !status.has_partner() {
                patched.spouse_accompanying = Observed::NotApplicable;
            } else if patched.spouse_accompanying == Observed::NotApplicable {
                // a newly partnered applicant has not said whether the spouse comes along
                patched.spouse_accompanying = Observed::Unknown;
            }
        }

        patched
    }
}

impl TryFrom<Value> for ProfileOverrides {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

fn set<T>(slot: &mut Observed<T>, value: Option<T>) {
    if let Some(value) = value {
        *slot = Observed::Known(value);
    }
}

fn age(value: &Value) -> Result<u8, ValidationError> {
    let years = value.as_i64().ok_or_else(|| ValidationError::Malformed {
        field: "age",
        message: format!("expected whole years, found {value}"),
    })?;
    match u8::try_from(years) {
        Ok(age) if years <= MAX_AGE => Ok(age),
        _ => Err(ValidationError::OutOfRange {
            field: "age",
            value: years.to_string(),
            min: "0".to_string(),
            max: MAX_AGE.to_string(),
        }),
    }
}

fn years(field: &'static str, value: &Value) -> Result<u8, ValidationError> {
    let years = value.as_f64().ok_or_else(|| ValidationError::Malformed {
        field,
        message: format!("expected a number of years, found {value}"),
    })?;
    if !years.is_finite() || !(0.0..=MAX_WORK_YEARS).contains(&years) {
        return Err(ValidationError::OutOfRange {
            field,
            value: years.to_string(),
            min: "0".to_string(),
            max: MAX_WORK_YEARS.to_string(),
        });
    }
    Ok(years.floor() as u8)
}

fn boolean(field: &'static str, value: &Value) -> Result<bool, ValidationError> {
    value.as_bool().ok_or_else(|| ValidationError::Malformed {
        field,
        message: format!("expected true or false, found {value}"),
    })
}

fn label<T>(
    field: &'static str,
    value: &Value,
    resolve: fn(&str) -> Option<T>,
) -> Result<T, ValidationError> {
    let raw = value.as_str().ok_or_else(|| ValidationError::Malformed {
        field,
        message: format!("expected a label, found {value}"),
    })?;
    resolve(raw).ok_or_else(|| ValidationError::Unrecognized {
        field,
        value: raw.to_string(),
    })
}

fn language_result(field: &'static str, value: &Value) -> Result<LanguageResult, ValidationError> {
    let object: &Map<String, Value> = value.as_object().ok_or_else(|| ValidationError::Malformed {
        field,
        message: format!("expected a test result object, found {value}"),
    })?;
    let record: LanguageRecord =
        serde_json::from_value(Value::Object(object.clone())).map_err(|err| {
            ValidationError::Malformed {
                field,
                message: err.to_string(),
            }
        })?;

    let raw_test = record.test.as_deref().ok_or_else(|| ValidationError::Malformed {
        field,
        message: "test name missing".to_string(),
    })?;
    let test = normalizer::language_test(raw_test).ok_or_else(|| ValidationError::Unrecognized {
        field,
        value: raw_test.to_string(),
    })?;

    let score = |skill: LanguageSkill, value: Option<&Value>| -> Result<f64, ValidationError> {
        value
            .and_then(Value::as_f64)
            .ok_or_else(|| ValidationError::Malformed {
                field,
                message: format!("{} score must be a number", skill.label()),
            })
    };
    let raw = RawScores {
        speaking: score(LanguageSkill::Speaking, record.speaking.as_ref())?,
        listening: score(LanguageSkill::Listening, record.listening.as_ref())?,
        reading: score(LanguageSkill::Reading, record.reading.as_ref())?,
        writing: score(LanguageSkill::Writing, record.writing.as_ref())?,
    };

    let bands = language::to_bands(test, raw).map_err(|err| match err {
        ScoreConversionError::OutOfRange { value, max, .. } => ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            min: "0".to_string(),
            max: max.to_string(),
        },
        other @ ScoreConversionError::NotWholeLevel { .. } => ValidationError::Malformed {
            field,
            message: other.to_string(),
        },
    })?;

    Ok(LanguageResult {
        test,
        bands,
        tested_on: record.tested_on,
    })
}
