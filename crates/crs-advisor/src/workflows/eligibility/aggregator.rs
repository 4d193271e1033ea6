use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::domain::{
    CanonicalProfile, EducationLevel, LanguageResult, LanguageSkill, OfficialLanguage, Observed,
    ProfileField,
};
use super::language::{self, RawScores};
use super::normalizer::{self, normalize_label};

const MAX_AGE: i64 = 120;
const MAX_WORK_YEARS: f64 = 80.0;
const DAYS_PER_YEAR: f64 = 365.25;

/// Flat record kept by the profile form. Everything is optional; nothing is trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualProfile {
    pub age: Option<i64>,
    pub dob: Option<NaiveDate>,
    pub marital_status: Option<String>,
    pub spouse_accompanying: Option<bool>,
    pub education_level: Option<String>,
    pub two_or_more_credentials: Option<bool>,
    pub canadian_education: Option<bool>,
    /// Declared first official language ("english" / "french").
    pub first_official_language: Option<String>,
    pub language_scores: Option<LanguageRecord>,
    pub second_language_scores: Option<LanguageRecord>,
    /// `Some(false)` records an explicit "no second official language".
    pub has_second_language: Option<bool>,
    pub canadian_work_years: Option<f64>,
    pub foreign_work_years: Option<f64>,
    pub certificate_of_qualification: Option<bool>,
    pub provincial_nomination: Option<bool>,
    pub sibling_in_canada: Option<bool>,
    pub spouse_education_level: Option<String>,
    pub spouse_language_scores: Option<LanguageRecord>,
    pub spouse_canadian_work_years: Option<f64>,
}

/// One language test as typed on the form or extracted from a result sheet.
/// Scores may arrive as numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageRecord {
    #[serde(alias = "test_type")]
    pub test: Option<String>,
    #[serde(alias = "test_date")]
    pub tested_on: Option<NaiveDate>,
    pub speaking: Option<Value>,
    pub listening: Option<Value>,
    pub reading: Option<Value>,
    pub writing: Option<Value>,
    pub holder: Option<String>,
}

impl LanguageRecord {
    pub fn new(test: &str, speaking: f64, listening: f64, reading: f64, writing: f64) -> Self {
        Self {
            test: Some(test.to_string()),
            speaking: Some(Value::from(speaking)),
            listening: Some(Value::from(listening)),
            reading: Some(Value::from(reading)),
            writing: Some(Value::from(writing)),
            ..Self::default()
        }
    }

    pub fn dated(mut self, tested_on: NaiveDate) -> Self {
        self.tested_on = Some(tested_on);
        self
    }
}

/// Raw JSON blobs written by document extraction, one per document family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedBlobs {
    pub education: Option<Value>,
    pub language: Option<Value>,
    pub work: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationWarning {
    pub field: ProfileField,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedProfile {
    pub profile: CanonicalProfile,
    pub warnings: Vec<AggregationWarning>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CredentialRecord {
    #[serde(alias = "education_level")]
    level: Option<String>,
    canadian: Option<bool>,
    country: Option<String>,
    holder: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PositionRecord {
    country: Option<String>,
    years: Option<f64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    holder: Option<String>,
}

#[derive(Debug, Default)]
struct WorkTotals {
    canadian: Option<f64>,
    foreign: Option<f64>,
}

impl WorkTotals {
    fn add(slot: &mut Option<f64>, years: f64) {
        *slot = Some(slot.unwrap_or(0.0) + years);
    }
}

/// Merge the manual record and extracted blobs into one canonical profile.
///
/// Manual values win over document-derived ones; disagreements and unreadable values
/// are reported as warnings and never abort the merge. `as_of` stands in for "today".
pub fn aggregate(
    manual: &ManualProfile,
    blobs: &ExtractedBlobs,
    as_of: NaiveDate,
) -> AggregatedProfile {
    let mut merge = Merge {
        as_of,
        warnings: Vec::new(),
    };

    let mut profile = CanonicalProfile {
        age: merge.age(manual),
        marital_status: merge.label(
            ProfileField::MaritalStatus,
            manual.marital_status.as_deref(),
            normalizer::marital_status,
        ),
        certificate_of_qualification: manual.certificate_of_qualification.into(),
        provincial_nomination: manual.provincial_nomination.into(),
        sibling_in_canada: manual.sibling_in_canada.into(),
        ..CanonicalProfile::default()
    };

    profile.spouse_accompanying = match profile.marital_status.copied() {
        Some(status) if !status.has_partner() => {
            if manual.spouse_accompanying == Some(true) {
                merge.warn(
                    ProfileField::SpouseAccompanying,
                    format!("ignored for marital status {}", status.label()),
                );
            }
            Observed::NotApplicable
        }
        _ => manual.spouse_accompanying.into(),
    };

    merge.education(manual, blobs.education.as_ref(), &mut profile);
    merge.languages(manual, blobs.language.as_ref(), &mut profile);
    merge.work(manual, blobs.work.as_ref(), &mut profile);

    for warning in &merge.warnings {
        debug!(
            field = warning.field.name(),
            message = %warning.message,
            "profile aggregation warning"
        );
    }

    AggregatedProfile {
        profile,
        warnings: merge.warnings,
    }
}

struct Merge {
    as_of: NaiveDate,
    warnings: Vec<AggregationWarning>,
}

impl Merge {
    fn warn(&mut self, field: ProfileField, message: impl Into<String>) {
        self.warnings.push(AggregationWarning {
            field,
            message: message.into(),
        });
    }

    fn label<T>(
        &mut self,
        field: ProfileField,
        raw: Option<&str>,
        resolve: fn(&str) -> Option<T>,
    ) -> Observed<T> {
        let Some(raw) = raw else {
            return Observed::Unknown;
        };
        if raw.trim().is_empty() {
            return Observed::Unknown;
        }
        match resolve(raw) {
            Some(value) => Observed::Known(value),
            None => {
                self.warn(field, format!("unrecognised value '{raw}'"));
                Observed::Malformed {
                    raw: raw.to_string(),
                }
            }
        }
    }

    fn age(&mut self, manual: &ManualProfile) -> Observed<u8> {
        let from_dob = manual.dob.map(|dob| (dob, age_at(dob, self.as_of)));

        if let Some(age) = manual.age {
            if let Some((_, Some(derived))) = from_dob {
                if derived != age {
                    self.warn(
                        ProfileField::Age,
                        format!("date of birth implies age {derived}, keeping entered age {age}"),
                    );
                }
            }
            return self.checked_age(age, age.to_string());
        }

        match from_dob {
            Some((dob, Some(age))) => self.checked_age(age, dob.to_string()),
            Some((dob, None)) => {
                self.warn(ProfileField::Age, format!("date of birth {dob} is in the future"));
                Observed::Malformed {
                    raw: dob.to_string(),
                }
            }
            None => Observed::Unknown,
        }
    }

    fn checked_age(&mut self, age: i64, raw: String) -> Observed<u8> {
        match u8::try_from(age) {
            Ok(years) if age <= MAX_AGE => Observed::Known(years),
            _ => {
                self.warn(ProfileField::Age, format!("age {age} is outside 0..={MAX_AGE}"));
                Observed::Malformed { raw }
            }
        }
    }

    fn education(
        &mut self,
        manual: &ManualProfile,
        blob: Option<&Value>,
        profile: &mut CanonicalProfile,
    ) {
        let mut principal: Vec<(EducationLevel, CredentialRecord)> = Vec::new();
        let mut spouse: Vec<EducationLevel> = Vec::new();
        let mut unrecognised_principal: Option<String> = None;

        for record in self.records(
            blob,
            "credentials",
            &["level", "education_level"],
            ProfileField::EducationLevel,
        ) {
            let credential: CredentialRecord = match serde_json::from_value(record) {
                Ok(credential) => credential,
                Err(err) => {
                    self.warn(ProfileField::EducationLevel, format!("credential skipped: {err}"));
                    continue;
                }
            };
            let spouse_held = is_spouse(credential.holder.as_deref());
            let field = if spouse_held {
                ProfileField::SpouseEducationLevel
            } else {
                ProfileField::EducationLevel
            };
            let Some(raw) = credential.level.clone() else {
                self.warn(field, "credential without a level skipped");
                continue;
            };
            match normalizer::education_level(&raw) {
                Some(level) if spouse_held => spouse.push(level),
                Some(level) => principal.push((level, credential)),
                None => {
                    self.warn(field, format!("unrecognised credential level '{raw}'"));
                    if !spouse_held && unrecognised_principal.is_none() {
                        unrecognised_principal = Some(raw);
                    }
                }
            }
        }

        let documented = principal.iter().map(|(level, _)| *level).max();
        let mut level = self.label(
            ProfileField::EducationLevel,
            manual.education_level.as_deref(),
            normalizer::education_level,
        );
        match (&level, documented) {
            (Observed::Known(entered), Some(found)) if *entered != found => self.warn(
                ProfileField::EducationLevel,
                format!(
                    "documents show {}, keeping entered {}",
                    found.label(),
                    entered.label()
                ),
            ),
            _ => {}
        }
        level = level.or_else(|| match (documented, unrecognised_principal) {
            (Some(found), _) => Observed::Known(found),
            (None, Some(raw)) => Observed::Malformed { raw },
            (None, None) => Observed::Unknown,
        });

        let two_or_more = manual
            .two_or_more_credentials
            .or_else(|| blob_flag(blob, "two_or_more_credentials"))
            .unwrap_or(false);
        if two_or_more {
            if let Observed::Known(current) = level {
                if current < EducationLevel::TwoOrMoreCredentials {
                    level = Observed::Known(EducationLevel::TwoOrMoreCredentials);
                }
            }
        }
        profile.education_level = level;

        profile.canadian_education = match manual.canadian_education {
            Some(flag) => Observed::Known(flag),
            None => canadian_study(principal.iter().map(|(_, record)| record)),
        };

        let spouse_documented = spouse.into_iter().max();
        profile.spouse_education_level = self
            .label(
                ProfileField::SpouseEducationLevel,
                manual.spouse_education_level.as_deref(),
                normalizer::education_level,
            )
            .or_else(|| spouse_documented.into());
    }

    fn languages(
        &mut self,
        manual: &ManualProfile,
        blob: Option<&Value>,
        profile: &mut CanonicalProfile,
    ) {
        let mut english = Vec::new();
        let mut french = Vec::new();
        let mut spouse = Vec::new();

        for record in self.records(
            blob,
            "tests",
            &["test", "test_type"],
            ProfileField::FirstOfficialLanguage,
        ) {
            let parsed: LanguageRecord = match serde_json::from_value(record) {
                Ok(parsed) => parsed,
                Err(err) => {
                    self.warn(
                        ProfileField::FirstOfficialLanguage,
                        format!("language result skipped: {err}"),
                    );
                    continue;
                }
            };
            let spouse_held = is_spouse(parsed.holder.as_deref());
            let field = if spouse_held {
                ProfileField::SpouseLanguage
            } else {
                ProfileField::FirstOfficialLanguage
            };
            match convert(&parsed) {
                Ok(result) if spouse_held => spouse.push(result),
                Ok(result) => match result.language() {
                    OfficialLanguage::English => english.push(result),
                    OfficialLanguage::French => french.push(result),
                },
                Err(reason) => self.warn(field, format!("language result skipped: {reason}")),
            }
        }

        let best_english = select_best(english);
        let best_french = select_best(french);
        let best_for = |language: OfficialLanguage| match language {
            OfficialLanguage::English => best_english.clone(),
            OfficialLanguage::French => best_french.clone(),
        };

        let declared = match self.label(
            ProfileField::FirstOfficialLanguage,
            manual.first_official_language.as_deref(),
            normalizer::official_language,
        ) {
            Observed::Known(language) => Some(language),
            _ => None,
        };

        let first = match manual.language_scores.as_ref() {
            Some(record) => self.manual_result(ProfileField::FirstOfficialLanguage, record),
            None => {
                let language = declared.or_else(|| match (&best_english, &best_french) {
                    (Some(en), Some(fr)) if fr.bands.sum() > en.bands.sum() => {
                        Some(OfficialLanguage::French)
                    }
                    (Some(_), _) => Some(OfficialLanguage::English),
                    (None, Some(_)) => Some(OfficialLanguage::French),
                    (None, None) => None,
                });
                language.and_then(best_for).into()
            }
        };

        if let (Observed::Known(entered), Some(document)) =
            (&first, first.known().and_then(|r| best_for(r.language())))
        {
            if manual.language_scores.is_some() && entered.bands != document.bands {
                self.warn(
                    ProfileField::FirstOfficialLanguage,
                    format!(
                        "{} result on file differs from entered scores; keeping entered",
                        document.test.label()
                    ),
                );
            }
        }

        let first_language = first
            .known()
            .map(LanguageResult::language)
            .or(declared);

        let second = match manual.second_language_scores.as_ref() {
            Some(record) => {
                let result = self.manual_result(ProfileField::SecondOfficialLanguage, record);
                match (&result, first_language) {
                    (Observed::Known(second), Some(primary)) if second.language() == primary => {
                        self.warn(
                            ProfileField::SecondOfficialLanguage,
                            format!("second result is also {}", primary.label()),
                        );
                        Observed::Malformed {
                            raw: describe(record),
                        }
                    }
                    _ => result,
                }
            }
            None if manual.has_second_language == Some(false) => Observed::NotApplicable,
            None => first_language
                .and_then(|language| best_for(language.other()))
                .into(),
        };

        profile.first_official_language = first;
        profile.second_official_language = second;

        profile.spouse_language = match manual.spouse_language_scores.as_ref() {
            Some(record) => self.manual_result(ProfileField::SpouseLanguage, record),
            None => select_best(spouse).into(),
        };
    }

    fn manual_result(
        &mut self,
        field: ProfileField,
        record: &LanguageRecord,
    ) -> Observed<LanguageResult> {
        match convert(record) {
            Ok(result) => Observed::Known(result),
            Err(reason) => {
                self.warn(field, format!("entered scores rejected: {reason}"));
                Observed::Malformed {
                    raw: describe(record),
                }
            }
        }
    }

    fn work(
        &mut self,
        manual: &ManualProfile,
        blob: Option<&Value>,
        profile: &mut CanonicalProfile,
    ) {
        let mut principal = WorkTotals::default();
        let mut spouse = WorkTotals::default();

        for record in self.records(
            blob,
            "positions",
            &["country", "years", "start_date"],
            ProfileField::CanadianWorkYears,
        ) {
            let position: PositionRecord = match serde_json::from_value(record) {
                Ok(position) => position,
                Err(err) => {
                    self.warn(ProfileField::CanadianWorkYears, format!("position skipped: {err}"));
                    continue;
                }
            };
            let spouse_held = is_spouse(position.holder.as_deref());
            let field = if spouse_held {
                ProfileField::SpouseCanadianWorkYears
            } else {
                ProfileField::CanadianWorkYears
            };
            let Some(country) = position.country.as_deref() else {
                self.warn(field, "position without a country skipped");
                continue;
            };
            let years = match self.position_years(&position) {
                Ok(years) => years,
                Err(reason) => {
                    self.warn(field, format!("position skipped: {reason}"));
                    continue;
                }
            };
            let totals = if spouse_held { &mut spouse } else { &mut principal };
            if normalizer::is_canada(country) {
                WorkTotals::add(&mut totals.canadian, years);
            } else {
                WorkTotals::add(&mut totals.foreign, years);
            }
        }

        let flat = |key: &str| blob.and_then(|value| value.get(key)).and_then(Value::as_f64);
        principal.canadian = principal.canadian.or_else(|| flat("canadian_work_years"));
        principal.foreign = principal.foreign.or_else(|| flat("foreign_work_years"));
        spouse.canadian = spouse.canadian.or_else(|| flat("spouse_canadian_work_years"));

        profile.canadian_work_years = self.years(
            ProfileField::CanadianWorkYears,
            manual.canadian_work_years,
            principal.canadian,
        );
        profile.foreign_work_years = self.years(
            ProfileField::ForeignWorkYears,
            manual.foreign_work_years,
            principal.foreign,
        );
        profile.spouse_canadian_work_years = self.years(
            ProfileField::SpouseCanadianWorkYears,
            manual.spouse_canadian_work_years,
            spouse.canadian,
        );
    }

    fn position_years(&self, position: &PositionRecord) -> Result<f64, String> {
        if let Some(years) = position.years {
            return Ok(years);
        }
        let start = position
            .start_date
            .ok_or_else(|| "neither years nor start_date given".to_string())?;
        let end = position.end_date.unwrap_or(self.as_of);
        if end < start {
            return Err(format!("end date {end} precedes start date {start}"));
        }
        Ok(end.signed_duration_since(start).num_days() as f64 / DAYS_PER_YEAR)
    }

    fn years(
        &mut self,
        field: ProfileField,
        entered: Option<f64>,
        documented: Option<f64>,
    ) -> Observed<u8> {
        let documented = documented.map(|years| self.whole_years(field, years));
        match entered {
            Some(years) => {
                let entered = self.whole_years(field, years);
                if let (Observed::Known(kept), Some(Observed::Known(found))) =
                    (&entered, &documented)
                {
                    if kept != found {
                        self.warn(
                            field,
                            format!("documents show {found} years, keeping entered {kept}"),
                        );
                    }
                }
                entered
            }
            None => documented.unwrap_or_default(),
        }
    }

    /// Completed whole years; fractional experience is floored.
    fn whole_years(&mut self, field: ProfileField, years: f64) -> Observed<u8> {
        if !years.is_finite() || !(0.0..=MAX_WORK_YEARS).contains(&years) {
            self.warn(field, format!("{years} years is outside 0..={MAX_WORK_YEARS}"));
            return Observed::Malformed {
                raw: years.to_string(),
            };
        }
        Observed::Known(years.floor() as u8)
    }

    /// Records from a blob shaped as a bare array, an object wrapping `key`, or one record.
    fn records(
        &mut self,
        blob: Option<&Value>,
        key: &str,
        markers: &[&str],
        field: ProfileField,
    ) -> Vec<Value> {
        match blob {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(map)) => match map.get(key) {
                Some(Value::Array(items)) => items.clone(),
                Some(single @ Value::Object(_)) => vec![single.clone()],
                Some(Value::Null) => Vec::new(),
                Some(other) => {
                    self.warn(field, format!("'{key}' should be a list, found {other}"));
                    Vec::new()
                }
                None if markers.iter().any(|marker| map.contains_key(*marker)) => {
                    vec![Value::Object(map.clone())]
                }
                None => Vec::new(),
            },
            Some(other) => {
                self.warn(field, format!("extracted data is not an object or list: {other}"));
                Vec::new()
            }
        }
    }
}

fn age_at(dob: NaiveDate, as_of: NaiveDate) -> Option<i64> {
    if dob > as_of {
        return None;
    }
    let mut years = i64::from(as_of.year() - dob.year());
    if (as_of.month(), as_of.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    Some(years)
}

fn is_spouse(holder: Option<&str>) -> bool {
    holder
        .map(|holder| {
            matches!(
                normalize_label(holder).as_str(),
                "spouse" | "partner" | "common law partner"
            )
        })
        .unwrap_or(false)
}

fn blob_flag(blob: Option<&Value>, key: &str) -> Option<bool> {
    match blob?.get(key)? {
        Value::Bool(flag) => Some(*flag),
        Value::String(raw) => normalizer::flag(raw),
        _ => None,
    }
}

fn canadian_study<'a>(credentials: impl Iterator<Item = &'a CredentialRecord>) -> Observed<bool> {
    let mut any = false;
    let mut all_foreign = true;
    for credential in credentials {
        any = true;
        let canadian = credential
            .canadian
            .or_else(|| credential.country.as_deref().map(normalizer::is_canada));
        match canadian {
            Some(true) => return Observed::Known(true),
            Some(false) => {}
            None => all_foreign = false,
        }
    }
    if any && all_foreign {
        Observed::Known(false)
    } else {
        Observed::Unknown
    }
}

fn convert(record: &LanguageRecord) -> Result<LanguageResult, String> {
    let label = record
        .test
        .as_deref()
        .ok_or_else(|| "test name missing".to_string())?;
    let test = normalizer::language_test(label)
        .ok_or_else(|| format!("unrecognised language test '{label}'"))?;
    let raw = RawScores {
        speaking: skill_value(record.speaking.as_ref(), LanguageSkill::Speaking)?,
        listening: skill_value(record.listening.as_ref(), LanguageSkill::Listening)?,
        reading: skill_value(record.reading.as_ref(), LanguageSkill::Reading)?,
        writing: skill_value(record.writing.as_ref(), LanguageSkill::Writing)?,
    };
    let bands = language::to_bands(test, raw).map_err(|err| err.to_string())?;
    Ok(LanguageResult {
        test,
        bands,
        tested_on: record.tested_on,
    })
}

fn skill_value(value: Option<&Value>, skill: LanguageSkill) -> Result<f64, String> {
    match value {
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| format!("{} score {number} is not representable", skill.label())),
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("{} score '{raw}' is not a number", skill.label())),
        Some(Value::Null) | None => Err(format!("{} score missing", skill.label())),
        Some(other) => Err(format!("{} score {other} is not a number", skill.label())),
    }
}

fn describe(record: &LanguageRecord) -> String {
    serde_json::to_string(record).unwrap_or_default()
}

/// Pick one result per language, ranking every candidate on one key: dated tests before
/// undated ones, later date first, then the higher band sum, then the earlier record.
/// Results are never averaged.
pub(crate) fn select_best(results: Vec<LanguageResult>) -> Option<LanguageResult> {
    results
        .into_iter()
        .enumerate()
        .min_by(|(left_index, left), (right_index, right)| {
            right
                .tested_on
                .cmp(&left.tested_on)
                .then_with(|| right.bands.sum().cmp(&left.bands.sum()))
                .then_with(|| left_index.cmp(right_index))
        })
        .map(|(_, result)| result)
}
