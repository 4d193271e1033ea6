use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for the applicant whose profile is assessed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value state for a canonical profile field. Absence is never read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Observed<T> {
    Known(T),
    Unknown,
    /// Present at the source but uninterpretable; the raw text is kept for the gap report.
    Malformed { raw: String },
    /// Explicitly declared as not applying to this applicant.
    NotApplicable,
}

impl<T> Default for Observed<T> {
    fn default() -> Self {
        Observed::Unknown
    }
}

impl<T> Observed<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Observed::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Observed::Known(_))
    }

    /// Known or explicitly declared absent.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Observed::Known(_) | Observed::NotApplicable)
    }

    pub fn malformed_raw(&self) -> Option<&str> {
        match self {
            Observed::Malformed { raw } => Some(raw.as_str()),
            _ => None,
        }
    }

    pub fn or_else(self, fallback: impl FnOnce() -> Observed<T>) -> Observed<T> {
        match self {
            Observed::Unknown => fallback(),
            other => other,
        }
    }
}

impl<T: Copy> Observed<T> {
    pub fn copied(&self) -> Option<T> {
        self.known().copied()
    }
}

impl<T> From<Option<T>> for Observed<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Observed::Known).unwrap_or(Observed::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
    CommonLaw,
}

impl MaritalStatus {
    pub const fn has_partner(self) -> bool {
        matches!(self, MaritalStatus::Married | MaritalStatus::CommonLaw)
    }

    pub const fn label(self) -> &'static str {
        match self {
            MaritalStatus::Single => "single",
            MaritalStatus::Married => "married",
            MaritalStatus::CommonLaw => "common_law",
        }
    }
}

/// Credential ladder, lowest first. Declaration order is the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    LessThanSecondary,
    Secondary,
    OneOrTwoYearDiploma,
    Bachelors,
    TwoOrMoreCredentials,
    Masters,
    Phd,
}

impl EducationLevel {
    pub const fn label(self) -> &'static str {
        match self {
            EducationLevel::LessThanSecondary => "less_than_secondary",
            EducationLevel::Secondary => "secondary",
            EducationLevel::OneOrTwoYearDiploma => "one_or_two_year_diploma",
            EducationLevel::Bachelors => "bachelors",
            EducationLevel::TwoOrMoreCredentials => "two_or_more_credentials",
            EducationLevel::Masters => "masters",
            EducationLevel::Phd => "phd",
        }
    }

    pub const fn is_post_secondary(self) -> bool {
        !matches!(
            self,
            EducationLevel::LessThanSecondary | EducationLevel::Secondary
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficialLanguage {
    English,
    French,
}

impl OfficialLanguage {
    pub const fn other(self) -> Self {
        match self {
            OfficialLanguage::English => OfficialLanguage::French,
            OfficialLanguage::French => OfficialLanguage::English,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            OfficialLanguage::English => "english",
            OfficialLanguage::French => "french",
        }
    }
}

/// Designated tests accepted for official-language proficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageTest {
    Ielts,
    Celpip,
    PteCore,
    TefCanada,
    TcfCanada,
}

impl LanguageTest {
    pub const fn language(self) -> OfficialLanguage {
        match self {
            LanguageTest::Ielts | LanguageTest::Celpip | LanguageTest::PteCore => {
                OfficialLanguage::English
            }
            LanguageTest::TefCanada | LanguageTest::TcfCanada => OfficialLanguage::French,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LanguageTest::Ielts => "ielts",
            LanguageTest::Celpip => "celpip",
            LanguageTest::PteCore => "pte_core",
            LanguageTest::TefCanada => "tef_canada",
            LanguageTest::TcfCanada => "tcf_canada",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageSkill {
    Speaking,
    Listening,
    Reading,
    Writing,
}

impl LanguageSkill {
    pub const ALL: [LanguageSkill; 4] = [
        LanguageSkill::Speaking,
        LanguageSkill::Listening,
        LanguageSkill::Reading,
        LanguageSkill::Writing,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            LanguageSkill::Speaking => "speaking",
            LanguageSkill::Listening => "listening",
            LanguageSkill::Reading => "reading",
            LanguageSkill::Writing => "writing",
        }
    }
}

/// CLB/NCLC level per skill. Zero stands for "below CLB 4".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillBands {
    pub speaking: u8,
    pub listening: u8,
    pub reading: u8,
    pub writing: u8,
}

impl SkillBands {
    pub const fn uniform(level: u8) -> Self {
        Self {
            speaking: level,
            listening: level,
            reading: level,
            writing: level,
        }
    }

    pub const fn get(&self, skill: LanguageSkill) -> u8 {
        match skill {
            LanguageSkill::Speaking => self.speaking,
            LanguageSkill::Listening => self.listening,
            LanguageSkill::Reading => self.reading,
            LanguageSkill::Writing => self.writing,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        LanguageSkill::ALL.into_iter().map(|skill| self.get(skill))
    }

    /// Lowest band across the four skills; transferability and bonus rules key off it.
    pub fn minimum(&self) -> u8 {
        self.iter().min().unwrap_or(0)
    }

    pub fn sum(&self) -> u16 {
        self.iter().map(u16::from).sum()
    }
}

/// One selected language test converted to CLB bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageResult {
    pub test: LanguageTest,
    pub bands: SkillBands,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_on: Option<NaiveDate>,
}

impl LanguageResult {
    pub const fn language(&self) -> OfficialLanguage {
        self.test.language()
    }
}

/// Merged, typed applicant view consumed by the analyzer and the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanonicalProfile {
    pub age: Observed<u8>,
    pub marital_status: Observed<MaritalStatus>,
    pub spouse_accompanying: Observed<bool>,
    pub education_level: Observed<EducationLevel>,
    pub canadian_education: Observed<bool>,
    pub first_official_language: Observed<LanguageResult>,
    pub second_official_language: Observed<LanguageResult>,
    pub canadian_work_years: Observed<u8>,
    pub foreign_work_years: Observed<u8>,
    pub certificate_of_qualification: Observed<bool>,
    pub provincial_nomination: Observed<bool>,
    pub sibling_in_canada: Observed<bool>,
    pub spouse_education_level: Observed<EducationLevel>,
    pub spouse_language: Observed<LanguageResult>,
    pub spouse_canadian_work_years: Observed<u8>,
}

impl CanonicalProfile {
    /// True only for a married or common-law applicant whose partner is declared as coming along.
    pub fn spouse_counts(&self) -> bool {
        self.marital_status
            .copied()
            .map(MaritalStatus::has_partner)
            .unwrap_or(false)
            && self.spouse_accompanying.copied().unwrap_or(false)
    }

    pub fn partnered(&self) -> bool {
        self.marital_status
            .copied()
            .map(MaritalStatus::has_partner)
            .unwrap_or(false)
    }

    /// Whether a field holds a usable value (or an explicit "does not apply").
    pub fn is_present(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Age => self.age.is_resolved(),
            ProfileField::MaritalStatus => self.marital_status.is_resolved(),
            ProfileField::SpouseAccompanying if self.partnered() => {
                self.spouse_accompanying.is_known()
            }
            ProfileField::SpouseAccompanying => self.spouse_accompanying.is_resolved(),
            ProfileField::EducationLevel => self.education_level.is_resolved(),
            ProfileField::CanadianEducation => self.canadian_education.is_resolved(),
            ProfileField::FirstOfficialLanguage => self.first_official_language.is_resolved(),
            ProfileField::SecondOfficialLanguage => self.second_official_language.is_resolved(),
            ProfileField::CanadianWorkYears => self.canadian_work_years.is_resolved(),
            ProfileField::ForeignWorkYears => self.foreign_work_years.is_resolved(),
            ProfileField::CertificateOfQualification => {
                self.certificate_of_qualification.is_resolved()
            }
            ProfileField::ProvincialNomination => self.provincial_nomination.is_resolved(),
            ProfileField::SiblingInCanada => self.sibling_in_canada.is_resolved(),
            ProfileField::SpouseEducationLevel => self.spouse_education_level.is_resolved(),
            ProfileField::SpouseLanguage => self.spouse_language.is_resolved(),
            ProfileField::SpouseCanadianWorkYears => self.spouse_canadian_work_years.is_resolved(),
        }
    }

    /// Raw text retained for a field that could not be interpreted.
    pub fn malformed_raw(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::Age => self.age.malformed_raw(),
            ProfileField::MaritalStatus => self.marital_status.malformed_raw(),
            ProfileField::SpouseAccompanying => self.spouse_accompanying.malformed_raw(),
            ProfileField::EducationLevel => self.education_level.malformed_raw(),
            ProfileField::CanadianEducation => self.canadian_education.malformed_raw(),
            ProfileField::FirstOfficialLanguage => self.first_official_language.malformed_raw(),
            ProfileField::SecondOfficialLanguage => self.second_official_language.malformed_raw(),
            ProfileField::CanadianWorkYears => self.canadian_work_years.malformed_raw(),
            ProfileField::ForeignWorkYears => self.foreign_work_years.malformed_raw(),
            ProfileField::CertificateOfQualification => {
                self.certificate_of_qualification.malformed_raw()
            }
            ProfileField::ProvincialNomination => self.provincial_nomination.malformed_raw(),
            ProfileField::SiblingInCanada => self.sibling_in_canada.malformed_raw(),
            ProfileField::SpouseEducationLevel => self.spouse_education_level.malformed_raw(),
            ProfileField::SpouseLanguage => self.spouse_language.malformed_raw(),
            ProfileField::SpouseCanadianWorkYears => {
                self.spouse_canadian_work_years.malformed_raw()
            }
        }
    }
}

/// Every field the requirement table and gap report can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Age,
    MaritalStatus,
    SpouseAccompanying,
    EducationLevel,
    CanadianEducation,
    FirstOfficialLanguage,
    SecondOfficialLanguage,
    CanadianWorkYears,
    ForeignWorkYears,
    CertificateOfQualification,
    ProvincialNomination,
    SiblingInCanada,
    SpouseEducationLevel,
    SpouseLanguage,
    SpouseCanadianWorkYears,
}

impl ProfileField {
    pub const ALL: [ProfileField; 15] = [
        ProfileField::Age,
        ProfileField::MaritalStatus,
        ProfileField::SpouseAccompanying,
        ProfileField::EducationLevel,
        ProfileField::CanadianEducation,
        ProfileField::FirstOfficialLanguage,
        ProfileField::SecondOfficialLanguage,
        ProfileField::CanadianWorkYears,
        ProfileField::ForeignWorkYears,
        ProfileField::CertificateOfQualification,
        ProfileField::ProvincialNomination,
        ProfileField::SiblingInCanada,
        ProfileField::SpouseEducationLevel,
        ProfileField::SpouseLanguage,
        ProfileField::SpouseCanadianWorkYears,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::MaritalStatus => "marital_status",
            ProfileField::SpouseAccompanying => "spouse_accompanying",
            ProfileField::EducationLevel => "education_level",
            ProfileField::CanadianEducation => "canadian_education",
            ProfileField::FirstOfficialLanguage => "first_official_language",
            ProfileField::SecondOfficialLanguage => "second_official_language",
            ProfileField::CanadianWorkYears => "canadian_work_years",
            ProfileField::ForeignWorkYears => "foreign_work_years",
            ProfileField::CertificateOfQualification => "certificate_of_qualification",
            ProfileField::ProvincialNomination => "provincial_nomination",
            ProfileField::SiblingInCanada => "sibling_in_canada",
            ProfileField::SpouseEducationLevel => "spouse_education_level",
            ProfileField::SpouseLanguage => "spouse_language",
            ProfileField::SpouseCanadianWorkYears => "spouse_canadian_work_years",
        }
    }

    /// Spouse-only fields are irrelevant unless the partner accompanies the applicant.
    pub const fn is_spouse_field(self) -> bool {
        matches!(
            self,
            ProfileField::SpouseEducationLevel
                | ProfileField::SpouseLanguage
                | ProfileField::SpouseCanadianWorkYears
        )
    }
}
