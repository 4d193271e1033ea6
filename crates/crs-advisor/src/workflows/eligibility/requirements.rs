use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{CanonicalProfile, ProfileField};
use super::error::ConfigurationError;
use super::normalizer::normalize_label;

/// Scoring pillar a requirement feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    Core,
    Spouse,
    Transferability,
    Additional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Required,
    Optional,
}

/// Document kinds that can satisfy a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    LanguageTest,
    Ielts,
    Celpip,
    PteCore,
    TefCanada,
    TcfCanada,
    EducationCredential,
    Degree,
    Diploma,
    Transcript,
    EmploymentLetter,
    WorkReference,
    WorkPermit,
    PayStubs,
    ProvincialNomination,
    CertificateOfQualification,
    SiblingStatusProof,
    MarriageCertificate,
    CommonLawDeclaration,
}

const DOCUMENT_LABELS: &[(&str, DocumentType)] = &[
    ("passport", DocumentType::Passport),
    ("language test", DocumentType::LanguageTest),
    ("language test result", DocumentType::LanguageTest),
    ("ielts", DocumentType::Ielts),
    ("celpip", DocumentType::Celpip),
    ("pte", DocumentType::PteCore),
    ("pte core", DocumentType::PteCore),
    ("tef", DocumentType::TefCanada),
    ("tef canada", DocumentType::TefCanada),
    ("tcf", DocumentType::TcfCanada),
    ("tcf canada", DocumentType::TcfCanada),
    ("education credential", DocumentType::EducationCredential),
    ("eca", DocumentType::EducationCredential),
    ("degree", DocumentType::Degree),
    ("diploma", DocumentType::Diploma),
    ("transcript", DocumentType::Transcript),
    ("employment letter", DocumentType::EmploymentLetter),
    ("work reference", DocumentType::WorkReference),
    ("reference letter", DocumentType::WorkReference),
    ("work permit", DocumentType::WorkPermit),
    ("pay stubs", DocumentType::PayStubs),
    ("pay stub", DocumentType::PayStubs),
    ("provincial nomination", DocumentType::ProvincialNomination),
    ("certificate of qualification", DocumentType::CertificateOfQualification),
    ("sibling documents", DocumentType::SiblingStatusProof),
    ("sibling status proof", DocumentType::SiblingStatusProof),
    ("marriage certificate", DocumentType::MarriageCertificate),
    ("common law declaration", DocumentType::CommonLawDeclaration),
];

impl DocumentType {
    pub const LANGUAGE_TESTS: [DocumentType; 6] = [
        DocumentType::LanguageTest,
        DocumentType::Ielts,
        DocumentType::Celpip,
        DocumentType::PteCore,
        DocumentType::TefCanada,
        DocumentType::TcfCanada,
    ];

    /// Resolve a detected document type label, e.g. `"Employment-Letter"`.
    pub fn from_label(raw: &str) -> Option<Self> {
        let key = normalize_label(raw);
        DOCUMENT_LABELS
            .iter()
            .find(|(label, _)| *label == key)
            .map(|(_, kind)| *kind)
    }

    pub fn is_language_test(self) -> bool {
        Self::LANGUAGE_TESTS.contains(&self)
    }
}

/// One row of the requirement table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub field: ProfileField,
    pub required_for_minimum_score: bool,
    pub category: RequirementCategory,
    pub label: String,
    pub reason: String,
    pub source_documents: Vec<DocumentType>,
}

/// Static field table. Built once and validated before the first request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSpec {
    entries: Vec<RequirementEntry>,
}

/// Gap annotation for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingField {
    pub field: ProfileField,
    pub label: String,
    pub priority: Priority,
    pub reason: String,
    pub source_documents: Vec<DocumentType>,
}

/// What is present, what blocks scoring, and what would refine it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    pub can_calculate: bool,
    pub is_complete: bool,
    pub missing_required: Vec<MissingField>,
    pub missing_optional: Vec<MissingField>,
    pub available_fields: Vec<ProfileField>,
    pub completion_percentage: u8,
}

impl GapReport {
    pub fn is_missing(&self, field: ProfileField) -> bool {
        self.missing_required
            .iter()
            .chain(self.missing_optional.iter())
            .any(|missing| missing.field == field)
    }
}

fn entry(
    field: ProfileField,
    required: bool,
    category: RequirementCategory,
    label: &str,
    reason: &str,
    source_documents: &[DocumentType],
) -> RequirementEntry {
    RequirementEntry {
        field,
        required_for_minimum_score: required,
        category,
        label: label.to_string(),
        reason: reason.to_string(),
        source_documents: source_documents.to_vec(),
    }
}

impl RequirementSpec {
    pub fn new(entries: Vec<RequirementEntry>) -> Result<Self, ConfigurationError> {
        let spec = Self { entries };
        spec.validate()?;
        Ok(spec)
    }

    /// Built-in CRS requirement table.
    pub fn standard() -> Self {
        use DocumentType as D;
        use ProfileField as F;
        use RequirementCategory as C;

        let language = DocumentType::LANGUAGE_TESTS;
        let education = [D::EducationCredential, D::Degree, D::Diploma, D::Transcript];
        let partner = [D::MarriageCertificate, D::CommonLawDeclaration];

        Self {
            entries: vec![
                entry(
                    F::Age,
                    true,
                    C::Core,
                    "Age",
                    "needed for age points; read from the date of birth on your passport",
                    &[D::Passport],
                ),
                entry(
                    F::MaritalStatus,
                    true,
                    C::Core,
                    "Marital status",
                    "selects the single or with-spouse point table",
                    &partner,
                ),
                entry(
                    F::SpouseAccompanying,
                    true,
                    C::Spouse,
                    "Spouse or partner accompanying",
                    "decides whether your partner's factors are scored alongside yours",
                    &partner,
                ),
                entry(
                    F::EducationLevel,
                    true,
                    C::Core,
                    "Highest education level",
                    "needed for education points",
                    &education,
                ),
                entry(
                    F::CanadianEducation,
                    false,
                    C::Additional,
                    "Canadian education",
                    "a Canadian post-secondary credential adds bonus points",
                    &[D::Transcript, D::Degree, D::Diploma],
                ),
                entry(
                    F::FirstOfficialLanguage,
                    true,
                    C::Core,
                    "First official language test",
                    "all four skill results are needed for language points",
                    &language,
                ),
                entry(
                    F::SecondOfficialLanguage,
                    false,
                    C::Additional,
                    "Second official language test",
                    "a second official language adds bonus points",
                    &language,
                ),
                entry(
                    F::CanadianWorkYears,
                    false,
                    C::Core,
                    "Canadian work experience",
                    "Canadian skilled work experience adds significant points",
                    &[D::EmploymentLetter, D::WorkPermit, D::PayStubs, D::WorkReference],
                ),
                entry(
                    F::ForeignWorkYears,
                    false,
                    C::Transferability,
                    "Foreign work experience",
                    "foreign work experience adds skill transferability points",
                    &[D::WorkReference, D::EmploymentLetter],
                ),
                entry(
                    F::CertificateOfQualification,
                    false,
                    C::Additional,
                    "Certificate of qualification",
                    "a provincial trade certificate adds points",
                    &[D::CertificateOfQualification],
                ),
                entry(
                    F::ProvincialNomination,
                    false,
                    C::Additional,
                    "Provincial nomination",
                    "a provincial nomination adds 600 points",
                    &[D::ProvincialNomination],
                ),
                entry(
                    F::SiblingInCanada,
                    false,
                    C::Additional,
                    "Sibling in Canada",
                    "a sibling who is a citizen or permanent resident adds points",
                    &[D::SiblingStatusProof],
                ),
                entry(
                    F::SpouseEducationLevel,
                    true,
                    C::Spouse,
                    "Spouse education level",
                    "needed for spouse education points",
                    &education,
                ),
                entry(
                    F::SpouseLanguage,
                    true,
                    C::Spouse,
                    "Spouse language test",
                    "needed for spouse language points",
                    &language,
                ),
                entry(
                    F::SpouseCanadianWorkYears,
                    false,
                    C::Spouse,
                    "Spouse Canadian work experience",
                    "your partner's Canadian work experience adds points",
                    &[D::EmploymentLetter, D::WorkPermit, D::PayStubs],
                ),
            ],
        }
    }

    /// Read a replacement table from JSON. Any inconsistency is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: display.clone(),
            source,
        })?;
        let spec: RequirementSpec =
            serde_json::from_str(&raw).map_err(|source| ConfigurationError::Parse {
                path: display,
                source,
            })?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn entries(&self) -> &[RequirementEntry] {
        &self.entries
    }

    pub fn entry(&self, field: ProfileField) -> Option<&RequirementEntry> {
        self.entries.iter().find(|entry| entry.field == field)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = BTreeSet::new();
        for entry in &self.entries {
            let name = entry.field.name();
            if !seen.insert(entry.field) {
                return Err(invalid(format!("{name} is listed more than once")));
            }
            if entry.label.trim().is_empty() {
                return Err(invalid(format!("{name} has an empty label")));
            }
            if entry.source_documents.is_empty() {
                return Err(invalid(format!("{name} names no source document")));
            }
            if entry.required_for_minimum_score
                && !matches!(
                    entry.category,
                    RequirementCategory::Core | RequirementCategory::Spouse
                )
            {
                return Err(invalid(format!(
                    "{name} is required but sits in the {:?} category",
                    entry.category
                )));
            }
            let spouse_field =
                entry.field.is_spouse_field() || entry.field == ProfileField::SpouseAccompanying;
            if spouse_field != (entry.category == RequirementCategory::Spouse) {
                return Err(invalid(format!(
                    "{name} is in the {:?} category",
                    entry.category
                )));
            }
        }

        if let Some(absent) = ProfileField::ALL
            .iter()
            .find(|field| !seen.contains(*field))
        {
            return Err(invalid(format!("{} has no entry", absent.name())));
        }

        Ok(())
    }

    /// Build the gap report from scratch; nothing is carried between calls.
    pub fn analyze(&self, profile: &CanonicalProfile) -> GapReport {
        let mut missing_required = Vec::new();
        let mut missing_optional = Vec::new();
        let mut available_fields = Vec::new();
        let mut required_applicable: u32 = 0;
        let mut required_present: u32 = 0;

        for entry in &self.entries {
            if !applies(entry.field, profile) {
                continue;
            }

            let present = profile.is_present(entry.field);
            if entry.required_for_minimum_score {
                required_applicable += 1;
                if present {
                    required_present += 1;
                }
            }

            if present {
                available_fields.push(entry.field);
                continue;
            }

            let priority = if entry.required_for_minimum_score {
                Priority::Required
            } else {
                Priority::Optional
            };
            let reason = match profile.malformed_raw(entry.field) {
                Some(raw) => format!("could not interpret '{raw}'; {}", entry.reason),
                None => entry.reason.clone(),
            };
            let missing = MissingField {
                field: entry.field,
                label: entry.label.clone(),
                priority,
                reason,
                source_documents: entry.source_documents.clone(),
            };

            match priority {
                Priority::Required => missing_required.push(missing),
                Priority::Optional => missing_optional.push(missing),
            }
        }

        let can_calculate = missing_required.is_empty();
        let is_complete = can_calculate && missing_optional.is_empty();
        let completion_percentage = if required_applicable == 0 {
            100
        } else {
            ((required_present * 100 + required_applicable / 2) / required_applicable) as u8
        };

        GapReport {
            can_calculate,
            is_complete,
            missing_required,
            missing_optional,
            available_fields,
            completion_percentage,
        }
    }
}

impl Default for RequirementSpec {
    fn default() -> Self {
        Self::standard()
    }
}

fn invalid(message: String) -> ConfigurationError {
    ConfigurationError::Requirements(message)
}

/// Whether the applicant's declared situation makes the field relevant at all.
fn applies(field: ProfileField, profile: &CanonicalProfile) -> bool {
    match field {
        ProfileField::SpouseAccompanying => profile.partnered(),
        field if field.is_spouse_field() => profile.spouse_counts(),
        _ => true,
    }
}
