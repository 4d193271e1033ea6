//! CRS eligibility assessment: merge the applicant profile, decide whether a score may be
//! computed, compute it pillar by pillar and classify the result.

pub mod aggregator;
pub mod band;
pub mod documents;
pub mod domain;
pub mod engine;
pub mod error;
pub mod language;
pub(crate) mod normalizer;
pub mod repository;
pub mod requirements;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use aggregator::{
    aggregate, AggregatedProfile, AggregationWarning, ExtractedBlobs, LanguageRecord,
    ManualProfile,
};
pub use band::{BandClassification, BandThresholds, PillarSubtotal, ScoreBand, ScoreReport};
pub use documents::{checklist, DocumentPriority, DocumentRequest, UploadedDocument};
pub use domain::{
    CanonicalProfile, EducationLevel, LanguageResult, LanguageSkill, LanguageTest,
    MaritalStatus, Observed, OfficialLanguage, ProfileField, SkillBands, UserId,
};
pub use engine::EligibilityEngine;
pub use error::{AssessmentError, ConfigurationError, GatingError, ValidationError};
pub use repository::{DocumentStore, ProfileStore, StoreError, StoredProfile};
pub use requirements::{
    DocumentType, GapReport, MissingField, Priority, RequirementCategory, RequirementEntry,
    RequirementSpec,
};
pub use router::eligibility_router;
pub use scoring::{CoreTableVariant, PointGrid, ProfileOverrides, ScoreBreakdown, ScoreRule};
pub use service::{
    ComputationView, EligibilityService, EligibilityServiceError, RequirementsView,
};
