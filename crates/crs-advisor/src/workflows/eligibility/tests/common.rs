use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::eligibility::aggregator::{ExtractedBlobs, LanguageRecord, ManualProfile};
use crate::workflows::eligibility::documents::UploadedDocument;
use crate::workflows::eligibility::domain::{
    CanonicalProfile, EducationLevel, LanguageResult, LanguageTest, MaritalStatus, Observed,
    SkillBands, UserId,
};
use crate::workflows::eligibility::engine::EligibilityEngine;
use crate::workflows::eligibility::repository::{
    DocumentStore, ProfileStore, StoreError, StoredProfile,
};
use crate::workflows::eligibility::service::EligibilityService;

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn engine() -> EligibilityEngine {
    EligibilityEngine::standard().expect("standard policy validates")
}

pub(super) fn clb(level: u8) -> LanguageResult {
    LanguageResult {
        test: LanguageTest::Celpip,
        bands: SkillBands::uniform(level),
        tested_on: None,
    }
}

pub(super) fn nclc(level: u8) -> LanguageResult {
    LanguageResult {
        test: LanguageTest::TefCanada,
        bands: SkillBands::uniform(level),
        tested_on: None,
    }
}

/// Age 28, bachelors, CLB 9 in every skill, single, three years of Canadian work.
pub(super) fn single_profile() -> CanonicalProfile {
    CanonicalProfile {
        age: Observed::Known(28),
        marital_status: Observed::Known(MaritalStatus::Single),
        spouse_accompanying: Observed::NotApplicable,
        education_level: Observed::Known(EducationLevel::Bachelors),
        canadian_education: Observed::Known(false),
        first_official_language: Observed::Known(clb(9)),
        second_official_language: Observed::NotApplicable,
        canadian_work_years: Observed::Known(3),
        foreign_work_years: Observed::Known(0),
        certificate_of_qualification: Observed::Known(false),
        provincial_nomination: Observed::Known(false),
        sibling_in_canada: Observed::Known(false),
        ..CanonicalProfile::default()
    }
}

/// Same applicant, married, with an accompanying spouse holding a bachelors and CLB 5.
pub(super) fn married_profile() -> CanonicalProfile {
    CanonicalProfile {
        marital_status: Observed::Known(MaritalStatus::Married),
        spouse_accompanying: Observed::Known(true),
        spouse_education_level: Observed::Known(EducationLevel::Bachelors),
        spouse_language: Observed::Known(clb(5)),
        spouse_canadian_work_years: Observed::Known(0),
        ..single_profile()
    }
}

pub(super) fn manual_single() -> ManualProfile {
    ManualProfile {
        age: Some(28),
        marital_status: Some("single".to_string()),
        education_level: Some("Bachelor's degree".to_string()),
        canadian_education: Some(false),
        language_scores: Some(LanguageRecord::new("IELTS", 7.0, 8.0, 7.0, 7.0)),
        has_second_language: Some(false),
        canadian_work_years: Some(3.0),
        foreign_work_years: Some(0.0),
        certificate_of_qualification: Some(false),
        provincial_nomination: Some(false),
        sibling_in_canada: Some(false),
        ..ManualProfile::default()
    }
}

pub(super) fn stored(manual: ManualProfile) -> StoredProfile {
    StoredProfile {
        manual,
        blobs: ExtractedBlobs::default(),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProfiles {
    records: Arc<Mutex<HashMap<UserId, StoredProfile>>>,
}

impl MemoryProfiles {
    pub(super) fn with(self, user: &str, profile: StoredProfile) -> Self {
        self.records
            .lock()
            .expect("profile mutex poisoned")
            .insert(UserId(user.to_string()), profile);
        self
    }
}

impl ProfileStore for MemoryProfiles {
    fn fetch(&self, user: &UserId) -> Result<Option<StoredProfile>, StoreError> {
        let guard = self.records.lock().expect("profile mutex poisoned");
        Ok(guard.get(user).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDocuments {
    records: Arc<Mutex<HashMap<UserId, Vec<UploadedDocument>>>>,
}

impl MemoryDocuments {
    pub(super) fn with(self, user: &str, documents: Vec<UploadedDocument>) -> Self {
        self.records
            .lock()
            .expect("document mutex poisoned")
            .insert(UserId(user.to_string()), documents);
        self
    }
}

impl DocumentStore for MemoryDocuments {
    fn documents(&self, user: &UserId) -> Result<Vec<UploadedDocument>, StoreError> {
        let guard = self.records.lock().expect("document mutex poisoned");
        Ok(guard.get(user).cloned().unwrap_or_default())
    }
}

pub(super) struct OfflineProfiles;

impl ProfileStore for OfflineProfiles {
    fn fetch(&self, _user: &UserId) -> Result<Option<StoredProfile>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> EligibilityService<MemoryProfiles, MemoryDocuments> {
    let profiles = MemoryProfiles::default()
        .with("ready", stored(manual_single()))
        .with(
            "incomplete",
            stored(ManualProfile {
                language_scores: None,
                ..manual_single()
            }),
        );
    let documents = MemoryDocuments::default().with(
        "ready",
        vec![UploadedDocument::new("IELTS"), UploadedDocument::new("passport")],
    );
    EligibilityService::new(Arc::new(profiles), Arc::new(documents), Arc::new(engine()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
