use chrono::NaiveDate;
use crs_advisor::workflows::eligibility::{
    DocumentStore, ProfileStore, StoreError, StoredProfile, UploadedDocument, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn poisoned(store: &str) -> StoreError {
    StoreError::Unavailable(format!("{store} lock poisoned"))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileStore {
    records: Arc<Mutex<HashMap<UserId, StoredProfile>>>,
}

impl InMemoryProfileStore {
    pub(crate) fn insert(&self, user: UserId, profile: StoredProfile) -> Result<(), StoreError> {
        let mut guard = self.records.lock().map_err(|_| poisoned("profile store"))?;
        guard.insert(user, profile);
        Ok(())
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn fetch(&self, user: &UserId) -> Result<Option<StoredProfile>, StoreError> {
        let guard = self.records.lock().map_err(|_| poisoned("profile store"))?;
        Ok(guard.get(user).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentStore {
    records: Arc<Mutex<HashMap<UserId, Vec<UploadedDocument>>>>,
}

impl InMemoryDocumentStore {
    pub(crate) fn insert(
        &self,
        user: UserId,
        documents: Vec<UploadedDocument>,
    ) -> Result<(), StoreError> {
        let mut guard = self.records.lock().map_err(|_| poisoned("document store"))?;
        guard.insert(user, documents);
        Ok(())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn documents(&self, user: &UserId) -> Result<Vec<UploadedDocument>, StoreError> {
        let guard = self.records.lock().map_err(|_| poisoned("document store"))?;
        Ok(guard.get(user).cloned().unwrap_or_default())
    }
}

/// One preloaded user: the stored profile plus the uploaded document inventory.
#[derive(Debug, Deserialize)]
pub(crate) struct SeedUser {
    #[serde(flatten)]
    pub(crate) profile: StoredProfile,
    #[serde(default)]
    pub(crate) documents: Vec<UploadedDocument>,
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, crs_advisor::error::AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Load `{ user_id: SeedUser }` into the in-memory stores; returns the number of users.
pub(crate) fn seed_stores(
    path: &Path,
    profiles: &InMemoryProfileStore,
    documents: &InMemoryDocumentStore,
) -> Result<usize, crs_advisor::error::AppError> {
    let users: HashMap<String, SeedUser> = read_json(path)?;
    let count = users.len();
    for (user, seed) in users {
        let user = UserId(user);
        profiles
            .insert(user.clone(), seed.profile)
            .map_err(store_failure)?;
        documents
            .insert(user, seed.documents)
            .map_err(store_failure)?;
    }
    Ok(count)
}

pub(crate) fn store_failure(err: StoreError) -> crs_advisor::error::AppError {
    crs_advisor::error::AppError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        err.to_string(),
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crs_advisor::workflows::eligibility::ManualProfile;

    #[test]
    fn stores_round_trip_by_user() {
        let profiles = InMemoryProfileStore::default();
        let documents = InMemoryDocumentStore::default();
        let user = UserId("u-1".to_string());
        let stored = StoredProfile {
            manual: ManualProfile {
                age: Some(30),
                ..ManualProfile::default()
            },
            ..StoredProfile::default()
        };

        profiles.insert(user.clone(), stored.clone()).expect("insert");
        documents
            .insert(user.clone(), vec![UploadedDocument::new("passport")])
            .expect("insert");

        assert_eq!(profiles.fetch(&user).expect("fetch"), Some(stored));
        assert_eq!(documents.documents(&user).expect("documents").len(), 1);
        assert!(documents
            .documents(&UserId("other".to_string()))
            .expect("documents")
            .is_empty());
    }

    #[test]
    fn seed_file_populates_both_stores() {
        let path = std::env::temp_dir().join(format!("crs-seed-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{
                "alice": {
                    "manual": { "age": 29, "marital_status": "single" },
                    "documents": [{ "type_detected": "Passport", "expires_on": "2031-01-01" }]
                }
            }"#,
        )
        .expect("write seed");

        let profiles = InMemoryProfileStore::default();
        let documents = InMemoryDocumentStore::default();
        let count = seed_stores(&path, &profiles, &documents).expect("seed loads");
        fs::remove_file(&path).ok();

        let alice = UserId("alice".to_string());
        assert_eq!(count, 1);
        let stored = profiles.fetch(&alice).expect("fetch").expect("alice stored");
        assert_eq!(stored.manual.age, Some(29));
        assert_eq!(documents.documents(&alice).expect("documents").len(), 1);
    }

    #[test]
    fn parse_date_reports_bad_input() {
        assert_eq!(
            parse_date(" 2025-06-01 "),
            Ok(NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"))
        );
        assert!(parse_date("June 1st").is_err());
    }
}
