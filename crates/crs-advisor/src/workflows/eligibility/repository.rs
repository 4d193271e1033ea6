use serde::{Deserialize, Serialize};

use super::aggregator::{ExtractedBlobs, ManualProfile};
use super::documents::UploadedDocument;
use super::domain::UserId;

/// Persisted profile: the manual form record plus the raw extraction blobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredProfile {
    #[serde(default)]
    pub manual: ManualProfile,
    #[serde(default)]
    pub blobs: ExtractedBlobs,
}

/// Read access to stored profiles so the service can run without a database.
pub trait ProfileStore: Send + Sync {
    fn fetch(&self, user: &UserId) -> Result<Option<StoredProfile>, StoreError>;
}

/// Read access to the uploaded document inventory.
pub trait DocumentStore: Send + Sync {
    fn documents(&self, user: &UserId) -> Result<Vec<UploadedDocument>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
