use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::ProfileField;
use super::requirements::{DocumentType, GapReport, MissingField, Priority};

/// Inventory entry for a document the user already uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub type_detected: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub issued_on: Option<NaiveDate>,
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,
}

impl UploadedDocument {
    pub fn new(type_detected: impl Into<String>) -> Self {
        Self {
            type_detected: type_detected.into(),
            payload: Value::Null,
            issued_on: None,
            expires_on: None,
        }
    }

    pub fn document_type(&self) -> Option<DocumentType> {
        DocumentType::from_label(&self.type_detected)
    }

    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.expires_on.map(|expiry| expiry < as_of).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentPriority {
    High,
    Medium,
}

/// One document the user should upload next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub document_type: DocumentType,
    pub priority: DocumentPriority,
    pub required_for_score: bool,
    pub reason: String,
    pub fields: Vec<ProfileField>,
}

/// Prioritised, de-duplicated upload list. A valid passport always comes first when absent.
pub fn checklist(
    report: &GapReport,
    uploaded: &[UploadedDocument],
    as_of: NaiveDate,
) -> Vec<DocumentRequest> {
    let on_file: BTreeSet<DocumentType> = uploaded
        .iter()
        .filter(|document| !document.is_expired(as_of))
        .filter_map(UploadedDocument::document_type)
        .collect();

    let mut requests: Vec<DocumentRequest> = Vec::new();

    if !on_file.contains(&DocumentType::Passport) {
        let expired = uploaded
            .iter()
            .filter(|document| document.document_type() == Some(DocumentType::Passport))
            .filter_map(|document| document.expires_on)
            .max();
        let reason = match expired {
            Some(expiry) => format!("the passport on file expired on {expiry}; upload a valid one"),
            None => "a valid passport confirms identity and date of birth".to_string(),
        };
        requests.push(DocumentRequest {
            document_type: DocumentType::Passport,
            priority: DocumentPriority::High,
            required_for_score: true,
            reason,
            fields: Vec::new(),
        });
    }

    for missing in report
        .missing_required
        .iter()
        .chain(report.missing_optional.iter())
    {
        if missing
            .source_documents
            .iter()
            .any(|document| on_file.contains(document))
        {
            continue;
        }
        let Some(document_type) = missing.source_documents.first().copied() else {
            continue;
        };
        merge(&mut requests, document_type, missing);
    }

    requests.sort_by_key(|request| (request.priority, !request.required_for_score));
    requests
}

fn merge(requests: &mut Vec<DocumentRequest>, document_type: DocumentType, missing: &MissingField) {
    let required = missing.priority == Priority::Required;
    let priority = if required {
        DocumentPriority::High
    } else {
        DocumentPriority::Medium
    };

    match requests
        .iter_mut()
        .find(|request| request.document_type == document_type)
    {
        Some(request) => {
            request.priority = request.priority.min(priority);
            request.required_for_score |= required;
            if !request.fields.contains(&missing.field) {
                request.fields.push(missing.field);
            }
        }
        None => requests.push(DocumentRequest {
            document_type,
            priority,
            required_for_score: required,
            reason: format!("{}: {}", missing.label, missing.reason),
            fields: vec![missing.field],
        }),
    }
}
