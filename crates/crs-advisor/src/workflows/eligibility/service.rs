use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::aggregator::{aggregate, AggregatedProfile, AggregationWarning};
use super::band::ScoreReport;
use super::documents::{checklist, DocumentRequest};
use super::domain::UserId;
use super::engine::EligibilityEngine;
use super::error::AssessmentError;
use super::repository::{DocumentStore, ProfileStore, StoreError};
use super::requirements::GapReport;
use super::scoring::{ProfileOverrides, ScoreBreakdown};

/// Gap report together with what the aggregator had to discard or override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsView {
    pub user_id: UserId,
    pub report: GapReport,
    pub warnings: Vec<AggregationWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationView {
    pub user_id: UserId,
    pub breakdown: ScoreBreakdown,
    pub report: ScoreReport,
    pub warnings: Vec<AggregationWarning>,
}

/// Composes the stores with the shared, immutable engine per user request.
pub struct EligibilityService<P, D> {
    profiles: Arc<P>,
    documents: Arc<D>,
    engine: Arc<EligibilityEngine>,
}

impl<P, D> EligibilityService<P, D>
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(profiles: Arc<P>, documents: Arc<D>, engine: Arc<EligibilityEngine>) -> Self {
        Self {
            profiles,
            documents,
            engine,
        }
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    fn profile(
        &self,
        user: &UserId,
        as_of: NaiveDate,
    ) -> Result<AggregatedProfile, EligibilityServiceError> {
        let stored = self
            .profiles
            .fetch(user)?
            .ok_or_else(|| EligibilityServiceError::UnknownUser(user.clone()))?;
        let aggregated = aggregate(&stored.manual, &stored.blobs, as_of);
        if !aggregated.warnings.is_empty() {
            debug!(
                user = %user.0,
                warnings = aggregated.warnings.len(),
                "profile aggregated with warnings"
            );
        }
        Ok(aggregated)
    }

    /// What is present, missing and blocking for this user.
    pub fn requirements(
        &self,
        user: &UserId,
        as_of: NaiveDate,
    ) -> Result<RequirementsView, EligibilityServiceError> {
        let aggregated = self.profile(user, as_of)?;
        let report = self.engine.analyze(&aggregated.profile);

        info!(
            user = %user.0,
            can_calculate = report.can_calculate,
            completion = report.completion_percentage,
            "requirements analysed"
        );

        Ok(RequirementsView {
            user_id: user.clone(),
            report,
            warnings: aggregated.warnings,
        })
    }

    /// Score the stored profile, optionally under a what-if patch that is never persisted.
    pub fn compute(
        &self,
        user: &UserId,
        overrides: Option<&ProfileOverrides>,
        as_of: NaiveDate,
    ) -> Result<ComputationView, EligibilityServiceError> {
        let aggregated = self.profile(user, as_of)?;
        let breakdown = self.engine.score(&aggregated.profile, overrides)?;
        let report = self.engine.report(&breakdown);

        info!(
            user = %user.0,
            total = breakdown.total,
            band = report.classification.label.as_str(),
            overrides = overrides.is_some(),
            "score computed"
        );

        Ok(ComputationView {
            user_id: user.clone(),
            breakdown,
            report,
            warnings: aggregated.warnings,
        })
    }

    pub fn document_checklist(
        &self,
        user: &UserId,
        as_of: NaiveDate,
    ) -> Result<Vec<DocumentRequest>, EligibilityServiceError> {
        let aggregated = self.profile(user, as_of)?;
        let report = self.engine.analyze(&aggregated.profile);
        let uploaded = self.documents.documents(user)?;
        Ok(checklist(&report, &uploaded, as_of))
    }
}

/// Error raised by the eligibility service.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityServiceError {
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no profile stored for user {0}")]
    UnknownUser(UserId),
}
