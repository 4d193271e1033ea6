use tracing::info;

use crate::config::PolicyConfig;

use super::band::{self, BandClassification, BandThresholds, PillarMaxima, ScoreReport};
use super::domain::CanonicalProfile;
use super::error::{AssessmentError, ConfigurationError, GatingError};
use super::requirements::{GapReport, RequirementSpec};
use super::scoring::{self, PointGrid, ProfileOverrides, ScoreBreakdown, ScoringEngine};

/// Requirement table, point grid and band thresholds, validated together and then frozen.
#[derive(Debug, Clone)]
pub struct EligibilityEngine {
    requirements: RequirementSpec,
    scoring: ScoringEngine,
    thresholds: BandThresholds,
}

impl EligibilityEngine {
    pub fn new(
        requirements: RequirementSpec,
        grid: PointGrid,
        thresholds: BandThresholds,
    ) -> Result<Self, ConfigurationError> {
        requirements.validate()?;
        grid.validate()?;
        thresholds.validate(grid.program_maximum)?;

        Ok(Self {
            requirements,
            scoring: ScoringEngine::new(grid),
            thresholds,
        })
    }

    /// Built-in tables and default thresholds.
    pub fn standard() -> Result<Self, ConfigurationError> {
        Self::new(
            RequirementSpec::standard(),
            PointGrid::standard(),
            BandThresholds::default(),
        )
    }

    /// Built-in tables and thresholds, replaced wherever the policy config names an override.
    pub fn from_policy(policy: &PolicyConfig) -> Result<Self, ConfigurationError> {
        let requirements = match &policy.requirements_path {
            Some(path) => {
                info!(path = %path.display(), "loading requirement table");
                RequirementSpec::load(path)?
            }
            None => RequirementSpec::standard(),
        };
        let grid = match &policy.point_grid_path {
            Some(path) => {
                info!(path = %path.display(), "loading point grid");
                PointGrid::load(path)?
            }
            None => PointGrid::standard(),
        };
        let defaults = BandThresholds::default();
        let thresholds = BandThresholds {
            medium_from: policy.medium_from.unwrap_or(defaults.medium_from),
            strong_from: policy.strong_from.unwrap_or(defaults.strong_from),
        };
        Self::new(requirements, grid, thresholds)
    }

    pub fn requirements(&self) -> &RequirementSpec {
        &self.requirements
    }

    pub fn grid(&self) -> &PointGrid {
        self.scoring.grid()
    }

    pub fn thresholds(&self) -> &BandThresholds {
        &self.thresholds
    }

    pub fn analyze(&self, profile: &CanonicalProfile) -> GapReport {
        self.requirements.analyze(profile)
    }

    /// Validate overrides, apply them, gate on the requirement table, then score.
    pub fn score(
        &self,
        profile: &CanonicalProfile,
        overrides: Option<&ProfileOverrides>,
    ) -> Result<ScoreBreakdown, AssessmentError> {
        let patched;
        let profile = match overrides {
            Some(overrides) if !overrides.is_empty() => {
                patched = overrides.apply(profile);
                &patched
            }
            _ => profile,
        };

        scoring::check_domain(profile)?;

        let report = self.requirements.analyze(profile);
        if !report.can_calculate {
            return Err(GatingError::new(report).into());
        }

        Ok(self.scoring.score(profile))
    }

    pub fn classify(&self, total: u16) -> BandClassification {
        self.thresholds.classify(total)
    }

    pub fn report(&self, breakdown: &ScoreBreakdown) -> ScoreReport {
        band::format(breakdown, &self.thresholds, self.pillar_maxima(breakdown))
    }

    fn pillar_maxima(&self, breakdown: &ScoreBreakdown) -> PillarMaxima {
        let grid = self.scoring.grid();
        let with_spouse = breakdown.core_table == scoring::CoreTableVariant::WithSpouse;
        PillarMaxima {
            core_human_capital: grid.core_table(with_spouse).cap,
            spouse_factors: if with_spouse { grid.spouse.cap } else { 0 },
            skill_transferability: grid.transferability.ceiling,
            additional_points: grid.additional.cap,
        }
    }
}
