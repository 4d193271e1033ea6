use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::ProfileField;
use super::error::ConfigurationError;
use super::scoring::{CoreTableVariant, ScoreBreakdown, ScoreRule};

pub const DISCLAIMER: &str = "This estimate is guidance only. It is not a determination of \
eligibility for any immigration program; official rules and draw cut-offs change over time.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub medium_from: u16,
    pub strong_from: u16,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            medium_from: 400,
            strong_from: 470,
        }
    }
}

impl BandThresholds {
    pub fn validate(&self, program_maximum: u16) -> Result<(), ConfigurationError> {
        if self.medium_from == 0 || self.medium_from >= self.strong_from {
            return Err(ConfigurationError::PointGrid(format!(
                "band thresholds out of order: medium from {}, strong from {}",
                self.medium_from, self.strong_from
            )));
        }
        if self.strong_from > program_maximum {
            return Err(ConfigurationError::PointGrid(format!(
                "strong band starts at {} above the program maximum {program_maximum}",
                self.strong_from
            )));
        }
        Ok(())
    }

    pub fn classify(&self, total: u16) -> BandClassification {
        let band = if total >= self.strong_from {
            ScoreBand::Strong
        } else if total >= self.medium_from {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        };

        BandClassification {
            band,
            label: band.label().to_string(),
            hint: band.hint().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Low,
    Medium,
    Strong,
}

impl ScoreBand {
    pub const fn label(self) -> &'static str {
        match self {
            ScoreBand::Low => "Low",
            ScoreBand::Medium => "Medium",
            ScoreBand::Strong => "Strong",
        }
    }

    pub const fn hint(self) -> &'static str {
        match self {
            ScoreBand::Low => {
                "Below recent draw ranges. Language retests, more Canadian work or a provincial \
                 nomination move the score the most."
            }
            ScoreBand::Medium => {
                "Within reach of some category-based draws. Check whether a second official \
                 language or more work experience lifts you over recent cut-offs."
            }
            ScoreBand::Strong => {
                "Competitive with most recent general draws. Keep documents current so the \
                 profile stays valid."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandClassification {
    pub band: ScoreBand,
    pub label: String,
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarSubtotal {
    pub pillar: String,
    pub points: u16,
    pub maximum: u16,
}

/// User-facing breakdown of one score computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub total: u16,
    pub classification: BandClassification,
    pub core_table: CoreTableVariant,
    pub pillars: Vec<PillarSubtotal>,
    pub line_items: BTreeMap<ScoreRule, u16>,
    pub unscored_fields: Vec<ProfileField>,
    pub disclaimer: String,
}

/// Pillar maxima shown beside each subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PillarMaxima {
    pub core_human_capital: u16,
    pub spouse_factors: u16,
    pub skill_transferability: u16,
    pub additional_points: u16,
}

pub fn format(
    breakdown: &ScoreBreakdown,
    thresholds: &BandThresholds,
    maxima: PillarMaxima,
) -> ScoreReport {
    let pillar = |name: &str, points: u16, maximum: u16| PillarSubtotal {
        pillar: name.to_string(),
        points,
        maximum,
    };

    ScoreReport {
        total: breakdown.total,
        classification: thresholds.classify(breakdown.total),
        core_table: breakdown.core_table,
        pillars: vec![
            pillar(
                "core_human_capital",
                breakdown.core_human_capital,
                maxima.core_human_capital,
            ),
            pillar(
                "spouse_factors",
                breakdown.spouse_factors,
                maxima.spouse_factors,
            ),
            pillar(
                "skill_transferability",
                breakdown.skill_transferability,
                maxima.skill_transferability,
            ),
            pillar(
                "additional_points",
                breakdown.additional_points,
                maxima.additional_points,
            ),
        ],
        line_items: breakdown.line_items.clone(),
        unscored_fields: breakdown.unscored_fields.clone(),
        disclaimer: DISCLAIMER.to_string(),
    }
}
