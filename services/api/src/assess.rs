use crate::infra::read_json;
use chrono::{Local, NaiveDate};
use clap::Args;
use crs_advisor::config::AppConfig;
use crs_advisor::error::AppError;
use crs_advisor::workflows::eligibility::{
    aggregate, AggregationWarning, AssessmentError, BandClassification, EligibilityEngine,
    GapReport, ProfileOverrides, ScoreReport, StoredProfile,
};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Stored profile JSON (`{ "manual": {..}, "blobs": {..} }`)
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// What-if overrides JSON applied for this computation only
    #[arg(long)]
    pub(crate) overrides: Option<PathBuf>,
    /// Reference date for age and open-ended positions (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Print the breakdown and report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Stored profile JSON (`{ "manual": {..}, "blobs": {..} }`)
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// Reference date for age and open-ended positions (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// CRS total to classify
    pub(crate) total: u16,
}

pub(crate) fn policy_engine() -> Result<EligibilityEngine, AppError> {
    let config = AppConfig::load()?;
    Ok(EligibilityEngine::from_policy(&config.policy)?)
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        profile,
        overrides,
        as_of,
        json,
    } = args;

    let engine = policy_engine()?;
    let stored: StoredProfile = read_json(&profile)?;
    let overrides = match overrides {
        Some(path) => {
            let raw: Value = read_json(&path)?;
            Some(ProfileOverrides::from_json(&raw).map_err(AssessmentError::from)?)
        }
        None => None,
    };

    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let aggregated = aggregate(&stored.manual, &stored.blobs, as_of);

    let breakdown = match engine.score(&aggregated.profile, overrides.as_ref()) {
        Ok(breakdown) => breakdown,
        Err(AssessmentError::Gating(gating)) => {
            render_warnings(&aggregated.warnings);
            render_gap_report(&gating.report);
            return Err(AssessmentError::Gating(gating).into());
        }
        Err(err) => return Err(err.into()),
    };
    let report = engine.report(&breakdown);

    if json {
        let payload = json!({
            "breakdown": breakdown,
            "report": report,
            "warnings": aggregated.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        render_warnings(&aggregated.warnings);
        render_score_report(&report);
    }
    Ok(())
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let engine = policy_engine()?;
    let stored: StoredProfile = read_json(&args.profile)?;
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let aggregated = aggregate(&stored.manual, &stored.blobs, as_of);

    render_warnings(&aggregated.warnings);
    render_gap_report(&engine.analyze(&aggregated.profile));
    Ok(())
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let engine = policy_engine()?;
    render_classification(args.total, &engine.classify(args.total));
    Ok(())
}

pub(crate) fn render_warnings(warnings: &[AggregationWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("Profile warnings");
    for warning in warnings {
        println!("  - {}: {}", warning.field.name(), warning.message);
    }
}

pub(crate) fn render_gap_report(report: &GapReport) {
    println!(
        "Profile completion: {}% | score available: {}",
        report.completion_percentage,
        if report.can_calculate { "yes" } else { "no" }
    );
    if report.missing_required.is_empty() && report.missing_optional.is_empty() {
        println!("  Nothing missing");
        return;
    }
    for (heading, missing) in [
        ("Required before scoring", &report.missing_required),
        ("Would refine the score", &report.missing_optional),
    ] {
        if missing.is_empty() {
            continue;
        }
        println!("{heading}");
        for field in missing {
            let documents: Vec<String> = field
                .source_documents
                .iter()
                .map(|document| format!("{document:?}"))
                .collect();
            println!(
                "  - {} ({}): {} [documents: {}]",
                field.label,
                field.field.name(),
                field.reason,
                documents.join(", ")
            );
        }
    }
}

pub(crate) fn render_score_report(report: &ScoreReport) {
    println!(
        "CRS estimate: {} ({})",
        report.total, report.classification.label
    );
    for pillar in &report.pillars {
        println!(
            "  {:<24} {:>4} / {}",
            pillar.pillar, pillar.points, pillar.maximum
        );
    }
    println!("Line items");
    for (rule, points) in &report.line_items {
        println!("  {:<34} {:>4}", rule.name(), points);
    }
    if !report.unscored_fields.is_empty() {
        let names: Vec<&str> = report.unscored_fields.iter().map(|field| field.name()).collect();
        println!("Scored as zero until provided: {}", names.join(", "));
    }
    println!("{}", report.classification.hint);
    println!("{}", report.disclaimer);
}

pub(crate) fn render_classification(total: u16, classification: &BandClassification) {
    println!("{total}: {}", classification.label);
    println!("{}", classification.hint);
}
