use crate::assess::{policy_engine, render_gap_report, render_score_report, render_warnings};
use crate::infra::{store_failure, InMemoryDocumentStore, InMemoryProfileStore};
use chrono::{Local, NaiveDate};
use clap::Args;
use crs_advisor::error::AppError;
use crs_advisor::workflows::eligibility::{
    AssessmentError, EligibilityService, EligibilityServiceError, ExtractedBlobs, LanguageRecord,
    ManualProfile, ProfileOverrides, StoredProfile, UploadedDocument, UserId,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for the walkthrough (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Skip the what-if override step
    #[arg(long)]
    pub(crate) skip_overrides: bool,
}

struct Applicant {
    id: &'static str,
    headline: &'static str,
    profile: StoredProfile,
    documents: Vec<UploadedDocument>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let engine = Arc::new(policy_engine()?);

    let profiles = InMemoryProfileStore::default();
    let documents = InMemoryDocumentStore::default();
    let applicants = sample_applicants();
    for applicant in &applicants {
        let user = UserId(applicant.id.to_string());
        profiles
            .insert(user.clone(), applicant.profile.clone())
            .map_err(store_failure)?;
        documents
            .insert(user, applicant.documents.clone())
            .map_err(store_failure)?;
    }
    let service = EligibilityService::new(Arc::new(profiles), Arc::new(documents), engine);

    println!("CRS eligibility walkthrough (as of {as_of})");
    for applicant in &applicants {
        let user = UserId(applicant.id.to_string());
        println!("\n== {} ({}) ==", applicant.headline, applicant.id);

        match service.requirements(&user, as_of) {
            Ok(view) => {
                render_warnings(&view.warnings);
                render_gap_report(&view.report);
            }
            Err(err) => {
                println!("  Requirements unavailable: {err}");
                continue;
            }
        }

        match service.compute(&user, None, as_of) {
            Ok(view) => render_score_report(&view.report),
            Err(EligibilityServiceError::Assessment(AssessmentError::Gating(gating))) => {
                println!("  Score withheld: {gating}");
            }
            Err(err) => println!("  Score unavailable: {err}"),
        }

        match service.document_checklist(&user, as_of) {
            Ok(requests) if requests.is_empty() => println!("Documents: nothing outstanding"),
            Ok(requests) => {
                println!("Documents to upload next");
                for request in requests {
                    println!(
                        "  - {:?} [{:?}{}]: {}",
                        request.document_type,
                        request.priority,
                        if request.required_for_score {
                            ", blocks scoring"
                        } else {
                            ""
                        },
                        request.reason
                    );
                }
            }
            Err(err) => println!("  Checklist unavailable: {err}"),
        }
    }

    if !args.skip_overrides {
        let overrides = ProfileOverrides::from_json(&json!({
            "first_official_language": {
                "test": "celpip", "speaking": 10, "listening": 10, "reading": 10, "writing": 10
            },
            "canadian_work_years": 4
        }))
        .map_err(AssessmentError::from)?;
        println!("\n== What-if: single applicant retests at CLB 10 with four years in Canada ==");
        match service.compute(&UserId("single".to_string()), Some(&overrides), as_of) {
            Ok(view) => render_score_report(&view.report),
            Err(err) => println!("  Score unavailable: {err}"),
        }
    }

    Ok(())
}

fn sample_applicants() -> Vec<Applicant> {
    let single = ManualProfile {
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
    };

    let married = ManualProfile {
        marital_status: Some("married".to_string()),
        spouse_accompanying: Some(true),
        spouse_education_level: Some("bachelors".to_string()),
        spouse_language_scores: Some(LanguageRecord::new("celpip", 5.0, 5.0, 5.0, 5.0)),
        spouse_canadian_work_years: Some(0.0),
        ..single.clone()
    };

    let documented = ManualProfile {
        age: None,
        dob: NaiveDate::from_ymd_opt(1994, 3, 14),
        marital_status: Some("single".to_string()),
        provincial_nomination: Some(true),
        ..ManualProfile::default()
    };
    let documented_blobs = ExtractedBlobs {
        education: Some(json!({ "credentials": [
            { "level": "masters", "country": "Canada" },
            { "level": "bachelors", "country": "India" }
        ] })),
        language: Some(json!({ "tests": [
            { "test_type": "CELPIP-G", "test_date": "2024-02-10",
              "speaking": 9, "listening": 10, "reading": 9, "writing": 9 }
        ] })),
        work: Some(json!({ "positions": [
            { "country": "Canada", "start_date": "2022-01-10" },
            { "country": "India", "years": 3.5 }
        ] })),
    };

    let incomplete = ManualProfile {
        language_scores: None,
        ..single.clone()
    };

    vec![
        Applicant {
            id: "single",
            headline: "Single applicant, bachelors, CLB 9, three years in Canada",
            profile: StoredProfile {
                manual: single,
                blobs: ExtractedBlobs::default(),
            },
            documents: vec![UploadedDocument::new("passport"), UploadedDocument::new("IELTS")],
        },
        Applicant {
            id: "married",
            headline: "Same applicant with an accompanying spouse",
            profile: StoredProfile {
                manual: married,
                blobs: ExtractedBlobs::default(),
            },
            documents: vec![UploadedDocument::new("passport")],
        },
        Applicant {
            id: "documented",
            headline: "Nominee whose profile comes mostly from uploaded documents",
            profile: StoredProfile {
                manual: documented,
                blobs: documented_blobs,
            },
            documents: vec![
                UploadedDocument::new("passport"),
                UploadedDocument::new("celpip"),
                UploadedDocument::new("degree"),
                UploadedDocument::new("employment letter"),
            ],
        },
        Applicant {
            id: "incomplete",
            headline: "Applicant without language results",
            profile: StoredProfile {
                manual: incomplete,
                blobs: ExtractedBlobs::default(),
            },
            documents: Vec::new(),
        },
    ]
}
