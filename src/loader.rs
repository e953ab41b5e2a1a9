use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::models::Job;

/// A posting as it appears in the scraped data file.
#[derive(Debug, Deserialize)]
struct RawJob {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Primary Description")]
    primary_description: Option<String>,
    #[serde(rename = "Detail URL")]
    detail_url: Option<String>,
    #[serde(rename = "Location")]
    location: Option<String>,
    #[serde(rename = "Skill")]
    skill: Option<String>,
    #[serde(rename = "Insight")]
    insight: Option<String>,
    #[serde(rename = "Job State")]
    job_state: Option<String>,
    #[serde(rename = "Poster Id")]
    poster_id: Option<serde_json::Value>,
    #[serde(rename = "Company Name")]
    company_name: Option<String>,
    #[serde(rename = "Company Logo")]
    company_logo: Option<String>,
    #[serde(rename = "Created At")]
    created_at: Option<String>,
    #[serde(rename = "Scraped At")]
    scraped_at: Option<String>,
}

impl From<RawJob> for Job {
    fn from(raw: RawJob) -> Self {
        Job {
            title: raw.title.unwrap_or_default(),
            description: raw.description,
            primary_description: raw.primary_description,
            detail_url: raw.detail_url,
            location: raw.location,
            company_name: raw.company_name,
            company_logo: raw.company_logo,
            created_at: raw.created_at,
            job_state: raw.job_state,
            skill: raw.skill,
            insight: raw.insight,
            poster_id: raw.poster_id.as_ref().and_then(poster_id),
            scraped_at: raw.scraped_at,
        }
    }
}

// Scrapers emit the poster id as either a number or a numeric string.
fn poster_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn parse_jobs(json: &str) -> Result<Vec<Job>> {
    let raw: Vec<RawJob> =
        serde_json::from_str(json).context("Job data is not an array of job records")?;
    Ok(raw.into_iter().map(Job::from).collect())
}

pub fn load_jobs(path: &Path) -> Result<Vec<Job>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job data: {}", path.display()))?;
    let jobs = parse_jobs(&contents)
        .with_context(|| format!("Failed to parse job data: {}", path.display()))?;

    tracing::info!(path = %path.display(), count = jobs.len(), "loaded job records");
    let missing_urls = jobs.iter().filter(|j| j.id().is_none()).count();
    if missing_urls > 0 {
        tracing::debug!(missing_urls, "records without a detail URL cannot be bookmarked");
    }

    Ok(jobs)
}
