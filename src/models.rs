use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a posting: its detail page URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobUrl(String);

impl JobUrl {
    /// Returns `None` for blank input; a blank URL identifies nothing.
    pub fn new(url: &str) -> Option<Self> {
        let url = url.trim();
        if url.is_empty() {
            None
        } else {
            Some(Self(url.to_string()))
        }
    }
}

impl fmt::Display for JobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_description: Option<String>,
    #[serde(default)]
    pub detail_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_logo: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub job_state: Option<String>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub insight: Option<String>,
    #[serde(default)]
    pub poster_id: Option<i64>,
    #[serde(default)]
    pub scraped_at: Option<String>,
}

impl Job {
    pub fn id(&self) -> Option<JobUrl> {
        self.detail_url.as_deref().and_then(JobUrl::new)
    }

    /// Display city: the location up to its first comma.
    pub fn city(&self) -> Option<&str> {
        self.location
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(first_segment)
    }
}

pub fn first_segment(location: &str) -> &str {
    location.split(',').next().unwrap_or(location)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkType {
    Remote,
    Hybrid,
    OnSite,
    NotSpecified,
}

impl WorkType {
    pub fn label(self) -> &'static str {
        match self {
            WorkType::Remote => "Remote",
            WorkType::Hybrid => "Hybrid",
            WorkType::OnSite => "On-site",
            WorkType::NotSpecified => "Not specified",
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl std::str::FromStr for WorkType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "remote" => Ok(WorkType::Remote),
            "hybrid" => Ok(WorkType::Hybrid),
            "on-site" | "onsite" => Ok(WorkType::OnSite),
            "not specified" | "unspecified" => Ok(WorkType::NotSpecified),
            other => Err(anyhow::anyhow!(
                "Unknown work type '{}' (expected remote, hybrid, on-site)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_url_rejects_blank() {
        assert!(JobUrl::new("").is_none());
        assert!(JobUrl::new("   ").is_none());
        assert_eq!(JobUrl::new(" https://x.io/1 ").unwrap().to_string(), "https://x.io/1");
    }

    #[test]
    fn test_job_id_and_city() {
        let job = Job {
            title: "Engineer".to_string(),
            detail_url: Some("https://jobs.example.com/42".to_string()),
            location: Some("Berlin, Germany".to_string()),
            ..Default::default()
        };
        assert_eq!(job.id(), JobUrl::new("https://jobs.example.com/42"));
        assert_eq!(job.city(), Some("Berlin"));

        let empty = Job::default();
        assert!(empty.id().is_none());
        assert!(empty.city().is_none());
    }

    #[test]
    fn test_job_serializes_with_camel_case_names() {
        let job = Job {
            title: "Engineer".to_string(),
            primary_description: Some("Remote".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["primaryDescription"], "Remote");
        assert!(value.get("detailUrl").is_some());

        let back: Job = serde_json::from_value(value).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_work_type_from_str() {
        assert_eq!("Remote".parse::<WorkType>().unwrap(), WorkType::Remote);
        assert_eq!("onsite".parse::<WorkType>().unwrap(), WorkType::OnSite);
        assert_eq!("On-site".parse::<WorkType>().unwrap(), WorkType::OnSite);
        assert!("office".parse::<WorkType>().is_err());
    }
}
