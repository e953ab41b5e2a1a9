use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

use crate::extract::{
    extract_skills, extract_work_type, parse_min_salary, parse_timestamp, valid_logo_url,
};
use crate::models::{Job, WorkType, first_segment};

/// Narrowing criteria for a job listing. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub search: Option<String>,
    pub work_type: Option<WorkType>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub skill: Option<String>,
    pub min_salary: Option<f64>,
}

fn set(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl JobFilter {
    pub fn is_empty(&self) -> bool {
        *self == JobFilter::default()
    }

    pub fn matches(&self, job: &Job) -> bool {
        if let Some(work_type) = self.work_type {
            if extract_work_type(job.primary_description.as_deref()) != work_type {
                return false;
            }
        }

        if let Some(term) = set(&self.search) {
            let term = term.to_lowercase();
            let hit = |v: Option<&str>| v.is_some_and(|s| s.to_lowercase().contains(&term));
            if !hit(Some(&job.title))
                && !hit(job.company_name.as_deref())
                && !hit(job.location.as_deref())
            {
                return false;
            }
        }

        if let Some(location) = set(&self.location) {
            let city = job.location.as_deref().map(|l| first_segment(l).trim());
            if !city.is_some_and(|c| c.to_lowercase() == location.to_lowercase()) {
                return false;
            }
        }

        if let Some(company) = set(&self.company) {
            let name = job.company_name.as_deref().map(str::trim);
            if !name.is_some_and(|n| n.to_lowercase() == company.to_lowercase()) {
                return false;
            }
        }

        if let Some(skill) = set(&self.skill) {
            let skill = skill.to_lowercase();
            if !extract_skills(job.description.as_deref())
                .iter()
                .any(|s| s.to_lowercase() == skill)
            {
                return false;
            }
        }

        if let Some(min) = self.min_salary.filter(|m| *m > 0.0) {
            match parse_min_salary(job.description.as_deref()) {
                Some(salary) if salary >= min => {}
                _ => return false,
            }
        }

        true
    }

    pub fn apply<'a>(&self, jobs: &'a [Job]) -> Vec<&'a Job> {
        jobs.iter().filter(|job| self.matches(job)).collect()
    }
}

// --- Facets ---

pub fn location_options(jobs: &[Job]) -> Vec<String> {
    jobs.iter()
        .filter_map(|j| j.location.as_deref())
        .map(|l| first_segment(l).trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn company_options(jobs: &[Job]) -> Vec<String> {
    jobs.iter()
        .filter_map(|j| j.company_name.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn skill_options(jobs: &[Job]) -> Vec<String> {
    jobs.iter()
        .flat_map(|j| extract_skills(j.description.as_deref()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// --- Company directory ---

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyEntry {
    pub name: String,
    pub logo: String,
    pub job_count: usize,
    pub latest_posting: Option<DateTime<Utc>>,
}

/// One entry per hiring company, busiest first. Companies with equal counts
/// keep the order they first appear in.
pub fn company_directory(jobs: &[Job]) -> Vec<CompanyEntry> {
    let mut entries: Vec<CompanyEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for job in jobs {
        let Some(name) = job.company_name.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        let created = job.created_at.as_deref().and_then(parse_timestamp);

        match index.get(name) {
            Some(&i) => {
                let entry = &mut entries[i];
                entry.job_count += 1;
                if created > entry.latest_posting {
                    entry.latest_posting = created;
                }
            }
            None => {
                index.insert(name, entries.len());
                entries.push(CompanyEntry {
                    name: name.to_string(),
                    logo: valid_logo_url(job.company_logo.as_deref()),
                    job_count: 1,
                    latest_posting: created,
                });
            }
        }
    }

    entries.sort_by(|a, b| b.job_count.cmp(&a.job_count));
    entries
}
