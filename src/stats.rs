use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::extract::{extract_skills, parse_timestamp};
use crate::models::{Job, first_segment};

pub const TOP_LOCATIONS: usize = 5;
pub const TOP_COMPANIES: usize = 5;
pub const TOP_TITLES: usize = 10;
pub const TOP_SKILLS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobStatistics {
    pub total_jobs: usize,
    pub remote_jobs: usize,
    pub hybrid_jobs: usize,
    pub onsite_jobs: usize,
    pub companies_count: usize,
    pub locations_count: usize,
    pub top_locations: Vec<RankEntry>,
    pub top_companies: Vec<RankEntry>,
    pub top_job_titles: Vec<RankEntry>,
    pub top_skills: Vec<RankEntry>,
    pub jobs_by_date: Vec<DateCount>,
}

impl JobStatistics {
    /// Fraction of all postings that `count` represents; `None` for an
    /// empty collection.
    pub fn share(&self, count: usize) -> Option<f64> {
        if self.total_jobs == 0 {
            None
        } else {
            Some(count as f64 / self.total_jobs as f64)
        }
    }
}

/// Counts keys, remembering the order each key was first seen in.
struct Tally<K> {
    order: Vec<K>,
    counts: HashMap<K, usize>,
}

impl<K: Hash + Eq + Clone> Tally<K> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            counts: HashMap::new(),
        }
    }

    fn add(&mut self, key: K) {
        match self.counts.get_mut(&key) {
            Some(count) => *count += 1,
            None => {
                self.order.push(key.clone());
                self.counts.insert(key, 1);
            }
        }
    }

    /// Entries by descending count. The sort is stable, so equal counts keep
    /// first-appearance order.
    fn ranked(self) -> Vec<(K, usize)> {
        let Tally { order, mut counts } = self;
        let mut entries: Vec<(K, usize)> = order
            .into_iter()
            .map(|key| {
                let count = counts.remove(&key).unwrap_or_default();
                (key, count)
            })
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

fn top_n(tally: Tally<String>, limit: usize) -> Vec<RankEntry> {
    let mut ranked = tally.ranked();
    ranked.truncate(limit);
    ranked
        .into_iter()
        .map(|(name, count)| RankEntry { name, count })
        .collect()
}

fn mentions(text: Option<&str>, needles: &[&str]) -> bool {
    text.map(|t| {
        let lower = t.to_lowercase();
        needles.iter().any(|n| lower.contains(n))
    })
    .unwrap_or(false)
}

/// Dashboard statistics over `jobs`.
///
/// The remote, hybrid and on-site counts are computed independently of one
/// another, so a posting mentioning both "remote" and "hybrid" counts in both
/// even though `extract_work_type` labels it Remote only.
pub fn job_statistics(jobs: &[Job]) -> JobStatistics {
    let mut remote_jobs = 0;
    let mut hybrid_jobs = 0;
    let mut onsite_jobs = 0;

    let mut companies: HashSet<Option<&str>> = HashSet::new();
    let mut locations: HashSet<&str> = HashSet::new();

    let mut location_tally = Tally::new();
    let mut company_tally = Tally::new();
    let mut title_tally = Tally::new();
    let mut skill_tally = Tally::new();
    let mut date_counts: HashMap<NaiveDate, usize> = HashMap::new();

    for job in jobs {
        let primary = job.primary_description.as_deref();
        if mentions(primary, &["remote"]) {
            remote_jobs += 1;
        }
        if mentions(primary, &["hybrid"]) {
            hybrid_jobs += 1;
        }
        if mentions(primary, &["on-site", "onsite"]) {
            onsite_jobs += 1;
        }

        companies.insert(job.company_name.as_deref());
        locations.insert(job.location.as_deref().map(first_segment).unwrap_or(""));

        if let Some(city) = job.city() {
            location_tally.add(city.to_string());
        }
        if let Some(company) = job.company_name.as_deref().filter(|c| !c.is_empty()) {
            company_tally.add(company.to_string());
        }
        if !job.title.is_empty() {
            title_tally.add(job.title.clone());
        }
        for skill in extract_skills(job.description.as_deref()) {
            skill_tally.add(skill);
        }

        if let Some(created) = job.created_at.as_deref().and_then(parse_timestamp) {
            *date_counts.entry(created.date_naive()).or_insert(0) += 1;
        }
    }

    let mut jobs_by_date: Vec<DateCount> = date_counts
        .into_iter()
        .map(|(date, count)| DateCount { date, count })
        .collect();
    jobs_by_date.sort_by_key(|d| d.date);

    JobStatistics {
        total_jobs: jobs.len(),
        remote_jobs,
        hybrid_jobs,
        onsite_jobs,
        companies_count: companies.len(),
        locations_count: locations.len(),
        top_locations: top_n(location_tally, TOP_LOCATIONS),
        top_companies: top_n(company_tally, TOP_COMPANIES),
        top_job_titles: top_n(title_tally, TOP_TITLES),
        top_skills: top_n(skill_tally, TOP_SKILLS),
        jobs_by_date,
    }
}
