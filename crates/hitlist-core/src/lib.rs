//! Core domain model and review prioritization for hitlist.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "hitlist-core";

pub const DEFAULT_REVIEW_STATUS: &str = "Not Applied";
pub const SNIPPET_CHARS: usize = 200;

/// One search-engine result as handed over by the search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// Catalog entry describing a single search query and the metadata stamped on its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub id: String,
    pub query: String,
    pub location: String,
    pub role: String,
    #[serde(default)]
    pub ats: Option<String>,
    pub tag: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ats {
    Ashby,
    Greenhouse,
    Lever,
    Workday,
    #[serde(rename = "iCIMS")]
    ICims,
    SmartRecruiters,
    Workable,
    Other,
}

impl Ats {
    pub fn as_str(self) -> &'static str {
        match self {
            Ats::Ashby => "Ashby",
            Ats::Greenhouse => "Greenhouse",
            Ats::Lever => "Lever",
            Ats::Workday => "Workday",
            Ats::ICims => "iCIMS",
            Ats::SmartRecruiters => "SmartRecruiters",
            Ats::Workable => "Workable",
            Ats::Other => "Other",
        }
    }
}

impl fmt::Display for Ats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review urgency. Declaration order is the review order: `A` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    A,
    B,
    C,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::A => "A",
            Priority::B => "B",
            Priority::C => "C",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteStatus {
    Remote,
    Hybrid,
    OnSite,
}

impl RemoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteStatus::Remote => "remote",
            RemoteStatus::Hybrid => "hybrid",
            RemoteStatus::OnSite => "on-site",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Freshness {
    pub posted_at: DateTime<Utc>,
    pub hours_old: f64,
}

/// Everything a successful posting-page fetch could tell us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub fetched_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub remote_status: RemoteStatus,
}

impl VerificationRecord {
    pub fn freshness(&self) -> Option<Freshness> {
        self.posted_at.map(|posted_at| Freshness {
            posted_at,
            hours_old: hours_old_between(self.fetched_at, posted_at),
        })
    }
}

/// Age in hours rounded to one decimal. Postings dated in the future count as brand new.
pub fn hours_old_between(now: DateTime<Utc>, posted_at: DateTime<Utc>) -> f64 {
    let hours = (now - posted_at).num_seconds() as f64 / 3600.0;
    ((hours * 10.0).round() / 10.0).max(0.0)
}

/// A search hit that survived filtering, enriched as it moves through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJob {
    pub identity_key: String,
    pub ats: Ats,
    pub title: String,
    pub url: String,
    pub company: String,
    pub snippet: String,
    pub declared_location: String,
    pub role_category: String,
    pub query_tag: String,
    pub fit_score: u32,
    pub fit_reasons: Vec<String>,
    pub matched_keywords: Vec<String>,
    pub is_senior: bool,
    pub is_us_eligible: bool,
    pub freshness: Option<Freshness>,
    pub verified_location: Option<String>,
    pub employment_type: Option<String>,
    pub remote_status: Option<RemoteStatus>,
    pub priority: Priority,
    pub discovered_at: DateTime<Utc>,
    pub review_status: String,
}

impl NormalizedJob {
    pub fn hours_old(&self) -> Option<f64> {
        self.freshness.map(|f| f.hours_old)
    }

    pub fn apply_verification(&mut self, record: &VerificationRecord) {
        self.freshness = record.freshness();
        self.verified_location = record.location.clone();
        self.employment_type = record.employment_type.clone();
        self.remote_status = Some(record.remote_status);
    }

    /// Declared location, annotated with the verified one when the page disagrees.
    pub fn display_location(&self) -> String {
        match self.verified_location.as_deref() {
            Some(verified) if !verified.eq_ignore_ascii_case(&self.declared_location) => {
                format!("{} (verified: {})", self.declared_location, verified)
            }
            _ => self.declared_location.clone(),
        }
    }
}

/// Truncates a search description to the snippet stored in the output.
pub fn snippet_of(description: &str) -> String {
    description.trim().chars().take(SNIPPET_CHARS).collect()
}

/// Review ordering: tier, then score (high first), then age (fresh first, unknown last).
pub fn review_order(a: &NormalizedJob, b: &NormalizedJob) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.fit_score.cmp(&a.fit_score))
        .then_with(|| {
            let age_a = a.hours_old().unwrap_or(f64::INFINITY);
            let age_b = b.hours_old().unwrap_or(f64::INFINITY);
            age_a.total_cmp(&age_b)
        })
        .then_with(|| a.identity_key.cmp(&b.identity_key))
}

pub fn sort_for_review(jobs: &mut [NormalizedJob]) {
    jobs.sort_by(review_order);
}

/// One tier rule: all of score, age and (optionally) platform must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRule {
    pub min_score: u32,
    pub max_hours_old: f64,
    #[serde(default)]
    pub platforms: Option<Vec<Ats>>,
}

impl TierRule {
    fn matches(&self, score: u32, age: f64, ats: Ats) -> bool {
        score >= self.min_score
            && age <= self.max_hours_old
            && self
                .platforms
                .as_ref()
                .map_or(true, |platforms| platforms.contains(&ats))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityPolicy {
    pub tier_a: Vec<TierRule>,
    pub tier_b: Vec<TierRule>,
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self {
            tier_a: vec![
                TierRule {
                    min_score: 75,
                    max_hours_old: 24.0,
                    platforms: Some(vec![Ats::Ashby, Ats::Greenhouse, Ats::Lever]),
                },
                TierRule {
                    min_score: 70,
                    max_hours_old: 36.0,
                    platforms: None,
                },
            ],
            tier_b: vec![
                TierRule {
                    min_score: 55,
                    max_hours_old: 72.0,
                    platforms: None,
                },
                TierRule {
                    min_score: 45,
                    max_hours_old: 24.0,
                    platforms: None,
                },
            ],
        }
    }
}

impl PriorityPolicy {
    /// Unknown age never ranks better than a known one, so it is treated as infinitely old.
    pub fn classify(&self, fit_score: u32, hours_old: Option<f64>, ats: Ats) -> Priority {
        let age = hours_old.unwrap_or(f64::INFINITY);
        if self.tier_a.iter().any(|r| r.matches(fit_score, age, ats)) {
            Priority::A
        } else if self.tier_b.iter().any(|r| r.matches(fit_score, age, ats)) {
            Priority::B
        } else {
            Priority::C
        }
    }

    pub fn prioritize(&self, job: &mut NormalizedJob) {
        job.priority = self.classify(job.fit_score, job.hours_old(), job.ats);
    }
}

/// Output row, field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub priority: String,
    pub fit_score: u32,
    pub hours_old: Option<f64>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub remote_status: String,
    pub employment_type: String,
    pub role_category: String,
    pub ats: String,
    pub matched_keywords: String,
    pub fit_reasons: String,
    pub url: String,
    pub posted_at: String,
    pub discovered_at: String,
    pub review_status: String,
    pub snippet: String,
}

impl From<&NormalizedJob> for OutputRow {
    fn from(job: &NormalizedJob) -> Self {
        Self {
            priority: job.priority.to_string(),
            fit_score: job.fit_score,
            hours_old: job.hours_old(),
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.display_location(),
            remote_status: job
                .remote_status
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            employment_type: job.employment_type.clone().unwrap_or_default(),
            role_category: job.role_category.clone(),
            ats: job.ats.to_string(),
            matched_keywords: job.matched_keywords.join(", "),
            fit_reasons: job.fit_reasons.join(", "),
            url: job.url.clone(),
            posted_at: job
                .freshness
                .map(|f| f.posted_at.to_rfc3339())
                .unwrap_or_default(),
            discovered_at: job.discovered_at.format("%Y-%m-%d %H:%M").to_string(),
            review_status: job.review_status.clone(),
            snippet: job.snippet.clone(),
        }
    }
}
