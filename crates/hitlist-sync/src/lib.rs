//! Run orchestration: query catalog, filtering, dedup, verification, output and reports.

mod scoring;
mod verify;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use hitlist_adapters::{classify, company_name, identity_key, FileHitSource, HitSource};
use hitlist_core::{
    snippet_of, sort_for_review, NormalizedJob, OutputRow, Priority, PriorityPolicy, RawHit,
    SearchQuery, DEFAULT_REVIEW_STATUS,
};
use hitlist_storage::{
    append_csv_rows, write_atomically, write_csv_rows, HttpClientConfig, HttpFetcher, PageFetcher,
    SeenSet, SeenStore, TokenBucketConfig, BROWSER_USER_AGENT,
};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub use scoring::{
    phrase_pattern, FilterEngine, FilterVerdict, FitAssessment, KeywordCategory, RejectReason,
    RuleError, ScoringRules,
};
pub use verify::{BatchOutcome, VerificationError, Verifier};

pub const CRATE_NAME: &str = "hitlist-sync";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub workspace_root: PathBuf,
    pub queries_path: PathBuf,
    pub hits_dir: PathBuf,
    pub output_file: PathBuf,
    pub top_jobs_file: PathBuf,
    pub top_jobs_limit: usize,
    pub seen_jobs_file: PathBuf,
    pub reports_dir: PathBuf,
    pub rules_path: Option<PathBuf>,
    pub verify_job_pages: bool,
    pub max_hours_old: f64,
    pub query_delay: Duration,
    pub verify_delay: Duration,
    pub verify_workers: usize,
    /// Concurrent page fetches against a single ATS.
    pub verify_per_ats: usize,
    pub verify_timeout: Duration,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub scheduler_enabled: bool,
    pub sync_cron: String,
}

impl PipelineConfig {
    /// Defaults for a workspace rooted at `root`.
    pub fn for_workspace(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            queries_path: root.join("queries.yaml"),
            hits_dir: root.join("hits"),
            output_file: root.join("ai_ml_jobs.csv"),
            top_jobs_file: root.join("ai_ml_jobs_top10_today.csv"),
            top_jobs_limit: 10,
            seen_jobs_file: root.join("seen_jobs.json"),
            reports_dir: root.join("reports"),
            rules_path: None,
            verify_job_pages: false,
            max_hours_old: 24.0,
            query_delay: Duration::from_secs(1),
            verify_delay: Duration::from_millis(200),
            verify_workers: 5,
            verify_per_ats: 2,
            verify_timeout: Duration::from_secs(15),
            http_timeout: Duration::from_secs(10),
            user_agent: BROWSER_USER_AGENT.to_string(),
            scheduler_enabled: false,
            sync_cron: "0 0 7 * * *".to_string(),
            workspace_root: root,
        }
    }

    /// Load `.env` if present, then read `HITLIST_*` variables.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparsable values are errors, never silently defaulted.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let root = lookup("HITLIST_WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let defaults = Self::for_workspace(&root);
        let path = |key: &str, default: PathBuf| -> PathBuf {
            lookup(key).map(|v| root.join(v)).unwrap_or(default)
        };

        Ok(Self {
            queries_path: path("HITLIST_QUERIES_PATH", defaults.queries_path),
            hits_dir: path("HITLIST_HITS_DIR", defaults.hits_dir),
            output_file: path("HITLIST_OUTPUT_FILE", defaults.output_file),
            top_jobs_file: path("HITLIST_TOP_JOBS_FILE", defaults.top_jobs_file),
            top_jobs_limit: parsed(&lookup, "HITLIST_TOP_JOBS_LIMIT", defaults.top_jobs_limit)?,
            seen_jobs_file: path("HITLIST_SEEN_JOBS_FILE", defaults.seen_jobs_file),
            reports_dir: path("HITLIST_REPORTS_DIR", defaults.reports_dir),
            rules_path: lookup("HITLIST_RULES_PATH").map(|v| root.join(v)),
            verify_job_pages: flag(&lookup, "HITLIST_VERIFY_JOB_PAGES", defaults.verify_job_pages)?,
            max_hours_old: parsed(&lookup, "HITLIST_MAX_HOURS_OLD", defaults.max_hours_old)?,
            query_delay: Duration::try_from_secs_f64(parsed(
                &lookup,
                "HITLIST_DELAY_BETWEEN_SEARCHES",
                defaults.query_delay.as_secs_f64(),
            )?)
            .context("HITLIST_DELAY_BETWEEN_SEARCHES must be a non-negative number of seconds")?,
            verify_delay: Duration::from_millis(parsed(
                &lookup,
                "HITLIST_VERIFY_DELAY_MS",
                defaults.verify_delay.as_millis() as u64,
            )?),
            verify_workers: parsed(&lookup, "HITLIST_VERIFY_WORKERS", defaults.verify_workers)?,
            verify_per_ats: parsed(&lookup, "HITLIST_VERIFY_PER_ATS", defaults.verify_per_ats)?,
            verify_timeout: Duration::from_secs(parsed(
                &lookup,
                "HITLIST_VERIFY_TIMEOUT_SECS",
                defaults.verify_timeout.as_secs(),
            )?),
            http_timeout: Duration::from_secs(parsed(
                &lookup,
                "HITLIST_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            user_agent: lookup("HITLIST_USER_AGENT").unwrap_or(defaults.user_agent),
            scheduler_enabled: flag(&lookup, "HITLIST_SCHEDULER_ENABLED", defaults.scheduler_enabled)?,
            sync_cron: lookup("HITLIST_SYNC_CRON").unwrap_or(defaults.sync_cron),
            workspace_root: root,
        })
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        None => Ok(default),
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some(v) if matches!(v, "1" | "true" | "TRUE" | "True" | "yes") => Ok(true),
        Some(v) if matches!(v, "0" | "false" | "FALSE" | "False" | "no" | "") => Ok(false),
        Some(v) => bail!("{key} must be a boolean, got {v:?}"),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryCatalog {
    pub queries: Vec<SearchQuery>,
}

impl QueryCatalog {
    pub async fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let catalog: Self =
            serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        if !catalog.queries.iter().any(|q| q.enabled) {
            bail!("{} has no enabled queries", path.display());
        }
        Ok(catalog)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &SearchQuery> {
        self.queries.iter().filter(|q| q.enabled)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub queries: usize,
    pub search_failures: usize,
    pub raw_hits: usize,
    pub rejected_senior: usize,
    pub rejected_location: usize,
    pub rejected_no_relevant_content: usize,
    pub rejected_low_fit: usize,
    pub duplicates: usize,
    pub verified: usize,
    pub verification_failures: usize,
    pub stale: usize,
    pub written: usize,
}

impl RunCounts {
    fn record_rejection(&mut self, reason: &RejectReason) {
        match reason {
            RejectReason::Senior => self.rejected_senior += 1,
            RejectReason::OutsideUs => self.rejected_location += 1,
            RejectReason::NoRelevantContent => self.rejected_no_relevant_content += 1,
            RejectReason::LowFit { .. } => self.rejected_low_fit += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counts: RunCounts,
    pub priorities: BTreeMap<Priority, usize>,
    pub seen_total: usize,
    pub output_file: String,
    pub top_jobs_file: String,
    pub reports_dir: String,
}

pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn HitSource>,
    fetcher: Arc<dyn PageFetcher>,
    policy: PriorityPolicy,
    run_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(http_client_config(&config))?;
        Ok(Self {
            source: Arc::new(FileHitSource::new(config.hits_dir.clone())),
            fetcher: Arc::new(fetcher),
            policy: PriorityPolicy::default(),
            run_lock: Mutex::new(()),
            config,
        })
    }

    pub fn with_source(mut self, source: Arc<dyn HitSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_policy(mut self, policy: PriorityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn load_rules(&self) -> Result<ScoringRules> {
        match &self.config.rules_path {
            Some(path) => ScoringRules::from_yaml_file(path),
            None => Ok(ScoringRules::default()),
        }
    }

    /// One full pass over the catalog. Overlapping calls are serialized.
    pub async fn run_once(&self) -> Result<RunSummary> {
        let _guard = self.run_lock.lock().await;
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        let catalog = QueryCatalog::load(&self.config.queries_path).await?;
        let engine = FilterEngine::new(self.load_rules()?).context("compiling scoring rules")?;
        let seen_store = SeenStore::new(self.config.seen_jobs_file.clone());
        let mut seen = seen_store.load().await?;
        let verifier = Verifier::new(
            self.fetcher.clone(),
            self.config.verify_workers,
            self.config.verify_timeout,
        );
        info!(%run_id, seen = seen.len(), verify = self.config.verify_job_pages, "starting run");

        let mut counts = RunCounts::default();
        let mut jobs = Vec::new();
        for (index, query) in catalog.enabled().enumerate() {
            if index > 0 && !self.config.query_delay.is_zero() {
                tokio::time::sleep(self.config.query_delay).await;
            }
            counts.queries += 1;
            let span = info_span!("query", %run_id, query_id = %query.id, tag = %query.tag);
            let found = self
                .process_query(query, &engine, &verifier, &mut seen, &mut counts)
                .instrument(span)
                .await;
            jobs.extend(found);
        }

        sort_for_review(&mut jobs);
        let rows: Vec<OutputRow> = jobs.iter().map(OutputRow::from).collect();
        counts.written = append_csv_rows(&self.config.output_file, &rows)?;
        let top = &rows[..rows.len().min(self.config.top_jobs_limit)];
        write_csv_rows(&self.config.top_jobs_file, top)?;
        seen_store.persist(&seen).await?;

        let mut priorities = BTreeMap::new();
        for job in &jobs {
            *priorities.entry(job.priority).or_default() += 1;
        }
        let reports_dir = self.config.reports_dir.join(run_id.to_string());
        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            counts,
            priorities,
            seen_total: seen.len(),
            output_file: self.config.output_file.display().to_string(),
            top_jobs_file: self.config.top_jobs_file.display().to_string(),
            reports_dir: reports_dir.display().to_string(),
        };
        write_reports(&reports_dir, &summary, &jobs).await?;
        info!(
            %run_id,
            written = summary.counts.written,
            duplicates = summary.counts.duplicates,
            stale = summary.counts.stale,
            "run complete"
        );
        Ok(summary)
    }

    async fn process_query(
        &self,
        query: &SearchQuery,
        engine: &FilterEngine,
        verifier: &Verifier,
        seen: &mut SeenSet,
        counts: &mut RunCounts,
    ) -> Vec<NormalizedJob> {
        let hits = match self.source.search(query).await {
            Ok(hits) => hits,
            Err(err) => {
                counts.search_failures += 1;
                warn!(error = %err, "search failed; skipping query");
                return Vec::new();
            }
        };
        let hit_count = hits.len();
        counts.raw_hits += hit_count;

        let discovered_at = Utc::now();
        let mut jobs = Vec::new();
        for hit in hits {
            let key = identity_key(&hit.url);
            let fit = match engine.evaluate(&hit.title, &hit.description) {
                FilterVerdict::Admitted(fit) => fit,
                FilterVerdict::Rejected(reason) => {
                    debug!(identity_key = %key, reason = reason.as_str(), title = %hit.title, "hit rejected");
                    counts.record_rejection(&reason);
                    continue;
                }
            };
            if !seen.mark(&key) {
                debug!(identity_key = %key, "already seen");
                counts.duplicates += 1;
                continue;
            }
            jobs.push(admit(hit, key, fit, query, discovered_at));
        }

        if self.config.verify_job_pages && !jobs.is_empty() {
            let outcome = verifier.verify_batch(&mut jobs).await;
            counts.verified += outcome.verified;
            counts.verification_failures += outcome.failed;

            let before = jobs.len();
            jobs.retain(|job| {
                job.hours_old()
                    .map_or(true, |hours| hours <= self.config.max_hours_old)
            });
            counts.stale += before - jobs.len();
        }

        for job in &mut jobs {
            self.policy.prioritize(job);
        }
        info!(hits = hit_count, admitted = jobs.len(), "query processed");
        jobs
    }

    /// Cron-driven runs, when enabled in config.
    pub async fn maybe_build_scheduler(self: Arc<Self>) -> Result<Option<JobScheduler>> {
        if !self.config.scheduler_enabled {
            return Ok(None);
        }

        let sched = JobScheduler::new().await.context("creating scheduler")?;
        let cron = self.config.sync_cron.clone();
        let pipeline = self.clone();
        let job = Job::new_async(&cron, move |_uuid, _l| {
            let pipeline = pipeline.clone();
            Box::pin(async move {
                match pipeline.run_once().await {
                    Ok(summary) => info!(run_id = %summary.run_id, written = summary.counts.written, "scheduled run finished"),
                    Err(err) => warn!(error = %format!("{err:#}"), "scheduled run failed"),
                }
            })
        })
        .with_context(|| format!("creating scheduler job for cron {cron}"))?;
        sched.add(job).await.context("adding scheduler job")?;
        Ok(Some(sched))
    }
}

fn http_client_config(config: &PipelineConfig) -> HttpClientConfig {
    let workers = config.verify_workers.max(1);
    HttpClientConfig {
        timeout: config.http_timeout,
        user_agent: Some(config.user_agent.clone()),
        global_concurrency: workers,
        per_scope_concurrency: config.verify_per_ats.clamp(1, workers),
        token_bucket: (!config.verify_delay.is_zero()).then(|| TokenBucketConfig {
            capacity: 1,
            refill_every: config.verify_delay,
        }),
        ..Default::default()
    }
}

fn admit(
    hit: RawHit,
    key: String,
    fit: FitAssessment,
    query: &SearchQuery,
    discovered_at: DateTime<Utc>,
) -> NormalizedJob {
    NormalizedJob {
        identity_key: key,
        ats: classify(&hit.url),
        company: company_name(&hit.url, &hit.title),
        snippet: snippet_of(&hit.description),
        title: hit.title,
        url: hit.url,
        declared_location: query.location.clone(),
        role_category: query.role.clone(),
        query_tag: query.tag.clone(),
        fit_score: fit.score,
        fit_reasons: fit.reasons,
        matched_keywords: fit.matched_keywords,
        is_senior: false,
        is_us_eligible: true,
        freshness: None,
        verified_location: None,
        employment_type: None,
        remote_status: None,
        priority: Priority::C,
        discovered_at,
        review_status: DEFAULT_REVIEW_STATUS.to_string(),
    }
}

fn brief_line(job: &NormalizedJob) -> String {
    let age = job
        .hours_old()
        .map(|h| format!("{h:.1}h old"))
        .unwrap_or_else(|| "age unknown".to_string());
    format!(
        "- [{}] {} {} at {} ({}, {}) {}",
        job.priority, job.fit_score, job.title, job.company, job.ats, age, job.url
    )
}

async fn write_reports(reports_dir: &Path, summary: &RunSummary, jobs: &[NormalizedJob]) -> Result<()> {
    fs::create_dir_all(reports_dir)
        .await
        .with_context(|| format!("creating {}", reports_dir.display()))?;

    let counts = &summary.counts;
    let priority_lines = [Priority::A, Priority::B, Priority::C]
        .iter()
        .map(|p| format!("- {}: {}", p, summary.priorities.get(p).copied().unwrap_or(0)))
        .collect::<Vec<_>>()
        .join("\n");
    let job_lines = if jobs.is_empty() {
        "_No new jobs this run._".to_string()
    } else {
        jobs.iter().map(brief_line).collect::<Vec<_>>().join("\n")
    };
    let brief = format!(
        "# Hitlist Daily Brief\n\n- Run ID: `{}`\n- Started: {}\n- Finished: {}\n- Queries: {} ({} failed)\n- Raw hits: {}\n- Rejected: {} senior, {} location, {} no relevant content, {} low fit\n- Duplicates: {}\n- Verified: {} ({} failed)\n- Stale: {}\n- New jobs written: {}\n\n## Priority Counts\n{}\n\n## New Jobs\n{}\n",
        summary.run_id,
        summary.started_at,
        summary.finished_at,
        counts.queries,
        counts.search_failures,
        counts.raw_hits,
        counts.rejected_senior,
        counts.rejected_location,
        counts.rejected_no_relevant_content,
        counts.rejected_low_fit,
        counts.duplicates,
        counts.verified,
        counts.verification_failures,
        counts.stale,
        counts.written,
        priority_lines,
        job_lines,
    );
    fs::write(reports_dir.join("daily_brief.md"), brief)
        .await
        .context("writing daily_brief.md")?;

    let summary_json = serde_json::to_vec_pretty(&serde_json::json!({
        "summary": summary,
        "jobs": jobs,
    }))
    .context("serializing run summary")?;
    write_atomically(&reports_dir.join("run_summary.json"), &summary_json).await
}

pub async fn run_once_from_env() -> Result<RunSummary> {
    let config = PipelineConfig::from_env()?;
    Pipeline::new(config)?.run_once().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn config_defaults_match_documented_values() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PipelineConfig::for_workspace("."));
        assert_eq!(config.max_hours_old, 24.0);
        assert_eq!(config.verify_workers, 5);
        assert_eq!(config.verify_per_ats, 2);
        assert_eq!(config.sync_cron, "0 0 7 * * *");
        assert_eq!(config.verify_delay, Duration::from_millis(200));
        assert_eq!(config.verify_timeout, Duration::from_secs(15));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert!(!config.verify_job_pages);
        assert!(config.rules_path.is_none());
    }

    #[test]
    fn config_paths_resolve_against_workspace_root() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("HITLIST_WORKSPACE_ROOT", "/srv/hitlist"),
            ("HITLIST_OUTPUT_FILE", "out/jobs.csv"),
            ("HITLIST_RULES_PATH", "rules/scoring.yaml"),
            ("HITLIST_VERIFY_JOB_PAGES", "true"),
            ("HITLIST_DELAY_BETWEEN_SEARCHES", "0.5"),
        ]))
        .unwrap();
        assert_eq!(config.output_file, PathBuf::from("/srv/hitlist/out/jobs.csv"));
        assert_eq!(config.seen_jobs_file, PathBuf::from("/srv/hitlist/seen_jobs.json"));
        assert_eq!(
            config.rules_path,
            Some(PathBuf::from("/srv/hitlist/rules/scoring.yaml"))
        );
        assert!(config.verify_job_pages);
        assert_eq!(config.query_delay, Duration::from_millis(500));
    }

    #[test]
    fn unparsable_config_values_are_fatal() {
        let err = PipelineConfig::from_lookup(lookup(&[("HITLIST_VERIFY_WORKERS", "five")]))
            .unwrap_err();
        assert!(err.to_string().contains("HITLIST_VERIFY_WORKERS"));
        assert!(PipelineConfig::from_lookup(lookup(&[("HITLIST_VERIFY_JOB_PAGES", "maybe")])).is_err());
        assert!(PipelineConfig::from_lookup(lookup(&[("HITLIST_MAX_HOURS_OLD", "a day")])).is_err());
        assert!(
            PipelineConfig::from_lookup(lookup(&[("HITLIST_DELAY_BETWEEN_SEARCHES", "-1")])).is_err()
        );
    }

    #[test]
    fn per_ats_fetch_limit_stays_within_worker_pool() {
        let config = PipelineConfig::for_workspace(".");
        let client = http_client_config(&config);
        assert_eq!(client.global_concurrency, 5);
        assert_eq!(client.per_scope_concurrency, 2);

        let config = PipelineConfig::from_lookup(lookup(&[
            ("HITLIST_VERIFY_WORKERS", "3"),
            ("HITLIST_VERIFY_PER_ATS", "8"),
        ]))
        .unwrap();
        let client = http_client_config(&config);
        assert_eq!(client.global_concurrency, 3);
        assert_eq!(client.per_scope_concurrency, 3);
    }

    #[tokio::test]
    async fn default_cron_builds_a_scheduler() {
        let mut config = PipelineConfig::for_workspace(".");
        assert!(Arc::new(Pipeline::new(config.clone()).unwrap())
            .maybe_build_scheduler()
            .await
            .unwrap()
            .is_none());

        config.scheduler_enabled = true;
        let pipeline = Arc::new(Pipeline::new(config).unwrap());
        let sched = pipeline.maybe_build_scheduler().await.unwrap();
        assert!(sched.is_some());
    }

    #[tokio::test]
    async fn catalog_without_enabled_queries_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("queries.yaml");
        std::fs::write(
            &path,
            "queries:\n  - id: q1\n    query: x\n    location: Boston\n    role: ML\n    tag: boston\n    enabled: false\n",
        )
        .unwrap();
        assert!(QueryCatalog::load(&path).await.is_err());
        std::fs::write(&path, "queries: []\n").unwrap();
        assert!(QueryCatalog::load(&path).await.is_err());
        assert!(QueryCatalog::load(&dir.path().join("missing.yaml")).await.is_err());
    }

    #[tokio::test]
    async fn shipped_catalog_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../queries.yaml");
        let catalog = QueryCatalog::load(&path).await.expect("catalog");
        assert!(catalog.enabled().count() >= 5);
        assert!(catalog.enabled().all(|q| !q.id.is_empty() && !q.tag.is_empty()));
    }

    #[test]
    fn rejection_counts_track_reasons() {
        let mut counts = RunCounts::default();
        counts.record_rejection(&RejectReason::Senior);
        counts.record_rejection(&RejectReason::LowFit { score: 10 });
        counts.record_rejection(&RejectReason::LowFit { score: 20 });
        assert_eq!(counts.rejected_senior, 1);
        assert_eq!(counts.rejected_low_fit, 2);
        assert_eq!(counts.rejected_location, 0);
    }
}
