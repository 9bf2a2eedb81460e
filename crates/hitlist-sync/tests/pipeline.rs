use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hitlist_adapters::StaticHitSource;
use hitlist_core::{Priority, RawHit};
use hitlist_storage::{FetchError, FetchedResponse, PageFetcher, StatusCode};
use hitlist_sync::{Pipeline, PipelineConfig};

const CATALOG: &str = r#"
queries:
  - id: q-boston
    query: '("AI Engineer" OR "ML Engineer") ("Boston" OR "Cambridge")'
    location: Boston
    role: AI/ML Engineer
    ats: Greenhouse
    tag: boston
  - id: q-remote
    query: '("LLM Engineer") ("remote")'
    location: Remote US
    role: LLM Engineer
    tag: remote
  - id: q-disabled
    query: unused
    location: Nowhere
    role: Other
    tag: disabled
    enabled: false
"#;

const GREENHOUSE: &str = "https://boards.greenhouse.io/acme/jobs/4012345";
const ASHBY: &str = "https://jobs.ashbyhq.com/vectorco/3f0e4c2a-1b2c-4d5e-8f90-abcdef012345";
const LEVER: &str = "https://jobs.lever.co/gizmo/5d1f8a2c-77aa-4e3b-9c1d-0e2f3a4b5c6d";
const WORKDAY: &str =
    "https://widgets.wd5.myworkdayjobs.com/en-US/External/job/Austin-TX/MLOps-Engineer_R1";

fn hit(title: &str, url: &str, description: &str) -> RawHit {
    RawHit {
        title: title.to_string(),
        url: url.to_string(),
        description: description.to_string(),
    }
}

fn source() -> StaticHitSource {
    StaticHitSource::new()
        .with_hits(
            "q-boston",
            vec![
                hit(
                    "AI Engineer",
                    &format!("{GREENHOUSE}?utm_source=brave"),
                    "Join us in Boston, MA building LangChain, RAG pipelines.",
                ),
                hit(
                    "AI Engineer",
                    &format!("{GREENHOUSE}/"),
                    "Join us in Boston, MA building LangChain, RAG pipelines.",
                ),
                hit("Senior AI Engineer (Remote, Canada)", "https://jobs.lever.co/x/1", ""),
                hit(
                    "Machine Learning Engineer",
                    "https://jobs.ashbyhq.com/maple/1",
                    "Hybrid in Toronto, Ontario",
                ),
                hit("Recruiter", "https://example.com/jobs/9", "Talent acquisition role"),
            ],
        )
        .with_hits(
            "q-remote",
            vec![
                hit("ML Engineer", ASHBY, "LLM agents on AWS with multimodal inputs"),
                hit("AI Engineer", LEVER, "Remote US. RAG systems"),
                hit("MLOps Engineer", WORKDAY, "Kubernetes and LLM serving, Austin TX"),
            ],
        )
        .with_hits("q-disabled", vec![hit("AI Engineer", "https://example.com/ai", "llm")])
}

struct StubPages;

fn page_posted_hours_ago(hours: i64, body: &str) -> String {
    let posted = (Utc::now() - chrono::Duration::hours(hours)).to_rfc3339();
    format!(
        r#"<html><head><script type="application/ld+json">{{"@type":"JobPosting","datePosted":"{posted}"}}</script></head><body>{body}</body></html>"#
    )
}

#[async_trait]
impl PageFetcher for StubPages {
    async fn fetch_page(&self, _scope: &str, url: &str) -> Result<FetchedResponse, FetchError> {
        let body = if url.starts_with(GREENHOUSE) {
            let posted = (Utc::now() - chrono::Duration::hours(30)).to_rfc3339();
            format!(
                r#"<html><head><meta property="og:published_time" content="{posted}"></head><body><div class="location">Cambridge, MA</div></body></html>"#
            )
        } else if url == ASHBY {
            page_posted_hours_ago(6, "Fully remote in the United States")
        } else if url == WORKDAY {
            page_posted_hours_ago(100, "On-site in Austin")
        } else {
            return Err(FetchError::HttpStatus {
                status: 503,
                url: url.to_string(),
            });
        };
        Ok(FetchedResponse {
            status: StatusCode::OK,
            final_url: url.to_string(),
            body: body.into_bytes(),
        })
    }
}

fn pipeline(root: &Path) -> Pipeline {
    std::fs::write(root.join("queries.yaml"), CATALOG).expect("catalog");
    let mut config = PipelineConfig::for_workspace(root);
    config.verify_job_pages = true;
    config.query_delay = Duration::ZERO;
    config.verify_delay = Duration::ZERO;
    config.verify_timeout = Duration::from_secs(2);
    Pipeline::new(config)
        .expect("pipeline")
        .with_source(Arc::new(source()))
        .with_fetcher(Arc::new(StubPages))
}

fn data_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("csv")
        .lines()
        .skip(1)
        .map(ToString::to_string)
        .collect()
}

#[tokio::test]
async fn run_filters_verifies_prioritizes_and_dedups_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = pipeline(dir.path());
    let config = pipeline.config().clone();

    let first = pipeline.run_once().await.expect("first run");
    let counts = &first.counts;
    assert_eq!(counts.queries, 2);
    assert_eq!(counts.raw_hits, 8);
    assert_eq!(counts.rejected_senior, 1);
    assert_eq!(counts.rejected_location, 1);
    assert_eq!(counts.rejected_no_relevant_content, 1);
    assert_eq!(counts.duplicates, 1);
    assert_eq!(counts.verified, 3);
    assert_eq!(counts.verification_failures, 1);
    assert_eq!(counts.stale, 1);
    assert_eq!(counts.written, 3);
    assert_eq!(first.priorities.get(&Priority::A), Some(&1));
    assert_eq!(first.priorities.get(&Priority::B), Some(&1));
    assert_eq!(first.priorities.get(&Priority::C), Some(&1));

    let header = std::fs::read_to_string(&config.output_file).expect("csv");
    assert!(header.starts_with(
        "priority,fit_score,hours_old,title,company,location,remote_status,employment_type,role_category,ats,matched_keywords,fit_reasons,url,posted_at,discovered_at,review_status,snippet"
    ));
    let rows = data_lines(&config.output_file);
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("A,90,6.0,ML Engineer,Vectorco,Remote US,remote,"), "{}", rows[0]);
    assert!(rows[1].starts_with(
        "B,55,30.0,AI Engineer,Acme,\"Boston (verified: Cambridge, MA)\",on-site,"
    ));
    assert!(rows[1].contains("?utm_source=brave"));
    assert!(rows[2].starts_with("C,55,,AI Engineer,Gizmo,Remote US,,"));
    assert!(rows.iter().all(|r| r.contains("Not Applied")));
    assert_eq!(data_lines(&config.top_jobs_file).len(), 3);

    let seen: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(&config.seen_jobs_file).expect("seen"))
            .expect("seen json");
    assert_eq!(seen.len(), 4);
    assert!(seen.contains(&"greenhouse_4012345".to_string()));
    assert!(seen.contains(&"workday_MLOps-Engineer_R1".to_string()));
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);

    let report = Path::new(&first.reports_dir);
    let brief = std::fs::read_to_string(report.join("daily_brief.md")).expect("brief");
    assert!(brief.contains("New jobs written: 3"));
    assert!(brief.contains("- [A] 90 ML Engineer at Vectorco"));
    assert!(report.join("run_summary.json").exists());

    let second = pipeline.run_once().await.expect("second run");
    assert_eq!(second.counts.written, 0);
    assert_eq!(second.counts.duplicates, 5);
    assert_eq!(second.counts.verified, 0);
    assert_eq!(second.seen_total, 4);
    assert_eq!(data_lines(&config.output_file).len(), 3);
    assert!(data_lines(&config.top_jobs_file).is_empty());
}

#[tokio::test]
async fn malformed_seen_file_aborts_before_writing_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = pipeline(dir.path());
    let config = pipeline.config().clone();
    std::fs::write(&config.seen_jobs_file, "{not json").expect("seen");

    let err = pipeline.run_once().await.unwrap_err();
    assert!(format!("{err:#}").contains("seen"));
    assert!(!config.output_file.exists());
    assert_eq!(
        std::fs::read_to_string(&config.seen_jobs_file).expect("seen"),
        "{not json"
    );
}

#[tokio::test]
async fn verification_off_keeps_unknown_age_and_skips_fetches() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("queries.yaml"), CATALOG).expect("catalog");
    let mut config = PipelineConfig::for_workspace(dir.path());
    config.query_delay = Duration::ZERO;
    let pipeline = Pipeline::new(config)
        .expect("pipeline")
        .with_source(Arc::new(source()))
        .with_fetcher(Arc::new(StubPages));

    let summary = pipeline.run_once().await.expect("run");
    assert_eq!(summary.counts.verified, 0);
    assert_eq!(summary.counts.stale, 0);
    assert_eq!(summary.counts.written, 4);
    assert_eq!(summary.priorities.get(&Priority::A), None);
}
