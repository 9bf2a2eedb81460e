//! Posting-page verification with bounded concurrency.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hitlist_adapters::parse_posting_page;
use hitlist_core::{NormalizedJob, VerificationRecord};
use hitlist_storage::{FetchError, PageFetcher};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info_span, warn, Instrument};

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("timed out after {secs}s")]
    TimedOut { secs: u64 },
    #[error("verification pool closed")]
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub verified: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Verifier {
    fetcher: Arc<dyn PageFetcher>,
    workers: usize,
    timeout: Duration,
}

impl Verifier {
    pub fn new(fetcher: Arc<dyn PageFetcher>, workers: usize, timeout: Duration) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
            timeout,
        }
    }

    /// Fetch and parse one posting page. Failures mean "unknown", never "reject".
    pub async fn verify(&self, job: &NormalizedJob) -> Result<VerificationRecord, VerificationError> {
        let fetch = self.fetcher.fetch_page(job.ats.as_str(), &job.url);
        let response = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| VerificationError::TimedOut {
                secs: self.timeout.as_secs(),
            })??;
        Ok(parse_posting_page(&response.text(), job.ats, Utc::now()))
    }

    /// Verify a batch concurrently and enrich the jobs in place.
    ///
    /// Jobs whose fetch fails, times out or panics keep their unverified state.
    pub async fn verify_batch(&self, jobs: &mut [NormalizedJob]) -> BatchOutcome {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        for job in jobs.iter() {
            let verifier = self.clone();
            let semaphore = semaphore.clone();
            let job = job.clone();
            let span = info_span!("verify_job", identity_key = %job.identity_key, url = %job.url);
            tasks.spawn(
                async move {
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => verifier.verify(&job).await,
                        Err(_) => Err(VerificationError::Closed),
                    };
                    (job.identity_key, result)
                }
                .instrument(span),
            );
        }

        let mut records: HashMap<String, VerificationRecord> = HashMap::new();
        let mut outcome = BatchOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, Ok(record))) => {
                    debug!(identity_key = %key, posted_at = ?record.posted_at, "verified posting page");
                    records.insert(key, record);
                }
                Ok((key, Err(err))) => {
                    outcome.failed += 1;
                    warn!(identity_key = %key, error = %err, "posting verification failed");
                }
                Err(err) => {
                    outcome.failed += 1;
                    warn!(error = %err, "verification task aborted");
                }
            }
        }

        for job in jobs.iter_mut() {
            if let Some(record) = records.get(&job.identity_key) {
                job.apply_verification(record);
                outcome.verified += 1;
            }
        }
        outcome
    }
}
