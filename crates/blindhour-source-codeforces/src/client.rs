use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use blindhour_core::types::{ContestId, StandingsData, Submission};
use blindhour_core::{SourceError, StandingsSource, SubmissionSource};

use crate::retry::{AttemptError, RetryPolicy, run_with_retry};
use crate::wire::{Envelope, StandingsPage, WireSubmission, assemble_standings};

pub const DEFAULT_BASE_URL: &str = "https://codeforces.com/api";
const STANDINGS_PAGE_SIZE: usize = 500;
const SUBMISSIONS_PAGE_SIZE: usize = 10_000;
const PAGE_PAUSE: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Codeforces API client.
///
/// Pages through `contest.standings` (official rows only) and
/// `contest.status` until a short page, and returns complete data or an
/// error. Each page request is retried independently.
#[derive(Debug, Clone)]
pub struct CodeforcesClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
    page_pause: Duration,
    standings_page_size: usize,
    submissions_page_size: usize,
}

impl Default for CodeforcesClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeforcesClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            page_pause: PAGE_PAUSE,
            standings_page_size: STANDINGS_PAGE_SIZE,
            submissions_page_size: SUBMISSIONS_PAGE_SIZE,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_page_pause(mut self, pause: Duration) -> Self {
        self.page_pause = pause;
        self
    }

    pub fn with_page_sizes(mut self, standings: usize, submissions: usize) -> Self {
        self.standings_page_size = standings.max(1);
        self.submissions_page_size = submissions.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One API call, retried per policy. `status != "OK"` is terminal.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, method);
        let url = url.as_str();
        run_with_retry(&self.retry, move |attempt| async move {
            tracing::debug!(method, attempt, "codeforces request");
            self.attempt(url, query).await
        })
        .await
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AttemptError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Retryable(e.to_string()))?;

        match (serde_json::from_str::<Envelope<T>>(&body), is_retryable(status)) {
            (Ok(Envelope::Ok { result }), _) => Ok(result),
            (Ok(Envelope::Failed { comment }), false) => {
                Err(AttemptError::Terminal(SourceError::Rejected(comment)))
            }
            (_, true) => Err(AttemptError::Retryable(format!("HTTP {status}"))),
            (Err(e), false) if status.is_success() => {
                Err(AttemptError::Terminal(SourceError::Malformed(e.to_string())))
            }
            (Err(_), false) => Err(AttemptError::Terminal(SourceError::Rejected(format!(
                "HTTP {status}"
            )))),
        }
    }

    async fn pause_between_pages(&self) {
        if !self.page_pause.is_zero() {
            tokio::time::sleep(self.page_pause).await;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl StandingsSource for CodeforcesClient {
    async fn fetch_standings(&self, contest_id: ContestId) -> Result<StandingsData, SourceError> {
        let page_size = self.standings_page_size;
        let mut from = 1;
        let mut header = None;
        let mut rows = Vec::new();

        loop {
            let page: StandingsPage = self
                .call(
                    "contest.standings",
                    &[
                        ("contestId", contest_id.to_string()),
                        ("from", from.to_string()),
                        ("count", page_size.to_string()),
                        ("showUnofficial", "false".to_string()),
                    ],
                )
                .await?;
            let fetched = page.rows.len();
            tracing::debug!(contest_id, from, fetched, "standings page");
            if header.is_none() {
                header = Some((page.contest, page.problems));
            }
            rows.extend(page.rows);
            if fetched < page_size {
                break;
            }
            from += page_size;
            self.pause_between_pages().await;
        }

        let Some((contest, problems)) = header else {
            return Err(SourceError::Malformed("standings without contest header".into()));
        };
        tracing::info!(contest_id, rows = rows.len(), "standings fetched");
        Ok(assemble_standings(contest, problems, rows))
    }
}

#[async_trait]
impl SubmissionSource for CodeforcesClient {
    async fn fetch_submissions(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<Submission>, SourceError> {
        let page_size = self.submissions_page_size;
        let mut from = 1;
        let mut submissions = Vec::new();

        loop {
            let page: Vec<WireSubmission> = self
                .call(
                    "contest.status",
                    &[
                        ("contestId", contest_id.to_string()),
                        ("from", from.to_string()),
                        ("count", page_size.to_string()),
                    ],
                )
                .await?;
            let fetched = page.len();
            tracing::debug!(contest_id, from, fetched, "submission page");
            submissions.extend(page.into_iter().map(Submission::from));
            if fetched < page_size {
                break;
            }
            from += page_size;
            self.pause_between_pages().await;
        }

        tracing::info!(contest_id, submissions = submissions.len(), "submissions fetched");
        Ok(submissions)
    }
}
