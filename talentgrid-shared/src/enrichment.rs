/// Client for the AI enrichment service
///
/// The service parses resumes, embeds documents into named collections and
/// ranks a collection against free text. Documents are stored under
/// `uuid5(NAMESPACE_DNS, document_id)`, so search hits come back as point ids
/// that [`point_id_for`] maps local ids onto.
///
/// # Example
///
/// ```no_run
/// use talentgrid_shared::enrichment::{Collection, EnrichmentClient};
/// use std::time::Duration;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = EnrichmentClient::new("http://localhost:8000", Duration::from_secs(10))?;
///
/// let job_id = Uuid::new_v4();
/// client.sync_document(Collection::Jobs, &job_id.to_string(), "Rust backend engineer").await?;
///
/// let hits = client.search(Collection::Profiles, "Rust backend engineer", 10).await?;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Enrichment client error
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    /// Transport failure, timeout or undecodable body
    #[error("enrichment request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("enrichment service returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Embedding collections kept by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Jobs,
    Profiles,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Profiles => "profiles",
        }
    }
}

/// Point id the service assigns to a document
pub fn point_id_for(document_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, document_id.as_bytes())
}

/// Acknowledgement of queued background work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAccepted {
    pub task_id: String,
    pub status: String,
}

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Point id, see [`point_id_for`]
    pub id: Uuid,
    pub score: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResumeRequest<'a> {
    resume_url: &'a str,
    identity_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequest<'a> {
    collection: Collection,
    document_id: &'a str,
    text_content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    collection: Collection,
    text_content: &'a str,
    limit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    ranked_results: Vec<SearchHit>,
}

/// HTTP client for the enrichment service
#[derive(Debug, Clone)]
pub struct EnrichmentClient {
    http: reqwest::Client,
    base_url: String,
}

impl EnrichmentClient {
    /// Builds a client with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EnrichmentError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, EnrichmentError>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let response = self.http.post(self.url(path)).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(path, status = status.as_u16(), "Enrichment service rejected request");
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Queues a resume for parsing
    pub async fn submit_resume(
        &self,
        identity_id: Uuid,
        resume_url: &str,
    ) -> Result<TaskAccepted, EnrichmentError> {
        let accepted: TaskAccepted = self
            .post(
                "/v1/parsing/resume",
                &ResumeRequest {
                    resume_url,
                    identity_id,
                },
            )
            .await?;

        debug!(identity_id = %identity_id, task_id = %accepted.task_id, "Resume submitted for parsing");
        Ok(accepted)
    }

    /// Queues a document for embedding into a collection
    pub async fn sync_document(
        &self,
        collection: Collection,
        document_id: &str,
        text_content: &str,
    ) -> Result<TaskAccepted, EnrichmentError> {
        let accepted: TaskAccepted = self
            .post(
                "/internal/sync",
                &SyncRequest {
                    collection,
                    document_id,
                    text_content,
                },
            )
            .await?;

        debug!(
            collection = collection.as_str(),
            document_id,
            task_id = %accepted.task_id,
            "Document queued for embedding"
        );
        Ok(accepted)
    }

    /// Ranks a collection against `text_content`, best first
    pub async fn search(
        &self,
        collection: Collection,
        text_content: &str,
        limit: u32,
    ) -> Result<Vec<SearchHit>, EnrichmentError> {
        let response: SearchResponse = self
            .post(
                "/v1/matching/search",
                &SearchRequest {
                    collection,
                    text_content,
                    limit,
                },
            )
            .await?;

        Ok(response.ranked_results)
    }

    /// Returns true if the service answers its health endpoint
    pub async fn health(&self) -> bool {
        match self.http.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Enrichment health check failed");
                false
            }
        }
    }
}

/// Maps search hits back onto local ids, dropping hits with no known id
///
/// Keeps the ranking order of `hits`.
pub fn resolve_hits(hits: &[SearchHit], candidates: &[Uuid]) -> Vec<(Uuid, f32)> {
    let index: std::collections::HashMap<Uuid, Uuid> = candidates
        .iter()
        .map(|id| (point_id_for(&id.to_string()), *id))
        .collect();

    hits.iter()
        .filter_map(|hit| index.get(&hit.id).map(|id| (*id, hit.score)))
        .collect()
}
