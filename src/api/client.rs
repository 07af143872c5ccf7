//! HTTP client for the scoring service
//!
//! One-shot request/response only: no retries, and no timeout on test or
//! rating calls (the audio-probe step is the only time-bounded part of a
//! run).

use crate::api::types::{
    AnalyticsSummary, DeviceInventory, ExportDownload, ExportFormat, RatingAck, RatingRequest,
    Recommendations, SessionAck, StartSessionRequest, TestRequest, TestResponse,
};
use crate::api::ScoringBackend;
use crate::config::Config;
use crate::error::{ResonaError, Result};
use crate::tone::TestKind;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Map a non-success HTTP status to a `Network` error
fn check_status(status: StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ResonaError::Network {
            status: status.as_u16(),
        })
    }
}

/// Decode a JSON body, converting parse failures to `Decode`
fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ResonaError::Decode {
        reason: e.to_string(),
    })
}

/// Extract `filename="..."` from a Content-Disposition header value
fn attachment_filename(header: &str) -> Option<String> {
    let start = header.find("filename=")? + "filename=".len();
    let raw = header[start..].trim();
    let name = raw.trim_matches('"').split(';').next()?.trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Async client for every scoring-service endpoint
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from the configuration
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await?;
        check_status(response.status())?;
        let body = response.text().await?;
        decode_body(&body)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        check_status(response.status())?;
        let body = response.text().await?;
        decode_body(&body)
    }

    /// `GET /analytics`
    pub async fn analytics(&self) -> Result<AnalyticsSummary> {
        self.get_json("analytics", &[]).await
    }

    /// `GET /recommendations`
    pub async fn recommendations(
        &self,
        user_id: Option<&str>,
        test_types: &[&str],
    ) -> Result<Recommendations> {
        let joined;
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(user_id) = user_id {
            query.push(("user_id", user_id));
        }
        if !test_types.is_empty() {
            joined = test_types.join(",");
            query.push(("test_types", &joined));
        }
        self.get_json("recommendations", &query).await
    }

    /// `GET /compare` — opaque comparison document for one speaker model
    pub async fn compare(&self, speaker_model: &str) -> Result<serde_json::Value> {
        self.get_json("compare", &[("speaker_model", speaker_model)])
            .await
    }

    /// `GET /detect-speakers`
    pub async fn detect_speakers(&self) -> Result<DeviceInventory> {
        self.get_json("detect-speakers", &[]).await
    }

    /// `POST /user/start-session`
    pub async fn start_session(&self, user_name: Option<&str>) -> Result<SessionAck> {
        let request = StartSessionRequest {
            user_name: user_name.map(str::to_string),
        };
        self.post_json("user/start-session", &request).await
    }

    /// `GET /export-results` — download test results as a file
    pub async fn export_results(
        &self,
        format: ExportFormat,
        speaker_model: Option<&str>,
    ) -> Result<ExportDownload> {
        let mut query: Vec<(&str, &str)> = vec![("format", format.as_str())];
        if let Some(model) = speaker_model {
            query.push(("speaker_model", model));
        }

        let response = self
            .http
            .get(self.url("export-results"))
            .query(&query)
            .send()
            .await?;
        check_status(response.status())?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(|| {
                format!(
                    "speaker_test_results_{}.{}",
                    chrono::Local::now().format("%Y%m%d_%H%M%S"),
                    format.extension()
                )
            });
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response.bytes().await?.to_vec();

        Ok(ExportDownload {
            filename,
            content_type,
            data,
        })
    }
}

impl ScoringBackend for ApiClient {
    async fn run_test(&self, kind: TestKind, request: &TestRequest) -> Result<TestResponse> {
        tracing::debug!(kind = %kind, speaker = %request.speaker_model, "posting test result request");
        self.post_json(&format!("test/{}", kind.as_str()), request)
            .await
    }

    async fn submit_rating(&self, request: &RatingRequest) -> Result<RatingAck> {
        tracing::debug!(rating = request.rating, "submitting rating");
        self.post_json("submit-rating", request).await
    }
}
