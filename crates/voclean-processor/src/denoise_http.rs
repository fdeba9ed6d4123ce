//! HTTP client for the denoise vendor API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::processor::{JobProcessor, JobState, ProcessorError};

/// Denoise API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenoiseHttpConfig {
    /// Base URL of the denoise API, e.g. `https://api.denoise.example.com`.
    pub base_url: String,
    /// API key sent in the `x-api-key` header.
    pub api_key: String,
    /// Request timeout (default: 30s).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Serialize)]
struct CreateJobRequest<'a> {
    source_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: String,
    output_url: Option<String>,
    error: Option<String>,
}

fn parse_state(response: JobStatusResponse) -> Result<JobState, ProcessorError> {
    match response.status.as_str() {
        "queued" => Ok(JobState::Queued),
        "processing" => Ok(JobState::InProgress),
        "succeeded" => {
            let output_url = response.output_url.ok_or_else(|| {
                ProcessorError::Transport(
                    "processor reported success without an output location".to_string(),
                )
            })?;
            Ok(JobState::Succeeded { output_url })
        }
        "failed" => Ok(JobState::Failed {
            reason: response
                .error
                .unwrap_or_else(|| "no reason reported".to_string()),
        }),
        other => Err(ProcessorError::Transport(format!(
            "processor reported unknown job status '{}'",
            other
        ))),
    }
}

/// `JobProcessor` implementation over the denoise vendor's REST API.
pub struct DenoiseHttpClient {
    http_client: reqwest::Client,
    config: DenoiseHttpConfig,
}

impl DenoiseHttpClient {
    pub fn new(config: DenoiseHttpConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to build HTTP client for denoise API, using default client");
                reqwest::Client::default()
            });

        Self {
            http_client,
            config,
        }
    }
}

#[async_trait]
impl JobProcessor for DenoiseHttpClient {
    #[tracing::instrument(skip(self))]
    async fn create_job(
        &self,
        source_url: &str,
        callback_url: Option<&str>,
    ) -> Result<String, ProcessorError> {
        let url = format!("{}/v1/jobs", self.config.base_url.trim_end_matches('/'));

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(&CreateJobRequest {
                source_url,
                callback_url,
            })
            .send()
            .await
            .map_err(|e| ProcessorError::Transport(format!("job creation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Remote(format!(
                "job creation rejected with {}: {}",
                status, body
            )));
        }

        let created: CreateJobResponse = response.json().await.map_err(|e| {
            ProcessorError::Transport(format!("malformed job creation response: {}", e))
        })?;

        tracing::info!(job_id = %created.job_id, "Denoise job created");

        Ok(created.job_id)
    }

    #[tracing::instrument(skip(self))]
    async fn job_status(&self, job_id: &str) -> Result<JobState, ProcessorError> {
        let url = format!(
            "{}/v1/jobs/{}",
            self.config.base_url.trim_end_matches('/'),
            job_id
        );

        let response = self
            .http_client
            .get(&url)
            .header("x-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| ProcessorError::Transport(format!("status request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Transport(format!(
                "status request answered with {}: {}",
                status, body
            )));
        }

        let parsed: JobStatusResponse = response
            .json()
            .await
            .map_err(|e| ProcessorError::Transport(format!("malformed status response: {}", e)))?;

        parse_state(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_queued_and_processing() {
        let state = parse_state(JobStatusResponse {
            status: "queued".to_string(),
            output_url: None,
            error: None,
        })
        .unwrap();
        assert_eq!(state, JobState::Queued);
        assert!(!state.is_terminal());

        let state = parse_state(JobStatusResponse {
            status: "processing".to_string(),
            output_url: None,
            error: None,
        })
        .unwrap();
        assert_eq!(state, JobState::InProgress);
    }

    #[test]
    fn test_parse_state_succeeded_requires_output() {
        let state = parse_state(JobStatusResponse {
            status: "succeeded".to_string(),
            output_url: Some("https://cdn/clean.wav".to_string()),
            error: None,
        })
        .unwrap();
        assert_eq!(
            state,
            JobState::Succeeded {
                output_url: "https://cdn/clean.wav".to_string()
            }
        );

        let missing = parse_state(JobStatusResponse {
            status: "succeeded".to_string(),
            output_url: None,
            error: None,
        });
        assert!(matches!(missing, Err(ProcessorError::Transport(_))));
    }

    #[test]
    fn test_parse_state_failed_carries_reason() {
        let state = parse_state(JobStatusResponse {
            status: "failed".to_string(),
            output_url: None,
            error: Some("unsupported format".to_string()),
        })
        .unwrap();
        assert_eq!(
            state,
            JobState::Failed {
                reason: "unsupported format".to_string()
            }
        );
    }

    #[test]
    fn test_parse_state_unknown_is_transport_error() {
        let result = parse_state(JobStatusResponse {
            status: "paused".to_string(),
            output_url: None,
            error: None,
        });
        assert!(matches!(result, Err(ProcessorError::Transport(_))));
    }
}
