use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{SubmitReceipt, Transport};
use crate::answers::AnswerSet;
use crate::errors::SubmissionError;

/// Error body returned by the portal API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Success body; any of these fields becomes the receipt reference.
#[derive(Debug, Deserialize)]
struct SuccessBody {
    id: Option<serde_json::Value>,
    reference: Option<String>,
}

/// POSTs the payload as JSON to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

/// Map a non-success response body to the message shown to the user.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(|r| r.to_string())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        })
}

fn receipt_from_body(body: &str) -> SubmitReceipt {
    let Ok(parsed) = serde_json::from_str::<SuccessBody>(body) else {
        return SubmitReceipt::default();
    };
    let reference = parsed.reference.or_else(|| {
        parsed.id.map(|id| match id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    });
    SubmitReceipt { reference }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, payload: &AnswerSet) -> Result<SubmitReceipt, SubmissionError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmissionError::new(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SubmissionError::new(e.to_string()))?;

        if !status.is_success() {
            return Err(SubmissionError::new(error_message(status, &body)));
        }

        Ok(receipt_from_body(&body))
    }
}
