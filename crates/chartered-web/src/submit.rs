//! Browser-side submitters

use chartered_core::dom::FormData;
use chartered_core::submit::{json_body, Submitter};
use chartered_core::{Error, Result};
use gloo::net::http::Request;
use gloo::timers::future::TimeoutFuture;

/// Waits on a browser timer, then reports success
pub struct TimerSubmitter {
    delay_ms: u32,
}

impl TimerSubmitter {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms: u32::try_from(delay_ms).unwrap_or(u32::MAX),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Submitter for TimerSubmitter {
    async fn submit(&self, _data: FormData) -> Result<()> {
        TimeoutFuture::new(self.delay_ms).await;
        Ok(())
    }
}

/// Posts the fields as JSON with `fetch`
pub struct FetchSubmitter {
    endpoint: String,
}

impl FetchSubmitter {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Submitter for FetchSubmitter {
    async fn submit(&self, data: FormData) -> Result<()> {
        let response = Request::post(&self.endpoint)
            .json(&json_body(&data))
            .map_err(|e| Error::Submission(e.to_string()))?
            .send()
            .await
            .map_err(|e| Error::Submission(e.to_string()))?;

        if !response.ok() {
            return Err(Error::SubmissionRejected {
                status: response.status(),
            });
        }
        Ok(())
    }
}
