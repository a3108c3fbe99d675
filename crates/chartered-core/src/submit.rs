//! Contact form delivery backends

use std::cell::RefCell;

use crate::dom::FormData;
use crate::Result;

#[cfg(feature = "http")]
use std::time::Duration;

#[cfg(feature = "http")]
use reqwest::Client;

#[cfg(feature = "http")]
use crate::Error;

/// Request timeout for the HTTP submitter
#[cfg(feature = "http")]
const SUBMIT_TIMEOUT_SECS: u64 = 15;

/// Something that can deliver a contact form submission
///
/// Futures are not required to be `Send` so browser-side implementations can
/// hold JS values across await points.
#[async_trait::async_trait(?Send)]
pub trait Submitter {
    async fn submit(&self, data: FormData) -> Result<()>;
}

/// Flat JSON object of the form's fields; later duplicates win
pub fn json_body(data: &FormData) -> serde_json::Value {
    let map = data
        .fields
        .iter()
        .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

/// Resolves or rejects immediately and keeps every submission it saw
pub struct ScriptedSubmitter {
    failure: Option<String>,
    received: RefCell<Vec<FormData>>,
}

impl ScriptedSubmitter {
    pub fn resolving() -> Self {
        Self {
            failure: None,
            received: RefCell::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            received: RefCell::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<FormData> {
        self.received.borrow().clone()
    }
}

#[async_trait::async_trait(?Send)]
impl Submitter for ScriptedSubmitter {
    async fn submit(&self, data: FormData) -> Result<()> {
        self.received.borrow_mut().push(data);
        match &self.failure {
            Some(reason) => Err(crate::Error::Submission(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Pretends to talk to a server: waits a fixed delay, then succeeds
#[cfg(feature = "runtime")]
pub struct SimulatedSubmitter {
    delay: std::time::Duration,
}

#[cfg(feature = "runtime")]
impl SimulatedSubmitter {
    pub fn new(delay: std::time::Duration) -> Self {
        Self { delay }
    }
}

#[cfg(feature = "runtime")]
#[async_trait::async_trait(?Send)]
impl Submitter for SimulatedSubmitter {
    async fn submit(&self, data: FormData) -> Result<()> {
        tracing::debug!(fields = data.fields.len(), "Simulating submission");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Posts the fields as JSON to a configured endpoint
#[cfg(feature = "http")]
pub struct HttpSubmitter {
    client: Client,
    endpoint: url::Url,
}

#[cfg(feature = "http")]
impl HttpSubmitter {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = url::Url::parse(endpoint)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(SUBMIT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[cfg(feature = "http")]
#[async_trait::async_trait(?Send)]
impl Submitter for HttpSubmitter {
    async fn submit(&self, data: FormData) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&json_body(&data))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SubmissionRejected {
                status: status.as_u16(),
            });
        }
        tracing::info!(endpoint = %self.endpoint, "Submission accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> FormData {
        FormData {
            fields: vec![
                ("name".to_string(), "Ada".to_string()),
                ("message".to_string(), "Quarterly audit".to_string()),
            ],
        }
    }

    #[test]
    fn test_json_body_is_flat_object() {
        let body = json_body(&data());
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["message"], "Quarterly audit");
    }

    #[cfg(feature = "runtime")]
    #[tokio::test(start_paused = true)]
    async fn test_simulated_submitter_waits_then_succeeds() {
        let start = tokio::time::Instant::now();
        let simulated = SimulatedSubmitter::new(std::time::Duration::from_millis(2000));
        assert!(simulated.submit(data()).await.is_ok());
        assert!(start.elapsed() >= std::time::Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_scripted_submitter_records_and_answers() {
        let ok = ScriptedSubmitter::resolving();
        assert!(ok.submit(data()).await.is_ok());
        assert_eq!(ok.received()[0].get("name"), Some("Ada"));

        let failing = ScriptedSubmitter::rejecting("offline");
        assert!(matches!(
            failing.submit(data()).await,
            Err(crate::Error::Submission(reason)) if reason == "offline"
        ));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_submitter_rejects_bad_endpoint() {
        assert!(matches!(
            HttpSubmitter::new("not a url"),
            Err(crate::Error::InvalidEndpoint(_))
        ));
        let submitter = HttpSubmitter::new("https://example.com/contact").unwrap();
        assert_eq!(submitter.endpoint().path(), "/contact");
    }
}
