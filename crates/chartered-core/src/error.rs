use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("Invalid root margin `{0}`")]
    RootMargin(String),

    #[error("Invalid submission endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[cfg(feature = "http")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Submission rejected with status {status}")]
    SubmissionRejected { status: u16 },

    #[error("Submission failed: {0}")]
    Submission(String),
}

impl Error {
    pub(crate) fn selector(selector: &str, reason: impl Into<String>) -> Self {
        Error::Selector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
