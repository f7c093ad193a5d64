use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Failure reported by the pipeline backend, carrying the HTTP status
    /// code (when the request reached the server) and the most specific
    /// message the response offered.
    #[error("{message}")]
    Gateway { code: Option<u16>, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// The user-facing message for this failure.
    ///
    /// Prefers the backend's structured detail over the generic error
    /// rendering; falls back to the plain Display output.
    pub fn user_message(&self) -> String {
        match self {
            Error::Gateway { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
