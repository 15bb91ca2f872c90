use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-checkable category of a fatal scrape failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Navigation or the whole page operation ran out of time
    Timeout,
    /// The WebDriver server or the target host could not be reached
    Connection,
    /// TLS certificate rejected by the browser
    Certificate,
    /// Any other browser-side failure
    Unexpected,
    /// Markdown conversion failed
    Rendering,
    /// The input URL is not an absolute http(s) URL
    InvalidUrl,
    /// Configuration could not be read or parsed
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection",
            ErrorKind::Certificate => "certificate",
            ErrorKind::Unexpected => "unexpected",
            ErrorKind::Rendering => "rendering",
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

/// Underlying driver error kept as the source of a browser failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal failure of a scrape request
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("timed out while {context}: {message}")]
    Timeout {
        context: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("connection failed while {context}: {message}")]
    Connection {
        context: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("certificate error while {context}: {message}")]
    Certificate {
        context: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("browser error while {context}: {message}")]
    Unexpected {
        context: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("markdown rendering failed: {0}")]
    Rendering(#[source] std::io::Error),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::Timeout { .. } => ErrorKind::Timeout,
            ScrapeError::Connection { .. } => ErrorKind::Connection,
            ScrapeError::Certificate { .. } => ErrorKind::Certificate,
            ScrapeError::Unexpected { .. } => ErrorKind::Unexpected,
            ScrapeError::Rendering(_) => ErrorKind::Rendering,
            ScrapeError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            ScrapeError::Config(_) => ErrorKind::Config,
        }
    }

    /// Timeout raised by a local deadline rather than by the driver
    pub fn timeout(context: impl Into<String>, message: impl Into<String>) -> Self {
        ScrapeError::Timeout {
            context: context.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Sorts a browser/driver error into one of the navigation kinds, keeping
    /// it as the source.
    ///
    /// Chrome reports network failures as `net::ERR_*` codes inside the
    /// WebDriver error text, so the classification is done on the message.
    pub fn from_browser_error<E>(context: &str, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let message = error.to_string();
        let lower = message.to_lowercase();
        let context = context.to_string();
        let source: Option<BoxError> = Some(Box::new(error));

        if lower.contains("timeout") || lower.contains("timed out") {
            ScrapeError::Timeout {
                context,
                message,
                source,
            }
        } else if lower.contains("err_cert")
            || lower.contains("certificate")
            || lower.contains("ssl")
        {
            ScrapeError::Certificate {
                context,
                message,
                source,
            }
        } else if lower.contains("err_connection")
            || lower.contains("err_name_not_resolved")
            || lower.contains("err_internet_disconnected")
            || lower.contains("err_address_unreachable")
            || lower.contains("connection refused")
            || lower.contains("failed to connect")
        {
            ScrapeError::Connection {
                context,
                message,
                source,
            }
        } else {
            ScrapeError::Unexpected {
                context,
                message,
                source,
            }
        }
    }

    /// Serializable `{kind, message}` view for callers that report failures
    pub fn failure(&self) -> Failure {
        Failure {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Structured failure object handed to the outer layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}
