use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed with status code {status}{}", detail_suffix(.detail))]
    Http { status: u16, detail: Option<String> },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid link header: {0}")]
    LinkHeader(#[from] LinkHeaderError),

    #[error("Entity has no identifier")]
    MissingId,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}

impl ClientError {
    /// HTTP status attached to the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkHeaderError {
    #[error("input must not be of zero length")]
    Empty,

    #[error("section could not be split on ';': {0}")]
    MalformedSection(String),

    #[error("page parameter is not a number: {0}")]
    InvalidPage(String),

    #[error("header value is not valid ASCII")]
    NotAscii,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base url '{0}': {1}")]
    InvalidBaseUrl(String, String),

    #[error("{0} must be {1}")]
    InvalidValue(&'static str, &'static str),
}

/// Failure as seen by the slice: one "request failed" entry carrying the
/// status (when there was one) and the rendered message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct SerializedError {
    pub status: Option<u16>,
    pub message: String,
}

impl SerializedError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<&ClientError> for SerializedError {
    fn from(err: &ClientError) -> Self {
        Self::new(err.status(), err.to_string())
    }
}

impl From<ClientError> for SerializedError {
    fn from(err: ClientError) -> Self {
        Self::from(&err)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_message_includes_detail_when_present() {
        let err = ClientError::Http {
            status: 404,
            detail: Some("Entity not found".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Request failed with status code 404: Entity not found"
        );

        let bare = ClientError::Http {
            status: 500,
            detail: None,
        };
        assert_eq!(bare.to_string(), "Request failed with status code 500");
    }

    #[test]
    fn serialized_error_keeps_status_and_message() {
        let serialized = SerializedError::from(ClientError::Http {
            status: 400,
            detail: Some("idexists".to_string()),
        });
        assert_eq!(serialized.status, Some(400));
        assert_eq!(
            serialized.message,
            "Request failed with status code 400: idexists"
        );

        let missing = SerializedError::from(ClientError::MissingId);
        assert_eq!(missing.status, None);
        assert_eq!(missing.to_string(), "Entity has no identifier");
    }
}
