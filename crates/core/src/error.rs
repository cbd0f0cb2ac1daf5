use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type InsightResult<T> = Result<T, InsightError>;

/// Graph API codes meaning the access token is expired or invalid.
pub const SESSION_EXPIRED_CODES: [i64; 2] = [190, 102];

pub const GENERIC_LIVE_FAILURE: &str = "Failed to load live data";

/// Rejection body returned by the advertising API (`{"error": {...}}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, rename = "error_subcode")]
    pub subcode: Option<i64>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

impl ApiError {
    pub fn is_session_expired(&self) -> bool {
        self.code
            .is_some_and(|code| SESSION_EXPIRED_CODES.contains(&code))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authorization required")]
    Unauthorized,

    #[error("{0}")]
    LoginUnavailable(String),

    #[error("Advertising API error: {0}")]
    Api(ApiError),

    #[error("{0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The one error a fetch cycle or a login hands back to its caller once
/// every fallback has been exhausted.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("Session expired, please sign in again")]
    AuthExpired { code: i64 },

    #[error("{message}")]
    TransientApi {
        message: String,
        code: Option<i64>,
        error_type: Option<String>,
    },

    #[error("{message}")]
    SdkUnavailable { message: String },
}

impl FetchError {
    pub fn classify(err: &InsightError) -> Self {
        match err {
            InsightError::Api(api) if api.is_session_expired() => FetchError::AuthExpired {
                // is_session_expired guarantees a code
                code: api.code.unwrap_or(SESSION_EXPIRED_CODES[0]),
            },
            InsightError::Api(api) => FetchError::TransientApi {
                message: if api.message.trim().is_empty() {
                    GENERIC_LIVE_FAILURE.to_string()
                } else {
                    api.message.clone()
                },
                code: api.code,
                error_type: api.error_type.clone(),
            },
            InsightError::LoginUnavailable(message) => FetchError::SdkUnavailable {
                message: message.clone(),
            },
            other => {
                let message = other.to_string();
                FetchError::TransientApi {
                    message: if message.trim().is_empty() {
                        GENERIC_LIVE_FAILURE.to_string()
                    } else {
                        message
                    },
                    code: None,
                    error_type: None,
                }
            }
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            FetchError::AuthExpired { code } => Some(*code),
            FetchError::TransientApi { code, .. } => *code,
            FetchError::SdkUnavailable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: Option<i64>, message: &str) -> InsightError {
        InsightError::Api(ApiError {
            message: message.to_string(),
            code,
            subcode: None,
            error_type: Some("OAuthException".into()),
        })
    }

    #[test]
    fn test_session_codes_classify_as_auth_expired() {
        assert_eq!(
            FetchError::classify(&api(Some(190), "Error validating access token")),
            FetchError::AuthExpired { code: 190 }
        );
        assert_eq!(
            FetchError::classify(&api(Some(102), "Session key invalid")),
            FetchError::AuthExpired { code: 102 }
        );
    }

    #[test]
    fn test_other_api_errors_keep_message() {
        let classified = FetchError::classify(&api(Some(17), "User request limit reached"));
        assert_eq!(classified.to_string(), "User request limit reached");
        assert_eq!(classified.code(), Some(17));
    }

    #[test]
    fn test_blank_message_gets_generic_text() {
        let classified = FetchError::classify(&api(Some(1), "  "));
        assert_eq!(classified.to_string(), GENERIC_LIVE_FAILURE);
    }

    #[test]
    fn test_transport_error_is_transient() {
        let classified =
            FetchError::classify(&InsightError::Transport("connection refused".into()));
        assert!(matches!(classified, FetchError::TransientApi { .. }));
        assert_eq!(classified.to_string(), "connection refused");
    }

    #[test]
    fn test_api_error_deserializes_graph_shape() {
        let body = r#"{"message":"Invalid OAuth access token.","type":"OAuthException","code":190,"error_subcode":463}"#;
        let err: ApiError = serde_json::from_str(body).unwrap();
        assert_eq!(err.code, Some(190));
        assert_eq!(err.subcode, Some(463));
        assert_eq!(err.error_type.as_deref(), Some("OAuthException"));
        assert!(err.is_session_expired());
    }
}
