use thiserror::Error;

/// Failure of a single exchange with the chat endpoint.
///
/// Every variant carries owned strings so the error can be stored in the
/// conversation and sent between tasks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("could not reach {endpoint}: {reason}")]
    Network { endpoint: String, reason: String },
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("malformed reply: {0}")]
    MalformedBody(String),
}

/// Coarse grouping of [`ChatError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced an HTTP response
    Network,
    /// A response arrived but did not honour the wire contract
    Protocol,
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::Network { .. } | ChatError::Timeout { .. } => ErrorKind::Network,
            ChatError::Status { .. } | ChatError::MalformedBody(_) => ErrorKind::Protocol,
        }
    }

    pub(crate) fn from_transport(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            ChatError::Network {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_variants() {
        let timeout = ChatError::Timeout {
            endpoint: "http://localhost:8000/chat".into(),
        };
        assert_eq!(timeout.kind(), ErrorKind::Network);

        let status = ChatError::Status {
            status: 500,
            detail: "Internal server error".into(),
        };
        assert_eq!(status.kind(), ErrorKind::Protocol);
        assert_eq!(status.to_string(), "server returned 500: Internal server error");
    }
}
