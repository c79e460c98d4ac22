use crate::errors::KpruneError;

/// Errors returned by a cluster backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    #[error("Resource kind '{kind}' is not served by the cluster")]
    KindNotFound { kind: String },

    #[error("Resource '{resource}' not found")]
    NotFound { resource: String },

    #[error("Cluster request failed: {message}")]
    Transport { message: String },

    #[error("Cluster rejected the request: {message}")]
    Forbidden { message: String },

    #[error("Cluster request cancelled")]
    Cancelled,
}

impl ClusterError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClusterError::Transport { .. })
    }
}

impl KpruneError for ClusterError {
    fn error_code(&self) -> &'static str {
        match self {
            ClusterError::KindNotFound { .. } => "CLUSTER_KIND_NOT_FOUND",
            ClusterError::NotFound { .. } => "CLUSTER_NOT_FOUND",
            ClusterError::Transport { .. } => "CLUSTER_TRANSPORT",
            ClusterError::Forbidden { .. } => "CLUSTER_FORBIDDEN",
            ClusterError::Cancelled => "CLUSTER_CANCELLED",
        }
    }
}

/// Errors loading or saving a cluster snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error on cluster snapshot: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Invalid cluster snapshot: {source}")]
    ParseError {
        #[from]
        source: serde_json::Error,
    },
}

impl KpruneError for SnapshotError {
    fn error_code(&self) -> &'static str {
        match self {
            SnapshotError::IoError { .. } => "SNAPSHOT_IO_ERROR",
            SnapshotError::ParseError { .. } => "SNAPSHOT_PARSE_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, SnapshotError::ParseError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_errors_are_transient() {
        assert!(
            ClusterError::Transport {
                message: "connection reset".to_string()
            }
            .is_transient()
        );
        assert!(
            !ClusterError::KindNotFound {
                kind: "networking.istio.io/v1alpha3/Sidecar".to_string()
            }
            .is_transient()
        );
        assert!(
            !ClusterError::Forbidden {
                message: "rbac".to_string()
            }
            .is_transient()
        );
        assert!(!ClusterError::Cancelled.is_transient());
    }

    #[test]
    fn test_kind_not_found_display() {
        let error = ClusterError::KindNotFound {
            kind: "config.istio.io/v1alpha2/rule".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Resource kind 'config.istio.io/v1alpha2/rule' is not served by the cluster"
        );
        assert_eq!(error.error_code(), "CLUSTER_KIND_NOT_FOUND");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_snapshot_parse_error_is_user_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = SnapshotError::from(source);
        assert_eq!(error.error_code(), "SNAPSHOT_PARSE_ERROR");
        assert!(error.is_user_error());
    }
}
