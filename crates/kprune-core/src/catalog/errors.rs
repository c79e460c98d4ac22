use crate::errors::KpruneError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid resource kind '{spec}': {reason}")]
    InvalidKind { spec: String, reason: String },

    #[error("Resource kind '{kind}' is listed more than once")]
    DuplicateKind { kind: String },
}

impl KpruneError for CatalogError {
    fn error_code(&self) -> &'static str {
        match self {
            CatalogError::InvalidKind { .. } => "CATALOG_INVALID_KIND",
            CatalogError::DuplicateKind { .. } => "CATALOG_DUPLICATE_KIND",
        }
    }

    fn is_user_error(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_kind() {
        let error = CatalogError::InvalidKind {
            spec: "apps".to_string(),
            reason: "expected version/Kind or group/version/Kind".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid resource kind 'apps': expected version/Kind or group/version/Kind"
        );
        assert_eq!(error.error_code(), "CATALOG_INVALID_KIND");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_duplicate_kind() {
        let error = CatalogError::DuplicateKind {
            kind: "apps/v1/Deployment".to_string(),
        };
        assert_eq!(error.error_code(), "CATALOG_DUPLICATE_KIND");
    }
}
