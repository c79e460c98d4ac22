use crate::errors::KpruneError;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error reading desired state: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Invalid desired state: {source}")]
    ParseError {
        #[from]
        source: serde_json::Error,
    },
}

impl KpruneError for ManifestError {
    fn error_code(&self) -> &'static str {
        match self {
            ManifestError::IoError { .. } => "MANIFEST_IO_ERROR",
            ManifestError::ParseError { .. } => "MANIFEST_PARSE_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, ManifestError::ParseError { .. })
    }
}
