#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found at '{path}'")]
    ConfigNotFound { path: String },

    #[error("Failed to parse config file: {message}")]
    ConfigParseError { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_not_found_display() {
        let error = ConfigError::ConfigNotFound {
            path: "/tmp/missing.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Config file not found at '/tmp/missing.toml'"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        let error = ConfigError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(error.source().is_some());
        assert!(error.to_string().contains("denied"));
    }

    #[test]
    fn test_invalid_configuration_has_no_source() {
        let error = ConfigError::InvalidConfiguration {
            message: "namespace must not be empty".to_string(),
        };
        assert!(error.source().is_none());
    }
}
