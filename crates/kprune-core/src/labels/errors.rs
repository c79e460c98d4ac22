use crate::errors::KpruneError;

/// Failure to derive an ownership selector for a component.
///
/// Always fatal for the component's sweep: a wrong selector could match
/// resources that belong to someone else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("Component name must not be empty")]
    EmptyComponentName,

    #[error("Invalid value '{value}' for label '{key}': {reason}")]
    InvalidLabelValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid label metadata domain '{domain}': must be a DNS subdomain")]
    InvalidDomain { domain: String },

    #[error("Owning resource is missing its {missing}")]
    IncompleteOwner { missing: &'static str },
}

impl KpruneError for LabelError {
    fn error_code(&self) -> &'static str {
        match self {
            LabelError::EmptyComponentName => "LABEL_EMPTY_COMPONENT",
            LabelError::InvalidLabelValue { .. } => "LABEL_INVALID_VALUE",
            LabelError::InvalidDomain { .. } => "LABEL_INVALID_DOMAIN",
            LabelError::IncompleteOwner { .. } => "LABEL_INCOMPLETE_OWNER",
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
    fn test_invalid_label_value() {
        let error = LabelError::InvalidLabelValue {
            key: "install.operator.istio.io/owner-name".to_string(),
            value: "-gateway".to_string(),
            reason: "must start and end with an alphanumeric character".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid value '-gateway' for label 'install.operator.istio.io/owner-name': \
             must start and end with an alphanumeric character"
        );
        assert_eq!(error.error_code(), "LABEL_INVALID_VALUE");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_incomplete_owner() {
        let error = LabelError::IncompleteOwner { missing: "namespace" };
        assert_eq!(error.to_string(), "Owning resource is missing its namespace");
        assert_eq!(error.error_code(), "LABEL_INCOMPLETE_OWNER");
    }
}
