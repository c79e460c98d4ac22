use std::fmt;

use crate::catalog::ResourceKind;
use crate::cluster::{ClusterError, ObjectHash};
use crate::errors::KpruneError;
use crate::labels::LabelError;

/// A single failure recorded during a sweep.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SweepFailure {
    #[error("Failed to delete {kind} '{identity}' of component '{component}': {source}")]
    Deletion {
        component: String,
        kind: ResourceKind,
        identity: ObjectHash,
        #[source]
        source: ClusterError,
    },

    #[error("Cannot compute ownership labels for component '{component}': {source}")]
    Label {
        component: String,
        #[source]
        source: LabelError,
    },
}

impl SweepFailure {
    pub fn component(&self) -> &str {
        match self {
            SweepFailure::Deletion { component, .. } | SweepFailure::Label { component, .. } => {
                component
            }
        }
    }
}

/// Zero or more sweep failures. Empty means success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorAggregate {
    failures: Vec<SweepFailure>,
}

impl ErrorAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: SweepFailure) {
        self.failures.push(failure);
    }

    pub fn merge(&mut self, other: ErrorAggregate) {
        self.failures.extend(other.failures);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SweepFailure> {
        self.failures.iter()
    }

    pub fn into_failures(self) -> Vec<SweepFailure> {
        self.failures
    }

    /// `Ok(())` when nothing failed, otherwise the aggregate itself.
    pub fn into_result(self) -> Result<(), ErrorAggregate> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.as_slice() {
            [] => write!(f, "no prune failures"),
            [only] => write!(f, "{}", only),
            all => {
                write!(f, "{} prune failures: ", all.len())?;
                for (i, failure) in all.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}", failure)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ErrorAggregate {}

impl FromIterator<SweepFailure> for ErrorAggregate {
    fn from_iter<I: IntoIterator<Item = SweepFailure>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PruneError {
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    Aggregate(#[from] ErrorAggregate),
}

impl KpruneError for ErrorAggregate {
    fn error_code(&self) -> &'static str {
        "PRUNE_FAILED"
    }
}

impl KpruneError for PruneError {
    fn error_code(&self) -> &'static str {
        match self {
            PruneError::Label(e) => e.error_code(),
            PruneError::Aggregate(e) => e.error_code(),
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            PruneError::Label(e) => e.is_user_error(),
            PruneError::Aggregate(_) => false,
        }
    }
}
