pub mod decision;
pub mod enumerate;
pub mod errors;
pub mod handler;
pub mod types;

// Public API exports
pub use decision::classify;
pub use enumerate::{Listing, ResourceEnumerator};
pub use errors::{ErrorAggregate, PruneError, SweepFailure};
pub use handler::Pruner;
pub use types::{
    Component, Decision, PruneOptions, PruneOutcome, PruneReport, PruneSummary, SkippedKind,
};
