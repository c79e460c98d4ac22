pub mod errors;
pub mod types;

pub use errors::ManifestError;
pub use types::{DesiredState, ExpectedSet, Manifest, ManifestMetadata};
