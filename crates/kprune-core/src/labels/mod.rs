pub mod errors;
pub mod labeler;
pub mod selector;

pub use errors::LabelError;
pub use labeler::{OwnershipLabeler, OwningResource};
pub use selector::LabelSelector;
