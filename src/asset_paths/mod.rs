//! Helpers for resolving and filtering asset paths.
//!
//! The responsibilities are split into focused submodules so that the filtering of trace
//! references, the lexical normalisation of paths and the per-entry copy decision can be
//! tested independently of any filesystem.

mod filters;
mod normalize;
mod predicate;

pub use filters::is_project_local;
pub use normalize::{absolutize, archive_name};
pub use predicate::is_required;
