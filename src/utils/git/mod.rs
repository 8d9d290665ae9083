//! Git operations for the static site generator.
//!
//! Publishing itself is delegated to the deploy helper; this module only
//! answers questions about the source repository.

mod repo;

pub use repo::{GitRevisions, RevisionSource};
