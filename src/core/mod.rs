//! Core data structures for srbuild.
//!
//! This module contains the types the project file is made of:
//! - Targets and the collections they are grouped in
//! - Build profiles
//! - The project description itself

pub mod index;
pub mod profile;
pub mod project;
pub mod target;

pub use index::Collection;
pub use profile::Profile;
pub use project::{Backend, Project, ProjectError, ProjectHeader, TestSummary, PROJECT_API_VERSION};
pub use target::{Target, TargetKind};
