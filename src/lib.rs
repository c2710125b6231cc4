//! srbuild - command orchestration for script-configured native builds
//!
//! A build script describes the project (targets, profiles, public headers)
//! and writes it to a project file. This crate loads that description,
//! resolves which targets and profiles a command applies to, and drives
//! build, run, test, install, uninstall and clean against it.

pub mod core;
pub mod ops;
pub mod util;

pub use core::{Project, Target, TargetKind, PROJECT_API_VERSION};
pub use ops::{LifecycleGate, MutationPlan};
pub use util::context::GlobalContext;
