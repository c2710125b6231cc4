//! High-level operations.
//!
//! This module contains the orchestration logic behind srbuild commands:
//! which targets and profiles a command applies to, when the project has to
//! be (re)configured, and what install/uninstall/clean would change on disk.

pub mod install;
pub mod lifecycle;
pub mod plan;
pub mod profiles;
pub mod resolve;

pub use install::{
    clean_plan, install_plan, nuke_plan, select_install, split_install_names, uninstall_plan,
    InstallDirs, InstallSelection,
};
pub use lifecycle::{ConfigureOptions, LifecycleError, LifecycleGate, Phase};
pub use plan::{Applied, FsAction, MutationPlan};
pub use profiles::{select_profiles, ProfileDefault, ProfileError, INSTALL_PROFILE};
pub use resolve::{resolve_targets, ResolveError};
