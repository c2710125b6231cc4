//! Target resolution.
//!
//! Maps the names given on the command line to targets. Every name is
//! looked up in every supplied collection and all matches are kept, so a
//! name shared by a library and an executable selects both.

use std::fmt;

use thiserror::Error;

use crate::core::{Collection, Target, TargetKind};
use crate::util::diagnostic::suggestions;

/// Target resolution failure.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("could not find target `{name}`\n{}{}", AvailableTargets(.available), suggestions::LIST_TARGETS)]
    NotFound {
        name: String,
        /// What each searched collection contains
        available: Vec<(TargetKind, Vec<String>)>,
    },
}

struct AvailableTargets<'a>(&'a [(TargetKind, Vec<String>)]);

impl fmt::Display for AvailableTargets<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, names) in self.0 {
            if names.is_empty() {
                writeln!(f, "  available {}: (none)", kind.collection_name())?;
            } else {
                writeln!(f, "  available {}: {}", kind.collection_name(), names.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Resolve target names across collections.
///
/// With no names, every target of the supplied collections is selected in
/// collection order. Otherwise the result holds one entry per
/// (name, collection) match, in request order.
pub fn resolve_targets<'a>(
    names: &[String],
    collections: &[Collection<'a>],
) -> Result<Vec<&'a Target>, ResolveError> {
    if names.is_empty() {
        let all: Vec<&'a Target> = collections.iter().flat_map(|c| c.targets().iter()).collect();
        tracing::debug!("no targets named, selecting all {} target(s)", all.len());
        return Ok(all);
    }

    let mut resolved = Vec::new();
    for name in names {
        let matches: Vec<(&'static str, &'a Target)> = collections
            .iter()
            .filter_map(|c| c.get(name).map(|t| (c.name(), t)))
            .collect();

        match matches.len() {
            0 => {
                return Err(ResolveError::NotFound {
                    name: name.clone(),
                    available: collections.iter().map(|c| (c.kind(), c.names())).collect(),
                });
            }
            1 => {}
            _ => {
                let found_in: Vec<&str> = matches.iter().map(|(collection, _)| *collection).collect();
                tracing::warn!(
                    "target `{}` exists in multiple collections ({}); using all of them",
                    name,
                    found_in.join(", ")
                );
            }
        }

        for (collection, target) in matches {
            tracing::trace!("resolved `{}` in {}", name, collection);
            resolved.push(target);
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Project;

    fn project() -> Project {
        Project::new("build")
            .with_profile("debug")
            .with_profile("release")
            .with_target(Target::library("core"))
            .with_target(Target::library("shared"))
            .with_target(Target::executable("app"))
            .with_target(Target::executable("shared"))
            .with_target(Target::test("core_test"))
    }

    fn names(targets: &[&Target]) -> Vec<String> {
        targets.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_empty_names_select_all_supplied() {
        let project = project();
        let all = resolve_targets(&[], &project.all_collections()).unwrap();
        assert_eq!(all.len(), 5);

        let tests = resolve_targets(&[], &project.collections(&[TargetKind::Test])).unwrap();
        assert_eq!(names(&tests), vec!["core_test (test)"]);
    }

    #[test]
    fn test_resolves_in_request_order() {
        let project = project();
        let resolved = resolve_targets(
            &["app".to_string(), "core".to_string()],
            &project.all_collections(),
        )
        .unwrap();
        assert_eq!(names(&resolved), vec!["app (executable)", "core (library)"]);
    }

    #[test]
    fn test_ambiguous_name_keeps_every_match() {
        let project = project();
        let resolved = resolve_targets(&["shared".to_string()], &project.all_collections()).unwrap();
        assert_eq!(names(&resolved), vec!["shared (library)", "shared (executable)"]);
    }

    #[test]
    fn test_repeated_name_is_not_deduplicated() {
        let project = project();
        let resolved = resolve_targets(
            &["app".to_string(), "app".to_string()],
            &project.all_collections(),
        )
        .unwrap();
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_not_found_lists_searched_collections() {
        let project = project();
        let err = resolve_targets(
            &["missing_target".to_string()],
            &project.collections(&[TargetKind::Executable]),
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("could not find target `missing_target`"));
        assert!(message.contains("available executables: app, shared"));
        assert!(!message.contains("libraries"));
        assert!(message.contains("srbuild help"));
    }

    #[test]
    fn test_collection_restriction() {
        let project = project();
        let err = resolve_targets(&["core".to_string()], &project.collections(&[TargetKind::Executable]));
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_collection_listed_as_none() {
        let project = Project::new("build").with_target(Target::library("core"));
        let err = resolve_targets(&["x".to_string()], &project.all_collections()).unwrap_err();
        assert!(err.to_string().contains("available tests: (none)"));
    }
}
