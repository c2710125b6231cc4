//! Borrowed views over a project's target collections.
//!
//! Commands choose which collections a name is looked up in (`run` only
//! considers executables, `build` considers everything). A [`Collection`]
//! pairs a slice of targets with the kind they were declared as, so lookups
//! can report where a name was found and what was available.

use crate::core::project::Project;
use crate::core::target::{Target, TargetKind};

/// One named collection of targets, borrowed from a [`Project`].
#[derive(Debug, Clone, Copy)]
pub struct Collection<'a> {
    kind: TargetKind,
    targets: &'a [Target],
}

impl<'a> Collection<'a> {
    pub fn new(kind: TargetKind, targets: &'a [Target]) -> Self {
        Collection { kind, targets }
    }

    /// Kind of the targets in this collection.
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Collection name, e.g. "executables".
    pub fn name(&self) -> &'static str {
        self.kind.collection_name()
    }

    pub fn targets(&self) -> &'a [Target] {
        self.targets
    }

    /// Find a target by exact name.
    pub fn get(&self, name: &str) -> Option<&'a Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Target names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.name.clone()).collect()
    }
}

impl Project {
    /// Borrow the collections of the given kinds, in the order given.
    pub fn collections(&self, kinds: &[TargetKind]) -> Vec<Collection<'_>> {
        kinds
            .iter()
            .map(|&kind| Collection::new(kind, self.collection(kind)))
            .collect()
    }

    /// Borrow every collection: libraries, executables, tests.
    pub fn all_collections(&self) -> Vec<Collection<'_>> {
        self.collections(&TargetKind::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_follow_requested_order() {
        let project = Project::new("build")
            .with_target(Target::library("core"))
            .with_target(Target::executable("app"))
            .with_target(Target::executable("tool"));

        let collections = project.collections(&[TargetKind::Executable, TargetKind::Library]);
        assert_eq!(collections[0].name(), "executables");
        assert_eq!(collections[0].names(), vec!["app", "tool"]);
        assert_eq!(collections[1].kind(), TargetKind::Library);

        assert_eq!(collections[0].get("tool").map(|t| t.kind()), Some(TargetKind::Executable));
        assert!(collections[1].get("app").is_none());
        assert_eq!(project.all_collections().len(), 3);
    }
}
