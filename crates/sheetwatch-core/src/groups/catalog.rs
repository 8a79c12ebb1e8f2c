//! Group catalog: core groups, nested `parent.child` groups and composite
//! groups built from other groups.
//!
//! Names are unique across all three tables and composite references are
//! acyclic; both are checked once, when the catalog is built.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::detection::model::Priority;
use crate::errors::{SwError, SwErrorKind};

/// Name that resolves to every core group.
pub const ALL_GROUPS: &str = "*";

/// A top-level group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDefinition {
    pub name: String,
    pub field_patterns: BTreeSet<String>,
    pub description: String,
    pub priority: Priority,
    /// Nested groups under this one, filled in when the catalog is built.
    pub subgroup_names: Vec<String>,
}

impl GroupDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        patterns: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            field_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            description: description.into(),
            priority,
            subgroup_names: Vec::new(),
        }
    }
}

/// Output of [`GroupCatalog::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPatterns {
    pub patterns: BTreeSet<String>,
    /// Names that matched no group, in the order given.
    pub unknown: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupCatalog {
    core: BTreeMap<String, GroupDefinition>,
    nested: BTreeMap<String, BTreeSet<String>>,
    composite: BTreeMap<String, Vec<String>>,
}

impl GroupCatalog {
    pub fn builder() -> GroupCatalogBuilder {
        GroupCatalogBuilder::default()
    }

    /// Process-wide builtin catalog, built on first use.
    pub fn builtin() -> &'static GroupCatalog {
        static BUILTIN: OnceLock<GroupCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| super::builtin_builder().assemble())
    }

    pub fn core_group(&self, name: &str) -> Option<&GroupDefinition> {
        self.core.get(name)
    }

    pub fn nested_group(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nested.get(name)
    }

    pub fn composite_group(&self, name: &str) -> Option<&[String]> {
        self.composite.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        name == ALL_GROUPS
            || self.core.contains_key(name)
            || self.nested.contains_key(name)
            || self.composite.contains_key(name)
    }

    pub fn core_groups(&self) -> impl Iterator<Item = &GroupDefinition> {
        self.core.values()
    }

    pub fn nested_groups(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.nested.iter()
    }

    pub fn composite_groups(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.composite.iter()
    }

    /// Resolve group names to the union of their field patterns.
    ///
    /// Unknown names contribute nothing and are listed in
    /// [`ResolvedPatterns::unknown`]; a warning is logged for each.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> ResolvedPatterns {
        let mut out = ResolvedPatterns::default();
        for name in names {
            let mut visiting = Vec::new();
            self.resolve_into(name.as_ref(), &mut out, &mut visiting);
        }
        for name in &out.unknown {
            tracing::warn!(
                op = "resolve_groups",
                group = name.as_str(),
                err.code = SwErrorKind::FilterResolutionWarning.code(),
                "unknown group name"
            );
        }
        out
    }

    fn resolve_into(&self, name: &str, out: &mut ResolvedPatterns, visiting: &mut Vec<String>) {
        if name == ALL_GROUPS {
            for group in self.core.values() {
                out.patterns.extend(group.field_patterns.iter().cloned());
            }
        } else if let Some(members) = self.composite.get(name) {
            if visiting.iter().any(|v| v == name) {
                return;
            }
            visiting.push(name.to_string());
            for member in members {
                self.resolve_into(member, out, visiting);
            }
            visiting.pop();
        } else if let Some(patterns) = self.nested.get(name) {
            out.patterns.extend(patterns.iter().cloned());
        } else if let Some(group) = self.core.get(name) {
            out.patterns.extend(group.field_patterns.iter().cloned());
        } else if !out.unknown.iter().any(|u| u == name) {
            out.unknown.push(name.to_string());
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupCatalogBuilder {
    core: Vec<GroupDefinition>,
    nested: Vec<(String, Vec<String>)>,
    composite: Vec<(String, Vec<String>)>,
}

impl GroupCatalogBuilder {
    pub fn core(mut self, group: GroupDefinition) -> Self {
        self.core.push(group);
        self
    }

    pub fn nested(mut self, name: impl Into<String>, patterns: &[&str]) -> Self {
        self.nested.push((
            name.into(),
            patterns.iter().map(|p| p.to_string()).collect(),
        ));
        self
    }

    pub fn composite(mut self, name: impl Into<String>, members: &[&str]) -> Self {
        self.composite.push((
            name.into(),
            members.iter().map(|m| m.to_string()).collect(),
        ));
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// `INVALID_CATALOG` when a name is defined twice, a nested group's
    /// parent is not a core group, a composite references an unknown group,
    /// or composite references form a cycle.
    pub fn build(self) -> Result<GroupCatalog, SwError> {
        let mut names = BTreeSet::new();
        let all_names = self
            .core
            .iter()
            .map(|g| g.name.as_str())
            .chain(self.nested.iter().map(|(n, _)| n.as_str()))
            .chain(self.composite.iter().map(|(n, _)| n.as_str()));
        for name in all_names {
            if name == ALL_GROUPS || !names.insert(name.to_string()) {
                return Err(invalid(format!("group name `{}` is defined more than once", name)));
            }
        }

        for (name, _) in &self.nested {
            let parent = name.split_once('.').map(|(p, _)| p);
            if !parent.is_some_and(|p| self.core.iter().any(|g| g.name == p)) {
                return Err(invalid(format!(
                    "nested group `{}` has no core parent group",
                    name
                )));
            }
        }

        for (name, members) in &self.composite {
            for member in members {
                if member != ALL_GROUPS && !names.contains(member) {
                    return Err(invalid(format!(
                        "composite group `{}` references unknown group `{}`",
                        name, member
                    )));
                }
            }
        }

        let catalog = self.assemble();
        for name in catalog.composite.keys() {
            let mut path = Vec::new();
            if let Some(cycle) = find_cycle(&catalog, name, &mut path) {
                return Err(invalid(format!(
                    "composite groups form a cycle: {}",
                    cycle.join(" -> ")
                )));
            }
        }
        Ok(catalog)
    }

    /// Build without validation. Used for the builtin table, which is
    /// covered by tests.
    pub(crate) fn assemble(self) -> GroupCatalog {
        let mut core: BTreeMap<String, GroupDefinition> = self
            .core
            .into_iter()
            .map(|g| (g.name.clone(), g))
            .collect();
        let mut nested = BTreeMap::new();
        for (name, patterns) in self.nested {
            if let Some(parent) = name.split_once('.').and_then(|(p, _)| core.get_mut(p)) {
                parent.subgroup_names.push(name.clone());
            }
            nested.insert(name, patterns.into_iter().collect());
        }
        GroupCatalog {
            core,
            nested,
            composite: self.composite.into_iter().collect(),
        }
    }
}

fn invalid(message: String) -> SwError {
    SwError::new(SwErrorKind::InvalidCatalog)
        .with_op("build_group_catalog")
        .with_message(message)
}

fn find_cycle(catalog: &GroupCatalog, name: &str, path: &mut Vec<String>) -> Option<Vec<String>> {
    if let Some(pos) = path.iter().position(|p| p == name) {
        let mut cycle = path[pos..].to_vec();
        cycle.push(name.to_string());
        return Some(cycle);
    }
    let members = catalog.composite.get(name)?;
    path.push(name.to_string());
    for member in members {
        if let Some(cycle) = find_cycle(catalog, member, path) {
            return Some(cycle);
        }
    }
    path.pop();
    None
}
