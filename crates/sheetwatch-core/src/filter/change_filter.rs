//! Group-based change filter.
//!
//! A record is kept when no exclude pattern matches its path, and either
//! the include set is empty or an include pattern matches, and its priority
//! is at least the optional minimum. Exclusion always wins.

use std::collections::BTreeSet;

use crate::detection::model::{ChangeRecord, Priority};
use crate::errors::{SwError, SwErrorKind};
use crate::filter::pattern::FieldPattern;
use crate::groups::catalog::{GroupCatalog, ALL_GROUPS};
use crate::groups::presets::preset;

#[derive(Debug, Clone, Default)]
struct PatternSet {
    raw: BTreeSet<String>,
    compiled: Vec<FieldPattern>,
}

impl PatternSet {
    fn new(raw: BTreeSet<String>) -> Self {
        let compiled = raw.iter().map(|p| FieldPattern::parse(p)).collect();
        Self { raw, compiled }
    }

    fn matches(&self, path: &str) -> bool {
        self.compiled.iter().any(|p| p.matches(path))
    }

    fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Immutable, shareable filter.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    include_group_names: Vec<String>,
    exclude_group_names: Vec<String>,
    include: PatternSet,
    exclude: PatternSet,
    min_priority: Option<Priority>,
    unknown_groups: Vec<String>,
}

impl Default for ChangeFilter {
    /// Include every core group, exclude nothing.
    fn default() -> Self {
        Self::new(GroupCatalog::builtin(), &[ALL_GROUPS], &[] as &[&str])
    }
}

impl ChangeFilter {
    /// Resolve include and exclude group names against `catalog`.
    /// Unknown names are kept in [`ChangeFilter::unknown_groups`].
    pub fn new<I, E>(catalog: &GroupCatalog, include: &[I], exclude: &[E]) -> Self
    where
        I: AsRef<str>,
        E: AsRef<str>,
    {
        let inc = catalog.resolve(include);
        let exc = catalog.resolve(exclude);
        let mut unknown = inc.unknown;
        for name in exc.unknown {
            if !unknown.contains(&name) {
                unknown.push(name);
            }
        }
        Self {
            include_group_names: include.iter().map(|s| s.as_ref().to_string()).collect(),
            exclude_group_names: exclude.iter().map(|s| s.as_ref().to_string()).collect(),
            include: PatternSet::new(inc.patterns),
            exclude: PatternSet::new(exc.patterns),
            min_priority: None,
            unknown_groups: unknown,
        }
    }

    /// Filter from a named preset.
    ///
    /// # Errors
    ///
    /// `CONFIG_ERROR` when no preset has that name.
    pub fn from_preset(catalog: &GroupCatalog, name: &str) -> Result<Self, SwError> {
        let p = preset(name).ok_or_else(|| {
            SwError::new(SwErrorKind::ConfigError)
                .with_op("filter_from_preset")
                .with_message(format!("unknown filter preset `{}`", name))
        })?;
        Ok(Self::new(catalog, p.include, p.exclude))
    }

    /// Filter from raw field patterns, bypassing group resolution.
    pub fn from_patterns<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
    {
        Self {
            include_group_names: Vec::new(),
            exclude_group_names: Vec::new(),
            include: PatternSet::new(include.into_iter().collect()),
            exclude: PatternSet::new(exclude.into_iter().collect()),
            min_priority: None,
            unknown_groups: Vec::new(),
        }
    }

    /// Keeps everything.
    pub fn allow_all() -> Self {
        Self::from_patterns(Vec::new(), Vec::new())
    }

    pub fn with_min_priority(mut self, min_priority: Priority) -> Self {
        self.min_priority = Some(min_priority);
        self
    }

    pub fn should_keep(&self, record: &ChangeRecord) -> bool {
        let path = record.field_path();
        if self.exclude.matches(path) {
            return false;
        }
        if !self.include.is_empty() && !self.include.matches(path) {
            return false;
        }
        self.min_priority.map_or(true, |min| record.priority() >= min)
    }

    /// Keep matching records, preserving order.
    pub fn filter(&self, records: Vec<ChangeRecord>) -> Vec<ChangeRecord> {
        records.into_iter().filter(|r| self.should_keep(r)).collect()
    }

    pub fn include_group_names(&self) -> &[String] {
        &self.include_group_names
    }

    pub fn exclude_group_names(&self) -> &[String] {
        &self.exclude_group_names
    }

    pub fn include_patterns(&self) -> &BTreeSet<String> {
        &self.include.raw
    }

    pub fn exclude_patterns(&self) -> &BTreeSet<String> {
        &self.exclude.raw
    }

    pub fn min_priority(&self) -> Option<Priority> {
        self.min_priority
    }

    /// Group names that resolved to nothing.
    pub fn unknown_groups(&self) -> &[String] {
        &self.unknown_groups
    }
}
