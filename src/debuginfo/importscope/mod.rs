//! Import scopes: the `using` context of a method.
//!
//! Imports are declared on the scopes of a method. For emission they are flattened
//! into [`ImportLevels`]: one level per import-bearing scope, innermost scope first
//! (name lookup walks outward), and inside a level namespaces before aliases before
//! extern aliases. The legacy `using` record stores one count per level.
//!
//! Extern aliases used anywhere in the flattened list are followed by trailing
//! `externinfo` entries ([`ExternInfo`]) naming the assembly each alias refers to,
//! ordered by first use.

mod types;

pub use types::{ExternInfo, ImportGroup, ImportRecord};
pub(crate) use types::qualified_type;

/// Flattened import context of one method.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct ImportLevels {
    levels: Vec<Vec<ImportRecord>>,
}

impl ImportLevels {
    /// Build from per-level records, innermost level first.
    ///
    /// Levels without records are dropped; each level is stably ordered by group.
    #[must_use]
    pub fn new(levels: Vec<Vec<ImportRecord>>) -> Self {
        let levels = levels
            .into_iter()
            .filter(|level| !level.is_empty())
            .map(|mut level| {
                level.sort_by_key(ImportRecord::group);
                level
            })
            .collect();
        ImportLevels { levels }
    }

    /// Returns `true` if the method has no imports at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The levels, innermost first.
    #[must_use]
    pub fn levels(&self) -> &[Vec<ImportRecord>] {
        &self.levels
    }

    /// Record count of each level.
    #[must_use]
    pub fn counts(&self) -> Vec<usize> {
        self.levels.iter().map(Vec::len).collect()
    }

    /// All records, innermost level first.
    pub fn iter(&self) -> impl Iterator<Item = &ImportRecord> {
        self.levels.iter().flatten()
    }

    /// Extern info entries for the aliases used, in order of first use.
    ///
    /// `target` maps an alias to its assembly identity; aliases without a known target
    /// produce no entry.
    pub fn extern_infos<F>(&self, mut target: F) -> Vec<ExternInfo>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut infos: Vec<ExternInfo> = Vec::new();
        for alias in self.iter().filter_map(ImportRecord::extern_alias_used) {
            if infos.iter().any(|info| info.alias == alias) {
                continue;
            }
            if let Some(assembly) = target(alias) {
                infos.push(ExternInfo {
                    alias: alias.to_string(),
                    assembly,
                });
            }
        }
        infos
    }
}
