//! Import records (`using` directives) and their legacy string form.
//!
//! Legacy symbol files store every import as one prefixed string:
//!
//! | Record                         | String                          |
//! |--------------------------------|---------------------------------|
//! | `using N;`                     | `UN`                            |
//! | `using A::N;`                  | `EN A`                          |
//! | `using X = N;`                 | `AX UN`                         |
//! | `using X = A::N;`              | `AX EN A`                       |
//! | `using X = T;`                 | `AX TT, Assembly`               |
//! | `extern alias A;`              | `XA`                            |
//! | `using static T;`              | `TT, Assembly`                  |
//! | extern alias target (emitter)  | `ZA Assembly`                   |

use std::fmt;

/// Grouping rank of a record inside one import level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportGroup {
    /// Namespace and static type imports
    Namespace = 0,
    /// Namespace and type aliases
    Alias = 1,
    /// `extern alias` declarations
    ExternAlias = 2,
}

/// A single import declared on a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportRecord {
    /// `using N;` or `using A::N;`
    Namespace {
        /// Namespace name
        name: String,
        /// Extern alias qualifier
        qualifier: Option<String>,
    },
    /// `using X = N;` or `using X = A::N;`
    NamespaceAlias {
        /// Alias being defined
        alias: String,
        /// Target namespace
        target: String,
        /// Extern alias qualifier
        qualifier: Option<String>,
    },
    /// `using X = T;`
    TypeAlias {
        /// Alias being defined
        alias: String,
        /// Target type name
        type_name: String,
        /// Identity of the assembly defining the type
        assembly: Option<String>,
    },
    /// `extern alias A;`
    ExternAlias {
        /// Alias name
        alias: String,
    },
    /// `using static T;`
    StaticType {
        /// Type name
        type_name: String,
        /// Identity of the assembly defining the type
        assembly: Option<String>,
    },
}

pub(crate) fn qualified_type(type_name: &str, assembly: Option<&str>) -> String {
    match assembly {
        Some(assembly) => format!("{type_name}, {assembly}"),
        None => type_name.to_string(),
    }
}

fn split_qualified_type(text: &str) -> (String, Option<String>) {
    match text.split_once(", ") {
        Some((type_name, assembly)) => (type_name.to_string(), Some(assembly.to_string())),
        None => (text.to_string(), None),
    }
}

impl ImportRecord {
    /// `using name;`
    pub fn namespace(name: impl Into<String>) -> Self {
        ImportRecord::Namespace {
            name: name.into(),
            qualifier: None,
        }
    }

    /// `using qualifier::name;`
    pub fn qualified_namespace(name: impl Into<String>, qualifier: impl Into<String>) -> Self {
        ImportRecord::Namespace {
            name: name.into(),
            qualifier: Some(qualifier.into()),
        }
    }

    /// `using alias = target;`
    pub fn namespace_alias(alias: impl Into<String>, target: impl Into<String>) -> Self {
        ImportRecord::NamespaceAlias {
            alias: alias.into(),
            target: target.into(),
            qualifier: None,
        }
    }

    /// `extern alias alias;`
    pub fn extern_alias(alias: impl Into<String>) -> Self {
        ImportRecord::ExternAlias {
            alias: alias.into(),
        }
    }

    /// Group this record sorts into.
    #[must_use]
    pub fn group(&self) -> ImportGroup {
        match self {
            ImportRecord::Namespace { .. } | ImportRecord::StaticType { .. } => {
                ImportGroup::Namespace
            }
            ImportRecord::NamespaceAlias { .. } | ImportRecord::TypeAlias { .. } => {
                ImportGroup::Alias
            }
            ImportRecord::ExternAlias { .. } => ImportGroup::ExternAlias,
        }
    }

    /// Extern alias this record uses or declares, if any.
    #[must_use]
    pub fn extern_alias_used(&self) -> Option<&str> {
        match self {
            ImportRecord::Namespace { qualifier, .. }
            | ImportRecord::NamespaceAlias { qualifier, .. } => qualifier.as_deref(),
            ImportRecord::ExternAlias { alias } => Some(alias),
            ImportRecord::TypeAlias { .. } | ImportRecord::StaticType { .. } => None,
        }
    }

    /// Legacy prefixed string.
    #[must_use]
    pub fn to_legacy_string(&self) -> String {
        match self {
            ImportRecord::Namespace {
                name,
                qualifier: None,
            } => format!("U{name}"),
            ImportRecord::Namespace {
                name,
                qualifier: Some(qualifier),
            } => format!("E{name} {qualifier}"),
            ImportRecord::NamespaceAlias {
                alias,
                target,
                qualifier: None,
            } => format!("A{alias} U{target}"),
            ImportRecord::NamespaceAlias {
                alias,
                target,
                qualifier: Some(qualifier),
            } => format!("A{alias} E{target} {qualifier}"),
            ImportRecord::TypeAlias {
                alias,
                type_name,
                assembly,
            } => format!("A{alias} T{}", qualified_type(type_name, assembly.as_deref())),
            ImportRecord::ExternAlias { alias } => format!("X{alias}"),
            ImportRecord::StaticType {
                type_name,
                assembly,
            } => format!("T{}", qualified_type(type_name, assembly.as_deref())),
        }
    }

    /// Decode a legacy prefixed string; extern info strings (`Z`) are not records.
    #[must_use]
    pub fn from_legacy_string(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        let prefix = chars.next()?;
        let rest = chars.as_str();

        match prefix {
            'U' => Some(ImportRecord::namespace(rest)),
            'E' => {
                let (name, qualifier) = rest.rsplit_once(' ')?;
                Some(ImportRecord::qualified_namespace(name, qualifier))
            }
            'X' => Some(ImportRecord::extern_alias(rest)),
            'T' => {
                let (type_name, assembly) = split_qualified_type(rest);
                Some(ImportRecord::StaticType {
                    type_name,
                    assembly,
                })
            }
            'A' => {
                let (alias, target) = rest.split_once(' ')?;
                let mut target_chars = target.chars();
                match target_chars.next()? {
                    'U' => Some(ImportRecord::namespace_alias(alias, target_chars.as_str())),
                    'E' => {
                        let (target, qualifier) = target_chars.as_str().rsplit_once(' ')?;
                        Some(ImportRecord::NamespaceAlias {
                            alias: alias.to_string(),
                            target: target.to_string(),
                            qualifier: Some(qualifier.to_string()),
                        })
                    }
                    'T' => {
                        let (type_name, assembly) = split_qualified_type(target_chars.as_str());
                        Some(ImportRecord::TypeAlias {
                            alias: alias.to_string(),
                            type_name,
                            assembly,
                        })
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for ImportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_legacy_string())
    }
}

/// Assembly identity an extern alias refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternInfo {
    /// The extern alias
    pub alias: String,
    /// Assembly identity
    pub assembly: String,
}

impl ExternInfo {
    /// Legacy `Z` string.
    #[must_use]
    pub fn to_legacy_string(&self) -> String {
        format!("Z{} {}", self.alias, self.assembly)
    }

    /// Parse a legacy `Z` string.
    #[must_use]
    pub fn from_legacy_string(text: &str) -> Option<Self> {
        let (alias, assembly) = text.strip_prefix('Z')?.split_once(' ')?;
        Some(ExternInfo {
            alias: alias.to_string(),
            assembly: assembly.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_strings() {
        let cases = [
            (ImportRecord::namespace("System"), "USystem"),
            (
                ImportRecord::qualified_namespace("N.M", "Lib"),
                "EN.M Lib",
            ),
            (
                ImportRecord::namespace_alias("Col", "System.Collections"),
                "ACol USystem.Collections",
            ),
            (ImportRecord::extern_alias("Lib"), "XLib"),
            (
                ImportRecord::TypeAlias {
                    alias: "I".to_string(),
                    type_name: "System.Int32".to_string(),
                    assembly: Some("mscorlib, Version=4.0.0.0".to_string()),
                },
                "AI TSystem.Int32, mscorlib, Version=4.0.0.0",
            ),
            (
                ImportRecord::StaticType {
                    type_name: "System.Math".to_string(),
                    assembly: None,
                },
                "TSystem.Math",
            ),
        ];

        for (record, text) in cases {
            assert_eq!(record.to_legacy_string(), text);
            assert_eq!(ImportRecord::from_legacy_string(text), Some(record));
        }
    }

    #[test]
    fn qualified_alias_string() {
        let record = ImportRecord::NamespaceAlias {
            alias: "X".to_string(),
            target: "N".to_string(),
            qualifier: Some("Lib".to_string()),
        };
        assert_eq!(record.to_legacy_string(), "AX EN Lib");
        assert_eq!(record.extern_alias_used(), Some("Lib"));
        assert_eq!(ImportRecord::from_legacy_string("AX EN Lib"), Some(record));
    }

    #[test]
    fn groups_and_unknown_prefixes() {
        assert_eq!(ImportRecord::namespace("A").group(), ImportGroup::Namespace);
        assert_eq!(ImportRecord::namespace_alias("A", "B").group(), ImportGroup::Alias);
        assert_eq!(ImportRecord::extern_alias("A").group(), ImportGroup::ExternAlias);
        assert!(ImportGroup::Namespace < ImportGroup::ExternAlias);
        assert_eq!(ImportRecord::from_legacy_string("ZLib Lib, Version=1.0"), None);
        assert_eq!(ImportRecord::from_legacy_string(""), None);

        let info = ExternInfo {
            alias: "Lib".to_string(),
            assembly: "Lib, Version=1.0.0.0".to_string(),
        };
        assert_eq!(info.to_legacy_string(), "ZLib Lib, Version=1.0.0.0");
    }
}
