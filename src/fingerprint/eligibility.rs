//! Serialization contract analysis over the supertype graph.
//!
//! A class is eligible for fingerprint injection when `java.io.Serializable` is reachable
//! through its superclasses and superinterfaces and `java.io.Externalizable` is not. The
//! [`crate::fingerprint::ContractGraph`] walks that closure, resolving each supertype
//! through an ordered list of [`crate::fingerprint::TypeSource`]s and caching what it learns
//! for the rest of the batch.
//!
//! # Architecture
//!
//! Two concurrent caches back the graph:
//!
//! - `supertypes`: the direct supertypes of every name looked up so far, including negative
//!   results, so each class file is read at most once per batch
//! - `contracts`: the contract summary of the full closure above a type, so later walks stop
//!   as soon as they meet a type that was already summarized
//!
//! # Thread Safety
//!
//! [`crate::fingerprint::ContractGraph`] is [`Send`] and [`Sync`]. Workers classify classes
//! concurrently; two workers racing on the same uncached type both compute the same value
//! and the second insert is a no-op in effect.

use std::{
    collections::{BTreeSet, HashSet, VecDeque},
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;

use crate::{classfile::ClassFile, file::File, Result};

/// Internal name of the serialization marker interface.
pub const SERIALIZABLE: &str = "java/io/Serializable";
/// Internal name of the custom serialization interface.
pub const EXTERNALIZABLE: &str = "java/io/Externalizable";

/// Direct supertypes of one type, as internal names.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Supertypes {
    /// The superclass, `None` for `java/lang/Object` and interfaces listed without one
    pub super_class: Option<String>,
    /// Direct superinterfaces
    pub interfaces: Vec<String>,
}

impl Supertypes {
    /// Reads the direct supertypes of a parsed class.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if a supertype name cannot be resolved.
    pub fn of(class: &ClassFile) -> Result<Supertypes> {
        Ok(Supertypes {
            super_class: class.super_class_name()?,
            interfaces: class.interface_names()?,
        })
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.super_class
            .iter()
            .chain(self.interfaces.iter())
            .map(String::as_str)
    }
}

/// A place that can answer "what are the direct supertypes of this type".
pub trait TypeSource: Send + Sync {
    /// Looks up a type by internal name. `Ok(None)` means this source does not know it.
    ///
    /// # Errors
    ///
    /// Implementations return an error only for failures that should abort the batch,
    /// never for an unknown or unreadable type.
    fn supertypes(&self, name: &str) -> Result<Option<Supertypes>>;
}

/// Built-in knowledge of the platform types that user classes commonly extend.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlatformTypes;

const PLATFORM: &[(&str, Option<&str>, &[&str])] = &[
    ("java/lang/Object", None, &[]),
    (SERIALIZABLE, None, &[]),
    (EXTERNALIZABLE, None, &[SERIALIZABLE]),
    ("java/lang/Comparable", None, &[]),
    ("java/lang/Cloneable", None, &[]),
    ("java/lang/Runnable", None, &[]),
    ("java/lang/AutoCloseable", None, &[]),
    ("java/io/Closeable", None, &["java/lang/AutoCloseable"]),
    ("java/lang/CharSequence", None, &[]),
    ("java/lang/Iterable", None, &[]),
    ("java/lang/annotation/Annotation", None, &[]),
    ("java/lang/Record", Some("java/lang/Object"), &[]),
    (
        "java/lang/Enum",
        Some("java/lang/Object"),
        &["java/lang/Comparable", SERIALIZABLE],
    ),
    ("java/lang/Number", Some("java/lang/Object"), &[SERIALIZABLE]),
    ("java/lang/Throwable", Some("java/lang/Object"), &[SERIALIZABLE]),
    ("java/lang/Exception", Some("java/lang/Throwable"), &[]),
    ("java/lang/Error", Some("java/lang/Throwable"), &[]),
    ("java/lang/RuntimeException", Some("java/lang/Exception"), &[]),
    (
        "java/lang/IllegalArgumentException",
        Some("java/lang/RuntimeException"),
        &[],
    ),
    (
        "java/lang/IllegalStateException",
        Some("java/lang/RuntimeException"),
        &[],
    ),
    (
        "java/lang/UnsupportedOperationException",
        Some("java/lang/RuntimeException"),
        &[],
    ),
    ("java/io/IOException", Some("java/lang/Exception"), &[]),
    ("java/util/EventObject", Some("java/lang/Object"), &[SERIALIZABLE]),
];

impl TypeSource for PlatformTypes {
    fn supertypes(&self, name: &str) -> Result<Option<Supertypes>> {
        Ok(PLATFORM
            .iter()
            .find(|(platform_name, _, _)| *platform_name == name)
            .map(|(_, super_class, interfaces)| Supertypes {
                super_class: super_class.map(str::to_string),
                interfaces: interfaces.iter().map(|i| (*i).to_string()).collect(),
            }))
    }
}

/// Resolves types from class files laid out by package under one or more root directories.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    roots: Vec<PathBuf>,
}

impl DirectorySource {
    /// Creates a source searching `roots` in order.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        DirectorySource { roots }
    }

    fn load(path: &Path) -> Option<Supertypes> {
        let file = match File::from_file(path) {
            Ok(file) => file,
            Err(error) => {
                log::debug!("cannot read {}: {}", path.display(), error);
                return None;
            }
        };

        match ClassFile::parse(file.data()).and_then(|class| Supertypes::of(&class)) {
            Ok(supertypes) => Some(supertypes),
            Err(error) => {
                log::debug!("cannot resolve supertypes from {}: {}", path.display(), error);
                None
            }
        }
    }
}

impl TypeSource for DirectorySource {
    fn supertypes(&self, name: &str) -> Result<Option<Supertypes>> {
        let relative = format!("{name}.class");
        for root in &self.roots {
            let path = root.join(&relative);
            if path.is_file() {
                if let Some(supertypes) = Self::load(&path) {
                    return Ok(Some(supertypes));
                }
            }
        }
        Ok(None)
    }
}

/// Result of the eligibility test for one class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Eligibility {
    /// Serializable, not Externalizable, closure fully resolved
    Eligible,
    /// Externalizable is reachable; definitive even with unresolved ancestors
    Externalizable,
    /// Serializable is not reachable and the closure is fully resolved
    NotSerializable,
    /// Some ancestors could not be resolved
    Undetermined {
        /// Internal names of the unresolved ancestors, sorted
        missing: Vec<String>,
        /// Whether Serializable was reached through the resolved part
        serializable_seen: bool,
    },
    /// The type is an interface and cannot carry a private field
    Interface,
}

impl Eligibility {
    /// Returns `true` only for [`Eligibility::Eligible`].
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// What the closure above a type contains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Contracts {
    serializable: bool,
    externalizable: bool,
    missing: BTreeSet<String>,
}

impl Contracts {
    fn absorb(&mut self, other: &Contracts) {
        self.serializable |= other.serializable;
        self.externalizable |= other.externalizable;
        self.missing.extend(other.missing.iter().cloned());
    }

    fn mark(&mut self, name: &str) {
        match name {
            SERIALIZABLE => self.serializable = true,
            EXTERNALIZABLE => self.externalizable = true,
            _ => {}
        }
    }
}

/// Reachability analysis of the serialization contracts, cached per batch.
pub struct ContractGraph {
    sources: Vec<Box<dyn TypeSource>>,
    supertypes: DashMap<String, Option<Arc<Supertypes>>>,
    contracts: DashMap<String, Arc<Contracts>>,
}

impl ContractGraph {
    /// Creates a graph consulting `sources` in order, then the built-in platform types.
    #[must_use]
    pub fn new(sources: Vec<Box<dyn TypeSource>>) -> Self {
        let mut sources = sources;
        sources.push(Box::new(PlatformTypes));
        ContractGraph {
            sources,
            supertypes: DashMap::new(),
            contracts: DashMap::new(),
        }
    }

    /// A graph that only knows the platform types.
    #[must_use]
    pub fn platform_only() -> Self {
        ContractGraph::new(Vec::new())
    }

    /// Number of types whose direct supertypes have been looked up.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.supertypes.len()
    }

    fn lookup(&self, name: &str) -> Result<Option<Arc<Supertypes>>> {
        if let Some(cached) = self.supertypes.get(name) {
            return Ok(cached.value().clone());
        }

        let mut found = None;
        for source in &self.sources {
            if let Some(supertypes) = source.supertypes(name)? {
                found = Some(Arc::new(supertypes));
                break;
            }
        }

        self.supertypes.insert(name.to_string(), found.clone());
        Ok(found)
    }

    /// Summarizes the closure above the given direct supertypes.
    fn walk(&self, roots: &Supertypes) -> Result<Contracts> {
        let mut summary = Contracts::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = roots.names().map(str::to_string).collect();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            summary.mark(&name);

            if let Some(cached) = self.contracts.get(&name) {
                summary.absorb(cached.value());
                continue;
            }

            match self.lookup(&name)? {
                Some(supertypes) => {
                    queue.extend(supertypes.names().map(str::to_string));
                }
                None => {
                    summary.missing.insert(name);
                }
            }
        }

        Ok(summary)
    }

    /// Classifies a parsed class.
    ///
    /// The class itself is the first type source: its own supertypes come from the parsed
    /// container, and the closure summary is cached under its name for subclasses processed
    /// later in the batch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the class's supertype names cannot be resolved,
    /// or any error a [`TypeSource`] reports.
    pub fn classify(&self, class: &ClassFile) -> Result<Eligibility> {
        let name = class.class_name()?;
        let supertypes = Supertypes::of(class)?;

        let contracts = self.walk(&supertypes)?;
        self.supertypes
            .entry(name.clone())
            .or_insert_with(|| Some(Arc::new(supertypes)));
        if contracts.missing.is_empty() {
            self.contracts.insert(name, Arc::new(contracts.clone()));
        }

        if class.is_interface() {
            return Ok(Eligibility::Interface);
        }

        Ok(Self::decide(contracts))
    }

    /// Classifies a type by internal name, resolving it through the sources.
    ///
    /// # Errors
    ///
    /// Returns any error a [`TypeSource`] reports.
    pub fn classify_name(&self, name: &str) -> Result<Eligibility> {
        let Some(supertypes) = self.lookup(name)? else {
            return Ok(Eligibility::Undetermined {
                missing: vec![name.to_string()],
                serializable_seen: false,
            });
        };

        let contracts = self.walk(&supertypes)?;
        Ok(Self::decide(contracts))
    }

    fn decide(contracts: Contracts) -> Eligibility {
        if contracts.externalizable {
            Eligibility::Externalizable
        } else if !contracts.missing.is_empty() {
            Eligibility::Undetermined {
                missing: contracts.missing.into_iter().collect(),
                serializable_seen: contracts.serializable,
            }
        } else if contracts.serializable {
            Eligibility::Eligible
        } else {
            Eligibility::NotSerializable
        }
    }
}

impl Default for ContractGraph {
    fn default() -> Self {
        ContractGraph::platform_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<&'static str, (Option<&'static str>, Vec<&'static str>)>);

    impl TypeSource for MapSource {
        fn supertypes(&self, name: &str) -> Result<Option<Supertypes>> {
            Ok(self.0.get(name).map(|(super_class, interfaces)| Supertypes {
                super_class: super_class.map(str::to_string),
                interfaces: interfaces.iter().map(|i| (*i).to_string()).collect(),
            }))
        }
    }

    fn graph(entries: &[(&'static str, Option<&'static str>, &[&'static str])]) -> ContractGraph {
        let map = entries
            .iter()
            .map(|(name, super_class, interfaces)| (*name, (*super_class, interfaces.to_vec())))
            .collect();
        ContractGraph::new(vec![Box::new(MapSource(map))])
    }

    #[test]
    fn platform_hierarchy() {
        let graph = ContractGraph::platform_only();
        assert_eq!(
            graph.classify_name("java/lang/RuntimeException").unwrap(),
            Eligibility::Eligible
        );
        assert_eq!(
            graph.classify_name("java/lang/Record").unwrap(),
            Eligibility::NotSerializable
        );
    }

    #[test]
    fn externalizable_wins_over_missing() {
        let graph = graph(&[
            ("a/Custom", Some("java/lang/Object"), &[EXTERNALIZABLE]),
            ("a/Child", Some("a/Custom"), &["a/Unknown"]),
        ]);
        assert_eq!(
            graph.classify_name("a/Child").unwrap(),
            Eligibility::Externalizable
        );
    }

    #[test]
    fn undetermined_reports_missing() {
        let graph = graph(&[
            ("a/Base", Some("lib/Missing"), &[SERIALIZABLE]),
            ("a/Leaf", Some("a/Base"), &["lib/Other"]),
        ]);
        assert_eq!(
            graph.classify_name("a/Leaf").unwrap(),
            Eligibility::Undetermined {
                missing: vec!["lib/Missing".to_string(), "lib/Other".to_string()],
                serializable_seen: true,
            }
        );
    }

    #[test]
    fn cycles_terminate() {
        let graph = graph(&[
            ("a/A", Some("a/B"), &[]),
            ("a/B", Some("a/A"), &[]),
        ]);
        assert_eq!(
            graph.classify_name("a/A").unwrap(),
            Eligibility::NotSerializable
        );
    }

    #[test]
    fn lookups_are_cached() {
        let graph = graph(&[("a/S", Some("java/lang/Object"), &[SERIALIZABLE])]);
        graph.classify_name("a/S").unwrap();
        let after_first = graph.resolved_count();
        graph.classify_name("a/S").unwrap();
        assert_eq!(graph.resolved_count(), after_first);
        assert!(!Eligibility::Interface.is_eligible());
        assert!(Eligibility::Eligible.is_eligible());
    }
}
