//! Shared state of one batch run.

use crate::{
    batch::Config,
    fingerprint::{ContractGraph, DirectorySource, TypeSource},
};

/// Everything the workers of a batch share: the configuration and the contract graph.
///
/// The context is created once per [`crate::Batch::run`] and borrowed by every worker. The
/// configuration is read-only; the graph caches supertype lookups behind concurrent maps.
pub struct BatchContext {
    /// The validated configuration
    pub config: Config,
    /// Supertype analysis over the class directory, the classpath and the platform types
    pub graph: ContractGraph,
}

impl BatchContext {
    /// Creates the context for `config`.
    ///
    /// Supertypes are looked up in the class directory first, then in the classpath entries
    /// in order, then among the built-in platform types.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut roots = Vec::with_capacity(config.classpath.len() + 1);
        roots.push(config.class_dir.clone());
        roots.extend(config.classpath.iter().cloned());

        let sources: Vec<Box<dyn TypeSource>> = vec![Box::new(DirectorySource::new(roots))];

        BatchContext {
            config,
            graph: ContractGraph::new(sources),
        }
    }
}
