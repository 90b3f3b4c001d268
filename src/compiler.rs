use std::{collections::HashSet, path::Path};

use crate::{
    codec::{DiagnosticLog, DirectorySource, ObjectCache, RecordParser, RecordSource, TextRecordParser},
    config::{ConfigProvider, ReqGraphConfig, TomlConfigProvider, COLLECTION_REQUIREMENTS},
    constraints::{Ce3Evaluator, Ce3Set, ConstraintRegistry},
    error::ReqGraphError,
    modules::ModuleRegistry,
    properties::KIND_REQUIREMENT,
    reqset::RequirementSet,
};

/// Runs the whole pipeline over a record source: ingestion through the cache, the requirement
/// set modules, constraint loading and, for a usable set, constraint propagation.
///
/// The compiler owns the [`ObjectCache`], so compiling the same (or a slightly changed) source
/// again only parses records whose content changed. Clones of the cache share storage, which
/// lets several compilers reuse each other's work.
pub struct RequirementCompiler {
    config: ReqGraphConfig,
    modules: ModuleRegistry,
    cache: ObjectCache,
    parser: Box<dyn RecordParser + Send + Sync>,
}

/// Result of one compiler run
#[derive(Debug, Clone)]
pub struct CompileResult<V> {
    pub set: RequirementSet,
    /// `None` when the set was not usable and propagation did not run.
    pub ce3: Option<Ce3Set<V>>,
    pub constraints: ConstraintRegistry,
}

impl<V> CompileResult<V> {
    pub fn is_usable(&self) -> bool {
        self.set.is_usable()
    }

    pub fn stats(&self) -> CompileStats {
        CompileStats {
            requirements: self.set.requirements_count(),
            edges: self.set.graph().edge_count(),
            master_nodes: self.set.master_node_count(),
            constraints: self.constraints.len(),
            diagnostics: self.set.diagnostics().len(),
        }
    }
}

/// Statistics about one compiler run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileStats {
    pub requirements: usize,
    pub edges: usize,
    pub master_nodes: usize,
    pub constraints: usize,
    pub diagnostics: usize,
}

impl RequirementCompiler {
    /// A compiler with the built-in modules, the text record parser and an empty cache.
    pub fn new(config: ReqGraphConfig) -> Self {
        let modules = ModuleRegistry::builtin(&config);
        RequirementCompiler {
            config,
            modules,
            cache: ObjectCache::new(),
            parser: Box::new(TextRecordParser),
        }
    }

    /// Load the configuration file at `config_path` and build a compiler plus the directory
    /// source it describes. A missing configuration file means the default configuration.
    pub fn simple(
        config_path: impl AsRef<Path>,
    ) -> Result<(Self, DirectorySource), ReqGraphError> {
        let provider = TomlConfigProvider::new(config_path.as_ref().to_path_buf());
        let config = provider.get_config()?;
        let source = DirectorySource::from_config(&config, provider.base_dir());
        Ok((RequirementCompiler::new(config), source))
    }

    pub fn with_cache(mut self, cache: ObjectCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_modules(mut self, modules: ModuleRegistry) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_parser(mut self, parser: impl RecordParser + Send + Sync + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn config(&self) -> &ReqGraphConfig {
        &self.config
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    /// Drop cached requirements whose content version no longer occurs in `source`. Returns the
    /// number of dropped entries.
    ///
    /// The cache may be shared with compilers over other sources; only prune it when this
    /// source is the only one it serves.
    pub fn prune_cache(&self, source: &dyn RecordSource) -> Result<usize, ReqGraphError> {
        let current = source
            .records(COLLECTION_REQUIREMENTS)?
            .into_iter()
            .map(|record| record.version_id)
            .collect::<HashSet<_>>();
        Ok(self.cache.retain_versions(KIND_REQUIREMENT, &current))
    }

    /// Compile all records of `source`.
    ///
    /// Content problems end up in the diagnostics of the returned set; check
    /// [`CompileResult::is_usable`]. `Err` is reserved for fatal conditions: source I/O, a
    /// failing module, an undefined constraint or a cycle found during propagation.
    pub fn compile<E: Ce3Evaluator>(
        &self,
        source: &dyn RecordSource,
        evaluator: &E,
    ) -> Result<CompileResult<E::Value>, ReqGraphError> {
        let mut set = RequirementSet::new(self.config.clone());
        set.read_requirements(source, self.parser.as_ref(), &self.modules, &self.cache)?;

        let mut log = DiagnosticLog::new();
        let constraints =
            ConstraintRegistry::load(source, self.parser.as_ref(), &self.config, &mut log)?;
        set.diagnostics_mut().extend(log);

        let ce3 = if set.is_usable() {
            Some(set.resolve_ce3(&constraints, evaluator)?)
        } else {
            tracing::warn!("[Compiler] requirement set is not usable, skipping constraint propagation");
            None
        };

        tracing::info!(
            "[Compiler] compiled [{}] requirements, [{}] master nodes, usable [{}]",
            set.requirements_count(),
            set.master_node_count(),
            set.is_usable()
        );
        Ok(CompileResult {
            set,
            ce3,
            constraints,
        })
    }
}
