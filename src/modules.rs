//! Requirement set modules: passes run over a whole [`RequirementSet`] after ingestion.
//!
//! Modules declare which other modules must run before them; [`ModuleRegistry::sorted`] orders
//! them with the same graph substrate the requirements use. The registry is built once and
//! threaded explicitly through ingestion, there is no global module table.

use std::{fmt, sync::Arc};

use crate::{
    codec::diagnostic::codes, config::ReqGraphConfig, error::ReqGraphError, reqset::Digraph,
    reqset::RequirementSet,
};

pub const MODULE_SOLVED_BY: &str = "solved_by";
pub const MODULE_DEPENDS_ON: &str = "depends_on";
pub const MODULE_NO_CYCLES: &str = "no_cycles";
pub const MODULE_MASTER_NODES: &str = "master_nodes";

pub trait RequirementSetModule: Send + Sync {
    fn name(&self) -> &str;

    /// Names of the modules that must have run before this one.
    fn depends_on(&self) -> &[&'static str] {
        &[]
    }

    /// Run the module over the set. `Ok(false)` means the set failed the module's checks (the
    /// details are in the set's diagnostics); `Err` aborts the whole run.
    fn rewrite(&self, set: &mut RequirementSet) -> Result<bool, ReqGraphError>;
}

#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn RequirementSetModule>>,
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|module| module.name()))
            .finish()
    }
}

impl ModuleRegistry {
    /// A registry without any module. Ingestion then only checks field handling.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard modules: reference resolution, cycle detection and master node location.
    pub fn builtin(config: &ReqGraphConfig) -> Self {
        ModuleRegistry::empty()
            .with(SolvedByModule)
            .with(DependsOnModule {
                solved_by_authoritative: config.requirements.solved_by_authoritative,
            })
            .with(NoCyclesModule)
            .with(MasterNodesModule)
    }

    pub fn register(&mut self, module: impl RequirementSetModule + 'static) {
        if self.contains(module.name()) {
            tracing::warn!(
                "[ModuleRegistry::register] Replacing existing module: {}",
                module.name()
            );
            let name = module.name().to_string();
            self.modules.retain(|m| m.name() != name);
        }
        self.modules.push(Arc::new(module));
    }

    pub fn with(mut self, module: impl RequirementSetModule + 'static) -> Self {
        self.register(module);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The modules in execution order: every module after all modules it depends on.
    pub fn sorted(&self) -> Result<Vec<Arc<dyn RequirementSetModule>>, ReqGraphError> {
        let mut deps = Digraph::<String>::new();
        for module in self.modules.iter() {
            deps.add_node(&module.name().to_string());
        }
        for module in self.modules.iter() {
            for dep in module.depends_on() {
                if !self.contains(dep) {
                    return Err(ReqGraphError::NotFound(format!(
                        "module '{}' depends on unknown module '{}'",
                        module.name(),
                        dep
                    )));
                }
                deps.create_edge(&dep.to_string(), &module.name().to_string());
            }
        }
        let order = deps.topological_order()?;
        Ok(order
            .iter()
            .filter_map(|name| self.modules.iter().find(|m| m.name() == name).cloned())
            .collect())
    }
}

/// Resolves the 'Solved by' field of every requirement.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolvedByModule;

impl RequirementSetModule for SolvedByModule {
    fn name(&self) -> &str {
        MODULE_SOLVED_BY
    }

    fn rewrite(&self, set: &mut RequirementSet) -> Result<bool, ReqGraphError> {
        Ok(set.resolve_solved_by())
    }
}

/// Resolves the 'Depends on' field of every requirement.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependsOnModule {
    pub solved_by_authoritative: bool,
}

impl RequirementSetModule for DependsOnModule {
    fn name(&self) -> &str {
        MODULE_DEPENDS_ON
    }

    fn depends_on(&self) -> &[&'static str] {
        &[MODULE_SOLVED_BY]
    }

    fn rewrite(&self, set: &mut RequirementSet) -> Result<bool, ReqGraphError> {
        Ok(set.resolve_depends_on(self.solved_by_authoritative))
    }
}

/// Checks that the linked graph has a topological order.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCyclesModule;

impl RequirementSetModule for NoCyclesModule {
    fn name(&self) -> &str {
        MODULE_NO_CYCLES
    }

    fn depends_on(&self) -> &[&'static str] {
        &[MODULE_DEPENDS_ON]
    }

    fn rewrite(&self, set: &mut RequirementSet) -> Result<bool, ReqGraphError> {
        match set.graph().topological_order() {
            Ok(_) => Ok(true),
            Err(ReqGraphError::Cycle { id }) => {
                set.error(
                    codes::CYCLE,
                    "requirement is part of a dependency cycle",
                    Some(&id),
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

/// Locates the master nodes of the linked graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct MasterNodesModule;

impl RequirementSetModule for MasterNodesModule {
    fn name(&self) -> &str {
        MODULE_MASTER_NODES
    }

    fn depends_on(&self) -> &[&'static str] {
        &[MODULE_NO_CYCLES]
    }

    fn rewrite(&self, set: &mut RequirementSet) -> Result<bool, ReqGraphError> {
        set.find_master_nodes();
        Ok(true)
    }
}
