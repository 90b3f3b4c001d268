//! Node ingestion: reading records into a [`RequirementSet`] and running the requirement set
//! modules over the result.

use std::sync::Arc;

use super::RequirementSet;
use crate::{
    codec::{diagnostic::codes, ObjectCache, ParseContext, RecordFile, RecordParser, RecordSource},
    config::COLLECTION_REQUIREMENTS,
    error::ReqGraphError,
    modules::ModuleRegistry,
    properties::KIND_REQUIREMENT,
};

impl RequirementSet {
    /// Reads in all requirements of the source, then runs the requirement set modules.
    ///
    /// Per-record problems are accumulated in the diagnostics log; check
    /// [`RequirementSet::is_usable`] afterwards. `Err` is only returned for fatal conditions
    /// (source I/O, a module reporting a fatal error).
    pub fn read_requirements(
        &mut self,
        source: &dyn RecordSource,
        parser: &dyn RecordParser,
        modules: &ModuleRegistry,
        cache: &ObjectCache,
    ) -> Result<bool, ReqGraphError> {
        tracing::debug!("Called.");
        self.read_all_requirements(source, parser, modules, cache)?;
        let result = self.handle_modules(modules)?;
        tracing::debug!("Finished; usable [{}].", self.is_usable());
        Ok(result)
    }

    fn read_all_requirements(
        &mut self,
        source: &dyn RecordSource,
        parser: &dyn RecordParser,
        modules: &ModuleRegistry,
        cache: &ObjectCache,
    ) -> Result<(), ReqGraphError> {
        for record in source.records(COLLECTION_REQUIREMENTS)? {
            self.read_one_requirement(&record, parser, modules, cache);
        }
        tracing::info!("Read [{}] requirements", self.requirements.len());
        Ok(())
    }

    /// Read in one requirement from the record, going through the cache.
    pub fn read_one_requirement(
        &mut self,
        record: &RecordFile,
        parser: &dyn RecordParser,
        modules: &ModuleRegistry,
        cache: &ObjectCache,
    ) {
        let Some(rid) = record.stem(&self.config.requirements.suffix) else {
            tracing::info!("skipping file [{}]", record.name);
            return;
        };
        if rid.is_empty() || rid.ends_with('/') {
            self.error(
                codes::UNPARSABLE_REQUIREMENT,
                "could not be parsed: the record name carries no requirement id",
                Some(&record.name),
            );
            return;
        }
        tracing::info!("Reading requirement [{}]", rid);

        let req = match cache.get(KIND_REQUIREMENT, &record.version_id) {
            Some(cached) if cached.id == rid => cached,
            cached => {
                let ctx = ParseContext {
                    config: &self.config,
                    modules,
                };
                let parsed = parser.parse(record, rid, &ctx);
                if cached.is_some() {
                    // Same content under another name: the cached node carries the wrong id.
                    Arc::new(parsed)
                } else {
                    cache.put(&record.version_id, KIND_REQUIREMENT, parsed)
                }
            }
        };

        if req.is_usable() {
            self.add_requirement(req.as_ref().clone());
        } else {
            let reason = req.failure.as_deref().unwrap_or_default();
            self.error(
                codes::UNPARSABLE_REQUIREMENT,
                format!("could not be parsed: {reason}"),
                Some(&req.id),
            );
        }
    }

    /// Run all modules which are executed on the requirement set level, then check that every
    /// remaining field has a handler.
    pub fn handle_modules(&mut self, modules: &ModuleRegistry) -> Result<bool, ReqGraphError> {
        self.handle_modules_reqdeps(modules)?;
        if !self.is_usable() {
            self.error(
                codes::MODULE_FAILED,
                "there was a problem handling the requirement set modules",
                None,
            );
            return Ok(false);
        }
        if !self.all_tags_handled() {
            self.error(
                codes::UNHANDLED_TAGS_SUMMARY,
                "There were errors encountered during parsing and checking - can't continue.",
                None,
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Unlike the per-requirement passes, module execution stops at the first failing module:
    /// later modules rely on the results of the earlier ones.
    fn handle_modules_reqdeps(&mut self, modules: &ModuleRegistry) -> Result<(), ReqGraphError> {
        for module in modules.sorted()? {
            tracing::debug!("Running requirement set module [{}]", module.name());
            match module.rewrite(self) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!("Requirement set module [{}] failed", module.name());
                    self.set_not_usable();
                    return Ok(());
                }
                Err(err) => {
                    self.set_not_usable();
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Returns true iff every residual field of every requirement has a handler.
    fn all_tags_handled(&mut self) -> bool {
        let unhandled = self
            .requirements
            .values()
            .filter_map(|req| {
                let tags = req
                    .fields
                    .keys()
                    .filter(|tag| !self.config.is_handled_field(tag))
                    .cloned()
                    .collect::<Vec<_>>();
                (!tags.is_empty()).then(|| (req.id.clone(), tags))
            })
            .collect::<Vec<_>>();

        for (id, tags) in unhandled.iter() {
            self.error(
                codes::UNHANDLED_TAG,
                format!(
                    "No tag handler found for tag(s) '{}' - Hint: typo in tag(s)?",
                    tags.join("', '")
                ),
                Some(id),
            );
        }
        unhandled.is_empty()
    }
}
