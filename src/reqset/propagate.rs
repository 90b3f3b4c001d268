//! Constraint propagation: local CE3 evaluation followed by the unite pass.

use std::{collections::BTreeMap, sync::Arc};

use super::RequirementSet;
use crate::{
    constraints::{
        parse_constraint_list, Ce3, Ce3Evaluator, Ce3Set, ConstraintRegistry, ResolvedConstraint,
    },
    error::ReqGraphError,
    properties::{Constraint, Constraints},
};

impl RequirementSet {
    /// Evaluate the constraints of every requirement, then unite each requirement's value with
    /// the finalized values of its outgoing neighbours in reverse topological order.
    ///
    /// An undefined constraint name, a malformed 'Constraints' field or a cycle in the graph
    /// aborts the whole operation.
    pub fn resolve_ce3<E: Ce3Evaluator>(
        &mut self,
        registry: &ConstraintRegistry,
        evaluator: &E,
    ) -> Result<Ce3Set<E::Value>, ReqGraphError> {
        tracing::debug!("Called.");
        let mut ce3set = self.resolve_ce3_local(registry, evaluator)?;
        let order = self.graph.reverse_topological_order()?;
        self.unite_ce3(&order, &mut ce3set, evaluator);
        tracing::debug!("Finished; [{}] CE3s.", ce3set.len());
        Ok(ce3set)
    }

    fn resolve_ce3_local<E: Ce3Evaluator>(
        &mut self,
        registry: &ConstraintRegistry,
        evaluator: &E,
    ) -> Result<Ce3Set<E::Value>, ReqGraphError> {
        let mut ce3set = Ce3Set::new();
        for (id, req) in self.requirements.iter_mut() {
            let raw = match &req.constraints {
                Constraints::None => None,
                Constraints::Raw(raw) | Constraints::Resolved { raw, .. } => Some(raw.clone()),
            };
            let refs = match raw.as_deref() {
                None => Vec::new(),
                Some(raw) => parse_constraint_list(raw).map_err(|err| {
                    ReqGraphError::Serialization(format!(
                        "'Constraints' of requirement '{id}' could not be parsed: {err}"
                    ))
                })?,
            };

            let mut definitions = Vec::with_capacity(refs.len());
            for cref in refs.iter() {
                let constraint =
                    registry
                        .get(&cref.name)
                        .ok_or_else(|| ReqGraphError::UndefinedConstraint {
                            name: cref.name.clone(),
                            id: id.clone(),
                        })?;
                definitions.push(constraint);
            }

            let resolved = refs
                .iter()
                .zip(definitions.iter())
                .map(|(reference, constraint)| ResolvedConstraint {
                    reference,
                    constraint: constraint.as_ref(),
                })
                .collect::<Vec<_>>();
            let local = evaluator.evaluate(id, &resolved)?;
            tracing::debug!("[{}] local CE3 {:?}", id, local);

            if let Some(raw) = raw.filter(|_| !refs.is_empty()) {
                req.constraints = Constraints::Resolved {
                    raw,
                    definitions: refs
                        .iter()
                        .zip(definitions)
                        .map(|(cref, constraint)| (cref.name.clone(), constraint))
                        .collect::<BTreeMap<String, Arc<Constraint>>>(),
                };
            }
            ce3set.insert(id.clone(), Ce3::new(local));
        }
        Ok(ce3set)
    }

    /// Unite along `order`. Every neighbour visited earlier contributes its finalized value,
    /// a neighbour not yet visited contributes its local value.
    pub(super) fn unite_ce3<E: Ce3Evaluator>(
        &self,
        order: &[String],
        ce3set: &mut Ce3Set<E::Value>,
        evaluator: &E,
    ) {
        for id in order {
            let Some(local) = ce3set.get(id).map(|ce3| ce3.local.clone()) else {
                continue;
            };
            let neighbors = self.outgoing(id);
            let united = {
                let values = neighbors
                    .iter()
                    .filter_map(|n| ce3set.value(n))
                    .collect::<Vec<_>>();
                evaluator.unite(&local, &values)
            };
            tracing::debug!("[{}] united CE3 {:?}", id, united);
            if let Some(ce3) = ce3set.get_mut(id) {
                ce3.united = Some(united);
            }
        }
    }
}
