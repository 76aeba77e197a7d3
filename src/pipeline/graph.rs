// src/pipeline/graph.rs

//! Directed acyclic graph of steps, derived from a [`Plan`].

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, SitepipeError};
use crate::pipeline::plan::Plan;
use crate::pipeline::step::StepId;

/// Validated adjacency view of a plan.
///
/// Plans are authored in [`Plan`]'s constructors, so a cycle or a dangling
/// edge is a programming error; validating here keeps that error from
/// silently wedging the scheduler.
#[derive(Debug, Clone)]
pub struct StepGraph {
    /// step -> its direct dependencies.
    deps: BTreeMap<StepId, Vec<StepId>>,
    /// step -> steps that depend on it.
    dependents: BTreeMap<StepId, Vec<StepId>>,
    /// All steps in topological order.
    order: Vec<StepId>,
}

impl StepGraph {
    pub fn from_plan(plan: &Plan) -> Result<Self> {
        let mut graph: DiGraphMap<StepId, ()> = DiGraphMap::new();

        let mut deps: BTreeMap<StepId, Vec<StepId>> = BTreeMap::new();
        let mut dependents: BTreeMap<StepId, Vec<StepId>> = BTreeMap::new();

        for &step in plan.steps() {
            graph.add_node(step);
            deps.entry(step).or_default();
            dependents.entry(step).or_default();
        }

        for &(before, after) in plan.edges() {
            for step in [before, after] {
                if !deps.contains_key(&step) {
                    return Err(SitepipeError::Config(format!(
                        "plan '{}' has an edge involving step '{step}' that is not in the plan",
                        plan.name()
                    )));
                }
            }
            graph.add_edge(before, after, ());
            deps.entry(after).or_default().push(before);
            dependents.entry(before).or_default().push(after);
        }

        // A topological sort fails exactly when there is a cycle.
        let order = toposort(&graph, None).map_err(|cycle| {
            SitepipeError::PlanCycle(format!(
                "cycle in plan '{}' involving step '{}'",
                plan.name(),
                cycle.node_id()
            ))
        })?;

        Ok(Self {
            deps,
            dependents,
            order,
        })
    }

    pub fn steps(&self) -> impl Iterator<Item = StepId> + '_ {
        self.deps.keys().copied()
    }

    pub fn contains(&self, step: StepId) -> bool {
        self.deps.contains_key(&step)
    }

    pub fn dependencies_of(&self, step: StepId) -> &[StepId] {
        self.deps.get(&step).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents_of(&self, step: StepId) -> &[StepId] {
        self.dependents.get(&step).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Steps with no dependencies, in topological order.
    pub fn roots(&self) -> Vec<StepId> {
        self.order
            .iter()
            .copied()
            .filter(|s| self.dependencies_of(*s).is_empty())
            .collect()
    }

    /// All steps in dependency order (used for dry-run output).
    pub fn topo_order(&self) -> &[StepId] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_plan_orders_generator_last() {
        let graph = StepGraph::from_plan(&Plan::build()).unwrap();

        assert_eq!(graph.roots(), vec![StepId::Styles, StepId::Images]);
        assert_eq!(graph.topo_order().last(), Some(&StepId::GenerateSite));
        assert_eq!(
            graph.dependencies_of(StepId::GenerateSite),
            &[StepId::Styles, StepId::Images]
        );
        assert_eq!(
            graph.dependents_of(StepId::Styles),
            &[StepId::GenerateSite]
        );
    }

    #[test]
    fn install_plan_is_a_chain() {
        let graph = StepGraph::from_plan(&Plan::install_dependencies()).unwrap();

        assert_eq!(graph.roots(), vec![StepId::Clean]);
        assert_eq!(
            graph.topo_order(),
            &[
                StepId::Clean,
                StepId::InstallPackages,
                StepId::RelocateVendorStyles,
                StepId::NormalizeVendorStylesheet,
            ]
        );
    }

    #[test]
    fn cycle_is_rejected() {
        let plan = Plan {
            name: "broken",
            steps: vec![StepId::Styles, StepId::Images],
            edges: vec![
                (StepId::Styles, StepId::Images),
                (StepId::Images, StepId::Styles),
            ],
        };

        let err = StepGraph::from_plan(&plan).unwrap_err();
        assert!(matches!(err, SitepipeError::PlanCycle(_)));
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let plan = Plan {
            name: "broken",
            steps: vec![StepId::Styles],
            edges: vec![(StepId::Styles, StepId::GenerateSite)],
        };

        let err = StepGraph::from_plan(&plan).unwrap_err();
        assert!(matches!(err, SitepipeError::Config(_)));
    }
}
