// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use crate::dag::definition::PipelineDefinition;
use crate::engine::TaskName;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    /// Direct dependencies: tasks that must be terminal before this one can run.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskName>,
}

/// Adjacency view of a pipeline definition keyed by task id.
///
/// Acyclicity is already guaranteed by [`PipelineDefinition::validate`];
/// here we only keep what scheduling and diagnostics need.
#[derive(Debug, Clone)]
pub struct DagGraph {
    /// Task ids in declaration order.
    order: Vec<TaskName>,
    nodes: HashMap<TaskName, DagNode>,
}

impl DagGraph {
    pub fn from_definition(def: &PipelineDefinition) -> Self {
        let mut nodes: HashMap<TaskName, DagNode> = HashMap::new();
        let order: Vec<TaskName> = def.tasks().iter().map(|t| t.id.clone()).collect();

        for id in &order {
            nodes.insert(
                id.clone(),
                DagNode {
                    deps: Vec::new(),
                    dependents: Vec::new(),
                },
            );
        }

        for edge in def.edges() {
            if let Some(node) = nodes.get_mut(&edge.successor) {
                node.deps.push(edge.predecessor.clone());
            }
            if let Some(node) = nodes.get_mut(&edge.predecessor) {
                node.dependents.push(edge.successor.clone());
            }
        }

        Self { order, nodes }
    }

    /// All task ids, in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks without dependencies.
    pub fn roots(&self) -> Vec<&str> {
        self.tasks()
            .filter(|t| self.dependencies_of(t).is_empty())
            .collect()
    }

    /// Tasks without dependents.
    pub fn leaves(&self) -> Vec<&str> {
        self.tasks()
            .filter(|t| self.dependents_of(t).is_empty())
            .collect()
    }

    /// Every task reachable from `start` by following dependents
    /// (excluding `start` itself).
    pub fn descendants_of(&self, start: &str) -> HashSet<TaskName> {
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = self.dependents_of(start).iter().map(|s| s.as_str()).collect();

        while let Some(name) = stack.pop() {
            if seen.insert(name.to_string()) {
                stack.extend(self.dependents_of(name).iter().map(|s| s.as_str()));
            }
        }

        seen
    }
}
