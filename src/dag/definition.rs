// src/dag/definition.rs

//! Static pipeline definition: an ordered list of task nodes plus an
//! explicit edge list.
//!
//! Definitions are assembled with [`PipelineBuilder`], whose
//! [`chain`](PipelineBuilder::chain) mirrors the usual "a >> b >> [c, d] >> e"
//! style of wiring: adjacent links are connected all-to-all, so a parallel
//! group fans out from its predecessor and fans back in to its successor.

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;

use crate::dag::operator::Operator;
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};
use crate::types::TriggerRule;

/// A single node of the pipeline graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    pub id: TaskName,
    pub operator: Operator,
    pub trigger_rule: TriggerRule,
}

impl TaskNode {
    pub fn new(id: impl Into<TaskName>, operator: Operator) -> Self {
        Self {
            id: id.into(),
            operator,
            trigger_rule: TriggerRule::default(),
        }
    }

    pub fn with_trigger_rule(mut self, rule: TriggerRule) -> Self {
        self.trigger_rule = rule;
        self
    }
}

/// Ordered dependency edge: `successor` may not start before `predecessor`
/// is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub predecessor: TaskName,
    pub successor: TaskName,
}

/// One element of a [`PipelineBuilder::chain`] call.
#[derive(Debug, Clone)]
pub enum Link {
    Task(TaskName),
    Parallel(Vec<TaskName>),
}

impl Link {
    fn ids(&self) -> Vec<TaskName> {
        match self {
            Link::Task(id) => vec![id.clone()],
            Link::Parallel(ids) => ids.clone(),
        }
    }
}

impl From<&str> for Link {
    fn from(id: &str) -> Self {
        Link::Task(id.to_string())
    }
}

impl From<Vec<&str>> for Link {
    fn from(ids: Vec<&str>) -> Self {
        Link::Parallel(ids.into_iter().map(str::to_string).collect())
    }
}

/// Immutable, validated pipeline definition.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineDefinition {
    dag_id: String,
    description: Option<String>,
    tasks: Vec<TaskNode>,
    edges: Vec<Edge>,
}

impl PipelineDefinition {
    pub fn dag_id(&self) -> &str {
        &self.dag_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> &[TaskNode] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&TaskNode> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The first declared task (the unique root of a valid definition).
    pub fn first_task(&self) -> Option<&TaskNode> {
        self.tasks.first()
    }

    pub fn predecessors_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.successor == id)
            .map(|e| e.predecessor.as_str())
            .collect()
    }

    pub fn successors_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.predecessor == id)
            .map(|e| e.successor.as_str())
            .collect()
    }

    /// Task ids in a topological order. The order among independent tasks
    /// is unspecified.
    pub fn topological_order(&self) -> Result<Vec<TaskName>> {
        let graph = self.petgraph();
        toposort(&graph, None)
            .map(|order| order.into_iter().map(str::to_string).collect())
            .map_err(|cycle| {
                PipelineError::DagCycle(format!(
                    "cycle detected in task DAG involving task '{}'",
                    cycle.node_id()
                ))
            })
    }

    /// Check the structural invariants of the definition.
    pub fn validate(&self) -> Result<()> {
        ensure_has_tasks(self)?;
        ensure_unique_ids(self)?;
        ensure_edges_reference_tasks(self)?;
        self.topological_order()?;
        ensure_single_root(self)?;
        Ok(())
    }

    // Edge direction: predecessor -> successor.
    fn petgraph(&self) -> DiGraphMap<&str, ()> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for task in &self.tasks {
            graph.add_node(task.id.as_str());
        }
        for edge in &self.edges {
            graph.add_edge(edge.predecessor.as_str(), edge.successor.as_str(), ());
        }
        graph
    }
}

fn ensure_has_tasks(def: &PipelineDefinition) -> Result<()> {
    if def.tasks.is_empty() {
        return Err(PipelineError::InvalidGraph(format!(
            "pipeline '{}' has no tasks",
            def.dag_id
        )));
    }
    Ok(())
}

fn ensure_unique_ids(def: &PipelineDefinition) -> Result<()> {
    let mut seen = HashSet::new();
    for task in &def.tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(PipelineError::DuplicateTask(task.id.clone()));
        }
    }
    Ok(())
}

fn ensure_edges_reference_tasks(def: &PipelineDefinition) -> Result<()> {
    for edge in &def.edges {
        for end in [&edge.predecessor, &edge.successor] {
            if def.task(end).is_none() {
                return Err(PipelineError::TaskNotFound(end.clone()));
            }
        }
        if edge.predecessor == edge.successor {
            return Err(PipelineError::DagCycle(format!(
                "task '{}' cannot depend on itself",
                edge.predecessor
            )));
        }
    }
    Ok(())
}

fn ensure_single_root(def: &PipelineDefinition) -> Result<()> {
    for (idx, task) in def.tasks.iter().enumerate() {
        let has_preds = !def.predecessors_of(&task.id).is_empty();
        if idx == 0 && has_preds {
            return Err(PipelineError::InvalidGraph(format!(
                "first task '{}' must not have predecessors",
                task.id
            )));
        }
        if idx > 0 && !has_preds {
            return Err(PipelineError::InvalidGraph(format!(
                "task '{}' has no predecessor; only the first task may be a root",
                task.id
            )));
        }
    }
    Ok(())
}

/// Incremental builder for [`PipelineDefinition`].
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    dag_id: String,
    description: Option<String>,
    tasks: Vec<TaskNode>,
    edges: Vec<Edge>,
}

impl PipelineBuilder {
    pub fn new(dag_id: impl Into<String>) -> Self {
        Self {
            dag_id: dag_id.into(),
            description: None,
            tasks: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn task(mut self, node: TaskNode) -> Self {
        self.tasks.push(node);
        self
    }

    /// Add a single edge.
    pub fn edge(mut self, predecessor: &str, successor: &str) -> Self {
        self.push_edge(predecessor, successor);
        self
    }

    /// Connect each link to the next one, all-to-all.
    pub fn chain<I, L>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Link>,
    {
        let links: Vec<Link> = links.into_iter().map(Into::into).collect();
        for pair in links.windows(2) {
            for up in pair[0].ids() {
                for down in pair[1].ids() {
                    self.push_edge(&up, &down);
                }
            }
        }
        self
    }

    /// Validate and freeze the definition.
    pub fn build(self) -> Result<PipelineDefinition> {
        let def = PipelineDefinition {
            dag_id: self.dag_id,
            description: self.description,
            tasks: self.tasks,
            edges: self.edges,
        };
        def.validate()?;
        Ok(def)
    }

    fn push_edge(&mut self, predecessor: &str, successor: &str) {
        let edge = Edge {
            predecessor: predecessor.to_string(),
            successor: successor.to_string(),
        };
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }
}
