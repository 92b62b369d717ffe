//! View Graph Analysis
//!
//! Finds container cycles before any module is emitted.
//!
//! Two results are produced:
//! - back edges from a depth-first walk, which are the edges the container
//!   compiler must not import (dropping them leaves the graph acyclic)
//! - strongly connected components, reported as cycle groups

use petgraph::algo::kosaraju_scc;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{ViewGraph, ViewId};

/// An edge that closes a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackEdge {
    /// Container whose subview list holds the edge
    pub from: ViewId,
    /// Subview that is already on the walk stack
    pub to: ViewId,
    /// The cycle this edge closes, starting and ending at `to`
    pub cycle: Vec<ViewId>,
}

/// A strongly connected component with more than one member or a self-loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleGroup {
    pub id: usize,
    pub members: Vec<ViewId>,
    pub is_self_referential: bool,
}

/// Complete cycle analysis result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleAnalysis {
    pub back_edges: Vec<BackEdge>,
    pub groups: Vec<CycleGroup>,
    #[serde(skip)]
    edge_set: HashSet<(ViewId, ViewId)>,
    #[serde(skip)]
    membership: HashMap<ViewId, usize>,
}

impl CycleAnalysis {
    /// Is `from -> to` an edge that must be cut?
    pub fn is_cyclic_edge(&self, from: &str, to: &str) -> bool {
        self.edge_set.contains(&(from.to_string(), to.to_string()))
    }

    /// The back edge record for `from -> to`
    pub fn back_edge(&self, from: &str, to: &str) -> Option<&BackEdge> {
        self.back_edges.iter().find(|e| e.from == from && e.to == to)
    }

    /// Cycle group a view belongs to
    pub fn group_of(&self, id: &str) -> Option<&CycleGroup> {
        self.membership.get(id).and_then(|idx| self.groups.get(*idx))
    }

    pub fn is_acyclic(&self) -> bool {
        self.back_edges.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

/// Run cycle analysis over a view graph.
///
/// The walk visits roots in blueprint order and subviews in list order, so the
/// choice of which edge to cut inside a cycle is deterministic: it is always
/// the edge that returns to a view first reached earlier in that order.
pub fn analyze_cycles(graph: &ViewGraph) -> CycleAnalysis {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.order.len());
    let mut back_edges = Vec::new();

    for root in graph.ids() {
        if marks.contains_key(root) {
            continue;
        }
        marks.insert(root, Mark::OnStack);
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let successors = graph.successors(node);

            if top.1 >= successors.len() {
                marks.insert(node, Mark::Done);
                stack.pop();
                continue;
            }

            let target = successors[top.1].as_str();
            top.1 += 1;

            match marks.get(target).copied() {
                None => {
                    marks.insert(target, Mark::OnStack);
                    stack.push((target, 0));
                }
                Some(Mark::OnStack) => {
                    let start = stack.iter().position(|(n, _)| *n == target).unwrap_or(0);
                    let mut cycle: Vec<ViewId> =
                        stack[start..].iter().map(|(n, _)| n.to_string()).collect();
                    cycle.push(target.to_string());
                    back_edges.push(BackEdge {
                        from: node.to_string(),
                        to: target.to_string(),
                        cycle,
                    });
                }
                Some(Mark::Done) => {}
            }
        }
    }

    let mut groups = Vec::new();
    let mut membership = HashMap::new();

    for scc in kosaraju_scc(&graph.graph) {
        let is_self_referential = scc.len() == 1
            && graph.graph
                .edges_directed(scc[0], Direction::Outgoing)
                .any(|e| e.target() == scc[0]);

        if scc.len() < 2 && !is_self_referential {
            continue;
        }

        let mut members: Vec<ViewId> = scc
            .iter()
            .filter_map(|idx| graph.graph.node_weight(*idx).cloned())
            .collect();
        members.sort_by_key(|id| graph.order.iter().position(|o| o == id));

        let id = groups.len();
        for member in &members {
            membership.insert(member.clone(), id);
        }
        groups.push(CycleGroup {
            id,
            members,
            is_self_referential,
        });
    }

    let edge_set = back_edges
        .iter()
        .map(|e| (e.from.clone(), e.to.clone()))
        .collect();

    if !back_edges.is_empty() {
        tracing::info!(
            back_edges = back_edges.len(),
            groups = groups.len(),
            "container cycles detected"
        );
    }

    CycleAnalysis {
        back_edges,
        groups,
        edge_set,
        membership,
    }
}
