//! View Dependency Graph
//!
//! Containers nest other views, so a blueprint describes a directed graph over
//! view ids with container→subview edges. The graph is built once per run,
//! analysed for cycles before any module is emitted, and exported as DOT for
//! inspection.

pub mod analysis;
pub mod diagnostics;

pub use analysis::{analyze_cycles, BackEdge, CycleAnalysis, CycleGroup};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use crate::blueprint::{Blueprint, ViewKind};

/// View identifier as it appears in the blueprint
pub type ViewId = String;

/// Directed graph over views with container→subview edges
pub struct ViewGraph {
    /// petgraph structure used for SCCs and export
    pub(crate) graph: DiGraph<ViewId, ()>,

    /// Node index lookup: view id -> NodeIndex
    pub(crate) node_indices: HashMap<ViewId, NodeIndex>,

    /// Successors in subview-list order (petgraph iterates newest-first)
    pub(crate) successors: HashMap<ViewId, Vec<ViewId>>,

    /// View ids in blueprint order, first occurrence wins
    pub(crate) order: Vec<ViewId>,

    /// Container view ids
    containers: Vec<ViewId>,
}

impl ViewGraph {
    /// Build the graph from a blueprint.
    ///
    /// Dangling subview ids produce no edge; the container compiler reports them.
    pub fn build(blueprint: &Blueprint) -> Self {
        let mut graph = DiGraph::with_capacity(blueprint.views.len(), blueprint.views.len());
        let mut node_indices = HashMap::with_capacity(blueprint.views.len());
        let mut order = Vec::with_capacity(blueprint.views.len());

        for view in &blueprint.views {
            if node_indices.contains_key(&view.id) {
                continue;
            }
            let idx = graph.add_node(view.id.clone());
            node_indices.insert(view.id.clone(), idx);
            order.push(view.id.clone());
        }

        let mut successors: HashMap<ViewId, Vec<ViewId>> = HashMap::new();
        let mut containers = Vec::new();

        for id in &order {
            let Some(view) = blueprint.view(id) else {
                continue;
            };
            if view.kind() != ViewKind::Container {
                continue;
            }
            containers.push(id.clone());

            let from = node_indices[id];
            let targets = successors.entry(id.clone()).or_default();
            for entry in view.subview_list().entries {
                if let Some(&to) = node_indices.get(&entry.id) {
                    graph.add_edge(from, to, ());
                    targets.push(entry.id);
                }
            }
        }

        Self {
            graph,
            node_indices,
            successors,
            order,
            containers,
        }
    }

    /// All view ids in blueprint order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Resolved subviews of a container, in list order
    pub fn successors(&self, id: &str) -> &[ViewId] {
        self.successors.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Container ids in blueprint order
    pub fn containers(&self) -> &[ViewId] {
        &self.containers
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    pub fn view_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Export the graph in DOT format, highlighting cyclic edges
    pub fn to_dot(&self, blueprint: &Blueprint, cycles: &CycleAnalysis) -> String {
        let mut output = String::new();

        output.push_str("digraph ViewGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8];\n");
        output.push('\n');

        for id in &self.order {
            let (label, color) = match blueprint.view(id) {
                Some(view) => {
                    let color = match view.kind() {
                        ViewKind::Container => "#FF9800",
                        ViewKind::Menu => "#2196F3",
                        ViewKind::Unknown(_) => "#9E9E9E",
                        _ => "#4CAF50",
                    };
                    (format!("{}\\n{}", view.display_name(), view.view_type), color)
                }
                None => (id.clone(), "#9E9E9E"),
            };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\"];\n",
                escape_dot(id),
                escape_dot(&label),
                color
            ));
        }

        output.push('\n');

        for edge in self.graph.edge_references() {
            let from = &self.graph[edge.source()];
            let to = &self.graph[edge.target()];
            let style = if cycles.is_cyclic_edge(from, to) {
                " [color=\"#F44336\", penwidth=2, label=\"cycle\"]"
            } else {
                ""
            };
            output.push_str(&format!(
                "  \"{}\" -> \"{}\"{};\n",
                escape_dot(from),
                escape_dot(to),
                style
            ));
        }

        output.push_str("}\n");
        output
    }
}

fn escape_dot(s: &str) -> String {
    s.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blueprint(views: serde_json::Value) -> Blueprint {
        serde_json::from_value(json!({ "views": views })).unwrap()
    }

    #[test]
    fn test_edges_follow_subview_order() {
        let bp = blueprint(json!([
            {"id": "c", "type": "container", "subviews": ["b", "missing", "a"]},
            {"id": "a", "type": "text"},
            {"id": "b", "type": "text"}
        ]));
        let graph = ViewGraph::build(&bp);

        assert_eq!(graph.view_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.successors("c"), ["b".to_string(), "a".to_string()]);
        assert!(graph.successors("a").is_empty());
        assert_eq!(graph.containers(), ["c".to_string()]);
    }

    #[test]
    fn test_dot_marks_cycles() {
        let bp = blueprint(json!([
            {"id": "a", "type": "container", "subviews": ["b"]},
            {"id": "b", "type": "container", "subviews": ["a"]}
        ]));
        let graph = ViewGraph::build(&bp);
        let cycles = analyze_cycles(&graph);
        let dot = graph.to_dot(&bp, &cycles);

        assert!(dot.starts_with("digraph ViewGraph"));
        assert!(dot.contains("\"b\" -> \"a\" [color=\"#F44336\""));
        assert!(dot.contains("\"a\" -> \"b\";"));
    }
}
