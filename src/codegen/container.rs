//! Container Compiler
//!
//! A container is a grid of its subviews, in list order. Every slot either
//! imports the subview's module inside a styled cell or, when importing it
//! would recurse, renders a visible diagnostic block instead.

use crate::blueprint::{ColumnHints, View};
use crate::config::CycleDetection;
use crate::graph::{DiagnosticCode, DiagnosticItem};
use crate::session::CompileSession;

use super::layout::LayoutMode;
use super::markup::{Element, Import, Module, Node};
use super::style::{container_cell_style, flex_wrapper_style, view_root_style};
use super::CodegenContext;

/// Why a slot was not filled
#[derive(Debug, Clone, PartialEq, Eq)]
enum Guard {
    /// Subview resolves to the container's own identity
    SelfReference,
    /// Edge closes a cycle through other containers
    Cycle(Vec<String>),
}

/// Visible replacement for a slot that must not be imported
pub fn diagnostic_block(subview_id: &str, message: &str) -> Element {
    Element::new("div")
        .class("view-diagnostic")
        .string("role", "note")
        .string("data-view-id", subview_id.to_string())
        .child(Node::text(message.to_string()))
}

fn grid_classes(flow_vertical: bool) -> &'static str {
    if flow_vertical {
        "view view-container grid grid-flow-row grid-cols-1 gap-4"
    } else {
        "view view-container grid grid-flow-row grid-cols-12 gap-4"
    }
}

/// Compile a container view. Never fails; the worst case is an empty grid.
pub fn compile_container(view: &View, ctx: &CodegenContext, session: &mut CompileSession, name: &str) -> Module {
    let own_identity = session.identity(view);
    let list = view.subview_list();

    for problem in &list.problems {
        session.diagnostics.push(
            DiagnosticItem::new(
                &view.id,
                DiagnosticCode::MalformedPlacement,
                "unreadable subview entry skipped",
            )
            .with_context(problem.clone()),
        );
    }

    let hints: Vec<ColumnHints> = list.entries.iter().map(|e| e.hints).collect();
    let mode = LayoutMode::for_group(&hints);
    let vertical = view.flow_vertical.is_set();

    let mut imports = Vec::new();
    let mut cells = Vec::new();

    for entry in &list.entries {
        let Some(subview) = ctx.blueprint.view(&entry.id) else {
            session.diagnostics.dangling_view(&view.id, &entry.id);
            continue;
        };

        let identity = session.identity(subview);
        let guard = if identity == own_identity {
            Some(Guard::SelfReference)
        } else if ctx.config.graph.cycle_detection == CycleDetection::Full
            && ctx.cycles.is_cyclic_edge(&view.id, &subview.id)
        {
            let members = ctx
                .cycles
                .back_edge(&view.id, &subview.id)
                .map(|edge| edge.cycle.clone())
                .unwrap_or_else(|| vec![view.id.clone(), subview.id.clone()]);
            Some(Guard::Cycle(members))
        } else {
            None
        };

        match guard {
            Some(Guard::SelfReference) => {
                session.diagnostics.report(
                    &view.id,
                    DiagnosticCode::SelfReference,
                    format!("subview '{}' resolves to the container itself; slot replaced by a diagnostic block", subview.id),
                );
                cells.push(Node::from(diagnostic_block(
                    &subview.id,
                    &format!("Skipped \u{201c}{}\u{201d}: a container cannot contain itself.", subview.display_name()),
                )));
            }
            Some(Guard::Cycle(members)) => {
                session.diagnostics.container_cycle(&view.id, &subview.id, &members);
                cells.push(Node::from(diagnostic_block(
                    &subview.id,
                    &format!("Skipped \u{201c}{}\u{201d}: nesting it here would repeat forever.", subview.display_name()),
                )));
            }
            None => {
                let component = session.component_name(&identity);
                imports.push(Import::default(component.clone(), ctx.view_import(&identity)));

                let span_class = if vertical {
                    "col-span-1".to_string()
                } else {
                    mode.spans(&entry.hints).classes()
                };
                let cell = Element::new("div")
                    .class(span_class)
                    .string("data-view-id", subview.id.clone())
                    .style(container_cell_style(&subview.style))
                    .child(
                        Element::new("div")
                            .style(flex_wrapper_style(&subview.style))
                            .child(Element::new(component)),
                    );
                cells.push(Node::from(cell));
            }
        }
    }

    tracing::debug!(
        container = %view.id,
        cells = cells.len(),
        legacy = mode.is_legacy(),
        "compiled container"
    );

    let body = Element::new("div")
        .class(grid_classes(vertical))
        .string("data-view-id", view.id.clone())
        .style(view_root_style(&view.style))
        .children(cells);

    imports
        .into_iter()
        .fold(Module::new(name, body), |module, import| module.import(import))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::Blueprint;
    use crate::codegen::tests::{with_config, with_context};
    use crate::config::CompilerConfig;
    use serde_json::json;

    fn compile(bp: serde_json::Value, id: &str) -> (String, CompileSession) {
        let blueprint: Blueprint = serde_json::from_value(bp).unwrap();
        with_context(&blueprint, |ctx, session| {
            let view = blueprint.view(id).unwrap();
            let identity = session.identity(view);
            let name = session.component_name(&identity);
            compile_container(view, ctx, session, &name).render()
        })
    }

    #[test]
    fn test_cells_follow_list_order_and_hints() {
        let (src, session) = compile(
            json!({"views": [
                {"id": "c", "name": "Row", "type": "container", "subviews": [
                    {"id": "b", "colpos": 8}, {"id": "missing", "colpos": 0}, {"id": "a", "colpos": 4}
                ]},
                {"id": "a", "name": "Alpha", "type": "text", "horizontal_align": "center"},
                {"id": "b", "name": "Beta", "type": "text"}
            ]}),
            "c",
        );

        let beta = src.find("<Beta />").unwrap();
        let alpha = src.find("<Alpha />").unwrap();
        assert!(beta < alpha);
        assert!(src.contains("import Beta from \"@/components/generated/beta\";"));
        assert!(src.contains("col-span-8 md:col-span-8 lg:col-span-8"));
        assert!(src.contains("alignItems: \"center\""));
        assert!(src.contains("grid-cols-12"));
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::DanglingViewRef).count(), 1);
    }

    #[test]
    fn test_self_reference_renders_diagnostic_block() {
        let (src, session) = compile(
            json!({"views": [
                {"id": "c", "name": "Box", "type": "container", "subviews": ["c", "t"]},
                {"id": "t", "name": "Copy", "type": "text"}
            ]}),
            "c",
        );
        assert!(src.contains("className=\"view-diagnostic\" role=\"note\" data-view-id=\"c\""));
        assert!(!src.contains("<Box />"));
        assert!(src.contains("<Copy />"));
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::SelfReference).count(), 1);
    }

    #[test]
    fn test_multi_hop_cycle_is_cut_in_full_mode() {
        let bp = json!({"views": [
            {"id": "a", "name": "Outer", "type": "container", "subviews": ["b"]},
            {"id": "b", "name": "Inner", "type": "container", "subviews": ["a"]}
        ]});

        let (outer, _) = compile(bp.clone(), "a");
        assert!(outer.contains("<Inner />"));

        let (inner, session) = compile(bp.clone(), "b");
        assert!(!inner.contains("<Outer />"));
        assert!(inner.contains("view-diagnostic"));
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::ContainerCycle).count(), 1);

        let mut config = CompilerConfig::default();
        config.graph.cycle_detection = CycleDetection::Identity;
        let blueprint: Blueprint = serde_json::from_value(bp).unwrap();
        let (narrow, _) = with_config(&blueprint, &config, |ctx, session| {
            let view = blueprint.view("b").unwrap();
            compile_container(view, ctx, session, "Inner").render()
        });
        assert!(narrow.contains("<Outer />"));
    }

    #[test]
    fn test_vertical_flow_and_malformed_entries() {
        let (src, session) = compile(
            json!({"views": [
                {"id": "c", "name": "Stack", "type": "container", "flow_vertical": "True",
                 "subviews": "[\"t\", {\"colpos\": 3}]"},
                {"id": "t", "name": "Copy", "type": "text"}
            ]}),
            "c",
        );
        assert!(src.contains("grid-cols-1"));
        assert!(src.contains("className=\"col-span-1\""));
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::MalformedPlacement).count(), 1);
    }

    #[test]
    fn test_empty_container() {
        let (src, session) = compile(json!({"views": [{"id": "c", "name": "Empty", "type": "container"}]}), "c");
        assert!(src.contains("<div className=\"view view-container grid"));
        assert!(session.diagnostics.is_empty());
    }
}
