//! View Compiler
//!
//! One self-contained module per view. Pre-generated source wins for every
//! non-container view; everything else is synthesized from the view's kind.

use serde_json::{json, Map, Value};

use crate::blueprint::{InternalView, Payload, View, ViewKind, WidgetKind};
use crate::graph::DiagnosticCode;
use crate::session::CompileSession;

use super::library::{icon_path, DEFAULT_ICON};
use super::markup::{Attr, Element, Import, Module, Node};
use super::names::fallback_page_path;
use super::style::view_root_style;
use super::{container, menu, CodegenContext};

/// Source of one view module
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleSource {
    Generated(Module),
    /// Supplied by an upstream generation phase, passed through untouched
    Pregenerated(String),
}

impl ModuleSource {
    pub fn render(&self) -> String {
        match self {
            Self::Generated(module) => module.render(),
            Self::Pregenerated(source) => source.clone(),
        }
    }

    pub fn is_pregenerated(&self) -> bool {
        matches!(self, Self::Pregenerated(_))
    }
}

/// Compile one view
pub fn compile_view(view: &View, ctx: &CodegenContext, session: &mut CompileSession) -> ModuleSource {
    let kind = view.kind();
    let identity = session.identity(view);

    if kind != ViewKind::Container {
        if let Some(source) = ctx.pregenerated.get(&view.id) {
            tracing::debug!(view = %view.id, identity = %identity, "using pre-generated source");
            return ModuleSource::Pregenerated(source.to_string());
        }
    }

    let name = session.component_name(&identity);
    tracing::debug!(view = %view.id, identity = %identity, kind = %kind.tag(), "synthesizing view module");

    let module = match &kind {
        ViewKind::Text => text_module(view, &name),
        ViewKind::Image => image_module(view, &name),
        ViewKind::Logo => logo_module(view, ctx, &name),
        ViewKind::Menu => menu::compile_menu_view(view, ctx, session, &name),
        ViewKind::Container => container::compile_container(view, ctx, session, &name),
        ViewKind::IconBar => icon_bar_module(view, ctx, session, &name),
        ViewKind::Widget(widget) => widget_module(view, *widget, ctx, session, &name),
        ViewKind::Internal(internal) => internal_module(*internal, ctx, &name),
        ViewKind::Component => {
            tracing::debug!(view = %view.id, "no pre-generated source for component view");
            placeholder_module(view, &name)
        }
        ViewKind::Unknown(raw) => {
            session.diagnostics.report(
                &view.id,
                DiagnosticCode::UnknownViewKind,
                format!("view type '{}' is not supported; emitting a placeholder", raw),
            );
            placeholder_module(view, &name)
        }
    };

    ModuleSource::Generated(module.banner(format!(
        "Generated by blueprint-compiler from view \"{}\" ({}). Do not edit.",
        view.id,
        kind.tag()
    )))
}

/// Root element shared by every synthesized view
pub(super) fn view_root(tag: &str, view: &View, kind_class: &str) -> Element {
    Element::new(tag)
        .class(format!("view view-{}", kind_class))
        .string("data-view-id", view.id.clone())
        .style(view_root_style(&view.style))
}

/// JSON configuration, with malformed payloads replaced by an empty object
pub(super) fn config_or_default(view: &View, session: &mut CompileSession) -> Value {
    match view.payload() {
        Payload::Parsed(value) => value,
        Payload::Absent => json!({}),
        Payload::Malformed(error) => {
            session.diagnostics.malformed_payload(&view.id, &error);
            json!({})
        }
    }
}

// =============================================================================
// Leaf kinds
// =============================================================================

fn text_module(view: &View, name: &str) -> Module {
    let markup = view.content.clone().unwrap_or_default();
    let body = view_root("section", view, "text")
        .child(Element::new("div").attr("dangerouslySetInnerHTML", Attr::Json(json!({ "__html": markup }))));
    Module::new(name, body)
}

/// Configured image source: explicit field, then JSON config, then bare content
fn image_source(view: &View) -> Option<String> {
    if let Some(url) = &view.image_url {
        return Some(url.clone());
    }

    let from_config = match &view.config {
        Some(Value::Object(map)) => string_field(map, &["src", "url", "image_url", "imageUrl"]),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => string_field(&map, &["src", "url", "image_url", "imageUrl"]),
            _ => None,
        },
        _ => None,
    };
    if from_config.is_some() {
        return from_config;
    }

    let content = view.content.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
    if content.starts_with('{') {
        match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(map)) => string_field(&map, &["src", "url", "image_url", "imageUrl"]),
            _ => None,
        }
    } else {
        Some(content.to_string())
    }
}

fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn image_module(view: &View, name: &str) -> Module {
    let mut root = view_root("div", view, "image");
    if let Some(src) = image_source(view) {
        root = root.child(
            Element::new("img")
                .string("src", src)
                .string("alt", view.display_name().to_string())
                .class("w-full h-auto"),
        );
    }
    Module::new(name, root)
}

fn logo_module(view: &View, ctx: &CodegenContext, name: &str) -> Module {
    let layout = &ctx.config.layout;
    let size = layout.logo_size.to_string();
    let body = view_root("div", view, "logo").child(
        Element::new("Link").string("href", "/").string("aria-label", "Home").child(
            Element::new("img")
                .string("src", layout.logo_path.clone())
                .string("alt", view.display_name().to_string())
                .expr("width", size.clone())
                .expr("height", size),
        ),
    );
    Module::new(name, body).import(Import::default("Link", "next/link"))
}

fn widget_module(
    view: &View,
    widget: WidgetKind,
    ctx: &CodegenContext,
    session: &mut CompileSession,
    name: &str,
) -> Module {
    let component = ctx.library.widget(widget);
    let config = config_or_default(view, session);
    let body = view_root("section", view, &ViewKind::Widget(widget).tag().replace('_', "-"))
        .child(Element::new(component.name.clone()).expr("config", "CONFIG"));
    Module::new(name, body)
        .import(Import::default(component.name, component.path))
        .constant("CONFIG", config)
}

fn internal_module(internal: InternalView, ctx: &CodegenContext, name: &str) -> Module {
    let component = ctx.library.internal(internal);
    let body = Element::new(component.name.clone());
    Module::new(name, body).import(Import::default(component.name, component.path))
}

fn placeholder_module(view: &View, name: &str) -> Module {
    let prompt = view
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} view", view.display_name()));
    let body = Element::new("div")
        .class("view view-placeholder")
        .string("data-view-id", view.id.clone())
        .string("data-view-type", view.view_type.clone())
        .child(Element::new("p").child(Node::text(prompt)));
    Module::new(name, body)
}

// =============================================================================
// Icon bar
// =============================================================================

/// One icon-bar entry, resolved at compile time except for the page slug
fn icon_items(view: &View, ctx: &CodegenContext, session: &mut CompileSession) -> Vec<Value> {
    let items = match config_or_default(view, session) {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| item.as_object())
        .map(|item| {
            let key = string_field(item, &["icon", "icon_key", "iconKey"]).unwrap_or_default();
            let label = string_field(item, &["label", "name", "title"]).unwrap_or_default();
            let page = ["page", "page_id", "pageId", "target"]
                .iter()
                .find_map(|k| match item.get(*k) {
                    Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                });

            if let Some(page) = &page {
                if ctx.blueprint.page(page).is_none() {
                    session.diagnostics.report(
                        &view.id,
                        DiagnosticCode::DanglingPageRef,
                        format!(
                            "icon '{}' targets unknown page '{}'; linking to {}",
                            label,
                            page,
                            fallback_page_path(page, &label)
                        ),
                    );
                }
            }

            json!({
                "icon": icon_path(&key).unwrap_or(DEFAULT_ICON),
                "label": label,
                "page": page,
            })
        })
        .collect()
}

fn justify_class(align: Option<&str>) -> &'static str {
    match align.map(|a| a.trim().to_ascii_lowercase()).as_deref() {
        Some("center") | Some("middle") => "justify-center",
        Some("right") | Some("end") => "justify-end",
        _ => "justify-start",
    }
}

fn icon_bar_module(view: &View, ctx: &CodegenContext, session: &mut CompileSession, name: &str) -> Module {
    let items = icon_items(view, ctx, session);

    let icon = Element::new("svg")
        .string("viewBox", "0 0 24 24")
        .expr("width", "24")
        .expr("height", "24")
        .string("fill", "none")
        .string("stroke", "currentColor")
        .expr("strokeWidth", "2")
        .string("aria-hidden", "true")
        .child(Element::new("path").expr("d", "item.icon"));

    let entry = Element::new("a")
        .expr("key", "index")
        .expr("href", "item.page ? pageHref(item.page, PAGES, item.label) : undefined")
        .class("icon-bar-item flex flex-col items-center gap-1")
        .expr("aria-label", "item.label")
        .child(icon)
        .child(Node::when("item.label", Element::new("span").child(Node::Expr("item.label".into()))));

    let body = view_root("nav", view, "icon-bar")
        .class(format!(
            "view view-icon-bar flex flex-row flex-wrap gap-4 {}",
            justify_class(view.style.horizontal_align.as_deref())
        ))
        .child(Node::map("ITEMS", "item", entry));

    Module::new(name, body)
        .import(Import::named(["pageHref"], ctx.links_import()))
        .constant("ITEMS", Value::Array(items))
        .constant("PAGES", ctx.routes.page_index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::Blueprint;
    use crate::codegen::tests::with_context;

    fn compile(bp: serde_json::Value, id: &str) -> (String, CompileSession) {
        let blueprint: Blueprint = serde_json::from_value(bp).unwrap();
        with_context(&blueprint, |ctx, session| {
            let view = blueprint.view(id).unwrap();
            compile_view(view, ctx, session).render()
        })
    }

    #[test]
    fn test_text_embeds_markup() {
        let (src, _) = compile(
            json!({"views": [{"id": "t", "name": "Intro", "type": "text", "content": "<p>Hi & \"bye\"</p>"}]}),
            "t",
        );
        assert!(src.contains("dangerouslySetInnerHTML={{\"__html\":\"<p>Hi & \\\"bye\\\"</p>\"}}"));
        assert!(src.contains("export default function Intro()"));
    }

    #[test]
    fn test_image_without_source_keeps_wrapper() {
        let (src, _) = compile(json!({"views": [{"id": "i", "name": "Pic", "type": "image"}]}), "i");
        assert!(src.contains("className=\"view view-image\""));
        assert!(!src.contains("<img"));

        let (src, _) = compile(
            json!({"views": [{"id": "i", "name": "Pic", "type": "image", "content": "https://x.test/a.png"}]}),
            "i",
        );
        assert!(src.contains("<img src=\"https://x.test/a.png\""));
    }

    #[test]
    fn test_widget_forwards_config_and_survives_bad_json() {
        let (src, _) = compile(
            json!({"views": [{"id": "g", "name": "Shots", "type": "gallery", "config": {"images": ["a.png"]}}]}),
            "g",
        );
        assert!(src.contains("import GalleryView from \"@/components/library/GalleryView\";"));
        assert!(src.contains("\"images\": ["));
        assert!(src.contains("<GalleryView config={CONFIG} />"));

        let (src, session) = compile(
            json!({"views": [{"id": "f", "name": "Contact", "type": "form", "content": "{oops"}]}),
            "f",
        );
        assert!(src.contains("const CONFIG = {};"));
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::MalformedPayload).count(), 1);
    }

    #[test]
    fn test_unknown_kind_shows_prompt() {
        let (src, session) = compile(
            json!({"views": [{"id": "u", "name": "Odd", "type": "hologram", "prompt": "A spinning logo"}]}),
            "u",
        );
        assert!(src.contains("A spinning logo"));
        assert!(src.contains("data-view-type=\"hologram\""));
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::UnknownViewKind).count(), 1);
    }

    #[test]
    fn test_icon_bar_resolves_icons() {
        let (src, session) = compile(
            json!({
                "pages": [{"id": "p1", "name": "Contact"}],
                "views": [{
                    "id": "ib", "name": "Quick Links", "type": "icon-bar", "horizontal_align": "center",
                    "config": [
                        {"icon": "mail", "label": "Write", "page": "p1"},
                        {"icon": "unicorn", "label": "Nowhere"},
                        {"icon": "home", "label": "Lost", "page": "p9"}
                    ]
                }]
            }),
            "ib",
        );
        assert!(src.contains("import { pageHref } from \"@/lib/site-links\";"));
        assert!(src.contains(DEFAULT_ICON));
        assert!(src.contains("justify-center"));
        assert!(src.contains("item.page ? pageHref(item.page, PAGES, item.label) : undefined"));
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::DanglingPageRef).count(), 1);
    }

    #[test]
    fn test_internal_view_is_thin() {
        let (src, _) = compile(json!({"views": [{"id": "l", "name": "Sign In", "type": "login"}]}), "l");
        assert!(src.contains("import LoginView from \"@/components/library/LoginView\";"));
        assert!(src.contains("<LoginView />"));
    }
}
