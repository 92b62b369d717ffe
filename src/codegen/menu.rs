//! Menu Compiler
//!
//! Menus compile to static data handed to the shared `SiteMenu` view. Links are
//! classified here; page slugs are resolved at render time by the shared link
//! helper so that unknown pages still get a usable fallback.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::blueprint::{Menu, MenuItem, View};
use crate::graph::DiagnosticCode;
use crate::session::CompileSession;

use super::markup::{Element, Import, Module};
use super::names::fallback_page_path;
use super::view::view_root;
use super::CodegenContext;

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

fn url_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").unwrap())
}

/// An external URL that may be rendered as a link, or `None`
pub fn safe_href(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    // Browsers ignore embedded whitespace and control characters in schemes
    let compact: String = url.chars().filter(|c| !c.is_whitespace() && !c.is_control()).collect();
    match url_scheme().captures(&compact) {
        Some(caps) => {
            let scheme = caps[1].to_ascii_lowercase();
            SAFE_SCHEMES.contains(&scheme.as_str()).then(|| url.to_string())
        }
        None => Some(url.to_string()),
    }
}

/// How a menu item links
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Page(String),
    /// A page id no page owns, with the route it falls back to
    MissingPage { page: String, href: String },
    External(String),
    File(String),
    None,
}

impl LinkTarget {
    fn to_json(&self, name: &str) -> Value {
        match self {
            Self::Page(id) => json!({ "name": name, "kind": "page", "page": id }),
            Self::MissingPage { page, href } => json!({ "name": name, "kind": "page", "page": page, "href": href }),
            Self::External(href) => json!({ "name": name, "kind": "external", "href": href }),
            Self::File(href) => json!({ "name": name, "kind": "file", "href": href }),
            Self::None => json!({ "name": name, "kind": "none" }),
        }
    }
}

/// Classify one item, recording dangling pages and unsafe links
pub fn classify_item(
    item: &MenuItem,
    owner: &str,
    ctx: &CodegenContext,
    session: &mut CompileSession,
) -> LinkTarget {
    if let Some(page) = &item.page {
        if ctx.blueprint.page(page).is_some() {
            return LinkTarget::Page(page.clone());
        }
        let href = fallback_page_path(page, &item.name);
        session.diagnostics.report(
            owner,
            DiagnosticCode::DanglingPageRef,
            format!("menu item '{}' links to unknown page '{}'; linking to {}", item.name, page, href),
        );
        return LinkTarget::MissingPage {
            page: page.clone(),
            href,
        };
    }

    if let Some(url) = item.url.as_deref().filter(|u| !u.trim().is_empty()) {
        return match safe_href(url) {
            Some(href) => LinkTarget::External(href),
            None => {
                session.diagnostics.report(
                    owner,
                    DiagnosticCode::UnsafeLink,
                    format!("menu item '{}' has a link with a disallowed scheme; rendered as plain text", item.name),
                );
                LinkTarget::None
            }
        };
    }

    if let Some(file) = item.file.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        let base = ctx.config.layout.file_base_path.trim_end_matches('/');
        return LinkTarget::File(format!("{}/{}", base, file.trim_start_matches('/')));
    }

    LinkTarget::None
}

/// Static menu data for the shared menu view
pub fn menu_data(menu: &Menu, owner: &str, ctx: &CodegenContext, session: &mut CompileSession) -> Value {
    let items: Vec<Value> = menu
        .items
        .iter()
        .map(|item| classify_item(item, owner, ctx, session).to_json(&item.name))
        .collect();

    json!({
        "id": menu.id,
        "name": menu.name,
        "layout": menu.layout.as_str(),
        "fontSize": menu.font_size,
        "fontFamily": menu.font_family,
        "alignment": menu.alignment,
        "collapseWidth": menu.collapse_width.unwrap_or(ctx.config.layout.menu_collapse_width),
        "items": items,
    })
}

/// Menu data for a menu id; an empty menu when the id is unknown
pub fn compile_menu(menu_id: Option<&str>, owner: &str, ctx: &CodegenContext, session: &mut CompileSession) -> Value {
    match menu_id.and_then(|id| ctx.blueprint.menu(id)) {
        Some(menu) => menu_data(menu, owner, ctx, session),
        None => {
            let message = match menu_id {
                Some(id) => format!("menu '{}' is not defined; rendering an empty menu", id),
                None => "menu view has no menu id; rendering an empty menu".to_string(),
            };
            session.diagnostics.report(owner, DiagnosticCode::DanglingMenuRef, message);
            let empty = Menu {
                id: menu_id.unwrap_or_default().to_string(),
                ..Menu::default()
            };
            menu_data(&empty, owner, ctx, session)
        }
    }
}

/// Module for a menu view
pub fn compile_menu_view(view: &View, ctx: &CodegenContext, session: &mut CompileSession, name: &str) -> Module {
    let menu = compile_menu(view.menu_id.as_deref(), &view.id, ctx, session);
    let body = view_root("div", view, "menu").child(
        Element::new("SiteMenu")
            .expr("menu", "MENU")
            .expr("pages", "PAGES"),
    );
    Module::new(name, body)
        .import(Import::default("SiteMenu", ctx.menu_import()))
        .constant("MENU", menu)
        .constant("PAGES", ctx.routes.page_index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::Blueprint;
    use crate::codegen::tests::with_context;

    #[test]
    fn test_safe_href() {
        assert_eq!(safe_href("https://example.com"), Some("https://example.com".to_string()));
        assert!(safe_href("MAILTO:hi@example.com").is_some());
        assert_eq!(safe_href("/about"), Some("/about".to_string()));
        assert_eq!(safe_href("javascript:alert(1)"), None);
        assert_eq!(safe_href("java\tscript:alert(1)"), None);
        assert_eq!(safe_href("data:text/html,x"), None);
        assert_eq!(safe_href("   "), None);
    }

    #[test]
    fn test_menu_items_are_classified() {
        let blueprint: Blueprint = serde_json::from_value(json!({
            "pages": [{"id": "1", "name": "About"}],
            "menus": [{
                "id": "m", "name": "Main", "layout": "tiled",
                "items": [
                    {"name": "About", "page": 1},
                    {"name": "Docs", "url": "https://docs.test"},
                    {"name": "Evil", "url": "javascript:void(0)"},
                    {"name": "Brochure", "file": "brochure.pdf"},
                    {"name": "Ghost", "page": "42"},
                    {"name": "Label"}
                ]
            }],
            "views": [{"id": "nav", "name": "Nav", "type": "menu", "menu_id": "m"}]
        }))
        .unwrap();

        let (data, session) = with_context(&blueprint, |ctx, session| {
            compile_menu(Some("m"), "nav", ctx, session)
        });

        let kinds: Vec<&str> = data["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, ["page", "external", "none", "file", "page", "none"]);
        assert_eq!(data["items"][3]["href"], "/files/brochure.pdf");
        assert_eq!(data["items"][4]["href"], "/42");
        assert!(data["items"][0].get("href").is_none());
        assert_eq!(data["layout"], "tiled");
        assert_eq!(data["collapseWidth"], 768);
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::UnsafeLink).count(), 1);
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::DanglingPageRef).count(), 1);
    }

    #[test]
    fn test_missing_menu_is_empty() {
        let blueprint: Blueprint = serde_json::from_value(json!({
            "views": [{"id": "nav", "name": "Nav", "type": "menu", "menu_id": "nope"}]
        }))
        .unwrap();

        let (src, session) = with_context(&blueprint, |ctx, session| {
            let view = blueprint.view("nav").unwrap();
            compile_menu_view(view, ctx, session, "Nav").render()
        });

        assert!(src.contains("import SiteMenu from \"@/components/site/SiteMenu\";"));
        assert!(src.contains("\"items\": []"));
        assert!(src.contains("<SiteMenu menu={MENU} pages={PAGES} />"));
        assert_eq!(session.diagnostics.with_code(DiagnosticCode::DanglingMenuRef).count(), 1);
    }
}
