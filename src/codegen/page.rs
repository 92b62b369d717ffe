//! Page Compiler
//!
//! One route module per page. Placements are grouped into rows and each row is
//! laid out on its own 12-unit grid.

use serde_json::{json, Map, Value};

use crate::blueprint::{Blueprint, ColumnHints, Page, Placement};
use crate::graph::{DiagnosticCode, Diagnostics};
use crate::session::CompileSession;

use super::layout::LayoutMode;
use super::markup::{Element, Import, Module, Node};
use super::names::{page_slug, slugify};
use super::style::page_cell_style;
use super::CodegenContext;

// =============================================================================
// Routes
// =============================================================================

/// Where one page is served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub page_id: String,
    pub name: String,
    /// `None` for the site root
    pub slug: Option<String>,
}

impl Route {
    /// Site path, `/` for the root
    pub fn href(&self) -> String {
        match &self.slug {
            Some(slug) => format!("/{}", slug),
            None => "/".to_string(),
        }
    }
}

/// Routes of every page, in blueprint order
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Assign routes. The first home-flagged page owns the root; a page whose
    /// name maps to a taken route is moved to a route suffixed with its id.
    pub fn build(blueprint: &Blueprint, diagnostics: &mut Diagnostics) -> Self {
        let mut routes: Vec<Route> = Vec::with_capacity(blueprint.pages.len());
        let has_home = blueprint.pages.iter().any(|p| p.home.is_set());
        let mut root_taken = false;

        for page in &blueprint.pages {
            if routes.iter().any(|r| r.page_id == page.id) {
                continue;
            }

            let wants_root = if has_home {
                page.home.is_set()
            } else {
                page_slug(&page.name).is_none() && !page.name.trim().is_empty()
            };

            let mut slug = if wants_root {
                None
            } else {
                Some(page_slug(&page.name).unwrap_or_else(|| fallback_slug(page)))
            };

            let taken = match &slug {
                None => root_taken,
                Some(s) => routes.iter().any(|r| r.slug.as_deref() == Some(s.as_str())),
            };
            if taken {
                let moved = match &slug {
                    Some(s) => format!("{}_{}", s, slugify(&page.id)),
                    None => fallback_slug(page),
                };
                diagnostics.report(
                    &page.id,
                    DiagnosticCode::RouteCollision,
                    format!(
                        "page '{}' routes to an already used path; serving it at /{}",
                        page.name, moved
                    ),
                );
                slug = Some(moved);
            }

            if slug.is_none() {
                root_taken = true;
            }
            routes.push(Route {
                page_id: page.id.clone(),
                name: page.name.clone(),
                slug,
            });
        }

        Self { routes }
    }

    pub fn get(&self, page_id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.page_id == page_id)
    }

    pub fn has_root(&self) -> bool {
        self.routes.iter().any(|r| r.slug.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Page id -> {name, slug} index consumed by the shared link helper
    pub fn page_index(&self) -> Value {
        let index: Map<String, Value> = self
            .routes
            .iter()
            .map(|r| {
                (
                    r.page_id.clone(),
                    json!({ "name": r.name, "slug": r.slug.clone().unwrap_or_default() }),
                )
            })
            .collect();
        Value::Object(index)
    }
}

fn fallback_slug(page: &Page) -> String {
    let id = slugify(&page.id);
    if id.is_empty() {
        "page".to_string()
    } else {
        format!("page_{}", id)
    }
}

// =============================================================================
// Route modules
// =============================================================================

/// Placements grouped into contiguous same-row runs, stable within a row
pub fn rows(placements: &[Placement]) -> Vec<Vec<&Placement>> {
    let mut sorted: Vec<&Placement> = placements.iter().collect();
    sorted.sort_by_key(|p| p.rowpos);

    let mut rows: Vec<Vec<&Placement>> = Vec::new();
    for placement in sorted {
        match rows.last_mut() {
            Some(row) if row[0].rowpos == placement.rowpos => row.push(placement),
            _ => rows.push(vec![placement]),
        }
    }
    rows
}

/// Compile one page into its route module
pub fn compile_page(page: &Page, ctx: &CodegenContext, session: &mut CompileSession) -> Module {
    let mut imports = Vec::new();
    let mut row_nodes = Vec::new();

    for row in rows(&page.views) {
        let hints: Vec<ColumnHints> = row.iter().map(|p| p.hints()).collect();
        let mode = LayoutMode::for_group(&hints);

        let mut cells = Vec::new();
        for placement in &row {
            let Some(view) = ctx.blueprint.view(&placement.id) else {
                session.diagnostics.dangling_view(&page.id, &placement.id);
                continue;
            };
            let identity = session.identity(view);
            let component = session.component_name(&identity);
            imports.push(Import::default(component.clone(), ctx.view_import(&identity)));

            cells.push(Node::from(
                Element::new("div")
                    .class(mode.spans(&placement.hints()).classes())
                    .style(page_cell_style(&view.style))
                    .child(Element::new(component)),
            ));
        }

        if cells.is_empty() {
            continue;
        }
        row_nodes.push(Node::from(
            Element::new("div")
                .class("grid grid-cols-12 gap-4")
                .string("data-row", row[0].rowpos.to_string())
                .children(cells),
        ));
    }

    tracing::debug!(page = %page.id, rows = row_nodes.len(), "compiled page");

    let body = Element::new("main")
        .class("page")
        .string("data-page-id", page.id.clone())
        .children(row_nodes);

    imports.into_iter().fold(
        Module::new("Page", body)
            .banner(format!(
                "Generated by blueprint-compiler from page \"{}\". Do not edit.",
                page.id
            ))
            .metadata(json!({ "title": page.name })),
        |module, import| module.import(import),
    )
}

/// Root module for sites without a home page: the site name and links to every page
pub fn fallback_root(ctx: &CodegenContext) -> Module {
    let title = ctx
        .blueprint
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("Welcome")
        .to_string();

    let links: Vec<Node> = ctx
        .routes
        .iter()
        .map(|route| {
            Node::from(
                Element::new("li").child(
                    Element::new("Link")
                        .string("href", route.href())
                        .child(Node::text(route.name.clone())),
                ),
            )
        })
        .collect();

    let mut body = Element::new("main")
        .class("page page-fallback")
        .child(Element::new("h1").child(Node::text(title.clone())));
    if !links.is_empty() {
        body = body.child(Element::new("nav").child(Element::new("ul").children(links)));
    }

    Module::new("Page", body)
        .banner("Generated by blueprint-compiler: no home page was defined. Do not edit.")
        .import(Import::default("Link", "next/link"))
        .metadata(json!({ "title": title }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::with_context;

    fn blueprint(value: serde_json::Value) -> Blueprint {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_routes() {
        let bp = blueprint(json!({"pages": [
            {"id": "1", "name": "Welcome", "home": "true"},
            {"id": "2", "name": "About Us"},
            {"id": "3", "name": "About us!"},
            {"id": "4", "name": "Home"},
            {"id": "5", "name": ""}
        ]}));
        let mut diags = Diagnostics::new();
        let routes = RouteTable::build(&bp, &mut diags);

        assert_eq!(routes.get("1").unwrap().href(), "/");
        assert_eq!(routes.get("2").unwrap().href(), "/about_us");
        assert_eq!(routes.get("3").unwrap().href(), "/about_us_3");
        assert_eq!(routes.get("4").unwrap().href(), "/page_4");
        assert_eq!(routes.get("5").unwrap().href(), "/page_5");
        assert_eq!(diags.with_code(DiagnosticCode::RouteCollision).count(), 1);
        assert_eq!(routes.page_index()["2"]["slug"], "about_us");
    }

    #[test]
    fn test_home_by_name_without_flag() {
        let bp = blueprint(json!({"pages": [{"id": "1", "name": "Contact"}, {"id": "2", "name": "Index"}]}));
        let routes = RouteTable::build(&bp, &mut Diagnostics::new());
        assert!(routes.has_root());
        assert_eq!(routes.get("2").unwrap().slug, None);
    }

    #[test]
    fn test_rows_are_stable_and_contiguous() {
        let page: Page = serde_json::from_value(json!({"id": "p", "name": "P", "views": [
            {"id": "c", "rowpos": 1}, {"id": "a", "rowpos": 0}, {"id": "d", "rowpos": 1}, {"id": "b", "rowpos": 0}
        ]}))
        .unwrap();
        let ids: Vec<Vec<&str>> = rows(&page.views)
            .iter()
            .map(|row| row.iter().map(|p| p.id.as_str()).collect())
            .collect();
        assert_eq!(ids, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_page_uses_page_level_style() {
        let bp = blueprint(json!({
            "pages": [{"id": "p", "name": "Home", "home": true, "views": [{"id": "v", "rowpos": 0, "colpos": 12}]}],
            "views": [{"id": "v", "name": "Hero", "type": "text", "background_color": "#000", "min_height": "50vh"}]
        }));
        let (src, _) = with_context(&bp, |ctx, session| compile_page(&bp.pages[0], ctx, session).render());
        assert!(src.contains("backgroundColor: \"#000\""));
        assert!(!src.contains("minHeight"));
        assert!(src.contains("export const metadata = {\n  \"title\": \"Home\"\n};"));
        assert!(src.contains("export default function Page()"));
    }

    #[test]
    fn test_fallback_root_lists_pages() {
        let bp = blueprint(json!({"name": "Acme", "pages": [{"id": "1", "name": "Contact"}]}));
        let (src, _) = with_context(&bp, |ctx, _| fallback_root(ctx).render());
        assert!(src.contains("<h1>"));
        assert!(src.contains("Acme"));
        assert!(src.contains("<Link href=\"/contact\">"));
    }
}
