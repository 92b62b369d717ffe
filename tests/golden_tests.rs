//! Golden Tests for Site Compilation
//!
//! Compiles the fixture blueprints end to end and checks the emitted modules.

use blueprint_compiler::codegen::names::IdentityResolver;
use blueprint_compiler::codegen::layout::{spans, GRID_UNITS};
use blueprint_compiler::blueprint::ColumnHints;
use blueprint_compiler::{
    compile_site, Blueprint, CompilerConfig, DiagnosticCode, PregeneratedSources, SiteOutput,
};

fn landing() -> Blueprint {
    Blueprint::from_json(include_str!("fixtures/landing.json")).unwrap()
}

fn compile(blueprint: &Blueprint) -> SiteOutput {
    compile_site(blueprint, &CompilerConfig::default(), &PregeneratedSources::default())
}

fn module<'a>(site: &'a SiteOutput, path: &str) -> &'a str {
    match site.artifact(path) {
        Some(artifact) => &artifact.contents,
        None => panic!("missing artifact {}", path),
    }
}

// =============================================================================
// Layout
// =============================================================================

#[test]
fn test_home_row_of_two_half_cells() {
    let site = compile(&landing());
    let home = module(&site, "app/page.tsx");

    assert_eq!(home.matches("data-row=").count(), 1);
    assert!(home.contains("<div className=\"grid grid-cols-12 gap-4\" data-row=\"0\">"));
    assert_eq!(home.matches("col-span-6 md:col-span-6 lg:col-span-6").count(), 2);
    assert!(home.find("<Intro />").unwrap() < home.find("<Photo />").unwrap());
    assert!(home.contains("import Intro from \"@/components/generated/intro\";"));
    assert!(home.contains("import Photo from \"@/components/generated/photo\";"));
}

#[test]
fn test_image_without_source_keeps_wrapper() {
    let site = compile(&landing());
    let photo = module(&site, "components/generated/photo.tsx");

    assert!(photo.contains("className=\"view view-image\""));
    assert!(photo.contains("data-view-id=\"v2\""));
    assert!(!photo.contains("<img"));
}

#[test]
fn test_spans_property() {
    let declared = [ColumnHints::new(Some(4), None, None), ColumnHints::new(Some(8), Some(6), None)];
    let result = spans(&declared[1], &declared);
    assert_eq!((result.large, result.medium, result.small), (8, 6, 6));

    for n in 1..=14u32 {
        let group: Vec<ColumnHints> = (0..n).map(|_| ColumnHints::new(Some(5), None, None)).collect();
        let expected = (GRID_UNITS / n).max(1);
        let result = spans(&group[0], &group);
        assert_eq!(result.large, expected, "group of {}", n);
    }
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn test_identities_are_unique_and_stable() {
    let blueprint: Blueprint = Blueprint::from_json(
        r#"{"views": [
            {"id": "1", "name": "Hero", "type": "text"},
            {"id": "2", "name": "hero!", "type": "text"},
            {"id": "3", "name": "HERO", "type": "image"},
            {"id": "4", "name": "Hero", "type": "text"}
        ]}"#,
    )
    .unwrap();

    let mut resolver = IdentityResolver::new();
    let first: Vec<String> = blueprint.views.iter().map(|v| resolver.resolve(v)).collect();
    let mut unique = first.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), first.len());

    let again: Vec<String> = blueprint.views.iter().map(|v| resolver.resolve(v)).collect();
    assert_eq!(first, again);

    resolver.reset();
    assert!(resolver.is_empty());
}

#[test]
fn test_compilation_is_deterministic() {
    let blueprint = landing();
    let a = compile(&blueprint);
    let b = compile(&blueprint);
    assert_eq!(a.artifacts, b.artifacts);
    assert_eq!(a.identities, b.identities);
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn test_self_referencing_container() {
    let site = compile(&landing());
    let boxed = module(&site, "components/generated/box.tsx");

    assert!(boxed.contains("className=\"view-diagnostic\" role=\"note\" data-view-id=\"box\""));
    assert!(!boxed.contains("<Box />"));
    assert!(boxed.contains("<Intro />"));
    assert_eq!(site.diagnostics.with_code(DiagnosticCode::SelfReference).count(), 1);
}

#[test]
fn test_menu_links_and_dangling_views() {
    let site = compile(&landing());
    let menu = module(&site, "components/generated/main_menu.tsx");

    assert!(menu.contains("import SiteMenu from \"@/components/site/SiteMenu\";"));
    assert!(menu.contains("\"href\": \"/files/menu.pdf\""));
    assert!(!menu.contains("javascript:"));
    assert_eq!(site.diagnostics.with_code(DiagnosticCode::UnsafeLink).count(), 1);

    let story = module(&site, "app/our_story/page.tsx");
    assert!(story.contains("<MainMenu />"));
    assert_eq!(site.diagnostics.with_code(DiagnosticCode::DanglingViewRef).count(), 1);
    assert_eq!(site.diagnostics.error_count(), 1);
}

#[test]
fn test_support_modules_are_emitted() {
    let site = compile(&landing());
    assert!(module(&site, "lib/site-links.ts").contains("export function pageHref"));
    let menu = module(&site, "components/site/SiteMenu.tsx");
    assert!(menu.starts_with("\"use client\";"));
    assert!(menu.contains("from \"@/lib/site-links\""));
}

#[test]
fn test_mistyped_scalars_still_compile() {
    let blueprint = Blueprint::from_json(
        r#"{
            "name": 12,
            "pages": [{"id": 1, "name": 404, "views": [{"id": 7, "rowpos": "0", "colpos": "12"}, {"id": "m"}]}],
            "views": [
                {"id": 7, "name": 7, "type": "text", "content": 99},
                {"id": "m", "name": "Nav", "type": "menu", "menu_id": 3}
            ],
            "menus": [{"id": 3, "name": 9, "font_size": 14, "items": [{"name": 5, "page": 1}, {"name": "Mail", "url": 8}]}],
            "models": [{"id": 1, "name": 22, "fields": [{"name": 5, "datatype": 4}]}]
        }"#,
    )
    .unwrap();

    let site = compile(&blueprint);
    let page = module(&site, "app/404/page.tsx");
    assert!(page.contains("<V7 />"));
    assert!(page.contains("<Nav />"));
    assert!(module(&site, "components/generated/v_7.tsx").contains("99"));

    let menu = module(&site, "components/generated/nav.tsx");
    assert!(menu.contains("\"fontSize\": \"14\""));
    assert!(menu.contains("\"page\": \"1\""));
    assert_eq!(site.diagnostics.with_code(DiagnosticCode::DanglingMenuRef).count(), 0);
    assert_eq!(site.diagnostics.with_code(DiagnosticCode::DanglingPageRef).count(), 0);
}

#[test]
fn test_unknown_menu_pages_fall_back() {
    let blueprint = Blueprint::from_json(
        r#"{
            "pages": [{"id": "p1", "name": "Home", "home": true, "views": [{"id": "nav", "colpos": 12}]}],
            "views": [{"id": "nav", "name": "Nav", "type": "menu", "menu_id": "m"}],
            "menus": [{"id": "m", "items": [
                {"name": "Home", "page": "p1"},
                {"name": "Jobs", "page": "careers"},
                {"name": "Opening Hours", "page": "Page 9"}
            ]}]
        }"#,
    )
    .unwrap();

    let site = compile(&blueprint);
    let menu = module(&site, "components/generated/nav.tsx");
    assert!(menu.contains("\"href\": \"/careers\""));
    assert!(menu.contains("\"href\": \"/opening_hours\""));
    assert!(!menu.contains("/page_"));
    assert_eq!(site.diagnostics.with_code(DiagnosticCode::DanglingPageRef).count(), 2);

    let links = module(&site, "lib/site-links.ts");
    assert!(links.contains("export function pageHref(pageId: string, pages: PageIndex, name = \"\")"));
    assert!(links.contains("return pathForName(name);"));
}
