//! Code Generation
//!
//! Compiles a blueprint into UI source modules.
//!
//! Architecture:
//! - CodegenContext: immutable after build(), holds the graph, cycle analysis
//!   and routes that every sub-compiler reads
//! - CompileSession: the run's mutable state (identities, component names,
//!   diagnostics), threaded through every sub-compiler
//! - Compilers: view, container, menu and page, each producing a markup Module
//!
//! Phases run in dependency order: identities for every view first, then view
//! modules, then route modules (which import views by identity), then the
//! shared support modules.

pub mod container;
pub mod layout;
pub mod library;
pub mod markup;
pub mod menu;
pub mod names;
pub mod page;
pub mod style;
pub mod view;

use std::collections::BTreeMap;

use include_dir::{include_dir, Dir};
use serde::Serialize;

use crate::blueprint::Blueprint;
use crate::config::CompilerConfig;
use crate::graph::{analyze_cycles, CycleAnalysis, Diagnostics, ViewGraph, ViewId};
use crate::output::Artifact;
use crate::pregenerated::PregeneratedSources;
use crate::session::CompileSession;

use library::ComponentLibrary;
use page::RouteTable;

static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Import specifier the menu template uses for the link helper
const LINKS_SPECIFIER: &str = "@/lib/site-links";

/// Names every generated module may import alongside view components
const SHARED_NAMES: &[&str] = &["SiteMenu", "Link", "Page"];

// =============================================================================
// Context
// =============================================================================

/// Read-only inputs shared by every sub-compiler
pub struct CodegenContext<'a> {
    pub blueprint: &'a Blueprint,
    pub config: &'a CompilerConfig,
    pub library: ComponentLibrary,
    pub graph: ViewGraph,
    pub cycles: CycleAnalysis,
    pub routes: RouteTable,
    pub pregenerated: &'a PregeneratedSources,
}

impl<'a> CodegenContext<'a> {
    /// Build the graph, run cycle analysis and assign routes
    pub fn build(
        blueprint: &'a Blueprint,
        config: &'a CompilerConfig,
        library: ComponentLibrary,
        pregenerated: &'a PregeneratedSources,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let graph = ViewGraph::build(blueprint);
        let cycles = analyze_cycles(&graph);
        let routes = RouteTable::build(blueprint, diagnostics);

        Self {
            blueprint,
            config,
            library,
            graph,
            cycles,
            routes,
            pregenerated,
        }
    }

    /// Import specifier of a view module
    pub fn view_import(&self, identity: &str) -> String {
        format!("@/{}/{}", self.config.output.components_dir.trim_matches('/'), identity)
    }

    /// Import specifier of the shared link helper
    pub fn links_import(&self) -> String {
        format!("@/{}/site-links", self.config.output.lib_dir.trim_matches('/'))
    }

    /// Import specifier of the shared menu view
    pub fn menu_import(&self) -> String {
        format!("@/{}/SiteMenu", self.config.output.support_dir.trim_matches('/'))
    }
}

/// Component names generated modules must not take
pub fn reserved_names(library: &ComponentLibrary) -> Vec<String> {
    let mut names = library.names();
    names.extend(SHARED_NAMES.iter().map(|s| s.to_string()));
    names
}

// =============================================================================
// Site compilation
// =============================================================================

/// Everything one run produces for the UI side
#[derive(Debug, Clone, Serialize)]
pub struct SiteOutput {
    pub artifacts: Vec<Artifact>,
    /// view id -> identity
    pub identities: BTreeMap<ViewId, String>,
    pub diagnostics: Diagnostics,
}

impl SiteOutput {
    pub fn artifact(&self, path: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.path == path)
    }
}

/// Compile every view and page of a blueprint
pub fn compile_site(
    blueprint: &Blueprint,
    config: &CompilerConfig,
    pregenerated: &PregeneratedSources,
) -> SiteOutput {
    let library = ComponentLibrary::from_config(&config.library);
    let mut session = CompileSession::new(reserved_names(&library));
    let ctx = CodegenContext::build(blueprint, config, library, pregenerated, &mut session.diagnostics);
    let output = &config.output;

    // Phase 1: identities, in blueprint order
    for id in ctx.graph.ids() {
        if let Some(view) = blueprint.view(id) {
            session.identity(view);
        }
    }
    if ctx.graph.view_count() < blueprint.views.len() {
        tracing::warn!(
            duplicates = blueprint.views.len() - ctx.graph.view_count(),
            "duplicate view ids; only the first definition of each is compiled"
        );
    }

    let mut artifacts = Vec::new();

    // Phase 2: view modules
    let mut pregenerated_count = 0;
    for id in ctx.graph.ids() {
        let Some(view) = blueprint.view(id) else {
            continue;
        };
        let source = view::compile_view(view, &ctx, &mut session);
        if source.is_pregenerated() {
            pregenerated_count += 1;
        }
        let identity = session.identity(view);
        artifacts.push(Artifact::new(
            join(&output.components_dir, &format!("{}.tsx", identity)),
            source.render(),
        ));
    }

    // Phase 3: route modules
    for route in ctx.routes.iter() {
        let Some(page) = blueprint.page(&route.page_id) else {
            continue;
        };
        let module = page::compile_page(page, &ctx, &mut session);
        let path = match &route.slug {
            None => join(&output.app_dir, "page.tsx"),
            Some(slug) => join(&output.app_dir, &format!("{}/page.tsx", slug)),
        };
        artifacts.push(Artifact::new(path, module.render()));
    }
    if !ctx.routes.has_root() {
        tracing::info!("no home page; emitting fallback root");
        artifacts.push(Artifact::new(
            join(&output.app_dir, "page.tsx"),
            page::fallback_root(&ctx).render(),
        ));
    }

    // Phase 4: shared runtime support
    artifacts.extend(support_modules(config));

    let diagnostics = session.take_diagnostics();
    tracing::info!(
        views = ctx.graph.view_count(),
        pages = blueprint.pages.len(),
        artifacts = artifacts.len(),
        pregenerated = pregenerated_count,
        warnings = diagnostics.warning_count(),
        errors = diagnostics.error_count(),
        "site compiled"
    );

    SiteOutput {
        artifacts,
        identities: session
            .identities()
            .assignments()
            .map(|(id, identity)| (id.clone(), identity.clone()))
            .collect(),
        diagnostics,
    }
}

/// Shared runtime modules, embedded at build time
pub fn support_modules(config: &CompilerConfig) -> Vec<Artifact> {
    let output = &config.output;
    let links_specifier = format!("@/{}/site-links", output.lib_dir.trim_matches('/'));

    let entries = [
        ("lib/site-links.ts", join(&output.lib_dir, "site-links.ts")),
        ("components/site/SiteMenu.tsx", join(&output.support_dir, "SiteMenu.tsx")),
    ];

    entries
        .into_iter()
        .filter_map(|(template, path)| {
            let contents = TEMPLATES.get_file(template).and_then(|f| f.contents_utf8());
            if contents.is_none() {
                tracing::warn!(template, "support template missing from build");
            }
            contents.map(|c| Artifact::new(path, c.replace(LINKS_SPECIFIER, &links_specifier)))
        })
        .collect()
}

/// Join output-relative path segments with `/`
fn join(dir: &str, file: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}
