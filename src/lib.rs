//! Blueprint Compiler
//!
//! Compiles a declarative site blueprint (pages, views, menus, data models and
//! a migration journal) into:
//!
//! - one UI source module per view and per page route (Next.js + Tailwind)
//! - two shared runtime support modules
//! - a base SQL schema and incremental migrations for each target dialect
//!
//! ## Architecture
//!
//! ```text
//! Blueprint JSON ──► blueprint (IR) ──► graph (view graph, cycles, diagnostics)
//!                                   │
//!                                   ├─► codegen (identities, layout, modules) ──┐
//!                                   │                                          ├─► output (sinks, manifest)
//!                                   └─► sql (dialects, base, migrations) ──────┘
//! ```
//!
//! Compilation is pure and never fails on bad blueprint content: every problem
//! becomes a [`graph::DiagnosticItem`]. Only missing inputs and I/O abort.

pub mod blueprint;
pub mod build;
pub mod checksum;
pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;
pub mod output;
pub mod pregenerated;
pub mod session;
pub mod sql;

pub use blueprint::Blueprint;
pub use build::{build, migrate, BuildReport};
pub use checksum::Checksum;
pub use codegen::{compile_site, SiteOutput};
pub use config::CompilerConfig;
pub use error::{CompileError, Result};
pub use graph::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity, ViewGraph};
pub use output::{Artifact, ArtifactSink, DirSink, Manifest, MemorySink};
pub use pregenerated::PregeneratedSources;
pub use session::CompileSession;
pub use sql::Dialect;
