//! Blueprint Compiler CLI
//!
//! Compile blueprints, emit schema scripts and inspect the view graph.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use blueprint_compiler::graph::analyze_cycles;
use blueprint_compiler::sql::emit_base_schema;
use blueprint_compiler::{
    build, migrate, Blueprint, CompilerConfig, Diagnostics, Dialect, DirSink, PregeneratedSources, ViewGraph,
};

#[derive(Parser)]
#[command(name = "blueprint-compiler")]
#[command(about = "Compile site blueprints into UI modules and SQL schema scripts")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every module and write the base schema
    Build {
        /// Blueprint JSON file
        #[arg(short, long)]
        blueprint: PathBuf,

        /// Output root (overrides config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Directory or JSON map of pre-generated view modules
        #[arg(short, long)]
        pregenerated: Option<PathBuf>,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append one migration script per dialect from the journal
    Migrate {
        #[arg(short, long)]
        blueprint: PathBuf,

        /// Target dialects (default: from config)
        #[arg(short, long)]
        dialect: Vec<Dialect>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the base schema DDL without writing anything
    Schema {
        #[arg(short, long)]
        blueprint: PathBuf,

        #[arg(short, long, default_value = "postgres")]
        dialect: Dialect,
    },

    /// Export the container graph in DOT format
    Graph {
        #[arg(short, long)]
        blueprint: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// View and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show {
        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "compiler.toml")]
        output: PathBuf,
    },

    /// Validate configuration
    Validate,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CompilerConfig> {
    Ok(CompilerConfig::load_from(path)?)
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        println!("✅ No diagnostics");
        return;
    }
    println!("{}", diagnostics.format_all());
    println!(
        "{} error(s), {} warning(s)",
        diagnostics.error_count(),
        diagnostics.warning_count()
    );
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Build {
            blueprint,
            out,
            pregenerated,
            json,
        } => {
            let mut config = load_config(config_path)?;
            if let Some(out) = out {
                config.output.root = out;
            }
            let blueprint = Blueprint::load(&blueprint)?;
            let pregenerated = match pregenerated {
                Some(path) => PregeneratedSources::load(&path)?,
                None => PregeneratedSources::default(),
            };

            let root = config.output_root();
            let mut sink = DirSink::new(&root);
            let report = build(&blueprint, &config, &pregenerated, &mut sink)?;

            println!("✅ Wrote {} artifact(s) to {:?}", report.written.len(), root);
            for dialect in &report.skipped_base {
                println!("   Base schema for {} already exists; left untouched", dialect);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report.diagnostics)?);
            } else {
                print_diagnostics(&report.diagnostics);
            }
        }

        Commands::Migrate { blueprint, dialect, out } => {
            let mut config = load_config(config_path)?;
            if let Some(out) = out {
                config.output.root = out;
            }
            let dialects = if dialect.is_empty() {
                config.schema.dialects.clone()
            } else {
                dialect
            };
            let blueprint = Blueprint::load(&blueprint)?;

            let mut sink = DirSink::new(config.output_root());
            let now = chrono::Local::now().naive_local();
            let (written, diagnostics) = migrate(&blueprint, &config, &dialects, now, &mut sink)?;

            if written.is_empty() {
                println!("✅ Journal produced no statements; nothing written");
            }
            for artifact in &written {
                println!("✅ Wrote {}", artifact.path);
            }
            print_diagnostics(&diagnostics);
        }

        Commands::Schema { blueprint, dialect } => {
            let config = load_config(config_path)?;
            let blueprint = Blueprint::load(&blueprint)?;
            let mut diagnostics = Diagnostics::new();
            let script = emit_base_schema(&blueprint.models, dialect.strategy(), &config.schema, &mut diagnostics);
            print!("{}", script.render(dialect.strategy()));
            if !diagnostics.is_empty() {
                eprintln!("{}", diagnostics.format_all());
            }
        }

        Commands::Graph { blueprint, output } => {
            let blueprint = Blueprint::load(&blueprint)?;
            let graph = ViewGraph::build(&blueprint);
            let cycles = analyze_cycles(&graph);
            let dot = graph.to_dot(&blueprint, &cycles);

            match output {
                Some(path) => {
                    std::fs::write(&path, &dot)?;
                    println!(
                        "✅ Exported DOT to {:?}: {} views, {} edges, {} cycle group(s)",
                        path,
                        graph.view_count(),
                        graph.edge_count(),
                        cycles.groups.len()
                    );
                }
                None => print!("{}", dot),
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show { toml, json } => {
                let cfg = load_config(config_path)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&cfg)?);
                } else if toml {
                    println!("{}", ::toml::to_string_pretty(&cfg)?);
                } else {
                    println!("📋 Blueprint Compiler Configuration\n");
                    println!("Output:");
                    println!("  Root: {:?}", cfg.output.root);
                    println!("  Routes: {}", cfg.output.app_dir);
                    println!("  Views: {}", cfg.output.components_dir);
                    println!("  Support: {} / {}", cfg.output.support_dir, cfg.output.lib_dir);
                    println!("  Schema: {}", cfg.output.schema_dir);
                    println!("  Manifest: {}", cfg.output.manifest);

                    println!("\nLibrary:");
                    println!("  Import base: {}", cfg.library.import_base);
                    for (kind, name) in &cfg.library.components {
                        println!("    {} -> {}", kind, name);
                    }

                    println!("\nLayout:");
                    println!("  Menu collapse width: {}px", cfg.layout.menu_collapse_width);
                    println!("  File base path: {}", cfg.layout.file_base_path);
                    println!("  Logo: {} ({}px)", cfg.layout.logo_path, cfg.layout.logo_size);

                    println!("\nSchema:");
                    let dialects: Vec<&str> = cfg.schema.dialects.iter().map(|d| d.as_str()).collect();
                    println!("  Dialects: {}", dialects.join(", "));
                    println!("  Default VARCHAR size: {}", cfg.schema.default_varchar_size);

                    println!("\nGraph:");
                    println!("  Cycle detection: {:?}", cfg.graph.cycle_detection);
                }
            }

            ConfigCommands::Init { output } => {
                CompilerConfig::default().save(&output)?;
                println!("✅ Created config file: {:?}", output);
            }

            ConfigCommands::Validate => match CompilerConfig::load_from(config_path) {
                Ok(cfg) => {
                    let problems = cfg.problems();
                    if problems.is_empty() {
                        println!("✅ Configuration is valid");
                        println!("   Output root: {:?}", cfg.output_root());
                        println!("   Dialects: {}", cfg.schema.dialects.len());
                    } else {
                        eprintln!("❌ Configuration has {} problem(s):", problems.len());
                        for problem in problems {
                            eprintln!("   - {}", problem);
                        }
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("❌ Configuration error: {}", e);
                    std::process::exit(1);
                }
            },
        },
    }

    Ok(())
}
