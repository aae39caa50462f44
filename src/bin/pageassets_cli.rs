//! PageAssets CLI - Plan-Driven Page Rendering
//!
//! Commands: plan, render
//! Outputs JSON (or a page skeleton) to stdout
//! Returns non-zero when the plan fails to load

use clap::{Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pageassets_core::{
    AssetsManager, Bootstrap, PageHost, RenderTarget, ScriptConfig, StyleConfig,
};

#[derive(Parser)]
#[command(name = "pageassets-cli")]
#[command(about = "PageAssets CLI - Declarative page asset pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Echo the descriptor set of a plan
    Plan {
        /// Plan file (JSON)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Run the lifecycle phases of a plan and print the rendered page
    Render {
        /// Plan file (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Render for the public site or the editor
        #[arg(short, long, value_enum, default_value = "public")]
        target: Target,

        /// Output format
        #[arg(long, value_enum, default_value = "html")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Public,
    Editor,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Json,
}

/// An asset plan: manager settings plus the descriptor set.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetPlan {
    #[serde(default)]
    base_url: String,
    #[serde(default = "default_root")]
    root_path: PathBuf,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    styles: IndexMap<String, StyleConfig>,
    #[serde(default)]
    scripts: IndexMap<String, ScriptConfig>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn load_plan(path: &Path) -> Result<AssetPlan, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("failed to read plan: {e}"))?;
    serde_json::from_str(&content).map_err(|e| format!("invalid plan: {e}"))
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { file } => {
            let plan = match load_plan(&file) {
                Ok(plan) => plan,
                Err(e) => {
                    eprintln!(r#"{{"error": "{e}"}}"#);
                    return ExitCode::FAILURE;
                }
            };

            let output = serde_json::json!({
                "baseUrl": plan.base_url,
                "version": plan.version,
                "styles": plan.styles,
                "scripts": plan.scripts,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Render {
            file,
            target,
            format,
        } => {
            let plan = match load_plan(&file) {
                Ok(plan) => plan,
                Err(e) => {
                    eprintln!(r#"{{"error": "{e}"}}"#);
                    return ExitCode::FAILURE;
                }
            };

            let mut manager =
                AssetsManager::new(plan.base_url, plan.root_path, plan.version);
            for (handle, config) in plan.styles {
                manager.add_style(&handle, config);
            }
            for (handle, config) in plan.scripts {
                manager.add_script(&handle, config);
            }

            let mut host = PageHost::new();
            let bootstrap = Bootstrap::lottie();
            bootstrap.install(&mut host);

            let target = match target {
                Target::Public => RenderTarget::Public,
                Target::Editor => RenderTarget::Editor,
            };

            manager.run();
            // block registration precedes the default-priority enqueues
            bootstrap.register_blocks(target, &mut host);
            for event in manager.scheduled_events() {
                manager.dispatch(&event, &mut host);
            }

            match format {
                Format::Html => print!("{}", host.render_page(&manager)),
                Format::Json => {
                    let output = serde_json::json!({
                        "head": host.render_head(&manager),
                        "footer": host.render_footer(&manager),
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                }
            }
            ExitCode::SUCCESS
        }
    }
}
