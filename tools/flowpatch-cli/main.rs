use clap::{Parser, Subcommand};
use flowpatch::prelude::*;
use serde::Serialize;
use std::fs;

/// Patch, validate and diff workflow graph documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional path to a schema policy JSON file
    #[arg(short, long, global = true)]
    policy: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a graph document and print the report
    Validate {
        /// Path to the graph JSON file
        graph_path: String,
    },
    /// Apply a patch to a graph and print the result
    Apply {
        /// Path to the base graph JSON file
        graph_path: String,
        /// Path to the patch JSON file
        patch_path: String,
        /// Produce the commit payload instead of a dry run
        #[arg(long)]
        commit: bool,
        /// Skip validation of the resulting graph
        #[arg(long)]
        no_validate: bool,
    },
    /// Print the patch that turns one graph into another
    Diff {
        /// Path to the old graph JSON file
        old_path: String,
        /// Path to the new graph JSON file
        new_path: String,
        /// Emit whole-node updates only
        #[arg(long)]
        coarse: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let validator = match &cli.policy {
        Some(path) => {
            let policy = SchemaPolicy::from_json(&read_file(path, "policy"))
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to load policy: {}", e)));
            Validator::with_policy(policy)
        }
        None => Validator::default(),
    };

    match cli.command {
        Command::Validate { graph_path } => {
            let report = validator.validate_json(&read_file(&graph_path, "graph"));
            print_json(&report);
            if !report.ok {
                std::process::exit(2);
            }
        }
        Command::Apply {
            graph_path,
            patch_path,
            commit,
            no_validate,
        } => {
            let base = load_graph(&graph_path);
            let patch = Patch::from_json(&read_file(&patch_path, "patch"))
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            let options = ApplyOptions {
                dry_run: !commit,
                validate: !no_validate,
            };

            let result = PatchApplier::new(validator).apply(&base, &patch, options);
            print_json(&result);
            if !result.ok {
                std::process::exit(2);
            }
        }
        Command::Diff {
            old_path,
            new_path,
            coarse,
        } => {
            let engine = if coarse {
                DiffEngine::coarse()
            } else {
                DiffEngine::new()
            };
            let patch = engine.diff(&load_graph(&old_path), &load_graph(&new_path));
            print_json(&patch);
        }
    }
}

fn read_file(path: &str, what: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read {} file '{}': {}", what, path, e))
    })
}

fn load_graph(path: &str) -> Graph {
    Graph::from_json(&read_file(path, "graph"))
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load '{}': {}", path, e)))
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to encode output: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
