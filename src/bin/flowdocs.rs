//! Flow documentation CLI.
//!
//! Lists topics, renders a topic's flow tree, checks a workspace for
//! structural problems and searches nodes.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flowdocs::{build_topics, scan_workspace, scc_groups, FlowConfig, TopicGraph};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flowdocs")]
#[command(about = "Navigate flow documentation extracted from tagged comments")]
struct Cli {
    /// Workspace root (overrides [scan].root from config)
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Path to a flowdocs.toml
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List topics with node and warning counts
    Topics,

    /// Print a topic's flow tree
    Show {
        topic: String,
        /// Emit the graph as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Report parse errors, warnings and cycle groups across all topics
    Check,

    /// Fuzzy-search node ids and step text
    Search {
        query: String,
        /// Restrict to one topic
        #[arg(short, long)]
        topic: Option<String>,
        /// Maximum hits to print
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = FlowConfig::load_from(cli.config.as_deref())?;
    let root = cli.workspace.clone().unwrap_or_else(|| config.scan_root());

    let scanned = scan_workspace(&root, &config.scan_config())?;
    let externals = config.external_names();
    let graphs = build_topics(&scanned.records, &scanned.errors, &externals);

    match cli.command {
        Commands::Topics => {
            if graphs.is_empty() {
                println!("No tagged comments found under {:?}", root);
                return Ok(());
            }
            println!("{:<24} {:>6} {:>6} {:>9}", "TOPIC", "NODES", "ROOTS", "WARNINGS");
            for (topic, graph) in &graphs {
                println!(
                    "{:<24} {:>6} {:>6} {:>9}",
                    topic,
                    graph.node_count(),
                    graph.roots().len(),
                    graph.warnings().len()
                );
            }
        }

        Commands::Show { topic, json } => {
            let Some(graph) = graphs.get(&topic) else {
                eprintln!("❌ Unknown topic '{}'", topic);
                let known: Vec<_> = graphs.keys().cloned().collect();
                if !known.is_empty() {
                    eprintln!("   Known topics: {}", known.join(", "));
                }
                std::process::exit(1);
            };

            if json {
                println!("{}", serde_json::to_string_pretty(graph)?);
            } else {
                print_tree(graph);
                if !graph.warnings().is_empty() {
                    println!();
                    for warning in graph.warnings() {
                        println!("⚠️  {}", warning);
                    }
                }
            }
        }

        Commands::Check => {
            let mut problems = 0usize;

            for error in scanned.errors.iter().filter(|e| e.topic.is_none()) {
                println!("❌ {}", error);
                problems += 1;
            }

            for (topic, graph) in &graphs {
                for error in graph.parse_errors() {
                    println!("❌ [{}] {}", topic, error);
                    problems += 1;
                }
                for warning in graph.warnings() {
                    println!("⚠️  [{}] {}", topic, warning);
                    problems += 1;
                }
                for group in scc_groups(graph) {
                    println!(
                        "🔁 [{}] cycle group: {}",
                        topic,
                        group.members.join(" -> ")
                    );
                    problems += 1;
                }
            }

            if problems == 0 {
                println!(
                    "✅ {} topic(s), {} node(s), no problems",
                    graphs.len(),
                    graphs.values().map(TopicGraph::node_count).sum::<usize>()
                );
            } else {
                println!("\n{} problem(s) found", problems);
                std::process::exit(1);
            }
        }

        Commands::Search { query, topic, limit } => {
            let mut any = false;
            for (name, graph) in &graphs {
                if topic.as_deref().is_some_and(|t| t != name.as_str()) {
                    continue;
                }
                for hit in graph.search(&query, limit) {
                    println!("{:<16} {:<12} {}", name, hit.id, hit.step);
                    any = true;
                }
            }
            if !any {
                println!("No matches for '{}'", query);
            }
        }
    }

    Ok(())
}

fn print_tree(graph: &TopicGraph) {
    println!(
        "{} ({} nodes, {} roots)",
        graph.topic,
        graph.node_count(),
        graph.roots().len()
    );
    let mut printed = HashSet::new();
    for root in graph.roots() {
        print_subtree(graph, root, 1, &mut printed);
    }
}

fn print_subtree(graph: &TopicGraph, id: &str, depth: usize, printed: &mut HashSet<String>) {
    let indent = "  ".repeat(depth);
    match graph.node(id) {
        Some(node) => {
            if !printed.insert(id.to_string()) {
                println!("{}↺ {} (already shown)", indent, id);
                return;
            }
            println!("{}{}: {}", indent, node.id, node.step);
            for child in graph.children(id) {
                print_subtree(graph, child, depth + 1, printed);
            }
        }
        None => println!("{}⇢ {} (external)", indent, id),
    }
}
