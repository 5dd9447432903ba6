//! Export a topic graph to DOT or SVG.

use std::path::PathBuf;

use clap::Parser;
use flowdocs::{build_topics, scan_workspace, FlowConfig};

#[derive(Parser)]
#[command(name = "flowdocs-export")]
#[command(about = "Export a flow topic graph to DOT/SVG format")]
struct Cli {
    /// Topic to export
    topic: String,

    /// Workspace root (overrides [scan].root from config)
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Output file (defaults to <topic>.dot / <topic>.svg)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: dot or svg (defaults to [export].format)
    #[arg(short, long)]
    format: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = FlowConfig::load()?;
    let root = cli.workspace.clone().unwrap_or_else(|| config.scan_root());

    println!("Scanning workspace: {:?}", root);
    let scanned = scan_workspace(&root, &config.scan_config())?;
    let graphs = build_topics(&scanned.records, &scanned.errors, &config.external_names());

    let Some(graph) = graphs.get(&cli.topic) else {
        eprintln!("❌ Unknown topic '{}'", cli.topic);
        std::process::exit(1);
    };

    println!(
        "Graph loaded: {} nodes, {} roots, {} warnings",
        graph.node_count(),
        graph.roots().len(),
        graph.warnings().len()
    );

    let dot_content = graph.to_dot();
    let format = cli.format.unwrap_or_else(|| config.export.format.clone());

    match format.as_str() {
        "dot" => {
            let output_path = cli
                .output
                .unwrap_or_else(|| PathBuf::from(format!("{}.dot", cli.topic)));
            std::fs::write(&output_path, &dot_content)?;
            println!("✅ Exported DOT to: {:?}", output_path);
        }
        "svg" => {
            let output_path = cli
                .output
                .unwrap_or_else(|| PathBuf::from(format!("{}.svg", cli.topic)));

            // Write DOT to a temp file, then convert to SVG with graphviz
            let temp_dot = output_path.with_extension("temp.dot");
            std::fs::write(&temp_dot, &dot_content)?;

            let output = std::process::Command::new("dot")
                .args(["-Tsvg"])
                .arg(&temp_dot)
                .arg("-o")
                .arg(&output_path)
                .output()?;

            let _ = std::fs::remove_file(&temp_dot);

            if output.status.success() {
                println!("✅ Exported SVG to: {:?}", output_path);
            } else {
                eprintln!("❌ GraphViz conversion failed:");
                eprintln!("{}", String::from_utf8_lossy(&output.stderr));
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("❌ Invalid format. Use 'dot' or 'svg'");
            std::process::exit(1);
        }
    }

    Ok(())
}
