//! Platy CLI - declarative deployment engine

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use platy::error::{FixSuggestion, PlatyError};
use platy::{
    create_provider, generate_generation_id, Event, EventKind, PlatyConfig, Stack, TraceWriter,
};

#[derive(Parser)]
#[command(name = "platy")]
#[command(about = "Platy - declarative deployment engine for production apps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a stack file
    Up {
        /// Path to .platy.yaml file
        file: String,

        /// Override the provider (local, mock)
        #[arg(short, long)]
        provider: Option<String>,

        /// Skip writing an NDJSON trace
        #[arg(long)]
        no_trace: bool,
    },

    /// Validate and print the plan without executing
    Preview {
        /// Path to .platy.yaml file
        file: String,
    },

    /// Validate a stack file (parse + schema + graph)
    Validate {
        /// Path to .platy.yaml file
        file: String,
    },

    /// Manage deployment traces
    Trace {
        #[command(subcommand)]
        action: TraceAction,
    },
}

#[derive(Subcommand)]
enum TraceAction {
    /// List all traces
    List {
        /// Show only last N traces
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show details of a trace
    Show {
        /// Generation ID or partial match
        id: String,
    },

    /// Export trace to file
    Export {
        /// Generation ID
        id: String,
        /// Output format (json, yaml)
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete old traces
    Clean {
        /// Keep only last N traces
        #[arg(short, long, default_value = "10")]
        keep: usize,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Up {
            file,
            provider,
            no_trace,
        } => up(&file, provider, no_trace).await,
        Commands::Preview { file } => preview(&file),
        Commands::Validate { file } => validate(&file),
        Commands::Trace { action } => handle_trace_command(action),
    };

    match result {
        Ok(success) => {
            if !success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

fn read_stack(file: &str) -> Result<(String, Stack), PlatyError> {
    if !std::path::Path::new(file).exists() {
        return Err(PlatyError::StackNotFound {
            path: file.to_string(),
        });
    }
    let yaml = fs::read_to_string(file)?;
    let stack = Stack::load(&yaml)?;
    Ok((yaml, stack))
}

/// Deploy a stack. Returns Ok(false) if any resource failed (exit code 1).
async fn up(file: &str, provider_override: Option<String>, no_trace: bool) -> Result<bool, PlatyError> {
    let (_yaml, stack) = read_stack(file)?;
    let config = PlatyConfig::load()?.with_env();

    let provider_name = provider_override
        .or_else(|| stack.provider.clone())
        .unwrap_or_else(|| config.default_provider().to_string());
    let provider = create_provider(&provider_name)?;

    println!(
        "{} Stack {} | provider: {}",
        "→".cyan(),
        stack.compute_hash().dimmed(),
        provider_name.cyan().bold()
    );

    let (graph, exporter) = stack.into_graph()?;
    let engine = platy::Engine::new(graph, Arc::clone(&provider));
    let mut report = engine.run().await?;

    let (outputs, unresolved) = exporter.collect_partial(engine.store());
    for (name, output_ref) in exporter.iter() {
        if outputs.contains_key(name) {
            engine.event_log().emit(EventKind::OutputResolved {
                name: name.to_string(),
                node_id: Arc::clone(&output_ref.node_id),
            });
        }
    }
    for (name, node_id, reason) in &unresolved {
        engine.event_log().emit(EventKind::OutputUnresolved {
            name: name.clone(),
            node_id: Arc::from(node_id.as_str()),
            reason: reason.clone(),
        });
    }
    report.unresolved_outputs = unresolved;

    report.print();

    if !outputs.is_empty() {
        println!("\n{}", "Outputs:".cyan().bold());
        for (name, value) in &outputs {
            println!("  {} = {}", name, value);
        }
    }

    if !no_trace && config.trace.enabled {
        let generation_id = generate_generation_id();
        match TraceWriter::new(&generation_id) {
            Ok(writer) => {
                writer.write_all(engine.event_log())?;
                writer.close()?;
                println!("\n{} Trace written: {}", "→".cyan(), generation_id.dimmed());
            }
            Err(e) => {
                eprintln!("{} Could not write trace: {}", "Warning:".yellow(), e);
            }
        }
    }

    Ok(report.is_success())
}

fn preview(file: &str) -> Result<bool, PlatyError> {
    let (_yaml, stack) = read_stack(file)?;
    let (graph, exporter) = stack.into_graph()?;
    graph.detect_cycles()?;

    let order = graph.topological_sort()?;

    println!(
        "{} Plan for {} resources:\n",
        "→".cyan(),
        graph.len()
    );
    for id in &order {
        let node = graph.node(id).expect("sorted ids come from the graph");
        let deps = graph.dependencies(id);
        if deps.is_empty() {
            println!("  {} {} [{}]", "+".green(), id, node.kind);
        } else {
            let deps: Vec<&str> = deps.iter().map(|d| d.as_ref()).collect();
            println!(
                "  {} {} [{}] {}",
                "+".green(),
                id,
                node.kind,
                format!("after {}", deps.join(", ")).dimmed()
            );
        }
    }

    if !exporter.is_empty() {
        println!("\n{}", "Outputs:".cyan());
        for name in exporter.names() {
            println!("  {}", name);
        }
    }

    Ok(true)
}

fn validate(file: &str) -> Result<bool, PlatyError> {
    let (_yaml, stack) = read_stack(file)?;
    let (graph, exporter) = stack.into_graph()?;
    graph.detect_cycles()?;

    println!("{} Stack '{}' is valid", "✓".green(), file);
    println!(
        "  Provider: {}",
        stack.provider.as_deref().unwrap_or("(default)")
    );
    println!("  Resources: {}", graph.len());
    println!("  Outputs: {}", exporter.len());

    Ok(true)
}

fn handle_trace_command(action: TraceAction) -> Result<bool, PlatyError> {
    match action {
        TraceAction::List { limit } => {
            let traces = platy::list_traces()?;
            let traces = match limit {
                Some(n) => traces.into_iter().take(n).collect::<Vec<_>>(),
                None => traces,
            };

            println!("Found {} traces:\n", traces.len());
            println!("{:<30} {:>10} {:>20}", "GENERATION ID", "SIZE", "CREATED");
            println!("{}", "-".repeat(62));

            for trace in traces {
                let size = if trace.size_bytes > 1024 * 1024 {
                    format!("{:.1}MB", trace.size_bytes as f64 / 1024.0 / 1024.0)
                } else if trace.size_bytes > 1024 {
                    format!("{:.1}KB", trace.size_bytes as f64 / 1024.0)
                } else {
                    format!("{}B", trace.size_bytes)
                };

                let created = trace
                    .created
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| {
                        chrono::DateTime::from_timestamp(d.as_secs() as i64, 0)
                            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "unknown".to_string())
                    })
                    .unwrap_or_else(|| "unknown".to_string());

                println!("{:<30} {:>10} {:>20}", trace.generation_id, size, created);
            }
            Ok(true)
        }

        TraceAction::Show { id } => {
            let traces = platy::list_traces()?;
            let trace = traces
                .iter()
                .find(|t| t.generation_id.contains(&id))
                .ok_or_else(|| PlatyError::ValidationError {
                    reason: format!("No trace matching '{}'", id),
                })?;

            let content = fs::read_to_string(&trace.path)?;
            let events: Vec<Event> = content
                .lines()
                .filter_map(|line| serde_json::from_str(line).ok())
                .collect();

            println!("Trace: {}", trace.generation_id);
            println!("Events: {}", events.len());
            println!("Size: {} bytes\n", trace.size_bytes);

            for event in events {
                println!("[{:>6}ms] {:?}", event.timestamp_ms, event.kind);
            }
            Ok(true)
        }

        TraceAction::Export { id, format, output } => {
            let traces = platy::list_traces()?;
            let trace = traces
                .iter()
                .find(|t| t.generation_id.contains(&id))
                .ok_or_else(|| PlatyError::ValidationError {
                    reason: format!("No trace matching '{}'", id),
                })?;

            let content = fs::read_to_string(&trace.path)?;
            let events: Vec<Event> = content
                .lines()
                .filter_map(|line| serde_json::from_str(line).ok())
                .collect();

            let exported = match format.as_str() {
                "json" => serde_json::to_string_pretty(&events)?,
                "yaml" => serde_yaml::to_string(&events)?,
                other => {
                    return Err(PlatyError::ValidationError {
                        reason: format!("Unknown format: {}. Use 'json' or 'yaml'", other),
                    })
                }
            };

            match output {
                Some(path) => {
                    fs::write(&path, &exported)?;
                    println!("Exported {} events to {}", events.len(), path.display());
                }
                None => println!("{}", exported),
            }
            Ok(true)
        }

        TraceAction::Clean { keep } => {
            let traces = platy::list_traces()?;
            let to_delete: Vec<_> = traces.into_iter().skip(keep).collect();
            let count = to_delete.len();

            for trace in to_delete {
                fs::remove_file(&trace.path)?;
            }

            println!("Deleted {} old traces, kept {}", count, keep);
            Ok(true)
        }
    }
}
