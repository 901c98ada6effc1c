// Command-line entry point for fun-trace.

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use fun_trace::api::dto::JsonRenderer;
use fun_trace::application::AnalyzeUsecase;
use fun_trace::config::Config;
use fun_trace::domain::entry_point::EntryPoint;
use fun_trace::infrastructure::{concurrency, FactsLoader, FileExporter};
use fun_trace::ports::{OutputExporter, TraceRenderer};
use fun_trace::ports::snippet_renderer::SnippetRenderer;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Facts file(s) produced by the analysis front-end (.json or .toml)
    #[arg(required = true)]
    facts: Vec<PathBuf>,

    /// List all contracts in the facts
    #[arg(long)]
    list_contracts: bool,

    /// List all functions callable on --contract
    #[arg(long, requires = "contract")]
    list_functions: bool,

    /// Contract to analyze
    #[arg(short, long)]
    contract: Option<String>,

    /// Function to analyze
    #[arg(short = 'f', long)]
    function: Option<String>,

    /// Parameter types selecting one overload, comma separated
    #[arg(short, long, value_delimiter = ',')]
    params: Option<Vec<String>>,

    /// Maximum call depth (overrides the config file)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Config file (TOML); falls back to $FUN_TRACE_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads for graph construction
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env("FUN_TRACE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(depth) = cli.max_depth {
        config.trace.max_depth = depth;
    }
    concurrency::init_thread_pool(cli.threads)?;

    let text_renderer = SnippetRenderer::new(config.render.clone());
    let renderer: &dyn TraceRenderer = match cli.format {
        Format::Text => &text_renderer,
        Format::Json => &JsonRenderer,
    };

    let usecase = AnalyzeUsecase {
        loader: &FactsLoader,
        renderer,
        exporter: &FileExporter,
        config: &config,
    };

    if cli.list_contracts || cli.list_functions {
        let session = usecase.load(&cli.facts)?;
        let mut lines = Vec::new();
        if cli.list_contracts {
            lines.push("Available contracts:".to_string());
            for contract in session.list_contracts() {
                lines.push(format!("- {} ({})", contract.name, contract.kind));
            }
        }
        if let (true, Some(contract)) = (cli.list_functions, &cli.contract) {
            lines.push(format!("Available functions in {}:", contract));
            for function in session.list_functions(contract)? {
                let origin = if function.inherited {
                    format!(" [from {}]", function.id.contract)
                } else {
                    String::new()
                };
                lines.push(format!("- {} - {}{}", function.signature, function.visibility, origin));
            }
        }
        lines.push(String::new());
        FileExporter.export(&lines.join("\n"), cli.output.as_deref())?;
        return Ok(());
    }

    let (Some(contract), Some(function)) = (&cli.contract, &cli.function) else {
        bail!("--contract and --function are required unless listing");
    };

    let mut entry = EntryPoint::new(contract, function);
    if let Some(params) = &cli.params {
        entry = entry.with_params(params);
    }

    let stats = usecase.run(&cli.facts, &entry, cli.output.as_deref())?;
    if let Some(path) = &cli.output {
        println!(
            "Trace of {} written to {} ({} functions, {} leaf markers)",
            entry,
            path.display(),
            stats.expanded,
            stats.revisits + stats.depth_exceeded + stats.external + stats.unresolved + stats.ambiguous
        );
    }
    Ok(())
}
