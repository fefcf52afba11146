//! MARS - CLI Entry Point
//!
//! Commands:
//! - `mars-vm run <warrior.json>...` - Run a match to completion
//! - `mars-vm check <warrior.json>...` - Load warriors and report placement
//!
//! Each warrior file is a JSON array of statements.

use clap::{Parser, Subcommand};
use mars::{Mars, MatchConfig, Outcome, Program};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mars-vm")]
#[command(version = "0.1.0")]
#[command(about = "A deterministic Memory Array Redcode Simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct MatchArgs {
    /// Warrior files (JSON arrays of statements), one per warrior
    #[arg(required = true)]
    warriors: Vec<String>,
    /// JSON match configuration
    #[arg(short, long)]
    config: Option<String>,
    /// Core size (overrides the config file)
    #[arg(long)]
    core_size: Option<usize>,
    /// Cycle limit before a draw (overrides the config file)
    #[arg(long)]
    cycles: Option<u64>,
    /// Seed for randomized placement
    #[arg(long)]
    seed: Option<u64>,
    /// Explicit start address per warrior
    #[arg(long, value_delimiter = ',')]
    start: Option<Vec<usize>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a match until one warrior is left or the cycle limit is reached
    Run {
        #[command(flatten)]
        args: MatchArgs,
        /// Log every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the final memory and process queues as JSON
        #[arg(long)]
        snapshot: bool,
    },
    /// Load the warriors and print where each one starts
    Check {
        #[command(flatten)]
        args: MatchArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args, trace, snapshot } => {
            init_logging(trace);
            run_match(&args, snapshot);
        }
        Commands::Check { args } => {
            init_logging(false);
            check_match(&args);
        }
    }
}

fn init_logging(trace: bool) {
    let default = if trace { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", message);
    std::process::exit(1);
}

fn load_config(args: &MatchArgs) -> MatchConfig {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .unwrap_or_else(|e| fail(format!("failed to read {}: {}", path, e)));
            MatchConfig::from_json(&text).unwrap_or_else(|e| fail(e))
        }
        None => MatchConfig::default(),
    };

    if let Some(size) = args.core_size {
        config = config.with_core_size(size);
    }
    if let Some(cycles) = args.cycles {
        config = config.with_cycle_limit(Some(cycles));
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(start) = &args.start {
        config = config.with_start_positions(start.clone());
    }
    config
}

fn load_programs(paths: &[String]) -> Vec<Program> {
    paths
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)
                .unwrap_or_else(|e| fail(format!("failed to read {}: {}", path, e)));
            serde_json::from_str(&text)
                .unwrap_or_else(|e| fail(format!("invalid warrior {}: {}", path, e)))
        })
        .collect()
}

fn build(args: &MatchArgs) -> Mars {
    let config = load_config(args);
    let programs = load_programs(&args.warriors);
    Mars::new(&programs, &config).unwrap_or_else(|e| fail(e))
}

fn run_match(args: &MatchArgs, snapshot: bool) {
    let mut mars = build(args);
    let outcome = mars.run();

    match &outcome {
        Outcome::Winner { warrior } => {
            println!("Winner: {} ({})", args.warriors[*warrior], warrior);
        }
        Outcome::Draw { survivors } => {
            let names: Vec<&str> = survivors.iter().map(|&id| args.warriors[id].as_str()).collect();
            println!("Draw between: {}", names.join(", "));
        }
        Outcome::Extinct => println!("No survivors"),
    }
    println!("Cycles: {}", mars.cycles());
    if !mars.diagnostics().is_empty() {
        println!("Invalid operands: {}", mars.diagnostics().len());
    }

    if snapshot {
        match serde_json::to_string_pretty(&mars.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
    }
}

fn check_match(args: &MatchArgs) {
    let mars = build(args);
    println!("Core size: {}", mars.core().size());
    for warrior in mars.warriors() {
        let start = warrior.next_pc().unwrap_or_default();
        println!(
            "{:>3}  start {:>5}  {}  {}",
            warrior.id(),
            start,
            mars.core().read(start),
            args.warriors[warrior.id()]
        );
    }
}
