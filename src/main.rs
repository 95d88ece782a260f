use clap::Parser;
use docbench::cli::{self, Command};

#[derive(Parser)]
#[command(name = "docbench", about = "docbench — synthetic document sets and search benchmarks")]
struct Cli {
    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    match cli.command {
        Command::Generate(args) => {
            let written = cli::generate(&args)?;
            println!("wrote {written} documents to {}", args.out.display());
        }
        Command::Bench(args) => {
            let (indexed, searched) = cli::bench(&args)?;
            println!(
                "indexed {} documents in {} batches; timed {} queries (mean {:.3} ms); log saved to {}",
                indexed.docs,
                indexed.batches,
                searched.results.len(),
                searched.mean_ms().unwrap_or_default(),
                args.log.display()
            );
        }
        Command::Report(args) => {
            let report = cli::report(&args)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
