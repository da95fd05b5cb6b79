use asmscope::{run_asmscope, Args, PipelineOptions};
use clap::Parser;
use tracing::Level;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let store = run_asmscope(&PipelineOptions::from(&args))?;
    println!(
        "Wrote {} components ({} nodes, {} edges) to {}",
        store.counts.components, store.counts.total_nodes, store.counts.total_edges, args.output
    );
    Ok(())
}
