mod augment;
mod cli;
mod data;
mod error;
mod output;
mod pipeline;
mod render;
mod stripes;

use clap::Parser;

use cli::Args;
use pipeline::PipelineConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::from(Args::parse());
    let summary = pipeline::run(&config)?;

    println!(
        "Saved augmented dataset to {}",
        summary.output_directory.display()
    );
    Ok(())
}
