use clap::Parser;
use inkhatch::{init_logging, run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let written = run(Cli::parse()).await?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
