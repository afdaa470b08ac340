use clap::Parser; // for cli
use puzzle_stats::{config::Args, start_server};

// this is main async function with tokio
#[tokio::main]
async fn main() -> std::io::Result<()> {
    // parse cli arguments
    let args = Args::parse();
    start_server(args).await
}
