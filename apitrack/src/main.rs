use std::net::SocketAddr;

use clap::Parser;
use server::ServeConfig;

mod args;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = args::Args::parse();

    logger::init(&args);

    let config = args.config()?;

    // Flag beats the configuration file beats the built-in default.
    let listen_address = args
        .listen_address
        .or(config.server.listen_address)
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8000)));

    if let Err(e) = server::serve(ServeConfig { listen_address, config }).await {
        log::error!("{e:#}");
        std::process::exit(1);
    }

    Ok(())
}
