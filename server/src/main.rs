use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use shared::DEFAULT_PORT;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seconds a new connection has to send its join message
    #[arg(long, default_value = "30")]
    handshake_timeout: u64,

    /// Longest accepted display name
    #[arg(long, default_value = "32")]
    max_name_len: usize,

    /// Pick colors at random instead of giving white to the first in queue
    #[arg(long)]
    random_colors: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        handshake_timeout: Duration::from_secs(args.handshake_timeout),
        max_name_len: args.max_name_len,
        random_colors: args.random_colors,
    };

    info!("Starting chess server on {}", config.bind_addr());
    if config.random_colors {
        info!("Colors are assigned at random");
    }

    let server = Server::new(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
    }

    Ok(())
}
