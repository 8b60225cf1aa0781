use clap::Parser;
use client::network::Client;
use log::info;
use shared::ServerMessage;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:5002")]
    server: String,

    /// Display name; asked for when missing
    #[arg(short = 'n', long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    let mut client = Client::connect(&args.server).await?;
    match client.next_message().await? {
        Some(ServerMessage::Welcome) => info!("Connected to {}", args.server),
        Some(other) => return Err(format!("unexpected greeting from server: {:?}", other).into()),
        None => return Err("server closed the connection".into()),
    }

    let name = match args.name {
        Some(name) => name,
        None => {
            print!("Your name: ");
            std::io::stdout().flush()?;
            stdin.next_line().await?.unwrap_or_default()
        }
    };
    client.join(&name).await?;

    client.run(&mut stdin).await?;

    Ok(())
}
