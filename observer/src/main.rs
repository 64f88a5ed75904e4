use clap::Parser;
use observer::network::ObserverClient;
use shared::ObserverMode;

/// Headless observer for the pitch telemetry server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address to connect to
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    server: String,
    /// Join as a participant owning one controlled player
    #[clap(long)]
    participant: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let mode = if args.participant {
        ObserverMode::Participant
    } else {
        ObserverMode::Monitor
    };

    let mut client = ObserverClient::new(&args.server, mode).await?;
    client.run().await
}
