use clap::Parser;
use log::info;
use server::network::{Server, ServerConfig};
use server::roster;
use shared::{FieldConfig, HEATMAP_INTERVAL_MS, MOTION_INTERVAL_MS};
use std::time::Duration;

/// Authoritative pitch telemetry simulation server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Motion tick interval in milliseconds
    #[clap(long, default_value_t = MOTION_INTERVAL_MS)]
    motion_interval_ms: u64,
    /// Heatmap broadcast interval in milliseconds
    #[clap(long, default_value_t = HEATMAP_INTERVAL_MS)]
    heatmap_interval_ms: u64,
    /// Pitch width in pixels
    #[clap(long, default_value = "800")]
    field_width: f32,
    /// Pitch height in pixels
    #[clap(long, default_value = "520")]
    field_height: f32,
    /// Fixed RNG seed for a reproducible session
    #[clap(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let config = ServerConfig {
        field: FieldConfig::new(args.field_width, args.field_height),
        motion_interval: Duration::from_millis(args.motion_interval_ms),
        heatmap_interval: Duration::from_millis(args.heatmap_interval_ms),
        seed: args.seed,
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, &roster::default_roster(), config).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
